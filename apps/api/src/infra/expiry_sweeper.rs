use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::use_cases::{promotion::PromotionUseCases, subscription::SubscriptionUseCases};

/// Catches up on expiries that no scheduled job handled, e.g. jobs lost in
/// a restart. The first tick fires immediately.
pub async fn run_expiry_sweep_loop(
    promotions: Arc<PromotionUseCases>,
    subscriptions: Arc<SubscriptionUseCases>,
    every_secs: u64,
) {
    let every_secs = every_secs.max(1);
    let mut ticker = interval(Duration::from_secs(every_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Expiry sweeper started (every {}s)", every_secs);

    loop {
        ticker.tick().await;
        sweep_once(&promotions, &subscriptions).await;
    }
}

pub async fn sweep_once(promotions: &PromotionUseCases, subscriptions: &SubscriptionUseCases) {
    let now = Utc::now();

    match promotions.sweep_expired(now).await {
        Ok(report) if report.total() > 0 => info!(
            featured = report.featured,
            hot_deals = report.hot_deals,
            "Deactivated expired placements"
        ),
        Ok(_) => {}
        Err(e) => error!(error = %e, "Placement sweep failed"),
    }

    if let Err(e) = subscriptions.expire_lapsed(now).await {
        error!(error = %e, "Subscription expiry failed");
    }
}
