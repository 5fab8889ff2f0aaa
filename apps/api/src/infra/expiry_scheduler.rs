use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    domain::entities::promotion::PromotionKind,
    ports::expiry_scheduler::{ExpiryJob, ExpiryScheduler},
    use_cases::promotion::{FeaturedProductRepo, HotDealRepo},
};

/// One detached tokio task per placement: sleep until `due_at`, then
/// deactivate the row if it is still due. Tasks die with the process.
#[derive(Clone)]
pub struct TokioExpiryScheduler {
    featured: Arc<dyn FeaturedProductRepo>,
    hot_deals: Arc<dyn HotDealRepo>,
}

impl TokioExpiryScheduler {
    pub fn new(featured: Arc<dyn FeaturedProductRepo>, hot_deals: Arc<dyn HotDealRepo>) -> Self {
        Self {
            featured,
            hot_deals,
        }
    }

    async fn run(self, job: ExpiryJob) {
        let wait = (job.due_at - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        let now = Utc::now();
        let result = match job.kind {
            PromotionKind::Featured => self.featured.deactivate_if_due(job.id, now).await,
            PromotionKind::HotDeal => self.hot_deals.deactivate_if_due(job.id, now).await,
        };

        match result {
            Ok(true) => debug!(kind = ?job.kind, id = %job.id, "Placement expired"),
            Ok(false) => debug!(kind = ?job.kind, id = %job.id, "Placement already inactive"),
            Err(e) => warn!(kind = ?job.kind, id = %job.id, error = %e, "Expiry job failed"),
        }
    }
}

impl ExpiryScheduler for TokioExpiryScheduler {
    fn schedule(&self, job: ExpiryJob) {
        let this = self.clone();
        tokio::spawn(this.run(job));
    }
}
