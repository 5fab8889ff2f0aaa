use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::subscription_plan::PlanTier;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HotDeal {
    pub id: Uuid,
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub subscription_code: String,
    pub plan_type: PlanTier,
    pub original_price_cents: i64,
    pub deal_price_cents: i64,
    pub discount_percentage: f64,
    pub description: Option<String>,
    pub deal_start_at: DateTime<Utc>,
    pub deal_end_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl HotDeal {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.deal_end_at <= now
    }

    /// Active and inside its deal window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.deal_start_at <= now && now < self.deal_end_at
    }

    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        if !self.is_active {
            return 0;
        }
        (self.deal_end_at - now).num_seconds().max(0)
    }
}

/// Percentage off the original price, rounded to two decimals.
pub fn discount_percentage(original_cents: i64, deal_cents: i64) -> f64 {
    if original_cents <= 0 {
        return 0.0;
    }
    let pct = (original_cents - deal_cents) as f64 / original_cents as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}
