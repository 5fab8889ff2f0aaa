use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::subscription_plan::PlanTier;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeaturedProduct {
    pub id: Uuid,
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub subscription_code: String,
    pub plan_type: PlanTier,
    pub start_time: DateTime<Utc>,
    pub finish_time: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl FeaturedProduct {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.finish_time <= now
    }

    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        if !self.is_active {
            return 0;
        }
        (self.finish_time - now).num_seconds().max(0)
    }
}
