use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::subscription_plan::PlanTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "store_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    Pending,
    Verified,
    Rejected,
    Suspended,
}

impl StoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Pending => "pending",
            StoreStatus::Verified => "verified",
            StoreStatus::Rejected => "rejected",
            StoreStatus::Suspended => "suspended",
        }
    }

    /// Review workflow: pending stores are verified or rejected, verified
    /// stores can be suspended and reinstated, rejected stores go back to
    /// pending once the owner edits them.
    pub fn can_transition_to(&self, next: StoreStatus) -> bool {
        use StoreStatus::*;
        matches!(
            (self, next),
            (Pending, Verified)
                | (Pending, Rejected)
                | (Verified, Suspended)
                | (Suspended, Verified)
                | (Rejected, Pending)
        )
    }
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Store {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub logo_path: Option<String>,
    pub status: StoreStatus,
    /// Display-only copy of the plan of the active subscription.
    pub current_plan: PlanTier,
    pub rejection_reason: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub fn is_verified(&self) -> bool {
        self.status == StoreStatus::Verified
    }
}
