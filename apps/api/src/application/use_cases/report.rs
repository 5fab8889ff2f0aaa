//! Admin dashboard figures.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::user::User,
    policy::{self, Capability},
};

/// Optional window on `reviewed_at` for the approval and revenue figures.
/// Every other figure is a current snapshot.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ReportPeriod {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ReportPeriod {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserCounts {
    pub buyers: i64,
    pub sellers: i64,
    pub banned: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub pending: i64,
    pub verified: i64,
    pub rejected: i64,
    pub suspended: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductCounts {
    pub total: i64,
    pub published: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionCounts {
    pub pending: i64,
    pub active: i64,
    /// Approved inside the period. Counts cycles that have since expired.
    pub approved: i64,
    pub approved_revenue_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromotionCounts {
    pub active_featured: i64,
    pub active_hot_deals: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportOverview {
    pub users: UserCounts,
    pub stores: StoreCounts,
    pub pending_documents: i64,
    pub products: ProductCounts,
    pub subscriptions: SubscriptionCounts,
    pub promotions: PromotionCounts,
}

#[async_trait]
pub trait ReportRepo: Send + Sync {
    async fn overview(&self, period: ReportPeriod) -> AppResult<ReportOverview>;
}

#[derive(Clone)]
pub struct ReportUseCases {
    repo: Arc<dyn ReportRepo>,
}

impl ReportUseCases {
    pub fn new(repo: Arc<dyn ReportRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn overview(&self, admin: &User, period: ReportPeriod) -> AppResult<ReportOverview> {
        policy::require(admin, Capability::ViewReports)?;
        if matches!((period.from, period.to), (Some(from), Some(to)) if from > to) {
            return Err(AppError::field("to", "The end date must be after the start date."));
        }
        self.repo.overview(period).await
    }
}
