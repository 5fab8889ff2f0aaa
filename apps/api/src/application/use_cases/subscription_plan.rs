use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        subscription_plan::{PlanTier, SubscriptionPlan},
        user::User,
    },
    policy::{self, Capability},
};

#[derive(Debug, Clone, Default)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub product_limit: Option<i32>,
    pub featured_slot_max: Option<i32>,
    pub hot_deal_max: Option<i32>,
    pub featured_duration_days: Option<i32>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait SubscriptionPlanRepo: Send + Sync {
    /// All plans, cheapest first.
    async fn list(&self) -> AppResult<Vec<SubscriptionPlan>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionPlan>>;
    async fn get_by_slug(&self, slug: PlanTier) -> AppResult<Option<SubscriptionPlan>>;
    async fn update(&self, slug: PlanTier, update: &PlanUpdate) -> AppResult<SubscriptionPlan>;
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlanInput {
    #[validate(length(min = 1, max = 60))]
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub price_cents: Option<i64>,
    #[validate(range(min = 0))]
    pub product_limit: Option<i32>,
    #[validate(range(min = 0))]
    pub featured_slot_max: Option<i32>,
    #[validate(range(min = 0))]
    pub hot_deal_max: Option<i32>,
    #[validate(range(min = 1, message = "The featured duration must be at least 1 day."))]
    pub featured_duration_days: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct SubscriptionPlanUseCases {
    repo: Arc<dyn SubscriptionPlanRepo>,
}

impl SubscriptionPlanUseCases {
    pub fn new(repo: Arc<dyn SubscriptionPlanRepo>) -> Self {
        Self { repo }
    }

    pub async fn list_plans(&self) -> AppResult<Vec<SubscriptionPlan>> {
        let plans = self.repo.list().await?;
        Ok(plans.into_iter().filter(|p| p.is_active).collect())
    }

    pub async fn get_plan(&self, slug: &str) -> AppResult<SubscriptionPlan> {
        let tier = slug.parse::<PlanTier>().map_err(|_| AppError::NotFound)?;
        self.repo.get_by_slug(tier).await?.ok_or(AppError::NotFound)
    }

    #[instrument(skip(self, admin, input), fields(admin_id = %admin.id))]
    pub async fn update_plan(
        &self,
        admin: &User,
        slug: &str,
        input: UpdatePlanInput,
    ) -> AppResult<SubscriptionPlan> {
        policy::require(admin, Capability::ManagePlans)?;
        input.validate()?;
        let tier = slug.parse::<PlanTier>().map_err(|_| AppError::NotFound)?;
        self.repo.get_by_slug(tier).await?.ok_or(AppError::NotFound)?;

        if tier.is_free() && input.price_cents.is_some_and(|p| p > 0) {
            return Err(AppError::field(
                "price_cents",
                "The basic plan must stay free.",
            ));
        }

        let plan = self
            .repo
            .update(
                tier,
                &PlanUpdate {
                    name: input.name,
                    price_cents: input.price_cents,
                    product_limit: input.product_limit,
                    featured_slot_max: input.featured_slot_max,
                    hot_deal_max: input.hot_deal_max,
                    featured_duration_days: input.featured_duration_days,
                    is_active: input.is_active,
                },
            )
            .await?;
        tracing::info!(plan = %tier, "Subscription plan updated");
        Ok(plan)
    }
}
