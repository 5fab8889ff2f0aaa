use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::subscription_plan::{PlanTier, SubscriptionPlan},
    use_cases::subscription_plan::{PlanUpdate, SubscriptionPlanRepo},
};

const SELECT_COLS: &str = r#"
    id, slug, name, price_cents, product_limit, featured_slot_max,
    hot_deal_max, featured_duration_days, is_active, updated_at
"#;

#[async_trait]
impl SubscriptionPlanRepo for PostgresPersistence {
    async fn list(&self) -> AppResult<Vec<SubscriptionPlan>> {
        sqlx::query_as::<_, SubscriptionPlan>(&format!(
            "SELECT {SELECT_COLS} FROM subscription_plans ORDER BY price_cents, slug"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionPlan>> {
        sqlx::query_as::<_, SubscriptionPlan>(&format!(
            "SELECT {SELECT_COLS} FROM subscription_plans WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_slug(&self, slug: PlanTier) -> AppResult<Option<SubscriptionPlan>> {
        sqlx::query_as::<_, SubscriptionPlan>(&format!(
            "SELECT {SELECT_COLS} FROM subscription_plans WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn update(&self, slug: PlanTier, update: &PlanUpdate) -> AppResult<SubscriptionPlan> {
        sqlx::query_as::<_, SubscriptionPlan>(&format!(
            r#"
            UPDATE subscription_plans SET
                name = COALESCE($2, name),
                price_cents = COALESCE($3, price_cents),
                product_limit = COALESCE($4, product_limit),
                featured_slot_max = COALESCE($5, featured_slot_max),
                hot_deal_max = COALESCE($6, hot_deal_max),
                featured_duration_days = COALESCE($7, featured_duration_days),
                is_active = COALESCE($8, is_active),
                updated_at = NOW()
            WHERE slug = $1
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(slug)
        .bind(&update.name)
        .bind(update.price_cents)
        .bind(update.product_limit)
        .bind(update.featured_slot_max)
        .bind(update.hot_deal_max)
        .bind(update.featured_duration_days)
        .bind(update.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }
}
