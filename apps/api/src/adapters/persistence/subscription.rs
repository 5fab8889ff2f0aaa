use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::subscription::{Subscription, SubscriptionStatus},
    use_cases::{
        Page, PageRequest,
        subscription::{NewSubscription, Superseded, SubscriptionRepo},
    },
};

const SELECT_COLS: &str = r#"
    id, store_id, plan_id, subscription_code, status, starts_at, ends_at,
    payment_receipt_path, amount_cents, reviewed_by, reviewed_at,
    rejection_reason, created_at, updated_at
"#;

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn supersede_and_create(&self, new: &NewSubscription) -> AppResult<Superseded> {
        let mut tx = self.pool().begin().await.map_err(AppError::from)?;

        // Serializes concurrent purchases for the same store
        sqlx::query("SELECT id FROM stores WHERE id = $1 FOR UPDATE")
            .bind(new.store_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from)?;

        let expired_codes: Vec<String> = sqlx::query_scalar(
            r#"
            UPDATE subscriptions
            SET status = 'expired', updated_at = NOW()
            WHERE store_id = $1 AND status IN ('pending', 'active')
            RETURNING subscription_code
            "#,
        )
        .bind(new.store_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::from)?;

        // Anything still live under an older code, including cycles that
        // already lapsed by time, stops with the new request.
        let mut placements_deactivated = 0;
        for table in ["featured_products", "hot_deals"] {
            let result = sqlx::query(&format!(
                r#"
                UPDATE {table} SET is_active = FALSE
                WHERE store_id = $1 AND subscription_code <> $2 AND is_active
                "#
            ))
            .bind(new.store_id)
            .bind(&new.subscription_code)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;
            placements_deactivated += result.rows_affected();
        }

        let created = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            INSERT INTO subscriptions
                (id, store_id, plan_id, subscription_code, status, amount_cents, payment_receipt_path)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6)
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.store_id)
        .bind(new.plan_id)
        .bind(&new.subscription_code)
        .bind(new.amount_cents)
        .bind(&new.payment_receipt_path)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;

        Ok(Superseded {
            created,
            expired_codes,
            placements_deactivated,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SELECT_COLS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn find_active(&self, store_id: Uuid) -> AppResult<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {SELECT_COLS} FROM subscriptions
            WHERE store_id = $1 AND status = 'active'
            ORDER BY starts_at DESC NULLS LAST
            LIMIT 1
            "#
        ))
        .bind(store_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list_by_store(&self, store_id: Uuid) -> AppResult<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SELECT_COLS} FROM subscriptions WHERE store_id = $1 ORDER BY created_at DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list(
        &self,
        status: Option<SubscriptionStatus>,
        page: PageRequest,
    ) -> AppResult<Page<Subscription>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM subscriptions WHERE ($1::subscription_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;

        let items = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {SELECT_COLS} FROM subscriptions
            WHERE ($1::subscription_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(Page { items, total })
    }

    async fn approve(
        &self,
        id: Uuid,
        reviewer_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> AppResult<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions SET
                status = 'active',
                starts_at = $3,
                ends_at = $4,
                reviewed_by = $2,
                reviewed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(id)
        .bind(reviewer_id)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn reject(
        &self,
        id: Uuid,
        reviewer_id: Uuid,
        reason: &str,
    ) -> AppResult<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions SET
                status = 'rejected',
                rejection_reason = $3,
                reviewed_by = $2,
                reviewed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(id)
        .bind(reviewer_id)
        .bind(reason)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn expire(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = 'expired', updated_at = NOW() WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions SET status = 'expired', updated_at = NOW()
            WHERE status = 'active' AND ends_at <= $1
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(now)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }
}
