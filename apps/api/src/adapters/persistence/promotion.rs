//! Featured products and hot deals.
//!
//! Both `claim` implementations lock the store row, the same lock a plan
//! purchase takes, so checking the cycle, counting used slots and inserting
//! the new row cannot interleave with another claim or with the cycle being
//! superseded.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::{featured_product::FeaturedProduct, hot_deal::HotDeal},
    use_cases::{
        Page, PageRequest,
        promotion::{
            FeaturedListing, FeaturedProductRepo, HotDealListing, HotDealRepo, NewFeaturedProduct,
            NewHotDeal, SlotClaim,
        },
    },
};

const FEATURED_COLS: &str = r#"
    id, product_id, store_id, subscription_code, plan_type,
    start_time, finish_time, is_active, created_at
"#;

const HOT_DEAL_COLS: &str = r#"
    id, product_id, store_id, subscription_code, plan_type,
    original_price_cents, deal_price_cents, discount_percentage, description,
    deal_start_at, deal_end_at, is_active, created_at
"#;

/// Locks the store row and reports whether `code` is still its active cycle.
async fn lock_open_cycle(
    tx: &mut Transaction<'_, Postgres>,
    store_id: Uuid,
    code: &str,
) -> AppResult<bool> {
    sqlx::query("SELECT id FROM stores WHERE id = $1 FOR UPDATE")
        .bind(store_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::from)?;

    sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM subscriptions
            WHERE store_id = $1 AND subscription_code = $2 AND status = 'active'
        )
        "#,
    )
    .bind(store_id)
    .bind(code)
    .fetch_one(&mut **tx)
    .await
    .map_err(AppError::from)
}

/// Counts rows already charged to `code` in `table`. Returns `Some(used)` when no slot is left.
async fn count_used(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    store_id: Uuid,
    code: &str,
    slot_max: i64,
) -> AppResult<Option<i64>> {
    let used: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {table} WHERE store_id = $1 AND subscription_code = $2"
    ))
    .bind(store_id)
    .bind(code)
    .fetch_one(&mut **tx)
    .await
    .map_err(AppError::from)?;

    Ok((used >= slot_max).then_some(used))
}

async fn has_active_row(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    product_id: Uuid,
) -> AppResult<bool> {
    sqlx::query_scalar(&format!(
        "SELECT EXISTS (SELECT 1 FROM {table} WHERE product_id = $1 AND is_active)"
    ))
    .bind(product_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(AppError::from)
}

impl PostgresPersistence {
    async fn set_inactive(&self, table: &str, condition: &str, id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(&format!(
            "UPDATE {table} SET is_active = FALSE WHERE is_active AND {condition}"
        ))
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FeaturedProductRepo for PostgresPersistence {
    async fn claim(
        &self,
        new: &NewFeaturedProduct,
        slot_max: i64,
    ) -> AppResult<SlotClaim<FeaturedProduct>> {
        let mut tx = self.pool().begin().await.map_err(AppError::from)?;

        if !lock_open_cycle(&mut tx, new.store_id, &new.subscription_code).await? {
            return Ok(SlotClaim::CycleClosed);
        }
        if let Some(used) = count_used(
            &mut tx,
            "featured_products",
            new.store_id,
            &new.subscription_code,
            slot_max,
        )
        .await?
        {
            return Ok(SlotClaim::Exhausted { used });
        }
        if has_active_row(&mut tx, "featured_products", new.product_id).await? {
            return Ok(SlotClaim::AlreadyActive);
        }

        let row = sqlx::query_as::<_, FeaturedProduct>(&format!(
            r#"
            INSERT INTO featured_products
                (id, product_id, store_id, subscription_code, plan_type, start_time, finish_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FEATURED_COLS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.product_id)
        .bind(new.store_id)
        .bind(&new.subscription_code)
        .bind(new.plan_type)
        .bind(new.start_time)
        .bind(new.finish_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(SlotClaim::Created(row))
    }

    async fn count_for_code(&self, store_id: Uuid, code: &str) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM featured_products WHERE store_id = $1 AND subscription_code = $2",
        )
        .bind(store_id)
        .bind(code)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn find_active_for_product(&self, product_id: Uuid) -> AppResult<Option<FeaturedProduct>> {
        sqlx::query_as::<_, FeaturedProduct>(&format!(
            "SELECT {FEATURED_COLS} FROM featured_products WHERE product_id = $1 AND is_active"
        ))
        .bind(product_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list_for_code(&self, store_id: Uuid, code: &str) -> AppResult<Vec<FeaturedProduct>> {
        sqlx::query_as::<_, FeaturedProduct>(&format!(
            r#"
            SELECT {FEATURED_COLS} FROM featured_products
            WHERE store_id = $1 AND subscription_code = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(store_id)
        .bind(code)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.set_inactive("featured_products", "id = $1", id).await? > 0)
    }

    async fn deactivate_if_due(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE featured_products SET is_active = FALSE WHERE id = $1 AND is_active AND finish_time <= $2",
        )
        .bind(id)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_for_product(&self, product_id: Uuid) -> AppResult<u64> {
        self.set_inactive("featured_products", "product_id = $1", product_id)
            .await
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE featured_products SET is_active = FALSE WHERE is_active AND finish_time <= $1",
        )
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }

    async fn list_public(&self, page: PageRequest) -> AppResult<Page<FeaturedListing>> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM featured_products f
            JOIN products p ON p.id = f.product_id
            JOIN stores s ON s.id = f.store_id
            WHERE f.is_active AND p.status = 'published' AND s.status = 'verified'
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;

        let items = sqlx::query_as::<_, FeaturedListing>(
            r#"
            SELECT
                f.id, f.product_id,
                p.name AS product_name, p.slug AS product_slug,
                p.price_cents, p.image_path,
                s.name AS store_name, s.slug AS store_slug,
                f.finish_time
            FROM featured_products f
            JOIN products p ON p.id = f.product_id
            JOIN stores s ON s.id = f.store_id
            WHERE f.is_active AND p.status = 'published' AND s.status = 'verified'
            ORDER BY f.start_time DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(Page { items, total })
    }
}

#[async_trait]
impl HotDealRepo for PostgresPersistence {
    async fn claim(&self, new: &NewHotDeal, slot_max: i64) -> AppResult<SlotClaim<HotDeal>> {
        let mut tx = self.pool().begin().await.map_err(AppError::from)?;

        if !lock_open_cycle(&mut tx, new.store_id, &new.subscription_code).await? {
            return Ok(SlotClaim::CycleClosed);
        }
        if let Some(used) = count_used(
            &mut tx,
            "hot_deals",
            new.store_id,
            &new.subscription_code,
            slot_max,
        )
        .await?
        {
            return Ok(SlotClaim::Exhausted { used });
        }
        if has_active_row(&mut tx, "hot_deals", new.product_id).await? {
            return Ok(SlotClaim::AlreadyActive);
        }

        let row = sqlx::query_as::<_, HotDeal>(&format!(
            r#"
            INSERT INTO hot_deals
                (id, product_id, store_id, subscription_code, plan_type,
                 original_price_cents, deal_price_cents, discount_percentage, description,
                 deal_start_at, deal_end_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {HOT_DEAL_COLS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.product_id)
        .bind(new.store_id)
        .bind(&new.subscription_code)
        .bind(new.plan_type)
        .bind(new.original_price_cents)
        .bind(new.deal_price_cents)
        .bind(new.discount_percentage)
        .bind(&new.description)
        .bind(new.deal_start_at)
        .bind(new.deal_end_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(SlotClaim::Created(row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<HotDeal>> {
        sqlx::query_as::<_, HotDeal>(&format!(
            "SELECT {HOT_DEAL_COLS} FROM hot_deals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn count_for_code(&self, store_id: Uuid, code: &str) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM hot_deals WHERE store_id = $1 AND subscription_code = $2",
        )
        .bind(store_id)
        .bind(code)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn find_active_for_product(&self, product_id: Uuid) -> AppResult<Option<HotDeal>> {
        sqlx::query_as::<_, HotDeal>(&format!(
            "SELECT {HOT_DEAL_COLS} FROM hot_deals WHERE product_id = $1 AND is_active"
        ))
        .bind(product_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list_for_code(&self, store_id: Uuid, code: &str) -> AppResult<Vec<HotDeal>> {
        sqlx::query_as::<_, HotDeal>(&format!(
            r#"
            SELECT {HOT_DEAL_COLS} FROM hot_deals
            WHERE store_id = $1 AND subscription_code = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(store_id)
        .bind(code)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.set_inactive("hot_deals", "id = $1", id).await? > 0)
    }

    async fn deactivate_if_due(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE hot_deals SET is_active = FALSE WHERE id = $1 AND is_active AND deal_end_at <= $2",
        )
        .bind(id)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_for_product(&self, product_id: Uuid) -> AppResult<u64> {
        self.set_inactive("hot_deals", "product_id = $1", product_id)
            .await
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE hot_deals SET is_active = FALSE WHERE is_active AND deal_end_at <= $1",
        )
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }

    async fn list_public(
        &self,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> AppResult<Page<HotDealListing>> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM hot_deals d
            JOIN products p ON p.id = d.product_id
            JOIN stores s ON s.id = d.store_id
            WHERE d.is_active AND d.deal_start_at <= $1 AND d.deal_end_at > $1
              AND p.status = 'published' AND s.status = 'verified'
            "#,
        )
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;

        let items = sqlx::query_as::<_, HotDealListing>(
            r#"
            SELECT
                d.id, d.product_id,
                p.name AS product_name, p.slug AS product_slug, p.image_path,
                s.name AS store_name, s.slug AS store_slug,
                d.original_price_cents, d.deal_price_cents, d.discount_percentage,
                d.description, d.deal_start_at, d.deal_end_at
            FROM hot_deals d
            JOIN products p ON p.id = d.product_id
            JOIN stores s ON s.id = d.store_id
            WHERE d.is_active AND d.deal_start_at <= $1 AND d.deal_end_at > $1
              AND p.status = 'published' AND s.status = 'verified'
            ORDER BY d.discount_percentage DESC, d.deal_end_at
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(now)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(Page { items, total })
    }
}
