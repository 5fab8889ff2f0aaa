use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, like_pattern, push_page},
    app_error::{AppError, AppResult},
    domain::entities::{
        store::{Store, StoreStatus},
        subscription_plan::PlanTier,
    },
    use_cases::{
        Page, PageRequest,
        store::{NewStore, StoreFilter, StoreProfileUpdate, StoreRepo},
    },
};

const SELECT_COLS: &str = r#"
    id, owner_id, name, slug, description, phone, address, logo_path,
    status, current_plan, rejection_reason, verified_at, created_at, updated_at
"#;

fn push_store_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &StoreFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = &filter.search {
        builder.push(" AND name ILIKE ").push_bind(like_pattern(search));
    }
}

#[async_trait]
impl StoreRepo for PostgresPersistence {
    async fn create(&self, store: &NewStore) -> AppResult<Store> {
        sqlx::query_as::<_, Store>(&format!(
            r#"
            INSERT INTO stores (id, owner_id, name, slug, description, phone, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(store.owner_id)
        .bind(&store.name)
        .bind(&store.slug)
        .bind(&store.description)
        .bind(&store.phone)
        .bind(&store.address)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Store>> {
        sqlx::query_as::<_, Store>(&format!("SELECT {SELECT_COLS} FROM stores WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)
    }

    async fn get_by_owner(&self, owner_id: Uuid) -> AppResult<Option<Store>> {
        sqlx::query_as::<_, Store>(&format!(
            "SELECT {SELECT_COLS} FROM stores WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_slug(&self, slug: &str) -> AppResult<Option<Store>> {
        sqlx::query_as::<_, Store>(&format!("SELECT {SELECT_COLS} FROM stores WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)
    }

    async fn update_profile(&self, id: Uuid, update: &StoreProfileUpdate) -> AppResult<Store> {
        sqlx::query_as::<_, Store>(&format!(
            r#"
            UPDATE stores SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.phone)
        .bind(&update.address)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn set_logo(&self, id: Uuid, logo_path: &str) -> AppResult<Store> {
        sqlx::query_as::<_, Store>(&format!(
            "UPDATE stores SET logo_path = $2, updated_at = NOW() WHERE id = $1 RETURNING {SELECT_COLS}"
        ))
        .bind(id)
        .bind(logo_path)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: StoreStatus,
        reason: Option<&str>,
    ) -> AppResult<Store> {
        sqlx::query_as::<_, Store>(&format!(
            r#"
            UPDATE stores SET
                status = $2,
                rejection_reason = $3,
                verified_at = CASE WHEN $2 = 'verified'::store_status THEN NOW() ELSE verified_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(reason)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn set_current_plan(&self, id: Uuid, plan: PlanTier) -> AppResult<()> {
        sqlx::query("UPDATE stores SET current_plan = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(plan)
            .execute(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn list(&self, filter: &StoreFilter, page: PageRequest) -> AppResult<Page<Store>> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM stores WHERE TRUE");
        push_store_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(AppError::from)?;

        let mut data_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SELECT_COLS} FROM stores WHERE TRUE"));
        push_store_filters(&mut data_builder, filter);
        data_builder.push(" ORDER BY created_at DESC");
        push_page(&mut data_builder, page);

        let items = data_builder
            .build_query_as::<Store>()
            .fetch_all(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(Page { items, total })
    }
}
