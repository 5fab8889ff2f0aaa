use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, like_pattern, push_page},
    app_error::{AppError, AppResult},
    domain::entities::product::Product,
    use_cases::{
        Page, PageRequest,
        product::{NewProduct, ProductFilter, ProductInsert, ProductRepo, ProductUpdate},
    },
};

const SELECT_COLS: &str = r#"
    p.id, p.store_id, p.category_id, p.name, p.slug, p.description,
    p.price_cents, p.stock, p.status, p.image_path, p.created_at, p.updated_at
"#;

/// Base FROM for the public catalog: published products of verified stores.
const PUBLIC_FROM: &str = r#"
    FROM products p
    JOIN stores s ON s.id = p.store_id
    WHERE p.status = 'published' AND s.status = 'verified'
"#;

fn push_product_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(category_id) = filter.category_id {
        builder.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(store_id) = filter.store_id {
        builder.push(" AND p.store_id = ").push_bind(store_id);
    }
    if let Some(search) = &filter.search {
        builder.push(" AND p.name ILIKE ").push_bind(like_pattern(search));
    }
}

#[async_trait]
impl ProductRepo for PostgresPersistence {
    async fn create_within_limit(
        &self,
        product: &NewProduct,
        max: i64,
    ) -> AppResult<ProductInsert> {
        let mut tx = self.pool().begin().await.map_err(AppError::from)?;

        // Serializes concurrent creates for the same store
        sqlx::query("SELECT id FROM stores WHERE id = $1 FOR UPDATE")
            .bind(product.store_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from)?;

        let used: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE store_id = $1")
            .bind(product.store_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from)?;
        if used >= max {
            return Ok(ProductInsert::LimitReached { used });
        }

        let created = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products AS p
                (id, store_id, category_id, name, slug, description, price_cents, stock, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(product.store_id)
        .bind(product.category_id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(ProductInsert::Created(created))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {SELECT_COLS} FROM products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn count_by_store(&self, store_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE store_id = $1")
            .bind(store_id)
            .fetch_one(self.pool())
            .await
            .map_err(AppError::from)
    }

    async fn list_by_store(&self, store_id: Uuid, page: PageRequest) -> AppResult<Page<Product>> {
        let total = self.count_by_store(store_id).await?;
        let items = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {SELECT_COLS} FROM products p
            WHERE p.store_id = $1
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(store_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(Page { items, total })
    }

    async fn list_public(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> AppResult<Page<Product>> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) {PUBLIC_FROM}"));
        push_product_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(AppError::from)?;

        let mut data_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SELECT_COLS} {PUBLIC_FROM}"));
        push_product_filters(&mut data_builder, filter);
        data_builder.push(" ORDER BY p.created_at DESC");
        push_page(&mut data_builder, page);

        let items = data_builder
            .build_query_as::<Product>()
            .fetch_all(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(Page { items, total })
    }

    async fn update(&self, id: Uuid, update: &ProductUpdate) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products AS p SET
                category_id = COALESCE($2, category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price_cents = COALESCE($5, price_cents),
                stock = COALESCE($6, stock),
                status = COALESCE($7, status),
                updated_at = NOW()
            WHERE p.id = $1
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(id)
        .bind(update.category_id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price_cents)
        .bind(update.stock)
        .bind(update.status)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
