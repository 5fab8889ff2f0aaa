use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::category::Category,
    use_cases::category::{CategoryRepo, CategoryUpdate, NewCategory},
};

const SELECT_COLS: &str = "id, name, slug, parent_id, is_active, created_at";

#[async_trait]
impl CategoryRepo for PostgresPersistence {
    async fn list(&self, active_only: bool) -> AppResult<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {SELECT_COLS} FROM categories WHERE (NOT $1 OR is_active) ORDER BY name"
        ))
        .bind(active_only)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {SELECT_COLS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {SELECT_COLS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn create(&self, category: &NewCategory) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (id, name, slug, parent_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.parent_id)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn update(&self, id: Uuid, update: &CategoryUpdate) -> AppResult<Category> {
        // parent_id: outer None keeps the column, Some(None) clears it
        let (set_parent, parent_id) = match update.parent_id {
            Some(parent) => (true, parent),
            None => (false, None),
        };
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                parent_id = CASE WHEN $4 THEN $5 ELSE parent_id END,
                is_active = COALESCE($6, is_active)
            WHERE id = $1
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.slug)
        .bind(set_parent)
        .bind(parent_id)
        .bind(update.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn count_products(&self, id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(AppError::from)
    }
}
