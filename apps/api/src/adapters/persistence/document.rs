use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, push_page},
    app_error::{AppError, AppResult},
    domain::entities::document::{DocumentStatus, StoreDocument},
    use_cases::{
        Page, PageRequest,
        document::{DocumentRepo, NewDocument},
    },
};

const SELECT_COLS: &str = r#"
    id, store_id, doc_type, file_path, status, review_note,
    reviewed_by, reviewed_at, created_at
"#;

#[async_trait]
impl DocumentRepo for PostgresPersistence {
    async fn create(&self, doc: &NewDocument) -> AppResult<StoreDocument> {
        sqlx::query_as::<_, StoreDocument>(&format!(
            r#"
            INSERT INTO store_documents (id, store_id, doc_type, file_path)
            VALUES ($1, $2, $3, $4)
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(doc.store_id)
        .bind(doc.doc_type)
        .bind(&doc.file_path)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<StoreDocument>> {
        sqlx::query_as::<_, StoreDocument>(&format!(
            "SELECT {SELECT_COLS} FROM store_documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list_by_store(&self, store_id: Uuid) -> AppResult<Vec<StoreDocument>> {
        sqlx::query_as::<_, StoreDocument>(&format!(
            "SELECT {SELECT_COLS} FROM store_documents WHERE store_id = $1 ORDER BY created_at DESC"
        ))
        .bind(store_id)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn list(
        &self,
        status: Option<DocumentStatus>,
        page: PageRequest,
    ) -> AppResult<Page<StoreDocument>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM store_documents WHERE ($1::document_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SELECT_COLS} FROM store_documents WHERE TRUE"));
        if let Some(status) = status {
            builder.push(" AND status = ").push_bind(status);
        }
        builder.push(" ORDER BY created_at DESC");
        push_page(&mut builder, page);

        let items = builder
            .build_query_as::<StoreDocument>()
            .fetch_all(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(Page { items, total })
    }

    async fn review(
        &self,
        id: Uuid,
        status: DocumentStatus,
        reviewer_id: Uuid,
        note: Option<&str>,
    ) -> AppResult<Option<StoreDocument>> {
        sqlx::query_as::<_, StoreDocument>(&format!(
            r#"
            UPDATE store_documents
            SET status = $2, reviewed_by = $3, review_note = $4, reviewed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {SELECT_COLS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(reviewer_id)
        .bind(note)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)
    }
}
