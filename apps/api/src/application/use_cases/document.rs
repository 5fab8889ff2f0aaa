use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        document::{DocumentStatus, DocumentType, StoreDocument},
        user::User,
    },
    policy::{self, Capability},
    ports::file_storage::{FileStorage, Upload},
    use_cases::{
        Page, PageRequest,
        store::{StoreRepo, owned_store},
    },
};

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub store_id: Uuid,
    pub doc_type: DocumentType,
    pub file_path: String,
}

#[async_trait]
pub trait DocumentRepo: Send + Sync {
    async fn create(&self, doc: &NewDocument) -> AppResult<StoreDocument>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<StoreDocument>>;
    async fn list_by_store(&self, store_id: Uuid) -> AppResult<Vec<StoreDocument>>;
    async fn list(
        &self,
        status: Option<DocumentStatus>,
        page: PageRequest,
    ) -> AppResult<Page<StoreDocument>>;
    /// Applies the review only while the document is still pending.
    async fn review(
        &self,
        id: Uuid,
        status: DocumentStatus,
        reviewer_id: Uuid,
        note: Option<&str>,
    ) -> AppResult<Option<StoreDocument>>;
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct DocumentUseCases {
    repo: Arc<dyn DocumentRepo>,
    stores: Arc<dyn StoreRepo>,
    storage: Arc<dyn FileStorage>,
}

impl DocumentUseCases {
    pub fn new(
        repo: Arc<dyn DocumentRepo>,
        stores: Arc<dyn StoreRepo>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            repo,
            stores,
            storage,
        }
    }

    #[instrument(skip(self, owner, upload), fields(owner_id = %owner.id))]
    pub async fn upload(
        &self,
        owner: &User,
        doc_type: &str,
        upload: Upload,
    ) -> AppResult<StoreDocument> {
        policy::require(owner, Capability::ManageOwnStore)?;
        let doc_type = doc_type
            .parse::<DocumentType>()
            .map_err(|_| AppError::field("doc_type", "The selected doc type is invalid."))?;
        upload.ensure_document("file")?;
        let store = owned_store(self.stores.as_ref(), owner).await?;

        let file_path = self.storage.put("documents", &upload).await?;
        let doc = self
            .repo
            .create(&NewDocument {
                store_id: store.id,
                doc_type,
                file_path,
            })
            .await?;

        tracing::info!(store_id = %store.id, document_id = %doc.id, "Store document uploaded");
        Ok(doc)
    }

    pub async fn my_documents(&self, owner: &User) -> AppResult<Vec<StoreDocument>> {
        policy::require(owner, Capability::ManageOwnStore)?;
        let store = owned_store(self.stores.as_ref(), owner).await?;
        self.repo.list_by_store(store.id).await
    }

    pub async fn list(
        &self,
        admin: &User,
        status: Option<DocumentStatus>,
        page: PageRequest,
    ) -> AppResult<Page<StoreDocument>> {
        policy::require(admin, Capability::ReviewDocuments)?;
        self.repo.list(status, page).await
    }

    pub async fn approve(
        &self,
        admin: &User,
        id: Uuid,
        input: ReviewInput,
    ) -> AppResult<StoreDocument> {
        self.review(admin, id, DocumentStatus::Approved, input).await
    }

    pub async fn reject(
        &self,
        admin: &User,
        id: Uuid,
        input: ReviewInput,
    ) -> AppResult<StoreDocument> {
        if input.note.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(AppError::field(
                "note",
                "A note is required when rejecting a document.",
            ));
        }
        self.review(admin, id, DocumentStatus::Rejected, input).await
    }

    #[instrument(skip(self, admin, input), fields(admin_id = %admin.id))]
    async fn review(
        &self,
        admin: &User,
        id: Uuid,
        status: DocumentStatus,
        input: ReviewInput,
    ) -> AppResult<StoreDocument> {
        policy::require(admin, Capability::ReviewDocuments)?;
        input.validate()?;

        let doc = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        if doc.status != DocumentStatus::Pending {
            return Err(AppError::BusinessRule(
                "Only pending documents can be reviewed".into(),
            ));
        }

        let reviewed = self
            .repo
            .review(id, status, admin.id, input.note.as_deref())
            .await?
            .ok_or_else(|| AppError::BusinessRule("Only pending documents can be reviewed".into()))?;

        tracing::info!(document_id = %id, status = ?status, "Store document reviewed");
        Ok(reviewed)
    }
}
