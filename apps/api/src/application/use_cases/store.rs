use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        store::{Store, StoreStatus},
        subscription_plan::PlanTier,
        user::User,
    },
    policy::{self, Capability},
    ports::file_storage::{FileStorage, Upload},
    use_cases::{Page, PageRequest},
    validators::slugify,
};

#[derive(Debug, Clone)]
pub struct NewStore {
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreProfileUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    pub status: Option<StoreStatus>,
    pub search: Option<String>,
}

#[async_trait]
pub trait StoreRepo: Send + Sync {
    async fn create(&self, store: &NewStore) -> AppResult<Store>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Store>>;
    async fn get_by_owner(&self, owner_id: Uuid) -> AppResult<Option<Store>>;
    async fn get_by_slug(&self, slug: &str) -> AppResult<Option<Store>>;
    async fn update_profile(&self, id: Uuid, update: &StoreProfileUpdate) -> AppResult<Store>;
    async fn set_logo(&self, id: Uuid, logo_path: &str) -> AppResult<Store>;
    async fn set_status(
        &self,
        id: Uuid,
        status: StoreStatus,
        reason: Option<&str>,
    ) -> AppResult<Store>;
    async fn set_current_plan(&self, id: Uuid, plan: PlanTier) -> AppResult<()>;
    async fn list(&self, filter: &StoreFilter, page: PageRequest) -> AppResult<Page<Store>>;
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStoreInput {
    #[validate(length(min = 3, max = 120, message = "The name must be between 3 and 120 characters."))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStoreInput {
    #[validate(length(min = 3, max = 120, message = "The name must be between 3 and 120 characters."))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReasonInput {
    #[validate(length(min = 3, max = 1000, message = "The reason must be at least 3 characters."))]
    pub reason: String,
}

/// Store owned by `user`, or NotFound.
pub(crate) async fn owned_store(stores: &dyn StoreRepo, user: &User) -> AppResult<Store> {
    stores
        .get_by_owner(user.id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Like [`owned_store`], but the store must also be verified.
pub(crate) async fn owned_verified_store(stores: &dyn StoreRepo, user: &User) -> AppResult<Store> {
    let store = owned_store(stores, user).await?;
    if !store.is_verified() {
        return Err(AppError::BusinessRule(format!(
            "Your store must be verified first (current status: {})",
            store.status
        )));
    }
    Ok(store)
}

#[derive(Clone)]
pub struct StoreUseCases {
    repo: Arc<dyn StoreRepo>,
    storage: Arc<dyn FileStorage>,
}

impl StoreUseCases {
    pub fn new(repo: Arc<dyn StoreRepo>, storage: Arc<dyn FileStorage>) -> Self {
        Self { repo, storage }
    }

    #[instrument(skip(self, owner, input), fields(owner_id = %owner.id))]
    pub async fn create_store(&self, owner: &User, input: CreateStoreInput) -> AppResult<Store> {
        policy::require(owner, Capability::ManageOwnStore)?;
        input.validate()?;

        if self.repo.get_by_owner(owner.id).await?.is_some() {
            return Err(AppError::Conflict("You already have a store".into()));
        }

        let slug = slugify(&input.name);
        if slug.is_empty() {
            return Err(AppError::field(
                "name",
                "The name must contain letters or digits.",
            ));
        }
        if self.repo.get_by_slug(&slug).await?.is_some() {
            return Err(AppError::field("name", "A store with this name already exists."));
        }

        let store = self
            .repo
            .create(&NewStore {
                owner_id: owner.id,
                name: input.name.trim().to_string(),
                slug,
                description: input.description,
                phone: input.phone,
                address: input.address,
            })
            .await?;

        tracing::info!(store_id = %store.id, slug = %store.slug, "Store created");
        Ok(store)
    }

    pub async fn my_store(&self, owner: &User) -> AppResult<Store> {
        policy::require(owner, Capability::ManageOwnStore)?;
        owned_store(self.repo.as_ref(), owner).await
    }

    /// Edits the profile. A rejected store goes back to pending review.
    #[instrument(skip(self, owner, input), fields(owner_id = %owner.id))]
    pub async fn update_my_store(&self, owner: &User, input: UpdateStoreInput) -> AppResult<Store> {
        policy::require(owner, Capability::ManageOwnStore)?;
        input.validate()?;
        let store = owned_store(self.repo.as_ref(), owner).await?;

        let update = StoreProfileUpdate {
            name: input.name.map(|n| n.trim().to_string()),
            description: input.description,
            phone: input.phone,
            address: input.address,
        };
        let updated = self.repo.update_profile(store.id, &update).await?;

        if updated.status == StoreStatus::Rejected {
            tracing::info!(store_id = %store.id, "Rejected store resubmitted for review");
            return self
                .repo
                .set_status(store.id, StoreStatus::Pending, None)
                .await;
        }
        Ok(updated)
    }

    #[instrument(skip(self, owner, upload), fields(owner_id = %owner.id))]
    pub async fn upload_logo(&self, owner: &User, upload: Upload) -> AppResult<Store> {
        policy::require(owner, Capability::ManageOwnStore)?;
        upload.ensure_image("logo")?;
        let store = owned_store(self.repo.as_ref(), owner).await?;

        let path = self.storage.put("logos", &upload).await?;
        let updated = self.repo.set_logo(store.id, &path).await?;

        if let Some(old) = store.logo_path {
            if let Err(e) = self.storage.delete(&old).await {
                tracing::warn!(error = %e, path = %old, "Failed to delete previous logo");
            }
        }
        Ok(updated)
    }

    /// Verified stores only; everything else looks missing to the public.
    pub async fn public_store(&self, slug: &str) -> AppResult<Store> {
        self.repo
            .get_by_slug(slug)
            .await?
            .filter(Store::is_verified)
            .ok_or(AppError::NotFound)
    }

    pub async fn list_stores(
        &self,
        admin: &User,
        filter: StoreFilter,
        page: PageRequest,
    ) -> AppResult<Page<Store>> {
        policy::require(admin, Capability::ReviewStores)?;
        self.repo.list(&filter, page).await
    }

    pub async fn get_store(&self, admin: &User, id: Uuid) -> AppResult<Store> {
        policy::require(admin, Capability::ReviewStores)?;
        self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn verify(&self, admin: &User, id: Uuid) -> AppResult<Store> {
        self.transition(admin, id, StoreStatus::Verified, None).await
    }

    pub async fn reject(&self, admin: &User, id: Uuid, input: ReasonInput) -> AppResult<Store> {
        input.validate()?;
        self.transition(admin, id, StoreStatus::Rejected, Some(&input.reason))
            .await
    }

    pub async fn suspend(&self, admin: &User, id: Uuid, input: ReasonInput) -> AppResult<Store> {
        input.validate()?;
        self.transition(admin, id, StoreStatus::Suspended, Some(&input.reason))
            .await
    }

    pub async fn reinstate(&self, admin: &User, id: Uuid) -> AppResult<Store> {
        self.transition(admin, id, StoreStatus::Verified, None).await
    }

    #[instrument(skip(self, admin, reason), fields(admin_id = %admin.id))]
    async fn transition(
        &self,
        admin: &User,
        id: Uuid,
        next: StoreStatus,
        reason: Option<&str>,
    ) -> AppResult<Store> {
        policy::require(admin, Capability::ReviewStores)?;
        let store = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;

        if !store.status.can_transition_to(next) {
            return Err(AppError::BusinessRule(format!(
                "Cannot change store status from {} to {}",
                store.status, next
            )));
        }

        let updated = self.repo.set_status(id, next, reason).await?;
        tracing::info!(store_id = %id, from = %store.status, to = %next, "Store status changed");
        Ok(updated)
    }
}
