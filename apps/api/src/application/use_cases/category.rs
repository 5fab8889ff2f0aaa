use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{category::Category, user::User},
    policy::{self, Capability},
    validators::slugify,
};

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait CategoryRepo: Send + Sync {
    async fn list(&self, active_only: bool) -> AppResult<Vec<Category>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Category>>;
    async fn get_by_slug(&self, slug: &str) -> AppResult<Option<Category>>;
    async fn create(&self, category: &NewCategory) -> AppResult<Category>;
    async fn update(&self, id: Uuid, update: &CategoryUpdate) -> AppResult<Category>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    async fn count_products(&self, id: Uuid) -> AppResult<i64>;
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 2, max = 100, message = "The name must be between 2 and 100 characters."))]
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 2, max = 100, message = "The name must be between 2 and 100 characters."))]
    pub name: Option<String>,
    /// `Some(None)` clears the parent.
    #[serde(default, deserialize_with = "present_or_null")]
    pub parent_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

/// Distinguishes an explicit `null` from a missing field.
fn present_or_null<'de, D>(de: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(de).map(Some)
}

#[derive(Clone)]
pub struct CategoryUseCases {
    repo: Arc<dyn CategoryRepo>,
}

impl CategoryUseCases {
    pub fn new(repo: Arc<dyn CategoryRepo>) -> Self {
        Self { repo }
    }

    pub async fn list_public(&self) -> AppResult<Vec<Category>> {
        self.repo.list(true).await
    }

    #[instrument(skip(self, admin, input), fields(admin_id = %admin.id))]
    pub async fn create(&self, admin: &User, input: CreateCategoryInput) -> AppResult<Category> {
        policy::require(admin, Capability::ManageCategories)?;
        input.validate()?;

        let slug = self.free_slug(&input.name, None).await?;
        if let Some(parent_id) = input.parent_id {
            self.ensure_parent(parent_id, None).await?;
        }

        let category = self
            .repo
            .create(&NewCategory {
                name: input.name.trim().to_string(),
                slug,
                parent_id: input.parent_id,
            })
            .await?;
        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    #[instrument(skip(self, admin, input), fields(admin_id = %admin.id))]
    pub async fn update(
        &self,
        admin: &User,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> AppResult<Category> {
        policy::require(admin, Capability::ManageCategories)?;
        input.validate()?;
        self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;

        let slug = match &input.name {
            Some(name) => Some(self.free_slug(name, Some(id)).await?),
            None => None,
        };
        if let Some(Some(parent_id)) = input.parent_id {
            self.ensure_parent(parent_id, Some(id)).await?;
        }

        self.repo
            .update(
                id,
                &CategoryUpdate {
                    name: input.name.map(|n| n.trim().to_string()),
                    slug,
                    parent_id: input.parent_id,
                    is_active: input.is_active,
                },
            )
            .await
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn delete(&self, admin: &User, id: Uuid) -> AppResult<()> {
        policy::require(admin, Capability::ManageCategories)?;
        self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;

        let products = self.repo.count_products(id).await?;
        if products > 0 {
            return Err(AppError::BusinessRule(format!(
                "Category still has {products} product(s)"
            )));
        }
        self.repo.delete(id).await
    }

    async fn free_slug(&self, name: &str, current: Option<Uuid>) -> AppResult<String> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(AppError::field(
                "name",
                "The name must contain letters or digits.",
            ));
        }
        match self.repo.get_by_slug(&slug).await? {
            Some(existing) if Some(existing.id) != current => Err(AppError::field(
                "name",
                "A category with this name already exists.",
            )),
            _ => Ok(slug),
        }
    }

    async fn ensure_parent(&self, parent_id: Uuid, current: Option<Uuid>) -> AppResult<()> {
        if Some(parent_id) == current {
            return Err(AppError::field(
                "parent_id",
                "A category cannot be its own parent.",
            ));
        }
        if self.repo.get_by_id(parent_id).await?.is_none() {
            return Err(AppError::field(
                "parent_id",
                "The selected parent category is invalid.",
            ));
        }
        Ok(())
    }
}
