use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        product::{Product, ProductStatus},
        store::Store,
        user::User,
    },
    policy::{self, Capability},
    use_cases::{
        Page, PageRequest,
        category::CategoryRepo,
        promotion::{FeaturedProductRepo, HotDealRepo},
        store::{StoreRepo, owned_store, owned_verified_store},
        subscription::SubscriptionUseCases,
    },
    validators::unique_slug,
};

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub store_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i32,
    pub status: ProductStatus,
}

/// Result of a limit-checked insert.
#[derive(Debug, Clone)]
pub enum ProductInsert {
    Created(Product),
    /// The store already holds `used >= max` products.
    LimitReached { used: i64 },
}

#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i32>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub search: Option<String>,
}

#[async_trait]
pub trait ProductRepo: Send + Sync {
    /// Inserts the product unless the store already holds `max` products.
    /// Count and insert are atomic per store.
    async fn create_within_limit(
        &self,
        product: &NewProduct,
        max: i64,
    ) -> AppResult<ProductInsert>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;
    async fn count_by_store(&self, store_id: Uuid) -> AppResult<i64>;
    async fn list_by_store(&self, store_id: Uuid, page: PageRequest) -> AppResult<Page<Product>>;
    /// Published products of verified stores.
    async fn list_public(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> AppResult<Page<Product>>;
    async fn update(&self, id: Uuid, update: &ProductUpdate) -> AppResult<Product>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 2, max = 200, message = "The name must be between 2 and 200 characters."))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "The price must be greater than 0."))]
    pub price_cents: i64,
    #[validate(range(min = 0, message = "The stock cannot be negative."))]
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 2, max = 200, message = "The name must be between 2 and 200 characters."))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "The price must be greater than 0."))]
    pub price_cents: Option<i64>,
    #[validate(range(min = 0, message = "The stock cannot be negative."))]
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
}

#[derive(Clone)]
pub struct ProductUseCases {
    repo: Arc<dyn ProductRepo>,
    stores: Arc<dyn StoreRepo>,
    categories: Arc<dyn CategoryRepo>,
    subscriptions: Arc<SubscriptionUseCases>,
    featured: Arc<dyn FeaturedProductRepo>,
    hot_deals: Arc<dyn HotDealRepo>,
}

impl ProductUseCases {
    pub fn new(
        repo: Arc<dyn ProductRepo>,
        stores: Arc<dyn StoreRepo>,
        categories: Arc<dyn CategoryRepo>,
        subscriptions: Arc<SubscriptionUseCases>,
        featured: Arc<dyn FeaturedProductRepo>,
        hot_deals: Arc<dyn HotDealRepo>,
    ) -> Self {
        Self {
            repo,
            stores,
            categories,
            subscriptions,
            featured,
            hot_deals,
        }
    }

    /// Fails with `LimitReached` without writing when the store's effective
    /// plan has no product capacity left.
    #[instrument(skip(self, owner, input), fields(owner_id = %owner.id))]
    pub async fn create(&self, owner: &User, input: CreateProductInput) -> AppResult<Product> {
        policy::require(owner, Capability::ManageOwnProducts)?;
        input.validate()?;
        let store = owned_verified_store(self.stores.as_ref(), owner).await?;

        if let Some(category_id) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        let plan = self.subscriptions.effective_plan(store.id).await?;
        let max = i64::from(plan.product_limit);
        let new = NewProduct {
            store_id: store.id,
            category_id: input.category_id,
            slug: unique_slug(&input.name),
            name: input.name.trim().to_string(),
            description: input.description,
            price_cents: input.price_cents,
            stock: input.stock,
            status: input.status.unwrap_or(ProductStatus::Draft),
        };

        let product = match self.repo.create_within_limit(&new, max).await? {
            ProductInsert::Created(product) => product,
            ProductInsert::LimitReached { used } => {
                tracing::debug!(store_id = %store.id, used, max, plan = %plan.slug, "Product limit reached");
                return Err(AppError::LimitReached {
                    resource: "product",
                    used,
                    max,
                });
            }
        };

        tracing::info!(product_id = %product.id, store_id = %store.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, owner, input), fields(owner_id = %owner.id))]
    pub async fn update(
        &self,
        owner: &User,
        id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        policy::require(owner, Capability::ManageOwnProducts)?;
        input.validate()?;
        let store = owned_store(self.stores.as_ref(), owner).await?;
        self.own_product(&store, id).await?;

        if let Some(category_id) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        self.repo
            .update(
                id,
                &ProductUpdate {
                    category_id: input.category_id,
                    name: input.name.map(|n| n.trim().to_string()),
                    description: input.description,
                    price_cents: input.price_cents,
                    stock: input.stock,
                    status: input.status,
                },
            )
            .await
    }

    /// Deactivates the product's live placements, then deletes it.
    #[instrument(skip(self, owner), fields(owner_id = %owner.id))]
    pub async fn delete(&self, owner: &User, id: Uuid) -> AppResult<()> {
        policy::require(owner, Capability::ManageOwnProducts)?;
        let store = owned_store(self.stores.as_ref(), owner).await?;
        let product = self.own_product(&store, id).await?;

        let featured = self.featured.deactivate_for_product(product.id).await?;
        let deals = self.hot_deals.deactivate_for_product(product.id).await?;
        self.repo.delete(product.id).await?;

        tracing::info!(
            product_id = %product.id,
            deactivated_featured = featured,
            deactivated_deals = deals,
            "Product deleted"
        );
        Ok(())
    }

    pub async fn list_mine(&self, owner: &User, page: PageRequest) -> AppResult<Page<Product>> {
        policy::require(owner, Capability::ManageOwnProducts)?;
        let store = owned_store(self.stores.as_ref(), owner).await?;
        self.repo.list_by_store(store.id, page).await
    }

    pub async fn list_public(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> AppResult<Page<Product>> {
        self.repo.list_public(&filter, page).await
    }

    pub async fn get_public(&self, id: Uuid) -> AppResult<Product> {
        let product = self
            .repo
            .get_by_id(id)
            .await?
            .filter(Product::is_published)
            .ok_or(AppError::NotFound)?;
        let store = self
            .stores
            .get_by_id(product.store_id)
            .await?
            .filter(Store::is_verified);
        match store {
            Some(_) => Ok(product),
            None => Err(AppError::NotFound),
        }
    }

    async fn own_product(&self, store: &Store, id: Uuid) -> AppResult<Product> {
        self.repo
            .get_by_id(id)
            .await?
            .filter(|p| p.store_id == store.id)
            .ok_or(AppError::NotFound)
    }

    async fn ensure_category(&self, category_id: Uuid) -> AppResult<()> {
        match self.categories.get_by_id(category_id).await? {
            Some(c) if c.is_active => Ok(()),
            _ => Err(AppError::field(
                "category_id",
                "The selected category is invalid.",
            )),
        }
    }
}
