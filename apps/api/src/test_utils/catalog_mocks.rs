//! In-memory mock implementations for categories, products and site settings.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use super::paginate;
use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::settings_cache::SettingsMap,
        use_cases::{
            Page, PageRequest,
            category::{CategoryRepo, CategoryUpdate, NewCategory},
            product::{NewProduct, ProductFilter, ProductInsert, ProductRepo, ProductUpdate},
            settings::SiteSettingRepo,
        },
    },
    domain::entities::{category::Category, product::Product, site_setting::SiteSetting},
};

// ============================================================================
// InMemoryCategoryRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryCategoryRepo {
    pub categories: Mutex<HashMap<Uuid, Category>>,
    product_counts: Mutex<HashMap<Uuid, i64>>,
}

impl InMemoryCategoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            categories: Mutex::new(categories.into_iter().map(|c| (c.id, c)).collect()),
            product_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Pretend `count` products reference the category.
    pub fn set_product_count(&self, id: Uuid, count: i64) {
        self.product_counts.lock().unwrap().insert(id, count);
    }
}

#[async_trait]
impl CategoryRepo for InMemoryCategoryRepo {
    async fn list(&self, active_only: bool) -> AppResult<Vec<Category>> {
        let mut list: Vec<Category> = self
            .categories
            .lock()
            .unwrap()
            .values()
            .filter(|c| !active_only || c.is_active)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(self.categories.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn create(&self, new: &NewCategory) -> AppResult<Category> {
        let category = Category {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            slug: new.slug.clone(),
            parent_id: new.parent_id,
            is_active: true,
            created_at: Utc::now(),
        };
        self.categories
            .lock()
            .unwrap()
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, id: Uuid, update: &CategoryUpdate) -> AppResult<Category> {
        let mut categories = self.categories.lock().unwrap();
        let category = categories.get_mut(&id).ok_or(AppError::NotFound)?;
        if let Some(name) = &update.name {
            category.name = name.clone();
        }
        if let Some(slug) = &update.slug {
            category.slug = slug.clone();
        }
        if let Some(parent_id) = update.parent_id {
            category.parent_id = parent_id;
        }
        if let Some(active) = update.is_active {
            category.is_active = active;
        }
        Ok(category.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.categories
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }

    async fn count_products(&self, id: Uuid) -> AppResult<i64> {
        Ok(self
            .product_counts
            .lock()
            .unwrap()
            .get(&id)
            .copied()
            .unwrap_or(0))
    }
}

// ============================================================================
// InMemoryProductRepo
// ============================================================================

/// Product store. `list_public` only filters on product status; store
/// verification is not modelled here.
#[derive(Default)]
pub struct InMemoryProductRepo {
    pub products: Mutex<HashMap<Uuid, Product>>,
}

impl InMemoryProductRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        self.products.lock().unwrap().insert(product.id, product);
    }

    pub fn get_all(&self) -> Vec<Product> {
        self.products.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl ProductRepo for InMemoryProductRepo {
    async fn create_within_limit(&self, new: &NewProduct, max: i64) -> AppResult<ProductInsert> {
        let mut products = self.products.lock().unwrap();
        let used = products
            .values()
            .filter(|p| p.store_id == new.store_id)
            .count() as i64;
        if used >= max {
            return Ok(ProductInsert::LimitReached { used });
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            store_id: new.store_id,
            category_id: new.category_id,
            name: new.name.clone(),
            slug: new.slug.clone(),
            description: new.description.clone(),
            price_cents: new.price_cents,
            stock: new.stock,
            status: new.status,
            image_path: None,
            created_at: now,
            updated_at: now,
        };
        products.insert(product.id, product.clone());
        Ok(ProductInsert::Created(product))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn count_by_store(&self, store_id: Uuid) -> AppResult<i64> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.store_id == store_id)
            .count() as i64)
    }

    async fn list_by_store(&self, store_id: Uuid, page: PageRequest) -> AppResult<Page<Product>> {
        let mut products: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.store_id == store_id)
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(products, page))
    }

    async fn list_public(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> AppResult<Page<Product>> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut products: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.is_published())
            .filter(|p| filter.category_id.is_none_or(|c| p.category_id == Some(c)))
            .filter(|p| filter.store_id.is_none_or(|s| p.store_id == s))
            .filter(|p| {
                search
                    .as_deref()
                    .is_none_or(|q| p.name.to_lowercase().contains(q))
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(products, page))
    }

    async fn update(&self, id: Uuid, update: &ProductUpdate) -> AppResult<Product> {
        let mut products = self.products.lock().unwrap();
        let product = products.get_mut(&id).ok_or(AppError::NotFound)?;
        if update.category_id.is_some() {
            product.category_id = update.category_id;
        }
        if let Some(name) = &update.name {
            product.name = name.clone();
        }
        if update.description.is_some() {
            product.description = update.description.clone();
        }
        if let Some(price) = update.price_cents {
            product.price_cents = price;
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
        }
        if let Some(status) = update.status {
            product.status = status;
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.products
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }
}

// ============================================================================
// InMemorySiteSettingRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySiteSettingRepo {
    settings: Mutex<SettingsMap>,
    reads: AtomicUsize,
}

impl InMemorySiteSettingRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SettingsMap) -> Self {
        Self {
            settings: Mutex::new(settings),
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of `all()` calls, to observe cache hits.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SiteSettingRepo for InMemorySiteSettingRepo {
    async fn all(&self) -> AppResult<Vec<SiteSetting>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        Ok(self
            .settings
            .lock()
            .unwrap()
            .iter()
            .map(|(key, value)| SiteSetting {
                key: key.clone(),
                value: value.clone(),
                updated_at: now,
            })
            .collect())
    }

    async fn upsert_many(&self, settings: &SettingsMap) -> AppResult<()> {
        let mut stored = self.settings.lock().unwrap();
        for (key, value) in settings {
            stored.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}
