//! Featured products and hot deals.
//!
//! Every placement is charged against the slot quota of the store's current
//! purchase cycle (its active `subscription_code`). Slots are never handed
//! back: ended, unfeatured and expired rows still count. Placements are
//! deactivated by a scheduled job at their end time, by the sweep that runs
//! before every status read, or by the periodic sweep loop, whichever comes
//! first.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marketplace_types::QuotaUsage;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::{AppError, AppResult, FieldErrors},
    domain::entities::{
        featured_product::FeaturedProduct,
        hot_deal::{HotDeal, discount_percentage},
        product::Product,
        promotion::PromotionKind,
        store::Store,
        subscription_plan::PlanTier,
        user::User,
    },
    policy::{self, Capability},
    ports::expiry_scheduler::{ExpiryJob, ExpiryScheduler},
    use_cases::{
        Page, PageRequest,
        product::ProductRepo,
        store::{StoreRepo, owned_verified_store},
        subscription::{ActivePlan, SubscriptionUseCases},
    },
};

/// Result of a quota-checked insert.
#[derive(Debug, Clone)]
pub enum SlotClaim<T> {
    Created(T),
    /// The code already holds `used >= max` rows.
    Exhausted { used: i64 },
    /// The product already has an active placement of this kind.
    AlreadyActive,
    /// The code is no longer the store's active subscription.
    CycleClosed,
}

#[derive(Debug, Clone)]
pub struct NewFeaturedProduct {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub subscription_code: String,
    pub plan_type: PlanTier,
    pub start_time: DateTime<Utc>,
    pub finish_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHotDeal {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub subscription_code: String,
    pub plan_type: PlanTier,
    pub original_price_cents: i64,
    pub deal_price_cents: i64,
    pub discount_percentage: f64,
    pub description: Option<String>,
    pub deal_start_at: DateTime<Utc>,
    pub deal_end_at: DateTime<Utc>,
}

/// Public row for the featured carousel.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeaturedListing {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub price_cents: i64,
    pub image_path: Option<String>,
    pub store_name: String,
    pub store_slug: String,
    pub finish_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HotDealListing {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub image_path: Option<String>,
    pub store_name: String,
    pub store_slug: String,
    pub original_price_cents: i64,
    pub deal_price_cents: i64,
    pub discount_percentage: f64,
    pub description: Option<String>,
    pub deal_start_at: DateTime<Utc>,
    pub deal_end_at: DateTime<Utc>,
}

#[async_trait]
pub trait FeaturedProductRepo: Send + Sync {
    /// Inserts the placement unless the code is no longer active, its quota
    /// is used up or the product is already featured. Check and insert are
    /// atomic.
    async fn claim(
        &self,
        new: &NewFeaturedProduct,
        slot_max: i64,
    ) -> AppResult<SlotClaim<FeaturedProduct>>;
    async fn count_for_code(&self, store_id: Uuid, code: &str) -> AppResult<i64>;
    async fn find_active_for_product(&self, product_id: Uuid) -> AppResult<Option<FeaturedProduct>>;
    async fn list_for_code(&self, store_id: Uuid, code: &str) -> AppResult<Vec<FeaturedProduct>>;
    async fn deactivate(&self, id: Uuid) -> AppResult<bool>;
    /// Deactivates the row only if it is still active and `finish_time <= now`.
    async fn deactivate_if_due(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;
    async fn deactivate_for_product(&self, product_id: Uuid) -> AppResult<u64>;
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
    async fn list_public(&self, page: PageRequest) -> AppResult<Page<FeaturedListing>>;
}

#[async_trait]
pub trait HotDealRepo: Send + Sync {
    async fn claim(&self, new: &NewHotDeal, slot_max: i64) -> AppResult<SlotClaim<HotDeal>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<HotDeal>>;
    async fn count_for_code(&self, store_id: Uuid, code: &str) -> AppResult<i64>;
    async fn find_active_for_product(&self, product_id: Uuid) -> AppResult<Option<HotDeal>>;
    async fn list_for_code(&self, store_id: Uuid, code: &str) -> AppResult<Vec<HotDeal>>;
    async fn deactivate(&self, id: Uuid) -> AppResult<bool>;
    /// Deactivates the row only if it is still active and `deal_end_at <= now`.
    async fn deactivate_if_due(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;
    async fn deactivate_for_product(&self, product_id: Uuid) -> AppResult<u64>;
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
    /// Active deals whose window has opened.
    async fn list_public(
        &self,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> AppResult<Page<HotDealListing>>;
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateHotDealInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "The deal price must be greater than 0."))]
    pub deal_price_cents: i64,
    /// Defaults to now.
    pub deal_start_at: Option<DateTime<Utc>>,
    pub deal_end_at: DateTime<Utc>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeaturedView {
    #[serde(flatten)]
    pub placement: FeaturedProduct,
    pub seconds_remaining: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HotDealView {
    #[serde(flatten)]
    pub deal: HotDeal,
    pub seconds_remaining: i64,
}

/// Dashboard view of the store's current purchase cycle.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionOverview {
    pub plan: PlanTier,
    pub subscription_code: Option<String>,
    pub featured_quota: QuotaUsage,
    pub hot_deal_quota: QuotaUsage,
    pub featured_products: Vec<FeaturedView>,
    pub hot_deals: Vec<HotDealView>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub featured: u64,
    pub hot_deals: u64,
}

impl SweepReport {
    pub fn total(&self) -> u64 {
        self.featured + self.hot_deals
    }
}

#[derive(Clone)]
pub struct PromotionUseCases {
    featured: Arc<dyn FeaturedProductRepo>,
    hot_deals: Arc<dyn HotDealRepo>,
    products: Arc<dyn ProductRepo>,
    stores: Arc<dyn StoreRepo>,
    subscriptions: Arc<SubscriptionUseCases>,
    scheduler: Arc<dyn ExpiryScheduler>,
}

impl PromotionUseCases {
    pub fn new(
        featured: Arc<dyn FeaturedProductRepo>,
        hot_deals: Arc<dyn HotDealRepo>,
        products: Arc<dyn ProductRepo>,
        stores: Arc<dyn StoreRepo>,
        subscriptions: Arc<SubscriptionUseCases>,
        scheduler: Arc<dyn ExpiryScheduler>,
    ) -> Self {
        Self {
            featured,
            hot_deals,
            products,
            stores,
            subscriptions,
            scheduler,
        }
    }

    #[instrument(skip(self, owner), fields(owner_id = %owner.id))]
    pub async fn feature_product(
        &self,
        owner: &User,
        product_id: Uuid,
    ) -> AppResult<FeaturedProduct> {
        policy::require(owner, Capability::ManagePromotions)?;
        let store = owned_verified_store(self.stores.as_ref(), owner).await?;
        let product = self.own_product(&store, product_id).await?;
        if !product.is_published() {
            return Err(AppError::BusinessRule(
                "Only published products can be featured".into(),
            ));
        }

        let ActivePlan { subscription, plan } = self.require_active_plan(store.id).await?;
        if self
            .featured
            .find_active_for_product(product.id)
            .await?
            .is_some()
        {
            return Err(already_active(PromotionKind::Featured));
        }

        let now = Utc::now();
        let new = NewFeaturedProduct {
            product_id: product.id,
            store_id: store.id,
            subscription_code: subscription.subscription_code.clone(),
            plan_type: plan.slug,
            start_time: now,
            finish_time: now + plan.featured_duration(),
        };
        let max = i64::from(plan.featured_slot_max);

        let placement = match self.featured.claim(&new, max).await? {
            SlotClaim::Created(placement) => placement,
            SlotClaim::Exhausted { used } => {
                return Err(AppError::QuotaExceeded {
                    kind: PromotionKind::Featured,
                    used,
                    max,
                });
            }
            SlotClaim::AlreadyActive => return Err(already_active(PromotionKind::Featured)),
            SlotClaim::CycleClosed => return Err(cycle_closed()),
        };

        self.scheduler.schedule(ExpiryJob {
            kind: PromotionKind::Featured,
            id: placement.id,
            due_at: placement.finish_time,
        });
        tracing::info!(
            featured_id = %placement.id,
            product_id = %product.id,
            code = %placement.subscription_code,
            finish_time = %placement.finish_time,
            "Product featured"
        );
        Ok(placement)
    }

    /// Ends the active featured placement early. The slot stays used.
    #[instrument(skip(self, owner), fields(owner_id = %owner.id))]
    pub async fn unfeature_product(&self, owner: &User, product_id: Uuid) -> AppResult<()> {
        policy::require(owner, Capability::ManagePromotions)?;
        let store = owned_verified_store(self.stores.as_ref(), owner).await?;
        let product = self.own_product(&store, product_id).await?;

        let placement = self
            .featured
            .find_active_for_product(product.id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.featured.deactivate(placement.id).await?;

        tracing::info!(featured_id = %placement.id, product_id = %product.id, "Product unfeatured");
        Ok(())
    }

    #[instrument(skip(self, owner, input), fields(owner_id = %owner.id, product_id = %input.product_id))]
    pub async fn create_hot_deal(
        &self,
        owner: &User,
        input: CreateHotDealInput,
    ) -> AppResult<HotDeal> {
        policy::require(owner, Capability::ManagePromotions)?;
        input.validate()?;
        let store = owned_verified_store(self.stores.as_ref(), owner).await?;
        let product = self
            .own_product(&store, input.product_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound => {
                    AppError::field("product_id", "The selected product is invalid.")
                }
                other => other,
            })?;

        let now = Utc::now();
        let deal_start_at = input.deal_start_at.unwrap_or(now);
        check_deal_window(&product, &input, deal_start_at, now)?;

        let ActivePlan { subscription, plan } = self.require_active_plan(store.id).await?;
        if self
            .hot_deals
            .find_active_for_product(product.id)
            .await?
            .is_some()
        {
            return Err(already_active(PromotionKind::HotDeal));
        }

        let new = NewHotDeal {
            product_id: product.id,
            store_id: store.id,
            subscription_code: subscription.subscription_code.clone(),
            plan_type: plan.slug,
            original_price_cents: product.price_cents,
            deal_price_cents: input.deal_price_cents,
            discount_percentage: discount_percentage(product.price_cents, input.deal_price_cents),
            description: input.description,
            deal_start_at,
            deal_end_at: input.deal_end_at,
        };
        let max = i64::from(plan.hot_deal_max);

        let deal = match self.hot_deals.claim(&new, max).await? {
            SlotClaim::Created(deal) => deal,
            SlotClaim::Exhausted { used } => {
                return Err(AppError::QuotaExceeded {
                    kind: PromotionKind::HotDeal,
                    used,
                    max,
                });
            }
            SlotClaim::AlreadyActive => return Err(already_active(PromotionKind::HotDeal)),
            SlotClaim::CycleClosed => return Err(cycle_closed()),
        };

        self.scheduler.schedule(ExpiryJob {
            kind: PromotionKind::HotDeal,
            id: deal.id,
            due_at: deal.deal_end_at,
        });
        tracing::info!(
            hot_deal_id = %deal.id,
            discount = deal.discount_percentage,
            deal_end_at = %deal.deal_end_at,
            "Hot deal created"
        );
        Ok(deal)
    }

    /// Ends a hot deal early. The slot stays used.
    #[instrument(skip(self, owner), fields(owner_id = %owner.id))]
    pub async fn end_hot_deal(&self, owner: &User, id: Uuid) -> AppResult<()> {
        policy::require(owner, Capability::ManagePromotions)?;
        let store = owned_verified_store(self.stores.as_ref(), owner).await?;

        let deal = self
            .hot_deals
            .get_by_id(id)
            .await?
            .filter(|d| d.store_id == store.id)
            .ok_or(AppError::NotFound)?;
        if !deal.is_active {
            return Err(AppError::BusinessRule("Hot deal has already ended".into()));
        }

        self.hot_deals.deactivate(deal.id).await?;
        tracing::info!(hot_deal_id = %deal.id, "Hot deal ended");
        Ok(())
    }

    /// Sweep, then report placements and quota usage under the current code.
    #[instrument(skip(self, owner), fields(owner_id = %owner.id))]
    pub async fn featured_and_deals(&self, owner: &User) -> AppResult<PromotionOverview> {
        policy::require(owner, Capability::ManagePromotions)?;
        let now = Utc::now();
        self.sweep_expired(now).await?;

        let store = owned_verified_store(self.stores.as_ref(), owner).await?;
        let Some(ActivePlan { subscription, plan }) =
            self.subscriptions.active_plan(store.id).await?
        else {
            let basic = self.subscriptions.basic_plan().await?;
            return Ok(PromotionOverview {
                plan: PlanTier::Basic,
                subscription_code: None,
                featured_quota: QuotaUsage::new(0, i64::from(basic.featured_slot_max)),
                hot_deal_quota: QuotaUsage::new(0, i64::from(basic.hot_deal_max)),
                featured_products: vec![],
                hot_deals: vec![],
            });
        };

        let code = subscription.subscription_code.as_str();
        let featured = self.featured.list_for_code(store.id, code).await?;
        let deals = self.hot_deals.list_for_code(store.id, code).await?;

        Ok(PromotionOverview {
            plan: plan.slug,
            subscription_code: Some(subscription.subscription_code.clone()),
            featured_quota: QuotaUsage::new(
                self.featured.count_for_code(store.id, code).await?,
                i64::from(plan.featured_slot_max),
            ),
            hot_deal_quota: QuotaUsage::new(
                self.hot_deals.count_for_code(store.id, code).await?,
                i64::from(plan.hot_deal_max),
            ),
            featured_products: featured
                .into_iter()
                .map(|placement| FeaturedView {
                    seconds_remaining: placement.seconds_remaining(now),
                    placement,
                })
                .collect(),
            hot_deals: deals
                .into_iter()
                .map(|deal| HotDealView {
                    seconds_remaining: deal.seconds_remaining(now),
                    deal,
                })
                .collect(),
        })
    }

    pub async fn public_featured(&self, page: PageRequest) -> AppResult<Page<FeaturedListing>> {
        self.sweep_expired(Utc::now()).await?;
        self.featured.list_public(page).await
    }

    pub async fn public_hot_deals(&self, page: PageRequest) -> AppResult<Page<HotDealListing>> {
        let now = Utc::now();
        self.sweep_expired(now).await?;
        self.hot_deals.list_public(now, page).await
    }

    /// Deactivates every placement whose end time has passed.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let report = SweepReport {
            featured: self.featured.sweep_expired(now).await?,
            hot_deals: self.hot_deals.sweep_expired(now).await?,
        };
        if report.total() > 0 {
            tracing::debug!(
                featured = report.featured,
                hot_deals = report.hot_deals,
                "Swept expired placements"
            );
        }
        Ok(report)
    }

    async fn own_product(&self, store: &Store, product_id: Uuid) -> AppResult<Product> {
        self.products
            .get_by_id(product_id)
            .await?
            .filter(|p| p.store_id == store.id)
            .ok_or(AppError::NotFound)
    }

    async fn require_active_plan(&self, store_id: Uuid) -> AppResult<ActivePlan> {
        self.subscriptions
            .active_plan(store_id)
            .await?
            .ok_or_else(|| AppError::BusinessRule("An active subscription is required".into()))
    }
}

fn already_active(kind: PromotionKind) -> AppError {
    match kind {
        PromotionKind::Featured => AppError::BusinessRule("Product is already featured".into()),
        PromotionKind::HotDeal => {
            AppError::BusinessRule("Product already has an active hot deal".into())
        }
    }
}

fn cycle_closed() -> AppError {
    AppError::BusinessRule("Your subscription changed, please try again".into())
}

fn check_deal_window(
    product: &Product,
    input: &CreateHotDealInput,
    deal_start_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    let mut push = |field: &str, msg: &str| {
        errors
            .entry(field.to_string())
            .or_default()
            .push(msg.to_string());
    };

    if input.deal_price_cents >= product.price_cents {
        push(
            "deal_price_cents",
            "The deal price must be lower than the product price.",
        );
    }
    if input.deal_end_at <= deal_start_at {
        push("deal_end_at", "The deal end must be after the deal start.");
    }
    if input.deal_end_at <= now {
        push("deal_end_at", "The deal end must be in the future.");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}
