use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        subscription::{Subscription, SubscriptionStatus, generate_subscription_code, period_end},
        subscription_plan::{PlanTier, SubscriptionPlan},
        user::User,
    },
    policy::{self, Capability},
    ports::file_storage::{FileStorage, Upload},
    use_cases::{
        Page, PageRequest,
        store::{StoreRepo, owned_store},
        subscription_plan::SubscriptionPlanRepo,
    },
};

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub store_id: Uuid,
    pub plan_id: Uuid,
    pub subscription_code: String,
    pub amount_cents: i64,
    pub payment_receipt_path: String,
}

/// Outcome of replacing a store's subscriptions with a fresh pending one.
#[derive(Debug, Clone)]
pub struct Superseded {
    pub created: Subscription,
    pub expired_codes: Vec<String>,
    pub placements_deactivated: u64,
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    /// Atomically expires every pending/active subscription of the store,
    /// deactivates every active featured product and hot deal of the store
    /// not charged to `new`'s code and inserts `new` as pending.
    async fn supersede_and_create(&self, new: &NewSubscription) -> AppResult<Superseded>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>>;
    async fn find_active(&self, store_id: Uuid) -> AppResult<Option<Subscription>>;
    async fn list_by_store(&self, store_id: Uuid) -> AppResult<Vec<Subscription>>;
    async fn list(
        &self,
        status: Option<SubscriptionStatus>,
        page: PageRequest,
    ) -> AppResult<Page<Subscription>>;
    /// pending -> active. `None` when the row was no longer pending.
    async fn approve(
        &self,
        id: Uuid,
        reviewer_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> AppResult<Option<Subscription>>;
    /// pending -> rejected. `None` when the row was no longer pending.
    async fn reject(
        &self,
        id: Uuid,
        reviewer_id: Uuid,
        reason: &str,
    ) -> AppResult<Option<Subscription>>;
    /// active -> expired; false when the row was not active.
    async fn expire(&self, id: Uuid) -> AppResult<bool>;
    /// Expires every active subscription with `ends_at <= now`, returning them.
    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<Vec<Subscription>>;
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectSubscriptionInput {
    #[validate(length(min = 3, max = 1000, message = "The reason must be at least 3 characters."))]
    pub reason: String,
}

/// An active subscription together with the plan it grants.
#[derive(Debug, Clone)]
pub struct ActivePlan {
    pub subscription: Subscription,
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionOverview {
    pub plan: SubscriptionPlan,
    pub subscription: Option<Subscription>,
    pub pending: Option<Subscription>,
}

#[derive(Clone)]
pub struct SubscriptionUseCases {
    repo: Arc<dyn SubscriptionRepo>,
    plans: Arc<dyn SubscriptionPlanRepo>,
    stores: Arc<dyn StoreRepo>,
    storage: Arc<dyn FileStorage>,
    period_months: u32,
}

impl SubscriptionUseCases {
    pub fn new(
        repo: Arc<dyn SubscriptionRepo>,
        plans: Arc<dyn SubscriptionPlanRepo>,
        stores: Arc<dyn StoreRepo>,
        storage: Arc<dyn FileStorage>,
        period_months: u32,
    ) -> Self {
        Self {
            repo,
            plans,
            stores,
            storage,
            period_months,
        }
    }

    /// Starts a new purchase cycle: the store's previous subscriptions are
    /// superseded and their placements deactivated.
    #[instrument(skip(self, owner, receipt), fields(owner_id = %owner.id))]
    pub async fn request_upgrade(
        &self,
        owner: &User,
        plan_slug: &str,
        receipt: Upload,
    ) -> AppResult<Subscription> {
        policy::require(owner, Capability::PurchaseSubscription)?;

        let tier = plan_slug
            .parse::<PlanTier>()
            .map_err(|_| AppError::field("plan", "The selected plan is invalid."))?;
        if tier.is_free() {
            return Err(AppError::field("plan", "The basic plan cannot be purchased."));
        }
        let plan = self
            .plans
            .get_by_slug(tier)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::field("plan", "The selected plan is not available."))?;
        receipt.ensure_document("receipt")?;

        let store = owned_store(self.stores.as_ref(), owner).await?;
        if !store.is_verified() {
            return Err(AppError::BusinessRule(
                "Your store must be verified before purchasing a plan".into(),
            ));
        }

        let receipt_path = self.storage.put("receipts", &receipt).await?;
        let new = NewSubscription {
            store_id: store.id,
            plan_id: plan.id,
            subscription_code: generate_subscription_code(Utc::now()),
            amount_cents: plan.price_cents,
            payment_receipt_path: receipt_path.clone(),
        };

        let superseded = match self.repo.supersede_and_create(&new).await {
            Ok(s) => s,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&receipt_path).await {
                    tracing::warn!(error = %cleanup, path = %receipt_path, "Failed to remove orphaned receipt");
                }
                return Err(e);
            }
        };

        if !superseded.expired_codes.is_empty() {
            self.stores
                .set_current_plan(store.id, PlanTier::Basic)
                .await?;
        }

        tracing::info!(
            store_id = %store.id,
            plan = %tier,
            code = %superseded.created.subscription_code,
            superseded = superseded.expired_codes.len(),
            placements_deactivated = superseded.placements_deactivated,
            "Subscription upgrade requested"
        );
        Ok(superseded.created)
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn approve(&self, admin: &User, id: Uuid) -> AppResult<Subscription> {
        policy::require(admin, Capability::ReviewSubscriptions)?;
        let sub = self.load_for_transition(id, SubscriptionStatus::Active).await?;
        let plan = self
            .plans
            .get_by_id(sub.plan_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("plan {} missing", sub.plan_id)))?;

        let starts_at = Utc::now();
        let ends_at = period_end(starts_at, self.period_months);
        let approved = self
            .repo
            .approve(id, admin.id, starts_at, ends_at)
            .await?
            .ok_or_else(|| AppError::BusinessRule("Subscription is no longer pending".into()))?;

        self.stores.set_current_plan(sub.store_id, plan.slug).await?;

        tracing::info!(
            subscription_id = %id,
            store_id = %sub.store_id,
            plan = %plan.slug,
            ends_at = %ends_at,
            "Subscription approved"
        );
        Ok(approved)
    }

    #[instrument(skip(self, admin, input), fields(admin_id = %admin.id))]
    pub async fn reject(
        &self,
        admin: &User,
        id: Uuid,
        input: RejectSubscriptionInput,
    ) -> AppResult<Subscription> {
        policy::require(admin, Capability::ReviewSubscriptions)?;
        input.validate()?;
        self.load_for_transition(id, SubscriptionStatus::Rejected)
            .await?;

        let rejected = self
            .repo
            .reject(id, admin.id, input.reason.trim())
            .await?
            .ok_or_else(|| AppError::BusinessRule("Subscription is no longer pending".into()))?;
        tracing::info!(subscription_id = %id, "Subscription rejected");
        Ok(rejected)
    }

    async fn load_for_transition(
        &self,
        id: Uuid,
        next: SubscriptionStatus,
    ) -> AppResult<Subscription> {
        let sub = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        if sub.status.is_terminal() {
            return Err(AppError::BusinessRule(format!(
                "Subscription is {} and can no longer change",
                sub.status
            )));
        }
        if !sub.status.can_transition_to(next) {
            return Err(AppError::BusinessRule(format!(
                "Cannot change subscription status from {} to {}",
                sub.status, next
            )));
        }
        Ok(sub)
    }

    /// The store's active subscription. A subscription whose period has
    /// ended is expired on the spot and the store falls back to basic.
    pub async fn current_subscription(&self, store_id: Uuid) -> AppResult<Option<Subscription>> {
        let Some(sub) = self.repo.find_active(store_id).await? else {
            return Ok(None);
        };
        if !sub.is_lapsed(Utc::now()) {
            return Ok(Some(sub));
        }

        if self.repo.expire(sub.id).await? {
            self.stores
                .set_current_plan(store_id, PlanTier::Basic)
                .await?;
            tracing::info!(store_id = %store_id, code = %sub.subscription_code, "Subscription lapsed");
        }
        Ok(None)
    }

    pub async fn active_plan(&self, store_id: Uuid) -> AppResult<Option<ActivePlan>> {
        let Some(subscription) = self.current_subscription(store_id).await? else {
            return Ok(None);
        };
        let plan = self
            .plans
            .get_by_id(subscription.plan_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("plan {} missing", subscription.plan_id)))?;
        Ok(Some(ActivePlan { subscription, plan }))
    }

    /// Plan governing the store's limits: the active plan, else basic.
    pub async fn effective_plan(&self, store_id: Uuid) -> AppResult<SubscriptionPlan> {
        match self.active_plan(store_id).await? {
            Some(active) => Ok(active.plan),
            None => self.basic_plan().await,
        }
    }

    pub async fn basic_plan(&self) -> AppResult<SubscriptionPlan> {
        Ok(self
            .plans
            .get_by_slug(PlanTier::Basic)
            .await?
            .unwrap_or_else(|| SubscriptionPlan::from_defaults(PlanTier::Basic)))
    }

    pub async fn my_overview(&self, owner: &User) -> AppResult<SubscriptionOverview> {
        policy::require(owner, Capability::PurchaseSubscription)?;
        let store = owned_store(self.stores.as_ref(), owner).await?;

        let (plan, subscription) = match self.active_plan(store.id).await? {
            Some(active) => (active.plan, Some(active.subscription)),
            None => (self.basic_plan().await?, None),
        };
        let pending = self
            .repo
            .list_by_store(store.id)
            .await?
            .into_iter()
            .find(|s| s.status == SubscriptionStatus::Pending);

        Ok(SubscriptionOverview {
            plan,
            subscription,
            pending,
        })
    }

    pub async fn my_history(&self, owner: &User) -> AppResult<Vec<Subscription>> {
        policy::require(owner, Capability::PurchaseSubscription)?;
        let store = owned_store(self.stores.as_ref(), owner).await?;
        self.repo.list_by_store(store.id).await
    }

    pub async fn list(
        &self,
        admin: &User,
        status: Option<SubscriptionStatus>,
        page: PageRequest,
    ) -> AppResult<Page<Subscription>> {
        policy::require(admin, Capability::ReviewSubscriptions)?;
        self.repo.list(status, page).await
    }

    /// Expires every subscription past its period. Used by the sweep loop.
    #[instrument(skip(self))]
    pub async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let lapsed = self.repo.expire_lapsed(now).await?;
        for sub in &lapsed {
            self.stores
                .set_current_plan(sub.store_id, PlanTier::Basic)
                .await?;
        }
        if !lapsed.is_empty() {
            tracing::info!(count = lapsed.len(), "Expired lapsed subscriptions");
        }
        Ok(lapsed.len())
    }
}
