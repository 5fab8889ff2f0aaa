//! In-memory mock implementations for plans and subscriptions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{InMemoryFeaturedProductRepo, InMemoryHotDealRepo, paginate};
use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        Page, PageRequest,
        subscription::{NewSubscription, Superseded, SubscriptionRepo},
        subscription_plan::{PlanUpdate, SubscriptionPlanRepo},
    },
    domain::entities::{
        subscription::{Subscription, SubscriptionStatus},
        subscription_plan::{PlanTier, SubscriptionPlan},
    },
};

// ============================================================================
// InMemorySubscriptionPlanRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionPlanRepo {
    pub plans: Mutex<HashMap<Uuid, SubscriptionPlan>>,
}

impl InMemorySubscriptionPlanRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four default tiers.
    pub fn seeded() -> Self {
        let plans = PlanTier::ALL
            .iter()
            .map(|tier| SubscriptionPlan::from_defaults(*tier))
            .map(|p| (p.id, p))
            .collect();
        Self {
            plans: Mutex::new(plans),
        }
    }

    pub fn plan_id(&self, tier: PlanTier) -> Uuid {
        self.plans
            .lock()
            .unwrap()
            .values()
            .find(|p| p.slug == tier)
            .map(|p| p.id)
            .unwrap()
    }
}

#[async_trait]
impl SubscriptionPlanRepo for InMemorySubscriptionPlanRepo {
    async fn list(&self) -> AppResult<Vec<SubscriptionPlan>> {
        let mut plans: Vec<SubscriptionPlan> =
            self.plans.lock().unwrap().values().cloned().collect();
        plans.sort_by_key(|p| p.price_cents);
        Ok(plans)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionPlan>> {
        Ok(self.plans.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: PlanTier) -> AppResult<Option<SubscriptionPlan>> {
        Ok(self
            .plans
            .lock()
            .unwrap()
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn update(&self, slug: PlanTier, update: &PlanUpdate) -> AppResult<SubscriptionPlan> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans
            .values_mut()
            .find(|p| p.slug == slug)
            .ok_or(AppError::NotFound)?;
        if let Some(name) = &update.name {
            plan.name = name.clone();
        }
        if let Some(v) = update.price_cents {
            plan.price_cents = v;
        }
        if let Some(v) = update.product_limit {
            plan.product_limit = v;
        }
        if let Some(v) = update.featured_slot_max {
            plan.featured_slot_max = v;
        }
        if let Some(v) = update.hot_deal_max {
            plan.hot_deal_max = v;
        }
        if let Some(v) = update.featured_duration_days {
            plan.featured_duration_days = v;
        }
        if let Some(v) = update.is_active {
            plan.is_active = v;
        }
        plan.updated_at = Utc::now();
        Ok(plan.clone())
    }
}

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

/// Subscription ledger. Holds the placement mocks so superseding a cycle
/// can deactivate its featured products and hot deals.
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<Uuid, Subscription>>,
    featured: Arc<InMemoryFeaturedProductRepo>,
    hot_deals: Arc<InMemoryHotDealRepo>,
}

impl InMemorySubscriptionRepo {
    pub fn new(
        featured: Arc<InMemoryFeaturedProductRepo>,
        hot_deals: Arc<InMemoryHotDealRepo>,
    ) -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
            featured,
            hot_deals,
        }
    }

    pub fn insert(&self, sub: Subscription) {
        self.subscriptions.lock().unwrap().insert(sub.id, sub);
    }

    fn transition(
        &self,
        id: Uuid,
        from: SubscriptionStatus,
        f: impl FnOnce(&mut Subscription),
    ) -> Option<Subscription> {
        let mut subs = self.subscriptions.lock().unwrap();
        let sub = subs.get_mut(&id).filter(|s| s.status == from)?;
        f(sub);
        sub.updated_at = Utc::now();
        Some(sub.clone())
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn supersede_and_create(&self, new: &NewSubscription) -> AppResult<Superseded> {
        let mut subs = self.subscriptions.lock().unwrap();
        let now = Utc::now();

        let mut expired_codes = Vec::new();
        for sub in subs.values_mut() {
            if sub.store_id == new.store_id && sub.status.is_supersedable() {
                sub.status = SubscriptionStatus::Expired;
                sub.updated_at = now;
                expired_codes.push(sub.subscription_code.clone());
            }
        }
        self.featured.close_codes(&expired_codes);
        self.hot_deals.close_codes(&expired_codes);
        let placements_deactivated = self
            .featured
            .deactivate_other_codes(new.store_id, &new.subscription_code)
            + self
                .hot_deals
                .deactivate_other_codes(new.store_id, &new.subscription_code);

        let created = Subscription {
            id: Uuid::new_v4(),
            store_id: new.store_id,
            plan_id: new.plan_id,
            subscription_code: new.subscription_code.clone(),
            status: SubscriptionStatus::Pending,
            starts_at: None,
            ends_at: None,
            payment_receipt_path: Some(new.payment_receipt_path.clone()),
            amount_cents: new.amount_cents,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        subs.insert(created.id, created.clone());

        Ok(Superseded {
            created,
            expired_codes,
            placements_deactivated,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self.subscriptions.lock().unwrap().get(&id).cloned())
    }

    async fn find_active(&self, store_id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.store_id == store_id && s.status == SubscriptionStatus::Active)
            .cloned())
    }

    async fn list_by_store(&self, store_id: Uuid) -> AppResult<Vec<Subscription>> {
        let mut subs: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.store_id == store_id)
            .cloned()
            .collect();
        subs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subs)
    }

    async fn list(
        &self,
        status: Option<SubscriptionStatus>,
        page: PageRequest,
    ) -> AppResult<Page<Subscription>> {
        let mut subs: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| status.is_none_or(|st| s.status == st))
            .cloned()
            .collect();
        subs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(subs, page))
    }

    async fn approve(
        &self,
        id: Uuid,
        reviewer_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> AppResult<Option<Subscription>> {
        Ok(self.transition(id, SubscriptionStatus::Pending, |s| {
            s.status = SubscriptionStatus::Active;
            s.starts_at = Some(starts_at);
            s.ends_at = Some(ends_at);
            s.reviewed_by = Some(reviewer_id);
            s.reviewed_at = Some(Utc::now());
        }))
    }

    async fn reject(
        &self,
        id: Uuid,
        reviewer_id: Uuid,
        reason: &str,
    ) -> AppResult<Option<Subscription>> {
        Ok(self.transition(id, SubscriptionStatus::Pending, |s| {
            s.status = SubscriptionStatus::Rejected;
            s.rejection_reason = Some(reason.to_string());
            s.reviewed_by = Some(reviewer_id);
            s.reviewed_at = Some(Utc::now());
        }))
    }

    async fn expire(&self, id: Uuid) -> AppResult<bool> {
        let expired = self.transition(id, SubscriptionStatus::Active, |s| {
            s.status = SubscriptionStatus::Expired;
        });
        if let Some(sub) = &expired {
            let codes = [sub.subscription_code.clone()];
            self.featured.close_codes(&codes);
            self.hot_deals.close_codes(&codes);
        }
        Ok(expired.is_some())
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<Vec<Subscription>> {
        let mut subs = self.subscriptions.lock().unwrap();
        let mut lapsed = Vec::new();
        for sub in subs.values_mut() {
            if sub.is_lapsed(now) {
                sub.status = SubscriptionStatus::Expired;
                sub.updated_at = now;
                lapsed.push(sub.clone());
            }
        }
        let codes: Vec<String> = lapsed.iter().map(|s| s.subscription_code.clone()).collect();
        self.featured.close_codes(&codes);
        self.hot_deals.close_codes(&codes);
        Ok(lapsed)
    }
}
