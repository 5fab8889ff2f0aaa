//! In-memory placement ledgers and a recording expiry scheduler.
//!
//! `claim` runs the cycle check, the quota count and the insert under a
//! single lock, which is what the Postgres implementation achieves with a row
//! lock. Codes the subscription mock expires are recorded in `closed_codes`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use super::paginate;
use crate::{
    app_error::AppResult,
    application::{
        ports::expiry_scheduler::{ExpiryJob, ExpiryScheduler},
        use_cases::{
            Page, PageRequest,
            promotion::{
                FeaturedListing, FeaturedProductRepo, HotDealListing, HotDealRepo,
                NewFeaturedProduct, NewHotDeal, SlotClaim,
            },
        },
    },
    domain::entities::{featured_product::FeaturedProduct, hot_deal::HotDeal},
};

fn placeholder_name(product_id: Uuid) -> String {
    format!("Product {}", &product_id.simple().to_string()[..8])
}

// ============================================================================
// InMemoryFeaturedProductRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryFeaturedProductRepo {
    pub rows: Mutex<HashMap<Uuid, FeaturedProduct>>,
    closed_codes: Mutex<HashSet<String>>,
}

impl InMemoryFeaturedProductRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, row: FeaturedProduct) {
        self.rows.lock().unwrap().insert(row.id, row);
    }

    pub fn get(&self, id: Uuid) -> Option<FeaturedProduct> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn get_all(&self) -> Vec<FeaturedProduct> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    /// Used by the subscription mock when a cycle ends.
    pub fn close_codes(&self, codes: &[String]) {
        self.closed_codes
            .lock()
            .unwrap()
            .extend(codes.iter().cloned());
    }

    /// Used by the subscription mock when a new cycle is requested.
    pub fn deactivate_other_codes(&self, store_id: Uuid, keep: &str) -> u64 {
        self.set_inactive_where(|r| r.store_id == store_id && r.subscription_code != keep)
    }

    fn set_inactive_where(&self, pred: impl Fn(&FeaturedProduct) -> bool) -> u64 {
        let mut n = 0;
        for row in self.rows.lock().unwrap().values_mut() {
            if row.is_active && pred(row) {
                row.is_active = false;
                n += 1;
            }
        }
        n
    }

    fn sorted(&self, pred: impl Fn(&FeaturedProduct) -> bool) -> Vec<FeaturedProduct> {
        let mut rows: Vec<FeaturedProduct> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| pred(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

#[async_trait]
impl FeaturedProductRepo for InMemoryFeaturedProductRepo {
    async fn claim(
        &self,
        new: &NewFeaturedProduct,
        slot_max: i64,
    ) -> AppResult<SlotClaim<FeaturedProduct>> {
        let mut rows = self.rows.lock().unwrap();
        if self
            .closed_codes
            .lock()
            .unwrap()
            .contains(&new.subscription_code)
        {
            return Ok(SlotClaim::CycleClosed);
        }
        let used = rows
            .values()
            .filter(|r| r.store_id == new.store_id && r.subscription_code == new.subscription_code)
            .count() as i64;
        if used >= slot_max {
            return Ok(SlotClaim::Exhausted { used });
        }
        if rows
            .values()
            .any(|r| r.is_active && r.product_id == new.product_id)
        {
            return Ok(SlotClaim::AlreadyActive);
        }

        let row = FeaturedProduct {
            id: Uuid::new_v4(),
            product_id: new.product_id,
            store_id: new.store_id,
            subscription_code: new.subscription_code.clone(),
            plan_type: new.plan_type,
            start_time: new.start_time,
            finish_time: new.finish_time,
            is_active: true,
            created_at: Utc::now(),
        };
        rows.insert(row.id, row.clone());
        Ok(SlotClaim::Created(row))
    }

    async fn count_for_code(&self, store_id: Uuid, code: &str) -> AppResult<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.store_id == store_id && r.subscription_code == code)
            .count() as i64)
    }

    async fn find_active_for_product(&self, product_id: Uuid) -> AppResult<Option<FeaturedProduct>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|r| r.is_active && r.product_id == product_id)
            .cloned())
    }

    async fn list_for_code(&self, store_id: Uuid, code: &str) -> AppResult<Vec<FeaturedProduct>> {
        Ok(self.sorted(|r| r.store_id == store_id && r.subscription_code == code))
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.set_inactive_where(|r| r.id == id) > 0)
    }

    async fn deactivate_if_due(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        Ok(self.set_inactive_where(|r| r.id == id && r.is_due(now)) > 0)
    }

    async fn deactivate_for_product(&self, product_id: Uuid) -> AppResult<u64> {
        Ok(self.set_inactive_where(|r| r.product_id == product_id))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self.set_inactive_where(|r| r.is_due(now)))
    }

    async fn list_public(&self, page: PageRequest) -> AppResult<Page<FeaturedListing>> {
        let listings = self
            .sorted(|r| r.is_active)
            .into_iter()
            .map(|r| FeaturedListing {
                id: r.id,
                product_id: r.product_id,
                product_name: placeholder_name(r.product_id),
                product_slug: r.product_id.to_string(),
                price_cents: 10_000,
                image_path: None,
                store_name: "Test Store".to_string(),
                store_slug: r.store_id.to_string(),
                finish_time: r.finish_time,
            })
            .collect();
        Ok(paginate(listings, page))
    }
}

// ============================================================================
// InMemoryHotDealRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryHotDealRepo {
    pub rows: Mutex<HashMap<Uuid, HotDeal>>,
    closed_codes: Mutex<HashSet<String>>,
}

impl InMemoryHotDealRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, row: HotDeal) {
        self.rows.lock().unwrap().insert(row.id, row);
    }

    pub fn get(&self, id: Uuid) -> Option<HotDeal> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn get_all(&self) -> Vec<HotDeal> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    /// Moves the deal's end time, e.g. into the past to simulate a missed job.
    pub fn set_window_end(&self, id: Uuid, end: DateTime<Utc>) {
        if let Some(row) = self.rows.lock().unwrap().get_mut(&id) {
            row.deal_end_at = end;
            if row.deal_start_at > end {
                row.deal_start_at = end;
            }
        }
    }

    pub fn close_codes(&self, codes: &[String]) {
        self.closed_codes
            .lock()
            .unwrap()
            .extend(codes.iter().cloned());
    }

    pub fn deactivate_other_codes(&self, store_id: Uuid, keep: &str) -> u64 {
        self.set_inactive_where(|r| r.store_id == store_id && r.subscription_code != keep)
    }

    fn set_inactive_where(&self, pred: impl Fn(&HotDeal) -> bool) -> u64 {
        let mut n = 0;
        for row in self.rows.lock().unwrap().values_mut() {
            if row.is_active && pred(row) {
                row.is_active = false;
                n += 1;
            }
        }
        n
    }

    fn sorted(&self, pred: impl Fn(&HotDeal) -> bool) -> Vec<HotDeal> {
        let mut rows: Vec<HotDeal> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| pred(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

#[async_trait]
impl HotDealRepo for InMemoryHotDealRepo {
    async fn claim(&self, new: &NewHotDeal, slot_max: i64) -> AppResult<SlotClaim<HotDeal>> {
        let mut rows = self.rows.lock().unwrap();
        if self
            .closed_codes
            .lock()
            .unwrap()
            .contains(&new.subscription_code)
        {
            return Ok(SlotClaim::CycleClosed);
        }
        let used = rows
            .values()
            .filter(|r| r.store_id == new.store_id && r.subscription_code == new.subscription_code)
            .count() as i64;
        if used >= slot_max {
            return Ok(SlotClaim::Exhausted { used });
        }
        if rows
            .values()
            .any(|r| r.is_active && r.product_id == new.product_id)
        {
            return Ok(SlotClaim::AlreadyActive);
        }

        let row = HotDeal {
            id: Uuid::new_v4(),
            product_id: new.product_id,
            store_id: new.store_id,
            subscription_code: new.subscription_code.clone(),
            plan_type: new.plan_type,
            original_price_cents: new.original_price_cents,
            deal_price_cents: new.deal_price_cents,
            discount_percentage: new.discount_percentage,
            description: new.description.clone(),
            deal_start_at: new.deal_start_at,
            deal_end_at: new.deal_end_at,
            is_active: true,
            created_at: Utc::now(),
        };
        rows.insert(row.id, row.clone());
        Ok(SlotClaim::Created(row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<HotDeal>> {
        Ok(self.get(id))
    }

    async fn count_for_code(&self, store_id: Uuid, code: &str) -> AppResult<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.store_id == store_id && r.subscription_code == code)
            .count() as i64)
    }

    async fn find_active_for_product(&self, product_id: Uuid) -> AppResult<Option<HotDeal>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|r| r.is_active && r.product_id == product_id)
            .cloned())
    }

    async fn list_for_code(&self, store_id: Uuid, code: &str) -> AppResult<Vec<HotDeal>> {
        Ok(self.sorted(|r| r.store_id == store_id && r.subscription_code == code))
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.set_inactive_where(|r| r.id == id) > 0)
    }

    async fn deactivate_if_due(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        Ok(self.set_inactive_where(|r| r.id == id && r.is_due(now)) > 0)
    }

    async fn deactivate_for_product(&self, product_id: Uuid) -> AppResult<u64> {
        Ok(self.set_inactive_where(|r| r.product_id == product_id))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Ok(self.set_inactive_where(|r| r.is_due(now)))
    }

    async fn list_public(
        &self,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> AppResult<Page<HotDealListing>> {
        let listings = self
            .sorted(|r| r.is_live(now))
            .into_iter()
            .map(|r| HotDealListing {
                id: r.id,
                product_id: r.product_id,
                product_name: placeholder_name(r.product_id),
                product_slug: r.product_id.to_string(),
                image_path: None,
                store_name: "Test Store".to_string(),
                store_slug: r.store_id.to_string(),
                original_price_cents: r.original_price_cents,
                deal_price_cents: r.deal_price_cents,
                discount_percentage: r.discount_percentage,
                description: r.description,
                deal_start_at: r.deal_start_at,
                deal_end_at: r.deal_end_at,
            })
            .collect();
        Ok(paginate(listings, page))
    }
}

// ============================================================================
// RecordingExpiryScheduler
// ============================================================================

/// Captures scheduled jobs instead of spawning timers.
#[derive(Default)]
pub struct RecordingExpiryScheduler {
    jobs: Mutex<Vec<ExpiryJob>>,
}

impl RecordingExpiryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<ExpiryJob> {
        self.jobs.lock().unwrap().clone()
    }
}

impl ExpiryScheduler for RecordingExpiryScheduler {
    fn schedule(&self, job: ExpiryJob) {
        self.jobs.lock().unwrap().push(job);
    }
}
