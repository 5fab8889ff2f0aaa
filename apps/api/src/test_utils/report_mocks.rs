//! Report figures computed from the other in-memory repos.

use async_trait::async_trait;
use std::sync::Arc;

use super::{
    InMemoryDocumentRepo, InMemoryFeaturedProductRepo, InMemoryHotDealRepo, InMemoryProductRepo,
    InMemoryStoreRepo, InMemorySubscriptionRepo, InMemoryUserRepo,
};
use crate::{
    app_error::AppResult,
    application::use_cases::report::{
        ProductCounts, PromotionCounts, ReportOverview, ReportPeriod, ReportRepo, StoreCounts,
        SubscriptionCounts, UserCounts,
    },
    domain::entities::{
        document::DocumentStatus,
        product::ProductStatus,
        store::StoreStatus,
        subscription::SubscriptionStatus,
        user::{Role, UserStatus},
    },
};

fn count<T>(items: impl Iterator<Item = T>, pred: impl Fn(&T) -> bool) -> i64 {
    items.filter(|item| pred(item)).count() as i64
}

pub struct InMemoryReportRepo {
    users: Arc<InMemoryUserRepo>,
    stores: Arc<InMemoryStoreRepo>,
    documents: Arc<InMemoryDocumentRepo>,
    products: Arc<InMemoryProductRepo>,
    subscriptions: Arc<InMemorySubscriptionRepo>,
    featured: Arc<InMemoryFeaturedProductRepo>,
    hot_deals: Arc<InMemoryHotDealRepo>,
}

impl InMemoryReportRepo {
    pub fn new(
        users: Arc<InMemoryUserRepo>,
        stores: Arc<InMemoryStoreRepo>,
        documents: Arc<InMemoryDocumentRepo>,
        products: Arc<InMemoryProductRepo>,
        subscriptions: Arc<InMemorySubscriptionRepo>,
        featured: Arc<InMemoryFeaturedProductRepo>,
        hot_deals: Arc<InMemoryHotDealRepo>,
    ) -> Self {
        Self {
            users,
            stores,
            documents,
            products,
            subscriptions,
            featured,
            hot_deals,
        }
    }
}

#[async_trait]
impl ReportRepo for InMemoryReportRepo {
    async fn overview(&self, period: ReportPeriod) -> AppResult<ReportOverview> {
        let users = self.users.users.lock().unwrap();
        let stores = self.stores.stores.lock().unwrap();
        let documents = self.documents.documents.lock().unwrap();
        let products = self.products.products.lock().unwrap();
        let subs = self.subscriptions.subscriptions.lock().unwrap();

        let approved: Vec<i64> = subs
            .values()
            .filter(|s| {
                matches!(
                    s.status,
                    SubscriptionStatus::Active | SubscriptionStatus::Expired
                ) && s.reviewed_at.is_some_and(|at| period.contains(at))
            })
            .map(|s| s.amount_cents)
            .collect();

        Ok(ReportOverview {
            users: UserCounts {
                buyers: count(users.values(), |u| u.role == Role::Buyer),
                sellers: count(users.values(), |u| u.role == Role::Seller),
                banned: count(users.values(), |u| u.status == UserStatus::Banned),
            },
            stores: StoreCounts {
                pending: count(stores.values(), |s| s.status == StoreStatus::Pending),
                verified: count(stores.values(), |s| s.status == StoreStatus::Verified),
                rejected: count(stores.values(), |s| s.status == StoreStatus::Rejected),
                suspended: count(stores.values(), |s| s.status == StoreStatus::Suspended),
            },
            pending_documents: count(documents.values(), |d| {
                d.status == DocumentStatus::Pending
            }),
            products: ProductCounts {
                total: products.len() as i64,
                published: count(products.values(), |p| p.status == ProductStatus::Published),
            },
            subscriptions: SubscriptionCounts {
                pending: count(subs.values(), |s| s.status == SubscriptionStatus::Pending),
                active: count(subs.values(), |s| s.status == SubscriptionStatus::Active),
                approved: approved.len() as i64,
                approved_revenue_cents: approved.iter().sum(),
            },
            promotions: PromotionCounts {
                active_featured: count(self.featured.get_all().into_iter(), |r| r.is_active),
                active_hot_deals: count(self.hot_deals.get_all().into_iter(), |r| r.is_active),
            },
        })
    }
}
