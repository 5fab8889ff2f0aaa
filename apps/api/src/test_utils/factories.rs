//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    category::Category,
    document::{DocumentStatus, DocumentType, StoreDocument},
    featured_product::FeaturedProduct,
    hot_deal::HotDeal,
    product::{Product, ProductStatus},
    store::{Store, StoreStatus},
    subscription::{Subscription, SubscriptionStatus, generate_subscription_code},
    subscription_plan::PlanTier,
    user::{Role, User, UserStatus},
};

/// A fixed timestamp for deterministic tests.
pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Create a test user (buyer, active) with sensible defaults.
pub fn create_test_user(overrides: impl FnOnce(&mut User)) -> User {
    let id = Uuid::new_v4();
    let mut user = User {
        id,
        name: "Test User".to_string(),
        email: format!("user-{}@example.com", &id.simple().to_string()[..8]),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        role: Role::Buyer,
        status: UserStatus::Active,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut user);
    user
}

/// Create a verified store on the basic plan.
pub fn create_test_store(owner_id: Uuid, overrides: impl FnOnce(&mut Store)) -> Store {
    let id = Uuid::new_v4();
    let mut store = Store {
        id,
        owner_id,
        name: "Test Store".to_string(),
        slug: format!("test-store-{}", &id.simple().to_string()[..6]),
        description: Some("A store used in tests".to_string()),
        phone: None,
        address: None,
        logo_path: None,
        status: StoreStatus::Verified,
        current_plan: PlanTier::Basic,
        rejection_reason: None,
        verified_at: Some(test_datetime()),
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut store);
    store
}

pub fn create_test_document(
    store_id: Uuid,
    overrides: impl FnOnce(&mut StoreDocument),
) -> StoreDocument {
    let mut doc = StoreDocument {
        id: Uuid::new_v4(),
        store_id,
        doc_type: DocumentType::BusinessLicense,
        file_path: "documents/license.pdf".to_string(),
        status: DocumentStatus::Pending,
        review_note: None,
        reviewed_by: None,
        reviewed_at: None,
        created_at: test_datetime(),
    };
    overrides(&mut doc);
    doc
}

pub fn create_test_category(overrides: impl FnOnce(&mut Category)) -> Category {
    let id = Uuid::new_v4();
    let mut category = Category {
        id,
        name: "Electronics".to_string(),
        slug: format!("electronics-{}", &id.simple().to_string()[..6]),
        parent_id: None,
        is_active: true,
        created_at: test_datetime(),
    };
    overrides(&mut category);
    category
}

/// Create a draft product priced at 100.00.
pub fn create_test_product(store_id: Uuid, overrides: impl FnOnce(&mut Product)) -> Product {
    let id = Uuid::new_v4();
    let mut product = Product {
        id,
        store_id,
        category_id: None,
        name: "Test Product".to_string(),
        slug: format!("test-product-{}", &id.simple().to_string()[..6]),
        description: None,
        price_cents: 10_000,
        stock: 10,
        status: ProductStatus::Draft,
        image_path: None,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut product);
    product
}

/// Create a pending subscription for `plan_id`. Set `status` to `Active`
/// for a running cycle; its period ends 30 days from now.
pub fn create_test_subscription(
    store_id: Uuid,
    plan_id: Uuid,
    overrides: impl FnOnce(&mut Subscription),
) -> Subscription {
    let now = Utc::now();
    let mut sub = Subscription {
        id: Uuid::new_v4(),
        store_id,
        plan_id,
        subscription_code: generate_subscription_code(now),
        status: SubscriptionStatus::Pending,
        starts_at: Some(now - Duration::days(1)),
        ends_at: Some(now + Duration::days(30)),
        payment_receipt_path: Some("receipts/test.pdf".to_string()),
        amount_cents: 9_900,
        reviewed_by: None,
        reviewed_at: None,
        rejection_reason: None,
        created_at: now,
        updated_at: now,
    };
    overrides(&mut sub);
    sub
}

/// Create an active featured placement running for three more days.
pub fn create_test_featured(
    store_id: Uuid,
    product_id: Uuid,
    subscription_code: &str,
    overrides: impl FnOnce(&mut FeaturedProduct),
) -> FeaturedProduct {
    let now = Utc::now();
    let mut featured = FeaturedProduct {
        id: Uuid::new_v4(),
        product_id,
        store_id,
        subscription_code: subscription_code.to_string(),
        plan_type: PlanTier::Silver,
        start_time: now,
        finish_time: now + Duration::days(3),
        is_active: true,
        created_at: now,
    };
    overrides(&mut featured);
    featured
}

pub fn create_test_hot_deal(
    store_id: Uuid,
    product_id: Uuid,
    subscription_code: &str,
    overrides: impl FnOnce(&mut HotDeal),
) -> HotDeal {
    let now = Utc::now();
    let mut deal = HotDeal {
        id: Uuid::new_v4(),
        product_id,
        store_id,
        subscription_code: subscription_code.to_string(),
        plan_type: PlanTier::Silver,
        original_price_cents: 10_000,
        deal_price_cents: 8_000,
        discount_percentage: 20.0,
        description: None,
        deal_start_at: now,
        deal_end_at: now + Duration::days(1),
        is_active: true,
        created_at: now,
    };
    overrides(&mut deal);
    deal
}
