use std::sync::Arc;

use crate::{
    infra::{config::AppConfig, rate_limit::RateLimiterTrait},
    ports::file_storage::FileStorage,
    use_cases::{
        category::CategoryUseCases, document::DocumentUseCases, product::ProductUseCases,
        promotion::PromotionUseCases, report::ReportUseCases, settings::SettingsUseCases,
        store::StoreUseCases,
        subscription::SubscriptionUseCases, subscription_plan::SubscriptionPlanUseCases,
        user::UserUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub user_use_cases: Arc<UserUseCases>,
    pub store_use_cases: Arc<StoreUseCases>,
    pub document_use_cases: Arc<DocumentUseCases>,
    pub category_use_cases: Arc<CategoryUseCases>,
    pub product_use_cases: Arc<ProductUseCases>,
    pub plan_use_cases: Arc<SubscriptionPlanUseCases>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub promotion_use_cases: Arc<PromotionUseCases>,
    pub settings_use_cases: Arc<SettingsUseCases>,
    pub report_use_cases: Arc<ReportUseCases>,
    pub storage: Arc<dyn FileStorage>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}
