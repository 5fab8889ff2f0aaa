use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, storage::LocalDiskStorage},
    infra::{
        InfraError,
        config::AppConfig,
        expiry_scheduler::TokioExpiryScheduler,
        postgres_persistence,
        rate_limit::{RateLimits, RedisRateLimiter},
        redis_manager,
        settings_cache::RedisSettingsCache,
    },
    ports::file_storage::FileStorage,
    use_cases::{
        category::CategoryUseCases,
        document::DocumentUseCases,
        product::ProductUseCases,
        promotion::{FeaturedProductRepo, HotDealRepo, PromotionUseCases},
        report::ReportUseCases,
        settings::SettingsUseCases,
        store::{StoreRepo, StoreUseCases},
        subscription::SubscriptionUseCases,
        subscription_plan::{SubscriptionPlanRepo, SubscriptionPlanUseCases},
        user::UserUseCases,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;

    let postgres = Arc::new(postgres_persistence(&config.database_url).await?);
    let redis = redis_manager(&config.redis_url).await?;

    let rate_limiter = Arc::new(RedisRateLimiter::new(
        redis.clone(),
        RateLimits {
            window_secs: config.rate_limit_window_secs,
            per_ip: config.rate_limit_per_ip,
            per_email: config.rate_limit_per_email,
        },
    ));
    let settings_cache = Arc::new(RedisSettingsCache::new(
        redis,
        config.settings_cache_ttl_secs,
    ));

    tokio::fs::create_dir_all(&config.public_storage_dir)
        .await
        .map_err(InfraError::StorageDir)?;
    let storage: Arc<dyn FileStorage> = Arc::new(LocalDiskStorage::new(
        &config.public_storage_dir,
        config.public_storage_url.clone(),
    ));

    let stores = postgres.clone() as Arc<dyn StoreRepo>;
    let plans = postgres.clone() as Arc<dyn SubscriptionPlanRepo>;
    let featured = postgres.clone() as Arc<dyn FeaturedProductRepo>;
    let hot_deals = postgres.clone() as Arc<dyn HotDealRepo>;
    let scheduler = Arc::new(TokioExpiryScheduler::new(
        featured.clone(),
        hot_deals.clone(),
    ));

    let user_use_cases = UserUseCases::new(
        postgres.clone(),
        config.jwt_secret.clone(),
        config.access_token_ttl,
    );
    let store_use_cases = StoreUseCases::new(stores.clone(), storage.clone());
    let document_use_cases =
        DocumentUseCases::new(postgres.clone(), stores.clone(), storage.clone());
    let category_use_cases = CategoryUseCases::new(postgres.clone());
    let plan_use_cases = SubscriptionPlanUseCases::new(plans.clone());
    let subscription_use_cases = Arc::new(SubscriptionUseCases::new(
        postgres.clone(),
        plans,
        stores.clone(),
        storage.clone(),
        config.subscription_period_months,
    ));
    let product_use_cases = ProductUseCases::new(
        postgres.clone(),
        stores.clone(),
        postgres.clone(),
        subscription_use_cases.clone(),
        featured.clone(),
        hot_deals.clone(),
    );
    let promotion_use_cases = PromotionUseCases::new(
        featured,
        hot_deals,
        postgres.clone(),
        stores,
        subscription_use_cases.clone(),
        scheduler,
    );
    let report_use_cases = ReportUseCases::new(postgres.clone());
    let settings_use_cases = SettingsUseCases::new(postgres, settings_cache);

    Ok(AppState {
        config: Arc::new(config),
        user_use_cases: Arc::new(user_use_cases),
        store_use_cases: Arc::new(store_use_cases),
        document_use_cases: Arc::new(document_use_cases),
        category_use_cases: Arc::new(category_use_cases),
        product_use_cases: Arc::new(product_use_cases),
        plan_use_cases: Arc::new(plan_use_cases),
        subscription_use_cases,
        promotion_use_cases: Arc::new(promotion_use_cases),
        settings_use_cases: Arc::new(settings_use_cases),
        report_use_cases: Arc::new(report_use_cases),
        storage,
        rate_limiter,
    })
}

/// Pretty console logs plus JSON lines in `app.log`. Runs console-only if
/// the log file cannot be created.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketplace_api=debug,tower_http=debug".into());

    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    let json_layer = match File::create("app.log") {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(Arc::new(file))
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(e) => {
            eprintln!("app.log unavailable, logging to console only: {e}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
