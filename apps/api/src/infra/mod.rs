use redis::aio::ConnectionManager;

use crate::{adapters::persistence::PostgresPersistence, infra::db::init_db};

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod expiry_scheduler;
pub mod expiry_sweeper;
pub mod rate_limit;
pub mod settings_cache;
pub mod setup;

pub use error::InfraError;
pub use rate_limit::{RateKey, RateLimiterTrait};

pub async fn postgres_persistence(database_url: &str) -> Result<PostgresPersistence, InfraError> {
    let pool = init_db(database_url).await?;
    Ok(PostgresPersistence::new(pool))
}

/// One multiplexed connection shared by the rate limiter and the settings cache.
pub async fn redis_manager(redis_url: &str) -> Result<ConnectionManager, InfraError> {
    let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
    ConnectionManager::new(client)
        .await
        .map_err(InfraError::RedisConnection)
}
