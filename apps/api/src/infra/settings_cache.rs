use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use crate::{
    app_error::{AppError, AppResult},
    ports::settings_cache::{SettingsCache, SettingsMap},
};

const SETTINGS_KEY: &str = "mkt:settings:all";

/// The whole settings map stored as one JSON string with a TTL.
#[derive(Clone)]
pub struct RedisSettingsCache {
    manager: ConnectionManager,
    ttl_secs: u64,
}

impl RedisSettingsCache {
    pub fn new(manager: ConnectionManager, ttl_secs: u64) -> Self {
        Self {
            manager,
            ttl_secs: ttl_secs.max(1),
        }
    }
}

#[async_trait]
impl SettingsCache for RedisSettingsCache {
    async fn get(&self) -> AppResult<Option<SettingsMap>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn
            .get(SETTINGS_KEY)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| AppError::Internal(e.to_string()))
        })
        .transpose()
    }

    async fn put(&self, settings: &SettingsMap) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let json = serde_json::to_string(settings).map_err(|e| AppError::Internal(e.to_string()))?;

        let _: () = conn
            .set_ex(SETTINGS_KEY, json, self.ttl_secs)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn invalidate(&self) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .del(SETTINGS_KEY)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }
}
