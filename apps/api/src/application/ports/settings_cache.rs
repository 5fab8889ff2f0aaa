use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::app_error::AppResult;

pub type SettingsMap = BTreeMap<String, Value>;

/// Cache-aside store for the full settings map.
#[async_trait]
pub trait SettingsCache: Send + Sync {
    async fn get(&self) -> AppResult<Option<SettingsMap>>;
    async fn put(&self, settings: &SettingsMap) -> AppResult<()>;
    async fn invalidate(&self) -> AppResult<()>;
}
