use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{site_setting::SiteSetting, user::User},
    policy::{self, Capability},
    ports::settings_cache::{SettingsCache, SettingsMap},
};

#[async_trait]
pub trait SiteSettingRepo: Send + Sync {
    async fn all(&self) -> AppResult<Vec<SiteSetting>>;
    async fn upsert_many(&self, settings: &SettingsMap) -> AppResult<()>;
}

const MAX_KEY_LEN: usize = 64;

/// Cache-aside access to site settings.
///
/// Reads go to the cache first and fall back to the database on a miss or a
/// cache failure. Writes go to the database and then drop the cached copy.
#[derive(Clone)]
pub struct SettingsUseCases {
    repo: Arc<dyn SiteSettingRepo>,
    cache: Arc<dyn SettingsCache>,
}

impl SettingsUseCases {
    pub fn new(repo: Arc<dyn SiteSettingRepo>, cache: Arc<dyn SettingsCache>) -> Self {
        Self { repo, cache }
    }

    pub async fn get_settings(&self) -> AppResult<SettingsMap> {
        match self.cache.get().await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Settings cache read failed"),
        }

        let settings: SettingsMap = self
            .repo
            .all()
            .await?
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect();

        if let Err(e) = self.cache.put(&settings).await {
            tracing::warn!(error = %e, "Settings cache write failed");
        }
        Ok(settings)
    }

    #[instrument(skip(self, admin, updates), fields(admin_id = %admin.id, keys = updates.len()))]
    pub async fn update_settings(
        &self,
        admin: &User,
        updates: SettingsMap,
    ) -> AppResult<SettingsMap> {
        policy::require(admin, Capability::ManageSettings)?;
        if updates.is_empty() {
            return Err(AppError::field("settings", "At least one setting is required."));
        }
        if let Some(bad) = updates
            .keys()
            .find(|k| !is_valid_key(k))
        {
            return Err(AppError::field(
                bad,
                "Setting keys must be 1-64 characters of a-z, 0-9 or underscore.",
            ));
        }

        self.repo.upsert_many(&updates).await?;
        if let Err(e) = self.cache.invalidate().await {
            tracing::error!(error = %e, "Settings cache invalidation failed; stale values may be served until TTL");
        }

        self.get_settings().await
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
