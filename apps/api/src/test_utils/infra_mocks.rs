//! In-memory stand-ins for the public disk, the settings cache and the
//! rate limiter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        file_storage::{FileStorage, Upload},
        settings_cache::{SettingsCache, SettingsMap},
    },
    infra::rate_limit::{RateKey, RateLimiterTrait},
};

// ============================================================================
// InMemoryFileStorage
// ============================================================================

/// Keeps uploaded bytes keyed by their relative path.
#[derive(Default)]
pub struct InMemoryFileStorage {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn put(&self, dir: &str, upload: &Upload) -> AppResult<String> {
        let path = format!("{dir}/{}.{}", Uuid::new_v4(), upload.extension());
        self.files
            .lock()
            .unwrap()
            .insert(path.clone(), upload.bytes.clone());
        Ok(path)
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("/storage/{path}")
    }
}

// ============================================================================
// InMemorySettingsCache
// ============================================================================

#[derive(Default)]
pub struct InMemorySettingsCache {
    cached: Mutex<Option<SettingsMap>>,
    invalidations: AtomicUsize,
    down: bool,
}

impl InMemorySettingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if Redis were unreachable.
    pub fn unavailable() -> Self {
        Self {
            down: true,
            ..Self::default()
        }
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    fn ensure_up(&self) -> AppResult<()> {
        if self.down {
            return Err(AppError::Internal("cache unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsCache for InMemorySettingsCache {
    async fn get(&self) -> AppResult<Option<SettingsMap>> {
        self.ensure_up()?;
        Ok(self.cached.lock().unwrap().clone())
    }

    async fn put(&self, settings: &SettingsMap) -> AppResult<()> {
        self.ensure_up()?;
        *self.cached.lock().unwrap() = Some(settings.clone());
        Ok(())
    }

    async fn invalidate(&self) -> AppResult<()> {
        self.ensure_up()?;
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        *self.cached.lock().unwrap() = None;
        Ok(())
    }
}

// ============================================================================
// InMemoryRateLimiter
// ============================================================================

/// Counts hits per key without a window; enough for request-count tests.
pub struct InMemoryRateLimiter {
    counts: Mutex<HashMap<String, u64>>,
    max_per_ip: u64,
    max_per_email: u64,
}

impl InMemoryRateLimiter {
    pub fn new(max_per_ip: u64, max_per_email: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            max_per_ip,
            max_per_email,
        }
    }

    /// Never blocks.
    pub fn permissive() -> Self {
        Self::new(u64::MAX, u64::MAX)
    }
}

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check(&self, key: RateKey<'_>) -> AppResult<()> {
        let limit = match key {
            RateKey::Ip(_) => self.max_per_ip,
            RateKey::Email(_) => self.max_per_email,
        };
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(key.bucket()).or_insert(0);
        *count += 1;
        if *count > limit {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}
