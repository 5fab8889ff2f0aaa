use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::app_error::{AppError, AppResult};

/// What a request is counted against.
#[derive(Debug, Clone, Copy)]
pub enum RateKey<'a> {
    /// Every API request, by client address.
    Ip(&'a str),
    /// Credential attempts, by the email being tried.
    Email(&'a str),
}

impl RateKey<'_> {
    pub fn bucket(&self) -> String {
        match self {
            RateKey::Ip(ip) => format!("mkt:rate:ip:{ip}"),
            RateKey::Email(email) => format!("mkt:rate:email:{}", email.trim().to_lowercase()),
        }
    }
}

#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Counts one hit. Returns `AppError::RateLimited` once the key is over
    /// its limit for the current window.
    async fn check(&self, key: RateKey<'_>) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub window_secs: u64,
    pub per_ip: u64,
    pub per_email: u64,
}

/// Fixed-window counter in Redis. The window index is part of the key, so
/// each window starts from zero and old keys expire on their own.
#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    limits: RateLimits,
}

impl RedisRateLimiter {
    pub fn new(manager: ConnectionManager, limits: RateLimits) -> Self {
        Self { manager, limits }
    }

    fn limit_for(&self, key: &RateKey<'_>) -> u64 {
        match key {
            RateKey::Ip(_) => self.limits.per_ip,
            RateKey::Email(_) => self.limits.per_email,
        }
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check(&self, key: RateKey<'_>) -> AppResult<()> {
        let window = self.limits.window_secs.max(1);
        let index = chrono::Utc::now().timestamp() as u64 / window;
        let redis_key = format!("{}:{index}", key.bucket());

        let mut conn = self.manager.clone();
        let (current,): (u64,) = redis::pipe()
            .atomic()
            .incr(&redis_key, 1u64)
            .expire(&redis_key, window as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("rate limiter: {e}")))?;

        if current > self.limit_for(&key) {
            tracing::debug!(bucket = %key.bucket(), current, "Rate limit exceeded");
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}
