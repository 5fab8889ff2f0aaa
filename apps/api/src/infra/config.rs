use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;

use super::error::InfraError;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub access_token_ttl: Duration,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub redis_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    pub rate_limit_per_email: u64,
    /// Trust X-Forwarded-For / X-Real-IP. Only enable behind a reverse proxy.
    pub trust_proxy: bool,
    /// Root of the public disk.
    pub public_storage_dir: PathBuf,
    /// URL prefix the public disk is served under.
    pub public_storage_url: String,
    pub max_upload_bytes: usize,
    pub settings_cache_ttl_secs: u64,
    pub expiry_sweep_interval_secs: u64,
    pub subscription_period_months: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let access_token_ttl_secs: i64 = get_env_default("ACCESS_TOKEN_TTL_SECS", 86_400);

        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid {
                    var: "CORS_ORIGIN",
                })?;
        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3001)),
        );

        let database_url: String = get_env("DATABASE_URL");
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 120);
        let rate_limit_per_email: u64 = get_env_default("RATE_LIMIT_PER_EMAIL", 20);
        // Off unless explicitly enabled behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let public_storage_dir: String =
            get_env_default("PUBLIC_STORAGE_DIR", "./storage/public".to_string());
        let public_storage_url: String =
            get_env_default("PUBLIC_STORAGE_URL", "/storage".to_string());
        let max_upload_bytes: usize = get_env_default("MAX_UPLOAD_BYTES", 5 * 1024 * 1024);

        let settings_cache_ttl_secs: u64 = get_env_default("SETTINGS_CACHE_TTL_SECS", 300);
        let expiry_sweep_interval_secs: u64 = get_env_default("EXPIRY_SWEEP_INTERVAL_SECS", 60);
        let subscription_period_months: u32 = get_env_default("SUBSCRIPTION_PERIOD_MONTHS", 1);

        Ok(Self {
            jwt_secret,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            cors_origin,
            bind_addr,
            database_url,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            rate_limit_per_email,
            trust_proxy,
            public_storage_dir: PathBuf::from(public_storage_dir),
            public_storage_url: public_storage_url.trim_end_matches('/').to_string(),
            max_upload_bytes,
            settings_cache_ttl_secs,
            expiry_sweep_interval_secs,
            subscription_period_months: subscription_period_months.max(1),
        })
    }
}
