use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::{
    adapters::http::app_state::AppState, app_error::AppError, infra::rate_limit::RateKey,
};

/// Per-IP request limit for every API call.
pub async fn rate_limit_middleware(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&app_state, &request);
    tracing::trace!(ip = %ip, "Rate limiting request");

    app_state.rate_limiter.check(RateKey::Ip(&ip)).await?;
    Ok(next.run(request).await)
}

/// The address requests are counted against. Forwarded headers are only
/// honoured with `TRUST_PROXY`; without connect info (tests) it is "unknown".
pub fn client_ip(app_state: &AppState, request: &Request) -> String {
    let connect_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let forwarded = if app_state.config.trust_proxy {
        forwarded_ip(request.headers())
    } else {
        None
    };

    forwarded
        .or(connect_ip)
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let from_xff = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = from_xff {
        return Some(ip.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
