use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

use super::ok;
use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{ACCESS_TOKEN_COOKIE, AuthUser},
    },
    app_error::AppResult,
    domain::entities::user::User,
    infra::rate_limit::RateKey,
    use_cases::user::{LoginInput, RegisterInput},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Serialize)]
struct SessionResponse {
    user: User,
    access_token: String,
    token_type: &'static str,
    expires_in: i64,
}

async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterInput>,
) -> AppResult<impl IntoResponse> {
    app_state
        .rate_limiter
        .check(RateKey::Email(&payload.email))
        .await?;

    let user = app_state.user_use_cases.register(payload).await?;
    Ok((StatusCode::CREATED, ok("Registration successful", user)))
}

async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginInput>,
) -> AppResult<impl IntoResponse> {
    app_state
        .rate_limiter
        .check(RateKey::Email(&payload.email))
        .await?;

    let session = app_state.user_use_cases.login(payload).await?;
    let ttl = app_state.user_use_cases.access_token_ttl();

    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, session.access_token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(ttl)
        .build();

    Ok((
        jar.add(cookie),
        ok(
            "Login successful",
            SessionResponse {
                user: session.user,
                access_token: session.access_token,
                token_type: "Bearer",
                expires_in: ttl.whole_seconds(),
            },
        ),
    ))
}

/// Tokens are stateless; logging out only clears the cookie.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    let cleared = Cookie::build((ACCESS_TOKEN_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(0))
        .build();
    (jar.add(cleared), ok("Logged out", ()))
}

async fn me(AuthUser(user): AuthUser) -> AppResult<impl IntoResponse> {
    Ok(ok("Current user", user))
}
