use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, put},
};

use super::ok;
use crate::{
    adapters::http::{app_state::AppState, extract::AuthUser},
    app_error::AppResult,
    ports::settings_cache::SettingsMap,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/admin/settings", put(update_settings))
}

async fn get_settings(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let settings = app_state.settings_use_cases.get_settings().await?;
    Ok(ok("Settings", settings))
}

/// Body is a flat JSON object of `key: value` pairs.
async fn update_settings(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Json(payload): Json<SettingsMap>,
) -> AppResult<impl IntoResponse> {
    let settings = app_state
        .settings_use_cases
        .update_settings(&admin, payload)
        .await?;
    Ok(ok("Settings updated", settings))
}
