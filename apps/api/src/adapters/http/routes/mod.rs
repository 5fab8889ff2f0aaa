pub mod auth;
pub mod catalog;
pub mod promotions;
pub mod reports;
pub mod settings;
pub mod stores;
pub mod subscriptions;
pub mod users;

use axum::{Json, Router};
use marketplace_types::ApiResponse;
use serde::Serialize;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(users::router())
        .merge(stores::router())
        .merge(catalog::router())
        .merge(subscriptions::router())
        .merge(promotions::router())
        .merge(settings::router())
        .merge(reports::router())
}

/// `{ "message": ..., "data": ... }`
pub(crate) fn ok<T: Serialize>(message: &str, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::new(message, data))
}
