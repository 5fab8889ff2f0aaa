use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;
use uuid::Uuid;

use super::ok;
use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{AuthUser, PageQuery},
    },
    app_error::AppResult,
    domain::entities::user::{Role, UserStatus},
    use_cases::user::UserFilter,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}/role", patch(change_role))
        .route("/admin/users/{id}/status", patch(set_status))
}

#[derive(Deserialize)]
struct UserListQuery {
    role: Option<Role>,
    status: Option<UserStatus>,
    search: Option<String>,
}

#[derive(Deserialize)]
struct RolePayload {
    role: Role,
}

#[derive(Deserialize)]
struct StatusPayload {
    status: UserStatus,
}

async fn list_users(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Query(paging): Query<PageQuery>,
    Query(query): Query<UserListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = paging.request();
    let filter = UserFilter {
        role: query.role,
        status: query.status,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let users = app_state
        .user_use_cases
        .list_users(&admin, filter, page)
        .await?;
    Ok(Json(users.into_paginated(page)))
}

async fn change_role(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RolePayload>,
) -> AppResult<impl IntoResponse> {
    let user = app_state
        .user_use_cases
        .change_role(&admin, id, payload.role)
        .await?;
    Ok(ok("Role updated", user))
}

async fn set_status(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusPayload>,
) -> AppResult<impl IntoResponse> {
    let user = app_state
        .user_use_cases
        .set_status(&admin, id, payload.status)
        .await?;
    Ok(ok("Status updated", user))
}
