use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ok;
use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{AuthUser, MultipartForm, PageQuery},
    },
    app_error::AppResult,
    domain::entities::subscription::{Subscription, SubscriptionStatus},
    use_cases::{
        subscription::RejectSubscriptionInput, subscription_plan::UpdatePlanInput,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/{slug}", get(get_plan))
        .route("/admin/plans/{slug}", patch(update_plan))
        .route("/subscription/upgrade", post(request_upgrade))
        .route("/subscription/current", get(current_subscription))
        .route("/subscription/history", get(subscription_history))
        .route("/admin/subscriptions", get(list_subscriptions))
        .route("/admin/subscriptions/{id}/approve", patch(approve_subscription))
        .route("/admin/subscriptions/{id}/reject", patch(reject_subscription))
}

#[derive(Serialize)]
struct SubscriptionView {
    #[serde(flatten)]
    subscription: Subscription,
    receipt_url: Option<String>,
}

fn subscription_view(app_state: &AppState, subscription: Subscription) -> SubscriptionView {
    let receipt_url = subscription
        .payment_receipt_path
        .as_deref()
        .map(|p| app_state.storage.public_url(p));
    SubscriptionView {
        subscription,
        receipt_url,
    }
}

#[derive(Deserialize)]
struct SubscriptionListQuery {
    status: Option<SubscriptionStatus>,
}

async fn list_plans(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let plans = app_state.plan_use_cases.list_plans().await?;
    Ok(ok("Plans", plans))
}

async fn get_plan(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state.plan_use_cases.get_plan(&slug).await?;
    Ok(ok("Plan", plan))
}

async fn update_plan(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(slug): Path<String>,
    Json(payload): Json<UpdatePlanInput>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state
        .plan_use_cases
        .update_plan(&admin, &slug, payload)
        .await?;
    Ok(ok("Plan updated", plan))
}

/// Multipart body: `plan` (slug) and `receipt` (payment proof).
async fn request_upgrade(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = MultipartForm::read(multipart).await?;
    let plan = form.text("plan")?.to_string();
    let receipt = form.take_file("receipt")?;
    let subscription = app_state
        .subscription_use_cases
        .request_upgrade(&owner, &plan, receipt)
        .await?;
    Ok((
        StatusCode::CREATED,
        ok(
            "Upgrade requested, awaiting payment review",
            subscription_view(&app_state, subscription),
        ),
    ))
}

async fn current_subscription(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> AppResult<impl IntoResponse> {
    let overview = app_state.subscription_use_cases.my_overview(&owner).await?;
    Ok(ok("Current subscription", overview))
}

async fn subscription_history(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> AppResult<impl IntoResponse> {
    let history = app_state.subscription_use_cases.my_history(&owner).await?;
    let views: Vec<SubscriptionView> = history
        .into_iter()
        .map(|s| subscription_view(&app_state, s))
        .collect();
    Ok(ok("Subscription history", views))
}

async fn list_subscriptions(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Query(paging): Query<PageQuery>,
    Query(query): Query<SubscriptionListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = paging.request();
    let subs = app_state
        .subscription_use_cases
        .list(&admin, query.status, page)
        .await?;
    Ok(Json(
        subs.map(|s| subscription_view(&app_state, s))
            .into_paginated(page),
    ))
}

async fn approve_subscription(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let sub = app_state
        .subscription_use_cases
        .approve(&admin, id)
        .await?;
    Ok(ok("Subscription approved", subscription_view(&app_state, sub)))
}

async fn reject_subscription(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectSubscriptionInput>,
) -> AppResult<impl IntoResponse> {
    let sub = app_state
        .subscription_use_cases
        .reject(&admin, id, payload)
        .await?;
    Ok(ok("Subscription rejected", subscription_view(&app_state, sub)))
}
