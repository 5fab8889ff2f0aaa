use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Serialize;
use uuid::Uuid;

use super::ok;
use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{AuthUser, PageQuery},
    },
    app_error::AppResult,
    use_cases::promotion::{CreateHotDealInput, FeaturedListing, HotDealListing},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/{id}/feature", post(feature_product))
        .route("/products/{id}/unfeature", delete(unfeature_product))
        .route("/hot-deals", post(create_hot_deal))
        .route("/hot-deals/{id}", delete(end_hot_deal))
        .route("/featured-and-deals", get(featured_and_deals))
        .route("/public/featured-products", get(public_featured))
        .route("/public/hot-deals", get(public_hot_deals))
}

#[derive(Serialize)]
struct Listing<T> {
    #[serde(flatten)]
    listing: T,
    image_url: Option<String>,
}

fn with_image<T>(app_state: &AppState, listing: T, image_path: Option<&str>) -> Listing<T> {
    Listing {
        image_url: image_path.map(|p| app_state.storage.public_url(p)),
        listing,
    }
}

async fn feature_product(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let placement = app_state
        .promotion_use_cases
        .feature_product(&owner, product_id)
        .await?;
    Ok((StatusCode::CREATED, ok("Product featured", placement)))
}

async fn unfeature_product(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    app_state
        .promotion_use_cases
        .unfeature_product(&owner, product_id)
        .await?;
    Ok(ok("Product removed from featured", ()))
}

async fn create_hot_deal(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    Json(payload): Json<CreateHotDealInput>,
) -> AppResult<impl IntoResponse> {
    let deal = app_state
        .promotion_use_cases
        .create_hot_deal(&owner, payload)
        .await?;
    Ok((StatusCode::CREATED, ok("Hot deal created", deal)))
}

async fn end_hot_deal(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    app_state
        .promotion_use_cases
        .end_hot_deal(&owner, id)
        .await?;
    Ok(ok("Hot deal ended", ()))
}

async fn featured_and_deals(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> AppResult<impl IntoResponse> {
    let overview = app_state
        .promotion_use_cases
        .featured_and_deals(&owner)
        .await?;
    Ok(ok("Featured products and hot deals", overview))
}

async fn public_featured(
    State(app_state): State<AppState>,
    Query(paging): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let page = paging.request();
    let listings = app_state.promotion_use_cases.public_featured(page).await?;
    Ok(Json(
        listings
            .map(|l: FeaturedListing| {
                let image = l.image_path.clone();
                with_image(&app_state, l, image.as_deref())
            })
            .into_paginated(page),
    ))
}

async fn public_hot_deals(
    State(app_state): State<AppState>,
    Query(paging): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let page = paging.request();
    let listings = app_state.promotion_use_cases.public_hot_deals(page).await?;
    Ok(Json(
        listings
            .map(|l: HotDealListing| {
                let image = l.image_path.clone();
                with_image(&app_state, l, image.as_deref())
            })
            .into_paginated(page),
    ))
}
