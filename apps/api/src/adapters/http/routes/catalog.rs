use axum::{
    Json, Router,
    extract::{Path, Query, State},
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
        extract::{AuthUser, PageQuery},
    },
    app_error::AppResult,
    domain::entities::product::Product,
    use_cases::{
        category::{CreateCategoryInput, UpdateCategoryInput},
        product::{CreateProductInput, ProductFilter, UpdateProductInput},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/admin/categories", post(create_category))
        .route(
            "/admin/categories/{id}",
            patch(update_category).delete(delete_category),
        )
        .route("/products", get(list_products).post(create_product))
        .route("/products/mine", get(my_products))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

#[derive(Serialize)]
struct ProductView {
    #[serde(flatten)]
    product: Product,
    image_url: Option<String>,
}

fn product_view(app_state: &AppState, product: Product) -> ProductView {
    let image_url = product
        .image_path
        .as_deref()
        .map(|p| app_state.storage.public_url(p));
    ProductView { product, image_url }
}

#[derive(Deserialize)]
struct ProductListQuery {
    category_id: Option<Uuid>,
    store_id: Option<Uuid>,
    search: Option<String>,
}

// ============================================================================
// Categories
// ============================================================================

async fn list_categories(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let categories = app_state.category_use_cases.list_public().await?;
    Ok(ok("Categories", categories))
}

async fn create_category(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Json(payload): Json<CreateCategoryInput>,
) -> AppResult<impl IntoResponse> {
    let category = app_state
        .category_use_cases
        .create(&admin, payload)
        .await?;
    Ok((StatusCode::CREATED, ok("Category created", category)))
}

async fn update_category(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryInput>,
) -> AppResult<impl IntoResponse> {
    let category = app_state
        .category_use_cases
        .update(&admin, id, payload)
        .await?;
    Ok(ok("Category updated", category))
}

async fn delete_category(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    app_state.category_use_cases.delete(&admin, id).await?;
    Ok(ok("Category deleted", ()))
}

// ============================================================================
// Products
// ============================================================================

async fn list_products(
    State(app_state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = paging.request();
    let filter = ProductFilter {
        category_id: query.category_id,
        store_id: query.store_id,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let products = app_state
        .product_use_cases
        .list_public(filter, page)
        .await?;
    Ok(Json(
        products
            .map(|p| product_view(&app_state, p))
            .into_paginated(page),
    ))
}

async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let product = app_state.product_use_cases.get_public(id).await?;
    Ok(ok("Product", product_view(&app_state, product)))
}

async fn my_products(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    Query(paging): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let page = paging.request();
    let products = app_state.product_use_cases.list_mine(&owner, page).await?;
    Ok(Json(
        products
            .map(|p| product_view(&app_state, p))
            .into_paginated(page),
    ))
}

async fn create_product(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    Json(payload): Json<CreateProductInput>,
) -> AppResult<impl IntoResponse> {
    let product = app_state
        .product_use_cases
        .create(&owner, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ok("Product created", product_view(&app_state, product)),
    ))
}

async fn update_product(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductInput>,
) -> AppResult<impl IntoResponse> {
    let product = app_state
        .product_use_cases
        .update(&owner, id, payload)
        .await?;
    Ok(ok("Product updated", product_view(&app_state, product)))
}

async fn delete_product(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    app_state.product_use_cases.delete(&owner, id).await?;
    Ok(ok("Product deleted", ()))
}
