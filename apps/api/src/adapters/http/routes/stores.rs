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
    domain::entities::{
        document::{DocumentStatus, StoreDocument},
        store::{Store, StoreStatus},
    },
    use_cases::{
        document::ReviewInput,
        store::{CreateStoreInput, ReasonInput, StoreFilter, UpdateStoreInput},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        // Seller
        .route("/stores", post(create_store))
        .route("/stores/me", get(my_store).patch(update_my_store))
        .route("/stores/me/logo", post(upload_logo))
        .route(
            "/stores/me/documents",
            get(my_documents).post(upload_document),
        )
        // Public
        .route("/public/stores/{slug}", get(public_store))
        // Admin
        .route("/admin/stores", get(list_stores))
        .route("/admin/stores/{id}", get(get_store))
        .route("/admin/stores/{id}/verify", patch(verify_store))
        .route("/admin/stores/{id}/reject", patch(reject_store))
        .route("/admin/stores/{id}/suspend", patch(suspend_store))
        .route("/admin/stores/{id}/reinstate", patch(reinstate_store))
        .route("/admin/documents", get(list_documents))
        .route("/admin/documents/{id}/approve", patch(approve_document))
        .route("/admin/documents/{id}/reject", patch(reject_document))
}

#[derive(Serialize)]
struct StoreView {
    #[serde(flatten)]
    store: Store,
    logo_url: Option<String>,
}

#[derive(Serialize)]
struct DocumentView {
    #[serde(flatten)]
    document: StoreDocument,
    file_url: String,
}

fn store_view(app_state: &AppState, store: Store) -> StoreView {
    let logo_url = store
        .logo_path
        .as_deref()
        .map(|p| app_state.storage.public_url(p));
    StoreView { store, logo_url }
}

fn document_view(app_state: &AppState, document: StoreDocument) -> DocumentView {
    let file_url = app_state.storage.public_url(&document.file_path);
    DocumentView { document, file_url }
}

#[derive(Deserialize)]
struct StoreListQuery {
    status: Option<StoreStatus>,
    search: Option<String>,
}

#[derive(Deserialize)]
struct DocumentListQuery {
    status: Option<DocumentStatus>,
}

// ============================================================================
// Seller endpoints
// ============================================================================

async fn create_store(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    Json(payload): Json<CreateStoreInput>,
) -> AppResult<impl IntoResponse> {
    let store = app_state
        .store_use_cases
        .create_store(&owner, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ok(
            "Store created and awaiting verification",
            store_view(&app_state, store),
        ),
    ))
}

async fn my_store(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> AppResult<impl IntoResponse> {
    let store = app_state.store_use_cases.my_store(&owner).await?;
    Ok(ok("Store", store_view(&app_state, store)))
}

async fn update_my_store(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    Json(payload): Json<UpdateStoreInput>,
) -> AppResult<impl IntoResponse> {
    let store = app_state
        .store_use_cases
        .update_my_store(&owner, payload)
        .await?;
    Ok(ok("Store updated", store_view(&app_state, store)))
}

async fn upload_logo(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = MultipartForm::read(multipart).await?;
    let logo = form.take_file("logo")?;
    let store = app_state.store_use_cases.upload_logo(&owner, logo).await?;
    Ok(ok("Logo updated", store_view(&app_state, store)))
}

async fn my_documents(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> AppResult<impl IntoResponse> {
    let docs = app_state.document_use_cases.my_documents(&owner).await?;
    let views: Vec<DocumentView> = docs
        .into_iter()
        .map(|d| document_view(&app_state, d))
        .collect();
    Ok(ok("Documents", views))
}

async fn upload_document(
    State(app_state): State<AppState>,
    AuthUser(owner): AuthUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = MultipartForm::read(multipart).await?;
    let doc_type = form.text("doc_type")?.to_string();
    let file = form.take_file("file")?;
    let doc = app_state
        .document_use_cases
        .upload(&owner, &doc_type, file)
        .await?;
    Ok((
        StatusCode::CREATED,
        ok("Document uploaded", document_view(&app_state, doc)),
    ))
}

// ============================================================================
// Public endpoints
// ============================================================================

async fn public_store(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let store = app_state.store_use_cases.public_store(&slug).await?;
    Ok(ok("Store", store_view(&app_state, store)))
}

// ============================================================================
// Admin endpoints
// ============================================================================

async fn list_stores(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Query(paging): Query<PageQuery>,
    Query(query): Query<StoreListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = paging.request();
    let filter = StoreFilter {
        status: query.status,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let stores = app_state
        .store_use_cases
        .list_stores(&admin, filter, page)
        .await?;
    Ok(Json(
        stores
            .map(|s| store_view(&app_state, s))
            .into_paginated(page),
    ))
}

async fn get_store(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let store = app_state.store_use_cases.get_store(&admin, id).await?;
    Ok(ok("Store", store_view(&app_state, store)))
}

async fn verify_store(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let store = app_state.store_use_cases.verify(&admin, id).await?;
    Ok(ok("Store verified", store_view(&app_state, store)))
}

async fn reject_store(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReasonInput>,
) -> AppResult<impl IntoResponse> {
    let store = app_state.store_use_cases.reject(&admin, id, payload).await?;
    Ok(ok("Store rejected", store_view(&app_state, store)))
}

async fn suspend_store(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReasonInput>,
) -> AppResult<impl IntoResponse> {
    let store = app_state
        .store_use_cases
        .suspend(&admin, id, payload)
        .await?;
    Ok(ok("Store suspended", store_view(&app_state, store)))
}

async fn reinstate_store(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let store = app_state.store_use_cases.reinstate(&admin, id).await?;
    Ok(ok("Store reinstated", store_view(&app_state, store)))
}

async fn list_documents(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Query(paging): Query<PageQuery>,
    Query(query): Query<DocumentListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = paging.request();
    let docs = app_state
        .document_use_cases
        .list(&admin, query.status, page)
        .await?;
    Ok(Json(
        docs.map(|d| document_view(&app_state, d))
            .into_paginated(page),
    ))
}

async fn approve_document(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<ReviewInput>>,
) -> AppResult<impl IntoResponse> {
    let input = payload.map(|Json(p)| p).unwrap_or_default();
    let doc = app_state
        .document_use_cases
        .approve(&admin, id, input)
        .await?;
    Ok(ok("Document approved", document_view(&app_state, doc)))
}

async fn reject_document(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewInput>,
) -> AppResult<impl IntoResponse> {
    let doc = app_state
        .document_use_cases
        .reject(&admin, id, payload)
        .await?;
    Ok(ok("Document rejected", document_view(&app_state, doc)))
}
