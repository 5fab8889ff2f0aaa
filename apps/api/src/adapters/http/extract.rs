//! Request extractors shared by the routers.

use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Multipart},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::entities::user::User,
    ports::file_storage::Upload,
    use_cases::PageRequest,
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// The authenticated caller. Reads `Authorization: Bearer <jwt>` first and
/// falls back to the `access_token` cookie. Banned users are rejected.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| {
                CookieJar::from_headers(&parts.headers)
                    .get(ACCESS_TOKEN_COOKIE)
                    .map(|c| c.value().to_owned())
            })
            .ok_or(AppError::InvalidCredentials)?;

        let user = state.user_use_cases.authenticate(&token).await?;
        Ok(AuthUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

/// `?page=&per_page=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

/// A drained multipart form: text fields and file parts by field name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, Upload>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);

            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Could not read field {name}: {e}")))?;

            match (file_name, content_type) {
                (Some(file_name), content_type) => {
                    let upload = Upload {
                        file_name: Some(file_name),
                        content_type: content_type
                            .unwrap_or_else(|| "application/octet-stream".to_string()),
                        bytes: bytes.to_vec(),
                    };
                    form.files.insert(name, upload);
                }
                (None, _) => {
                    let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                        AppError::InvalidInput(format!("Field {name} is not valid UTF-8"))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> AppResult<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::field(name, format!("The {name} field is required.")))
    }

    pub fn take_file(&mut self, name: &str) -> AppResult<Upload> {
        self.files
            .remove(name)
            .ok_or_else(|| AppError::field(name, format!("The {name} field is required.")))
    }
}
