use std::collections::BTreeMap;

use marketplace_types::ErrorCode;
use thiserror::Error;

use crate::domain::entities::promotion::PromotionKind;

/// Field name -> messages, rendered as the `errors` object of a 422.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("You are not allowed to perform this action")]
    Forbidden,

    #[error("The given data was invalid")]
    Validation(FieldErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{} slots exhausted ({used}/{max})", .kind.label())]
    QuotaExceeded {
        kind: PromotionKind,
        used: i64,
        max: i64,
    },

    #[error("{resource} limit reached ({used}/{max})")]
    LimitReached {
        resource: &'static str,
        used: i64,
        max: i64,
    },

    #[error("{0}")]
    BusinessRule(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::Validation(_) => ErrorCode::ValidationFailed,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            AppError::LimitReached { .. } => ErrorCode::LimitReached,
            AppError::BusinessRule(_) => ErrorCode::BusinessRule,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errors) in errs.field_errors() {
            let messages = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("The {} field is invalid ({})", field, e.code))
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::Validation(fields)
    }
}

pub type AppResult<T> = Result<T, AppError>;
