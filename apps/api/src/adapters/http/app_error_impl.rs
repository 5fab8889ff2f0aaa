use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use marketplace_types::ErrorBody;

use crate::app_error::AppError;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_)
            | AppError::QuotaExceeded { .. }
            | AppError::LimitReached { .. }
            | AppError::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let mut body = match &self {
            // Details of server-side failures stay in the logs
            AppError::Database(_) | AppError::Internal(_) => {
                ErrorBody::new(self.code(), "Something went wrong")
            }
            _ => ErrorBody::new(self.code(), self.to_string()),
        };

        match self {
            AppError::Validation(fields) => body.errors = Some(fields),
            AppError::QuotaExceeded { used, max, .. } | AppError::LimitReached { used, max, .. } => {
                body.current = Some(used);
                body.max = Some(max);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
