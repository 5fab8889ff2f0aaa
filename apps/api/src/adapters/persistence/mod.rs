pub mod category;
pub mod document;
pub mod product;
pub mod promotion;
pub mod report;
pub mod site_setting;
pub mod store;
pub mod subscription;
pub mod subscription_plan;
pub mod user;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{app_error::AppError, use_cases::PageRequest};

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Appends `LIMIT`/`OFFSET` for the requested page.
pub(crate) fn push_page(builder: &mut QueryBuilder<'_, Postgres>, page: PageRequest) {
    builder.push(" LIMIT ").push_bind(page.limit());
    builder.push(" OFFSET ").push_bind(page.offset());
}

/// `%term%` for ILIKE, with LIKE wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    AppError::Conflict("A record with this value already exists".into())
                } else if db_err.is_foreign_key_violation() {
                    AppError::InvalidInput("Referenced record not found".into())
                } else if db_err.is_check_violation() {
                    AppError::InvalidInput("Value out of range".into())
                } else {
                    // Details stay in the log
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
