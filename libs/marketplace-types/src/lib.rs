//! Wire types shared between the marketplace API and its dashboard clients.
//!
//! This crate provides:
//! - Response envelopes (`ApiResponse`, `Paginated`)
//! - API error codes and the error body shape
//! - Promotion quota usage counters

mod errors;
mod quota;
mod responses;

pub use errors::{ErrorBody, ErrorCode};
pub use quota::QuotaUsage;
pub use responses::{ApiResponse, Paginated, Pagination};
