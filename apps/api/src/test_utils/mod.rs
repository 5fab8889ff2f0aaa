//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence
//! - A report repo that aggregates over the other mocks
//! - In-memory stand-ins for storage, cache, scheduler and rate limiter
//! - `TestAppStateBuilder` for router-level tests

mod billing_mocks;
mod catalog_mocks;
mod factories;
mod identity_mocks;
mod infra_mocks;
mod promotion_mocks;
mod report_mocks;

pub use app_state_builder::*;
pub use billing_mocks::*;
pub use catalog_mocks::*;
pub use factories::*;
pub use identity_mocks::*;
pub use infra_mocks::*;
pub use promotion_mocks::*;
pub use report_mocks::*;

use crate::use_cases::{Page, PageRequest};

/// Slices an already filtered and ordered list into a page.
pub(crate) fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Page { items, total }
}
