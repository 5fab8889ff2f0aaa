//! Admin and seller backend for a multi-store marketplace.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infra;

// In-memory repositories and factories for unit tests
#[cfg(test)]
pub mod test_utils;

pub use application::*;
pub use domain::*;
