//! # Taskhive Shared Library
//!
//! This crate contains the shared types and business logic used by the
//! Taskhive API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and row-level CRUD
//! - `ledger`: Membership mutation rules and operations (the core)
//! - `store`: Multi-step flows (workspace creation, tasks, the personal alias)
//! - `auth`: Identity token verification for the external provider
//! - `db`: Connection pool and migration runner
//! - `error`: The shared domain error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod store;

/// Current version of the Taskhive shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
