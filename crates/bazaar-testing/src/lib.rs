//! Test utilities for Bazaar services.
//!
//! Provides bearer-header builders and principal injection for handler tests.
//! Import from `[dev-dependencies]` only, never in production code.

pub mod auth;
