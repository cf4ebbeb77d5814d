//! Auth types shared across Bazaar services.
//!
//! Provides session-token decoding, bearer-header extraction, and the
//! `Principal` extractor that downstream handlers use after the gate runs.

pub mod bearer;
pub mod principal;
pub mod token;
