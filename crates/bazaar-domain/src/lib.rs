//! Domain types shared across Bazaar services.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; storage adapters convert to and
//! from the wire strings exposed here.

pub mod account;
pub mod otp;
pub mod phone;

/// Returned when a stored or wire string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
