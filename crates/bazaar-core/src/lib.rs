//! Cross-service plumbing for Bazaar HTTP services.

pub mod middleware;
pub mod serde;
pub mod tracing;
