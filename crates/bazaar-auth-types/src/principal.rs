//! Request-scoped principal attached by the authentication gate.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use serde::Serialize;
use uuid::Uuid;

use bazaar_domain::account::AccountKind;

/// The authenticated identity of a request: which account, and which kind.
///
/// The gate inserts this into request extensions after a token passes every
/// check. Downstream handlers extract it; a request that reaches a handler
/// without one is rejected with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub account_id: Uuid,
    pub account_kind: AccountKind,
}

impl Principal {
    pub fn new(account_id: Uuid, account_kind: AccountKind) -> Self {
        Self {
            account_id,
            account_kind,
        }
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // Read synchronously and return a 'static future so the borrow of `parts`
    // does not leak into the returned future.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let principal = parts.extensions.get::<Principal>().copied();
        async move { principal.ok_or(StatusCode::UNAUTHORIZED) }
    }
}
