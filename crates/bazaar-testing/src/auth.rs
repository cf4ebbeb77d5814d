//! Mock auth helpers for integration tests.
//!
//! Handlers behind the gate read a [`Principal`] from request extensions.
//! `MockPrincipal` inserts one directly so tests need neither a token store
//! nor a signed token. `bearer_headers` builds the header a real client sends.

use axum::http::{HeaderMap, HeaderValue, Request, header::AUTHORIZATION};
use uuid::Uuid;

use bazaar_auth_types::principal::Principal;
use bazaar_domain::account::AccountKind;

/// Configurable identity injected into test requests.
pub struct MockPrincipal {
    pub account_id: Uuid,
    pub account_kind: AccountKind,
}

impl MockPrincipal {
    pub fn new(account_id: Uuid, account_kind: AccountKind) -> Self {
        Self {
            account_id,
            account_kind,
        }
    }

    pub fn customer() -> Self {
        Self::new(Uuid::new_v4(), AccountKind::Customer)
    }

    pub fn seller() -> Self {
        Self::new(Uuid::new_v4(), AccountKind::Seller)
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.account_id, self.account_kind)
    }

    /// Attach the principal as if the gate had authenticated the request.
    pub fn inject<B>(&self, request: &mut Request<B>) {
        request.extensions_mut().insert(self.principal());
    }
}

/// Headers carrying `Authorization: Bearer <token>`.
pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    map
}
