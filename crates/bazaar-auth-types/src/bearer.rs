//! `Authorization: Bearer <token>` extraction.

use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use http::HeaderMap;

/// Why a request carries no usable bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("missing authorization header")]
    Missing,
    #[error("malformed authorization header")]
    Malformed,
}

/// Pull the raw bearer token out of the request headers.
///
/// ```
/// use bazaar_auth_types::bearer::{BearerError, bearer_token};
/// use http::{HeaderMap, HeaderValue, header::AUTHORIZATION};
///
/// let mut headers = HeaderMap::new();
/// assert_eq!(bearer_token(&headers), Err(BearerError::Missing));
///
/// headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
/// assert_eq!(bearer_token(&headers).as_deref(), Ok("abc.def.ghi"));
///
/// headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
/// assert_eq!(bearer_token(&headers), Err(BearerError::Malformed));
/// ```
pub fn bearer_token(headers: &HeaderMap) -> Result<String, BearerError> {
    let auth = headers
        .typed_try_get::<Authorization<Bearer>>()
        .map_err(|_| BearerError::Malformed)?
        .ok_or(BearerError::Missing)?;
    let token = auth.token().trim();
    if token.is_empty() {
        return Err(BearerError::Malformed);
    }
    Ok(token.to_owned())
}
