//! Session-token decoding.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
use serde::Serialize;
use uuid::Uuid;

use bazaar_domain::account::AccountKind;

/// Identity carried by a session token whose signature and expiry check out.
///
/// The kind here is what the issuer wrote into the token. The gate does not
/// trust it for authorization; it re-derives the kind from the token store.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub account_id: Uuid,
    pub account_kind: AccountKind,
    pub phone: String,
    pub token_id: Uuid,
    pub expires_at: u64,
}

/// Errors returned by [`validate_session_token`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// JWT claims payload shared by token creation (auth service) and decoding.
///
/// # Fields
///
/// | Field | JWT claim | Rust type | Meaning |
/// |-------|-----------|-----------|---------|
/// | `sub` | `sub` | UUID string | account ID |
/// | `kind` | custom | [`AccountKind`] | `"seller"` or `"customer"` |
/// | `phone` | custom | string | normalized phone of the account |
/// | `iat` | `iat` | seconds since epoch | issue time |
/// | `exp` | `exp` | seconds since epoch | token expiration |
/// | `jti` | `jti` | UUID string | session-token record id, keeps raw values unique |
///
/// # Feature gate
///
/// [`Deserialize`] is always available.
/// [`Serialize`] requires the **`USE_ONLY_IN_AUTH_SERVICE`** cargo feature. Only the auth
/// service enables it because it is the sole token issuer.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test), derive(Serialize))]
pub struct SessionClaims {
    pub sub: String,
    pub kind: AccountKind,
    pub phone: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

/// Decode and validate a JWT, returning raw claims.
///
/// Validation: HS256, exp checked, required claims: `exp` + `sub` + `jti`.
/// Default leeway = 60s.
fn decode_jwt(token: &str, secret: &str) -> Result<SessionClaims, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub", "jti"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_) => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    Ok(data.claims)
}

/// Check a bearer token's signature and embedded expiry, returning parsed identity.
///
/// This is the cheap, local half of session validation. It cannot tell whether
/// the session was revoked; only the auth service's token store knows that.
pub fn validate_session_token(token: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    let claims = decode_jwt(token, secret)?;
    let account_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    let token_id = claims
        .jti
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    Ok(TokenInfo {
        account_id,
        account_kind: claims.kind,
        phone: claims.phone,
        token_id,
        expires_at: claims.exp,
    })
}
