pub mod account;
pub mod code;
pub mod gate;
pub mod login;
pub mod otp;
pub mod password;
pub mod signup;
pub mod sweep;
pub mod token;

use bazaar_domain::phone::normalize_phone;

use crate::error::AuthServiceError;

/// Normalize user-supplied phone input or reject it before any store access.
pub fn parse_phone(raw: &str) -> Result<String, AuthServiceError> {
    normalize_phone(raw).ok_or(AuthServiceError::InvalidPhone)
}
