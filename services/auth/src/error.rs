use axum::http::{HeaderValue, StatusCode, header::RETRY_AFTER};
use axum::response::{IntoResponse, Response};

/// Auth service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("too many otp requests")]
    RateLimited { retry_after_secs: u64 },
    #[error("otp not found")]
    ChallengeNotFound,
    #[error("otp expired")]
    ChallengeExpired,
    #[error("too many wrong attempts")]
    ChallengeLockedOut,
    #[error("invalid code")]
    InvalidCode,
    #[error("account already exists")]
    AccountAlreadyExists,
    #[error("account not found")]
    AccountNotFound,
    #[error("account not verified")]
    NotVerified,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid phone number")]
    InvalidPhone,
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid token")]
    InvalidToken,
    #[error("token revoked")]
    TokenRevoked,
    #[error("token expired")]
    TokenExpired,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::ChallengeNotFound => "OTP_NOT_FOUND",
            Self::ChallengeExpired => "OTP_EXPIRED",
            Self::ChallengeLockedOut => "OTP_LOCKED_OUT",
            Self::InvalidCode => "INVALID_CODE",
            Self::AccountAlreadyExists => "ACCOUNT_ALREADY_EXISTS",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::NotVerified => "NOT_VERIFIED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidPhone => "INVALID_PHONE",
            Self::Unauthorized | Self::InvalidToken | Self::TokenRevoked | Self::TokenExpired => {
                "UNAUTHORIZED"
            }
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Token failures collapse into one outward shape so callers cannot map out session state.
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::InvalidToken | Self::TokenRevoked | Self::TokenExpired
        )
    }

    fn public_message(&self) -> String {
        if self.is_token_failure() {
            Self::Unauthorized.to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ChallengeNotFound | Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::ChallengeExpired => StatusCode::GONE,
            Self::ChallengeLockedOut => StatusCode::LOCKED,
            Self::InvalidCode | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccountAlreadyExists => StatusCode::CONFLICT,
            Self::NotVerified => StatusCode::FORBIDDEN,
            Self::InvalidPhone => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidToken | Self::TokenRevoked | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only. TraceLayer already records status for every request and
        // 4xx here are expected outcomes; internal errors need the anyhow chain.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.public_message(),
        });
        let mut response = (status, axum::Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
