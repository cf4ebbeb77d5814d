pub mod health;
pub mod login;
pub mod password;
pub mod session;
pub mod signup;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use bazaar_domain::account::AccountKind;

use crate::domain::types::{AuthenticatedSession, IssuedOtp, OtpPolicy};

/// Body returned when a code was sent. Never carries the code.
#[derive(Serialize)]
pub struct OtpSentResponse {
    #[serde(serialize_with = "bazaar_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    pub resend_after_secs: i64,
}

impl OtpSentResponse {
    pub fn new(issued: &IssuedOtp, policy: &OtpPolicy) -> Self {
        Self {
            expires_at: issued.expires_at,
            resend_after_secs: policy.resend_cooldown.num_seconds(),
        }
    }
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    #[serde(serialize_with = "bazaar_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    pub account_id: Uuid,
    pub account_kind: AccountKind,
}

impl From<AuthenticatedSession> for SessionResponse {
    fn from(session: AuthenticatedSession) -> Self {
        Self {
            token: session.token.raw_value,
            expires_at: session.token.expires_at,
            account_id: session.account.id,
            account_kind: session.account.kind,
        }
    }
}
