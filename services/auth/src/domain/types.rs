use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_domain::account::{AccountKind, AccountStatus};
use bazaar_domain::otp::OtpPurpose;

/// One OTP issuance for a `(phone, purpose)` pair.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub id: Uuid,
    pub phone: String,
    pub purpose: OtpPurpose,
    pub code: String,
    /// Carried from signup request to account creation.
    pub display_name: Option<String>,
    pub attempts: u32,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// What the issuer hands back. The code leaves the core only through [`OtpDelivery`].
///
/// [`OtpDelivery`]: crate::domain::repository::OtpDelivery
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub challenge_id: Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Proof that the caller controls `phone`, produced by a successful verification.
#[derive(Debug, Clone)]
pub struct VerifiedChallenge {
    pub challenge_id: Uuid,
    pub phone: String,
    pub purpose: OtpPurpose,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub kind: AccountKind,
    pub phone: String,
    pub display_name: Option<String>,
    /// Argon2id PHC string; `None` for OTP-only accounts.
    pub password_hash: Option<String>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted record of an issued session token.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub id: Uuid,
    pub account_id: Uuid,
    pub account_kind: AccountKind,
    pub raw_value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub expired: bool,
}

impl SessionToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expired || now >= self.expires_at
    }
}

/// Account plus the token minted for it by a login or signup flow.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub account: Account,
    pub token: SessionToken,
}

/// Counts reported by one housekeeping run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub tokens_expired: u64,
    pub challenges_pruned: u64,
}

/// Outbox event for async delivery (OTP codes to the SMS worker).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

/// Outbox event kind written for every issued OTP.
pub const OTP_ISSUED_EVENT: &str = "otp_issued";

/// Trailing window, in seconds, for the per-phone issuance cap.
pub const RESEND_WINDOW_SECS: i64 = 3600;

/// OTP issuance and verification limits.
#[derive(Debug, Clone, Copy)]
pub struct OtpPolicy {
    pub code_len: usize,
    pub ttl: Duration,
    pub resend_cooldown: Duration,
    pub max_resends_per_hour: u64,
    pub max_verify_attempts: u32,
    /// How long an expired challenge is kept before the sweep prunes it.
    pub retention: Duration,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            code_len: 6,
            ttl: Duration::minutes(5),
            resend_cooldown: Duration::seconds(60),
            max_resends_per_hour: 5,
            max_verify_attempts: 5,
            retention: Duration::days(1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub ttl: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::days(365),
        }
    }
}
