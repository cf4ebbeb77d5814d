#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use bazaar_domain::account::AccountKind;
use bazaar_domain::otp::OtpPurpose;

use crate::domain::types::{Account, IssuedOtp, OtpChallenge, SessionToken};
use crate::error::AuthServiceError;

/// Source of the current time for every expiry and rate-limit decision.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Repository for OTP challenges.
pub trait OtpChallengeRepository: Send + Sync {
    /// Most recently created challenge for `(phone, purpose)`, used or expired included.
    async fn latest(
        &self,
        phone: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>, AuthServiceError>;

    /// Creation times of every challenge for `phone` (any purpose) since `since`, oldest first.
    async fn issued_since(
        &self,
        phone: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, AuthServiceError>;

    async fn create(&self, challenge: &OtpChallenge) -> Result<(), AuthServiceError>;

    /// Atomically increment `attempts` if it is still below `max_attempts`.
    /// Returns `false` when the budget was already spent.
    async fn record_failed_attempt(
        &self,
        id: Uuid,
        max_attempts: u32,
    ) -> Result<bool, AuthServiceError>;

    /// Atomically mark the challenge used if it is unused and not locked out.
    /// Returns `false` when another request got there first.
    async fn mark_used(&self, id: Uuid, max_attempts: u32) -> Result<bool, AuthServiceError>;

    /// Delete challenges that expired before `cutoff`. Returns the number removed.
    async fn prune_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthServiceError>;
}

/// Repository for seller and customer accounts. Every query is scoped to one kind.
pub trait AccountRepository: Send + Sync {
    async fn find_by_phone(
        &self,
        kind: AccountKind,
        phone: &str,
    ) -> Result<Option<Account>, AuthServiceError>;

    async fn find_by_id(
        &self,
        kind: AccountKind,
        id: Uuid,
    ) -> Result<Option<Account>, AuthServiceError>;

    /// Insert a new account. Fails with `AccountAlreadyExists` if the phone is taken for `kind`.
    async fn create(&self, account: &Account) -> Result<(), AuthServiceError>;

    /// Flip a pending account to enabled. Returns `false` if no pending row matched.
    async fn enable(
        &self,
        kind: AccountKind,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError>;

    /// Returns `false` if the account does not exist.
    async fn set_password(
        &self,
        kind: AccountKind,
        id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError>;

    /// Rename a pending account. Returns `false` if no pending row matched.
    async fn rename_pending(
        &self,
        kind: AccountKind,
        id: Uuid,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError>;
}

/// Token store. One logical store per [`AccountKind`].
pub trait SessionTokenRepository: Send + Sync {
    async fn insert(&self, token: &SessionToken) -> Result<(), AuthServiceError>;

    async fn find_by_raw(
        &self,
        kind: AccountKind,
        raw_value: &str,
    ) -> Result<Option<SessionToken>, AuthServiceError>;

    /// Revoke every unrevoked token of the account. Returns the number revoked.
    async fn revoke_all(
        &self,
        kind: AccountKind,
        account_id: Uuid,
    ) -> Result<u64, AuthServiceError>;

    async fn revoke(&self, kind: AccountKind, raw_value: &str) -> Result<bool, AuthServiceError>;

    /// Set `expired` on tokens whose `expires_at` has passed. Returns the number flipped.
    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthServiceError>;
}

/// Hand-off of a freshly issued code to out-of-band delivery.
pub trait OtpDelivery: Send + Sync {
    async fn deliver(
        &self,
        phone: &str,
        purpose: OtpPurpose,
        otp: &IssuedOtp,
    ) -> Result<(), AuthServiceError>;
}
