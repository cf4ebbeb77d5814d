use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use bazaar_auth_types::token::{AuthError, SessionClaims, TokenInfo, validate_session_token};
use bazaar_domain::account::AccountKind;

use crate::domain::repository::{AccountRepository, Clock, SessionTokenRepository};
use crate::domain::types::{Account, SessionPolicy, SessionToken};
use crate::error::AuthServiceError;

fn epoch_secs(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or(0)
}

/// Sign a session token for `account` and build its store record. Does not persist.
pub fn issue_session_token(
    account: &Account,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<SessionToken, AuthServiceError> {
    let id = Uuid::now_v7();
    let expires_at = now + ttl;
    let claims = SessionClaims {
        sub: account.id.to_string(),
        kind: account.kind,
        phone: account.phone.clone(),
        iat: epoch_secs(now),
        exp: epoch_secs(expires_at),
        jti: id.to_string(),
    };
    let raw_value = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthServiceError::Internal(e.into()))?;

    Ok(SessionToken {
        id,
        account_id: account.id,
        account_kind: account.kind,
        raw_value,
        issued_at: now,
        expires_at,
        revoked: false,
        expired: false,
    })
}

// ── IssueToken ───────────────────────────────────────────────────────────────

pub struct IssueTokenUseCase<T: SessionTokenRepository, C: Clock> {
    pub tokens: T,
    pub clock: C,
    pub policy: SessionPolicy,
    pub jwt_secret: String,
}

impl<T: SessionTokenRepository, C: Clock> IssueTokenUseCase<T, C> {
    pub async fn execute(&self, account: &Account) -> Result<SessionToken, AuthServiceError> {
        let token =
            issue_session_token(account, &self.jwt_secret, self.policy.ttl, self.clock.now())?;
        self.tokens.insert(&token).await?;
        Ok(token)
    }
}

// ── ValidateToken ────────────────────────────────────────────────────────────

pub struct ValidateTokenUseCase<A: AccountRepository, T: SessionTokenRepository, C: Clock> {
    pub accounts: A,
    pub tokens: T,
    pub clock: C,
    pub jwt_secret: String,
}

impl<A, T, C> ValidateTokenUseCase<A, T, C>
where
    A: AccountRepository,
    T: SessionTokenRepository,
    C: Clock,
{
    /// Resolve `raw` against the `expected_kind` token store.
    pub async fn execute(
        &self,
        raw: &str,
        expected_kind: AccountKind,
    ) -> Result<Account, AuthServiceError> {
        let info = self.check_signature(raw)?;
        let record = self
            .tokens
            .find_by_raw(expected_kind, raw)
            .await?
            .ok_or(AuthServiceError::Unauthorized)?;
        self.accept(&info, &record).await
    }

    /// Signature and embedded expiry. Local, no store access.
    pub fn check_signature(&self, raw: &str) -> Result<TokenInfo, AuthServiceError> {
        validate_session_token(raw, &self.jwt_secret).map_err(|e| match e {
            AuthError::Expired => AuthServiceError::TokenExpired,
            AuthError::InvalidSignature | AuthError::Malformed => AuthServiceError::InvalidToken,
        })
    }

    /// Store-side checks for a record found in some token store, then the account itself.
    /// The kind comes from the record, never from the claims.
    pub async fn accept(
        &self,
        info: &TokenInfo,
        record: &SessionToken,
    ) -> Result<Account, AuthServiceError> {
        if record.revoked {
            return Err(AuthServiceError::TokenRevoked);
        }
        if record.is_expired_at(self.clock.now()) {
            return Err(AuthServiceError::TokenExpired);
        }
        if record.account_id != info.account_id || record.id != info.token_id {
            return Err(AuthServiceError::InvalidToken);
        }
        self.accounts
            .find_by_id(record.account_kind, record.account_id)
            .await?
            .ok_or(AuthServiceError::Unauthorized)
    }
}

// ── RevokeAll ────────────────────────────────────────────────────────────────

pub struct RevokeAllUseCase<T: SessionTokenRepository> {
    pub tokens: T,
}

impl<T: SessionTokenRepository> RevokeAllUseCase<T> {
    pub async fn execute(&self, kind: AccountKind, account_id: Uuid) -> Result<u64, AuthServiceError> {
        let revoked = self.tokens.revoke_all(kind, account_id).await?;
        if revoked > 0 {
            info!(%account_id, account_kind = %kind, revoked, "revoked sessions");
        }
        Ok(revoked)
    }
}

// ── RevokeToken ──────────────────────────────────────────────────────────────

pub struct RevokeTokenUseCase<T: SessionTokenRepository> {
    pub tokens: T,
}

impl<T: SessionTokenRepository> RevokeTokenUseCase<T> {
    /// Revoke one presented token. Idempotent.
    pub async fn execute(&self, kind: AccountKind, raw: &str) -> Result<(), AuthServiceError> {
        self.tokens.revoke(kind, raw).await?;
        Ok(())
    }
}
