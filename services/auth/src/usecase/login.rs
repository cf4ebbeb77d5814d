use bazaar_domain::account::AccountKind;
use bazaar_domain::otp::OtpPurpose;

use crate::domain::repository::{
    AccountRepository, Clock, OtpChallengeRepository, OtpDelivery, SessionTokenRepository,
};
use crate::domain::types::{AuthenticatedSession, IssuedOtp, OtpPolicy, SessionPolicy};
use crate::error::AuthServiceError;
use crate::password::verify_password;
use crate::usecase::account::{ensure_enabled, find_account};
use crate::usecase::otp::{
    IssueChallengeInput, IssueChallengeUseCase, VerifyChallengeInput, VerifyChallengeUseCase,
};
use crate::usecase::parse_phone;
use crate::usecase::token::{IssueTokenUseCase, RevokeAllUseCase};

// ── PasswordLogin ────────────────────────────────────────────────────────────

pub struct PasswordLoginInput {
    pub kind: AccountKind,
    pub phone: String,
    pub password: String,
}

pub struct PasswordLoginUseCase<A, T, C>
where
    A: AccountRepository,
    T: SessionTokenRepository + Clone,
    C: Clock + Clone,
{
    pub accounts: A,
    pub tokens: T,
    pub clock: C,
    pub session_policy: SessionPolicy,
    pub jwt_secret: String,
}

impl<A, T, C> PasswordLoginUseCase<A, T, C>
where
    A: AccountRepository,
    T: SessionTokenRepository + Clone,
    C: Clock + Clone,
{
    /// Existing sessions are left alone; only OTP-based flows revoke them.
    pub async fn execute(
        &self,
        input: PasswordLoginInput,
    ) -> Result<AuthenticatedSession, AuthServiceError> {
        let phone = parse_phone(&input.phone)?;
        let account = self
            .accounts
            .find_by_phone(input.kind, &phone)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        // Password first so the status of an account is not revealed to a wrong guess.
        let hash = account
            .password_hash
            .as_deref()
            .ok_or(AuthServiceError::InvalidCredentials)?;
        if !verify_password(&input.password, hash)? {
            return Err(AuthServiceError::InvalidCredentials);
        }
        ensure_enabled(&account)?;

        let token = IssueTokenUseCase {
            tokens: self.tokens.clone(),
            clock: self.clock.clone(),
            policy: self.session_policy,
            jwt_secret: self.jwt_secret.clone(),
        }
        .execute(&account)
        .await?;
        Ok(AuthenticatedSession { account, token })
    }
}

// ── RequestLoginOtp ──────────────────────────────────────────────────────────

pub struct RequestLoginOtpInput {
    pub kind: AccountKind,
    pub phone: String,
}

pub struct RequestLoginOtpUseCase<A, O, D, C>
where
    A: AccountRepository,
    O: OtpChallengeRepository + Clone,
    D: OtpDelivery,
    C: Clock + Clone,
{
    pub accounts: A,
    pub challenges: O,
    pub delivery: D,
    pub clock: C,
    pub otp_policy: OtpPolicy,
}

impl<A, O, D, C> RequestLoginOtpUseCase<A, O, D, C>
where
    A: AccountRepository,
    O: OtpChallengeRepository + Clone,
    D: OtpDelivery,
    C: Clock + Clone,
{
    pub async fn execute(&self, input: RequestLoginOtpInput) -> Result<IssuedOtp, AuthServiceError> {
        let phone = parse_phone(&input.phone)?;
        let account = find_account(&self.accounts, input.kind, &phone).await?;
        ensure_enabled(&account)?;

        let issued = IssueChallengeUseCase {
            challenges: self.challenges.clone(),
            clock: self.clock.clone(),
            policy: self.otp_policy,
        }
        .execute(IssueChallengeInput {
            phone: phone.clone(),
            purpose: OtpPurpose::Login,
            display_name: None,
        })
        .await?;
        self.delivery.deliver(&phone, OtpPurpose::Login, &issued).await?;
        Ok(issued)
    }
}

// ── OtpLogin ─────────────────────────────────────────────────────────────────

pub struct OtpLoginInput {
    pub kind: AccountKind,
    pub phone: String,
    pub code: String,
}

pub struct OtpLoginUseCase<A, O, T, C>
where
    A: AccountRepository,
    O: OtpChallengeRepository + Clone,
    T: SessionTokenRepository + Clone,
    C: Clock + Clone,
{
    pub accounts: A,
    pub challenges: O,
    pub tokens: T,
    pub clock: C,
    pub otp_policy: OtpPolicy,
    pub session_policy: SessionPolicy,
    pub jwt_secret: String,
}

impl<A, O, T, C> OtpLoginUseCase<A, O, T, C>
where
    A: AccountRepository,
    O: OtpChallengeRepository + Clone,
    T: SessionTokenRepository + Clone,
    C: Clock + Clone,
{
    /// Revokes every prior session of the account before issuing the new one.
    pub async fn execute(
        &self,
        input: OtpLoginInput,
    ) -> Result<AuthenticatedSession, AuthServiceError> {
        let phone = parse_phone(&input.phone)?;
        let account = find_account(&self.accounts, input.kind, &phone).await?;
        ensure_enabled(&account)?;

        VerifyChallengeUseCase {
            challenges: self.challenges.clone(),
            clock: self.clock.clone(),
            policy: self.otp_policy,
        }
        .execute(VerifyChallengeInput {
            phone,
            purpose: OtpPurpose::Login,
            code: input.code,
        })
        .await?;

        RevokeAllUseCase {
            tokens: self.tokens.clone(),
        }
        .execute(account.kind, account.id)
        .await?;
        let token = IssueTokenUseCase {
            tokens: self.tokens.clone(),
            clock: self.clock.clone(),
            policy: self.session_policy,
            jwt_secret: self.jwt_secret.clone(),
        }
        .execute(&account)
        .await?;
        Ok(AuthenticatedSession { account, token })
    }
}
