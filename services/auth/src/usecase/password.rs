use bazaar_auth_types::principal::Principal;
use bazaar_domain::account::AccountKind;
use bazaar_domain::otp::OtpPurpose;

use crate::domain::repository::{AccountRepository, Clock, OtpChallengeRepository, OtpDelivery};
use crate::domain::types::{IssuedOtp, OtpPolicy};
use crate::error::AuthServiceError;
use crate::password::hash_password;
use crate::usecase::account::{SetPasswordUseCase, find_account};
use crate::usecase::otp::{
    IssueChallengeInput, IssueChallengeUseCase, VerifyChallengeInput, VerifyChallengeUseCase,
};
use crate::usecase::parse_phone;

// ── RequestPasswordReset ─────────────────────────────────────────────────────

pub struct RequestPasswordResetInput {
    pub kind: AccountKind,
    pub phone: String,
}

pub struct RequestPasswordResetUseCase<A, O, D, C>
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

impl<A, O, D, C> RequestPasswordResetUseCase<A, O, D, C>
where
    A: AccountRepository,
    O: OtpChallengeRepository + Clone,
    D: OtpDelivery,
    C: Clock + Clone,
{
    pub async fn execute(
        &self,
        input: RequestPasswordResetInput,
    ) -> Result<IssuedOtp, AuthServiceError> {
        let phone = parse_phone(&input.phone)?;
        find_account(&self.accounts, input.kind, &phone).await?;

        let issued = IssueChallengeUseCase {
            challenges: self.challenges.clone(),
            clock: self.clock.clone(),
            policy: self.otp_policy,
        }
        .execute(IssueChallengeInput {
            phone: phone.clone(),
            purpose: OtpPurpose::PasswordReset,
            display_name: None,
        })
        .await?;
        self.delivery
            .deliver(&phone, OtpPurpose::PasswordReset, &issued)
            .await?;
        Ok(issued)
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordInput {
    pub kind: AccountKind,
    pub phone: String,
    pub code: String,
    pub new_password: String,
}

pub struct ResetPasswordUseCase<A, O, C>
where
    A: AccountRepository + Clone,
    O: OtpChallengeRepository + Clone,
    C: Clock + Clone,
{
    pub accounts: A,
    pub challenges: O,
    pub clock: C,
    pub otp_policy: OtpPolicy,
}

impl<A, O, C> ResetPasswordUseCase<A, O, C>
where
    A: AccountRepository + Clone,
    O: OtpChallengeRepository + Clone,
    C: Clock + Clone,
{
    /// Existing sessions stay valid after a reset.
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<(), AuthServiceError> {
        let phone = parse_phone(&input.phone)?;
        let account = find_account(&self.accounts, input.kind, &phone).await?;

        VerifyChallengeUseCase {
            challenges: self.challenges.clone(),
            clock: self.clock.clone(),
            policy: self.otp_policy,
        }
        .execute(VerifyChallengeInput {
            phone,
            purpose: OtpPurpose::PasswordReset,
            code: input.code,
        })
        .await?;

        let hash = hash_password(&input.new_password)?;
        SetPasswordUseCase {
            accounts: self.accounts.clone(),
            clock: self.clock.clone(),
        }
        .execute(input.kind, account.id, &hash)
        .await
    }
}

// ── ChangePassword ───────────────────────────────────────────────────────────

pub struct ChangePasswordUseCase<A: AccountRepository, C: Clock> {
    pub accounts: A,
    pub clock: C,
}

impl<A: AccountRepository, C: Clock> ChangePasswordUseCase<A, C> {
    pub async fn execute(
        &self,
        principal: Principal,
        new_password: &str,
    ) -> Result<(), AuthServiceError> {
        let hash = hash_password(new_password)?;
        let updated = self
            .accounts
            .set_password(
                principal.account_kind,
                principal.account_id,
                &hash,
                self.clock.now(),
            )
            .await?;
        if !updated {
            return Err(AuthServiceError::AccountNotFound);
        }
        Ok(())
    }
}
