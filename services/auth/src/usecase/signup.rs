use bazaar_domain::account::AccountKind;
use bazaar_domain::otp::OtpPurpose;

use crate::domain::repository::{
    AccountRepository, Clock, OtpChallengeRepository, OtpDelivery, SessionTokenRepository,
};
use crate::domain::types::{AuthenticatedSession, IssuedOtp, OtpPolicy, SessionPolicy};
use crate::error::AuthServiceError;
use crate::password::hash_password;
use crate::usecase::account::{
    CompleteSignupVerificationUseCase, CreateAccountInput, CreateAccountUseCase,
    SetPasswordUseCase,
};
use crate::usecase::otp::{
    IssueChallengeInput, IssueChallengeUseCase, VerifyChallengeInput, VerifyChallengeUseCase,
};
use crate::usecase::parse_phone;
use crate::usecase::token::{IssueTokenUseCase, RevokeAllUseCase};

// ── RequestSignup ────────────────────────────────────────────────────────────

pub struct RequestSignupInput {
    pub kind: AccountKind,
    pub phone: String,
    pub display_name: Option<String>,
}

pub struct RequestSignupUseCase<A, O, D, C>
where
    A: AccountRepository + Clone,
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

impl<A, O, D, C> RequestSignupUseCase<A, O, D, C>
where
    A: AccountRepository + Clone,
    O: OtpChallengeRepository + Clone,
    D: OtpDelivery,
    C: Clock + Clone,
{
    pub async fn execute(&self, input: RequestSignupInput) -> Result<IssuedOtp, AuthServiceError> {
        let phone = parse_phone(&input.phone)?;

        // 1. Enabled accounts cannot sign up again; a pending one just gets a fresh code.
        match self.accounts.find_by_phone(input.kind, &phone).await? {
            Some(account) if account.status.is_enabled() => {
                return Err(AuthServiceError::AccountAlreadyExists);
            }
            Some(_) => {}
            None => {
                CreateAccountUseCase {
                    accounts: self.accounts.clone(),
                    clock: self.clock.clone(),
                }
                .execute(CreateAccountInput {
                    kind: input.kind,
                    phone: phone.clone(),
                    display_name: input.display_name.clone(),
                    password_hash: None,
                })
                .await?;
            }
        }

        // 2. Issue and hand off the code.
        let issued = IssueChallengeUseCase {
            challenges: self.challenges.clone(),
            clock: self.clock.clone(),
            policy: self.otp_policy,
        }
        .execute(IssueChallengeInput {
            phone: phone.clone(),
            purpose: OtpPurpose::Signup,
            display_name: input.display_name,
        })
        .await?;
        self.delivery
            .deliver(&phone, OtpPurpose::Signup, &issued)
            .await?;
        Ok(issued)
    }
}

// ── CompleteSignup ───────────────────────────────────────────────────────────

pub struct CompleteSignupInput {
    pub kind: AccountKind,
    pub phone: String,
    pub code: String,
    /// Set only after the code checks out, so only the phone holder can choose it.
    pub password: Option<String>,
}

pub struct CompleteSignupUseCase<A, O, T, C>
where
    A: AccountRepository + Clone,
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

impl<A, O, T, C> CompleteSignupUseCase<A, O, T, C>
where
    A: AccountRepository + Clone,
    O: OtpChallengeRepository + Clone,
    T: SessionTokenRepository + Clone,
    C: Clock + Clone,
{
    pub async fn execute(
        &self,
        input: CompleteSignupInput,
    ) -> Result<AuthenticatedSession, AuthServiceError> {
        let phone = parse_phone(&input.phone)?;
        let existing = self.accounts.find_by_phone(input.kind, &phone).await?;
        if existing.as_ref().is_some_and(|a| a.status.is_enabled()) {
            return Err(AuthServiceError::AccountAlreadyExists);
        }

        // 1. Prove control of the phone.
        let verified = VerifyChallengeUseCase {
            challenges: self.challenges.clone(),
            clock: self.clock.clone(),
            policy: self.otp_policy,
        }
        .execute(VerifyChallengeInput {
            phone,
            purpose: OtpPurpose::Signup,
            code: input.code,
        })
        .await?;

        // 2. The pending row normally exists; recreate it from the challenge if not.
        // The name on the newest request wins.
        let account = match existing {
            Some(account) => {
                if let Some(name) = verified
                    .display_name
                    .as_deref()
                    .filter(|name| account.display_name.as_deref() != Some(*name))
                {
                    self.accounts
                        .rename_pending(input.kind, account.id, name, self.clock.now())
                        .await?;
                }
                account
            }
            None => {
                CreateAccountUseCase {
                    accounts: self.accounts.clone(),
                    clock: self.clock.clone(),
                }
                .execute(CreateAccountInput {
                    kind: input.kind,
                    phone: verified.phone.clone(),
                    display_name: verified.display_name.clone(),
                    password_hash: None,
                })
                .await?
            }
        };

        // 3. Optional password, then pending → enabled.
        if let Some(password) = input.password {
            let hash = hash_password(&password)?;
            SetPasswordUseCase {
                accounts: self.accounts.clone(),
                clock: self.clock.clone(),
            }
            .execute(input.kind, account.id, &hash)
            .await?;
        }
        CompleteSignupVerificationUseCase {
            accounts: self.accounts.clone(),
            clock: self.clock.clone(),
        }
        .execute(input.kind, account.id)
        .await?;

        // 4. Revoke all, then issue: exactly one live session afterwards.
        RevokeAllUseCase {
            tokens: self.tokens.clone(),
        }
        .execute(input.kind, account.id)
        .await?;
        let account = self
            .accounts
            .find_by_id(input.kind, account.id)
            .await?
            .ok_or(AuthServiceError::AccountNotFound)?;
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
