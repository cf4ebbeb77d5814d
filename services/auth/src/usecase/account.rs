use uuid::Uuid;

use bazaar_domain::account::{AccountKind, AccountStatus};

use crate::domain::repository::{AccountRepository, Clock};
use crate::domain::types::Account;
use crate::error::AuthServiceError;
use crate::usecase::parse_phone;

// ── CreateAccount ────────────────────────────────────────────────────────────

pub struct CreateAccountInput {
    pub kind: AccountKind,
    pub phone: String,
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
}

pub struct CreateAccountUseCase<A: AccountRepository, C: Clock> {
    pub accounts: A,
    pub clock: C,
}

impl<A: AccountRepository, C: Clock> CreateAccountUseCase<A, C> {
    /// New accounts always start pending.
    pub async fn execute(&self, input: CreateAccountInput) -> Result<Account, AuthServiceError> {
        let phone = parse_phone(&input.phone)?;
        let now = self.clock.now();
        let account = Account {
            id: Uuid::now_v7(),
            kind: input.kind,
            phone,
            display_name: input.display_name,
            password_hash: input.password_hash,
            status: AccountStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.accounts.create(&account).await?;
        Ok(account)
    }
}

// ── CompleteSignupVerification ───────────────────────────────────────────────

pub struct CompleteSignupVerificationUseCase<A: AccountRepository, C: Clock> {
    pub accounts: A,
    pub clock: C,
}

impl<A: AccountRepository, C: Clock> CompleteSignupVerificationUseCase<A, C> {
    /// Pending → enabled. A no-op for an already enabled account.
    pub async fn execute(&self, kind: AccountKind, account_id: Uuid) -> Result<(), AuthServiceError> {
        if self
            .accounts
            .enable(kind, account_id, self.clock.now())
            .await?
        {
            return Ok(());
        }
        match self.accounts.find_by_id(kind, account_id).await? {
            Some(_) => Ok(()),
            None => Err(AuthServiceError::AccountNotFound),
        }
    }
}

// ── SetPassword ──────────────────────────────────────────────────────────────

pub struct SetPasswordUseCase<A: AccountRepository, C: Clock> {
    pub accounts: A,
    pub clock: C,
}

impl<A: AccountRepository, C: Clock> SetPasswordUseCase<A, C> {
    /// Allowed in any state. `password_hash` must already be hashed.
    pub async fn execute(
        &self,
        kind: AccountKind,
        account_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthServiceError> {
        let updated = self
            .accounts
            .set_password(kind, account_id, password_hash, self.clock.now())
            .await?;
        if !updated {
            return Err(AuthServiceError::AccountNotFound);
        }
        Ok(())
    }
}

/// Load the account a phone-keyed flow operates on.
pub async fn find_account<A: AccountRepository>(
    accounts: &A,
    kind: AccountKind,
    phone: &str,
) -> Result<Account, AuthServiceError> {
    accounts
        .find_by_phone(kind, phone)
        .await?
        .ok_or(AuthServiceError::AccountNotFound)
}

/// Login precondition shared by password and OTP login.
pub fn ensure_enabled(account: &Account) -> Result<(), AuthServiceError> {
    if !account.status.is_enabled() {
        return Err(AuthServiceError::NotVerified);
    }
    Ok(())
}
