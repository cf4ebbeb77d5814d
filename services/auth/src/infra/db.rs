use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, SqlErr, sea_query::Expr,
};
use serde_json::json;
use uuid::Uuid;

use bazaar_auth_schema::{accounts, otp_challenges, outbox_events, session_tokens};
use bazaar_domain::account::{AccountKind, AccountStatus};
use bazaar_domain::otp::OtpPurpose;

use crate::domain::repository::{
    AccountRepository, OtpChallengeRepository, OtpDelivery, SessionTokenRepository,
};
use crate::domain::types::{
    Account, IssuedOtp, OTP_ISSUED_EVENT, OtpChallenge, OutboxEvent, SessionToken,
};
use crate::error::AuthServiceError;

fn attempts_column(max_attempts: u32) -> i32 {
    i32::try_from(max_attempts).unwrap_or(i32::MAX)
}

// ── OtpChallenge repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpChallengeRepository {
    pub db: DatabaseConnection,
}

impl OtpChallengeRepository for DbOtpChallengeRepository {
    async fn latest(
        &self,
        phone: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpChallenge>, AuthServiceError> {
        let model = otp_challenges::Entity::find()
            .filter(otp_challenges::Column::Phone.eq(phone))
            .filter(otp_challenges::Column::Purpose.eq(purpose.as_str()))
            .order_by_desc(otp_challenges::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find latest otp challenge")?;
        model.map(challenge_from_model).transpose()
    }

    async fn issued_since(
        &self,
        phone: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, AuthServiceError> {
        let models = otp_challenges::Entity::find()
            .filter(otp_challenges::Column::Phone.eq(phone))
            .filter(otp_challenges::Column::CreatedAt.gte(since))
            .order_by_asc(otp_challenges::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list recent otp challenges")?;
        Ok(models.into_iter().map(|m| m.created_at).collect())
    }

    async fn create(&self, challenge: &OtpChallenge) -> Result<(), AuthServiceError> {
        otp_challenges::ActiveModel {
            id: Set(challenge.id),
            phone: Set(challenge.phone.clone()),
            purpose: Set(challenge.purpose.as_str().to_owned()),
            code: Set(challenge.code.clone()),
            display_name: Set(challenge.display_name.clone()),
            attempts: Set(attempts_column(challenge.attempts)),
            used: Set(challenge.used),
            created_at: Set(challenge.created_at),
            expires_at: Set(challenge.expires_at),
        }
        .insert(&self.db)
        .await
        .context("create otp challenge")?;
        Ok(())
    }

    async fn record_failed_attempt(
        &self,
        id: Uuid,
        max_attempts: u32,
    ) -> Result<bool, AuthServiceError> {
        // Single conditional UPDATE: concurrent guesses can never push attempts past the cap.
        let result = otp_challenges::Entity::update_many()
            .col_expr(
                otp_challenges::Column::Attempts,
                Expr::col(otp_challenges::Column::Attempts).add(1),
            )
            .filter(otp_challenges::Column::Id.eq(id))
            .filter(otp_challenges::Column::Attempts.lt(attempts_column(max_attempts)))
            .exec(&self.db)
            .await
            .context("record failed otp attempt")?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_used(&self, id: Uuid, max_attempts: u32) -> Result<bool, AuthServiceError> {
        let result = otp_challenges::Entity::update_many()
            .col_expr(otp_challenges::Column::Used, Expr::value(true))
            .filter(otp_challenges::Column::Id.eq(id))
            .filter(otp_challenges::Column::Used.eq(false))
            .filter(otp_challenges::Column::Attempts.lt(attempts_column(max_attempts)))
            .exec(&self.db)
            .await
            .context("mark otp challenge used")?;
        Ok(result.rows_affected > 0)
    }

    async fn prune_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthServiceError> {
        let result = otp_challenges::Entity::delete_many()
            .filter(otp_challenges::Column::ExpiresAt.lt(cutoff))
            .exec(&self.db)
            .await
            .context("prune expired otp challenges")?;
        Ok(result.rows_affected)
    }
}

fn challenge_from_model(model: otp_challenges::Model) -> Result<OtpChallenge, AuthServiceError> {
    let purpose = model
        .purpose
        .parse::<OtpPurpose>()
        .context("decode otp challenge purpose")?;
    Ok(OtpChallenge {
        id: model.id,
        phone: model.phone,
        purpose,
        code: model.code,
        display_name: model.display_name,
        attempts: u32::try_from(model.attempts).unwrap_or(0),
        used: model.used,
        created_at: model.created_at,
        expires_at: model.expires_at,
    })
}

// ── Account repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAccountRepository {
    pub db: DatabaseConnection,
}

impl AccountRepository for DbAccountRepository {
    async fn find_by_phone(
        &self,
        kind: AccountKind,
        phone: &str,
    ) -> Result<Option<Account>, AuthServiceError> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::AccountKind.eq(kind.as_str()))
            .filter(accounts::Column::Phone.eq(phone))
            .one(&self.db)
            .await
            .context("find account by phone")?;
        model.map(account_from_model).transpose()
    }

    async fn find_by_id(
        &self,
        kind: AccountKind,
        id: Uuid,
    ) -> Result<Option<Account>, AuthServiceError> {
        let model = accounts::Entity::find_by_id(id)
            .filter(accounts::Column::AccountKind.eq(kind.as_str()))
            .one(&self.db)
            .await
            .context("find account by id")?;
        model.map(account_from_model).transpose()
    }

    async fn create(&self, account: &Account) -> Result<(), AuthServiceError> {
        let result = accounts::ActiveModel {
            id: Set(account.id),
            account_kind: Set(account.kind.as_str().to_owned()),
            phone: Set(account.phone.clone()),
            display_name: Set(account.display_name.clone()),
            password_hash: Set(account.password_hash.clone()),
            status: Set(account.status.as_str().to_owned()),
            created_at: Set(account.created_at),
            updated_at: Set(account.updated_at),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(AuthServiceError::AccountAlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("create account").into()),
        }
    }

    async fn enable(
        &self,
        kind: AccountKind,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Status,
                Expr::value(AccountStatus::Enabled.as_str()),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::AccountKind.eq(kind.as_str()))
            .filter(accounts::Column::Status.eq(AccountStatus::Pending.as_str()))
            .exec(&self.db)
            .await
            .context("enable account")?;
        Ok(result.rows_affected > 0)
    }

    async fn set_password(
        &self,
        kind: AccountKind,
        id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::AccountKind.eq(kind.as_str()))
            .exec(&self.db)
            .await
            .context("set account password")?;
        Ok(result.rows_affected > 0)
    }

    async fn rename_pending(
        &self,
        kind: AccountKind,
        id: Uuid,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::DisplayName, Expr::value(display_name))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::AccountKind.eq(kind.as_str()))
            .filter(accounts::Column::Status.eq(AccountStatus::Pending.as_str()))
            .exec(&self.db)
            .await
            .context("rename pending account")?;
        Ok(result.rows_affected > 0)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn account_from_model(model: accounts::Model) -> Result<Account, AuthServiceError> {
    Ok(Account {
        id: model.id,
        kind: model
            .account_kind
            .parse()
            .context("decode account kind")?,
        phone: model.phone,
        display_name: model.display_name,
        password_hash: model.password_hash,
        status: model.status.parse().context("decode account status")?,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── SessionToken repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSessionTokenRepository {
    pub db: DatabaseConnection,
}

impl SessionTokenRepository for DbSessionTokenRepository {
    async fn insert(&self, token: &SessionToken) -> Result<(), AuthServiceError> {
        session_tokens::ActiveModel {
            id: Set(token.id),
            account_id: Set(token.account_id),
            account_kind: Set(token.account_kind.as_str().to_owned()),
            raw_value: Set(token.raw_value.clone()),
            issued_at: Set(token.issued_at),
            expires_at: Set(token.expires_at),
            revoked: Set(token.revoked),
            expired: Set(token.expired),
        }
        .insert(&self.db)
        .await
        .context("insert session token")?;
        Ok(())
    }

    async fn find_by_raw(
        &self,
        kind: AccountKind,
        raw_value: &str,
    ) -> Result<Option<SessionToken>, AuthServiceError> {
        let model = session_tokens::Entity::find()
            .filter(session_tokens::Column::RawValue.eq(raw_value))
            .filter(session_tokens::Column::AccountKind.eq(kind.as_str()))
            .one(&self.db)
            .await
            .context("find session token")?;
        model.map(token_from_model).transpose()
    }

    async fn revoke_all(
        &self,
        kind: AccountKind,
        account_id: Uuid,
    ) -> Result<u64, AuthServiceError> {
        let result = session_tokens::Entity::update_many()
            .col_expr(session_tokens::Column::Revoked, Expr::value(true))
            .filter(session_tokens::Column::AccountId.eq(account_id))
            .filter(session_tokens::Column::AccountKind.eq(kind.as_str()))
            .filter(session_tokens::Column::Revoked.eq(false))
            .exec(&self.db)
            .await
            .context("revoke all session tokens")?;
        Ok(result.rows_affected)
    }

    async fn revoke(&self, kind: AccountKind, raw_value: &str) -> Result<bool, AuthServiceError> {
        let result = session_tokens::Entity::update_many()
            .col_expr(session_tokens::Column::Revoked, Expr::value(true))
            .filter(session_tokens::Column::RawValue.eq(raw_value))
            .filter(session_tokens::Column::AccountKind.eq(kind.as_str()))
            .filter(session_tokens::Column::Revoked.eq(false))
            .exec(&self.db)
            .await
            .context("revoke session token")?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthServiceError> {
        let result = session_tokens::Entity::update_many()
            .col_expr(session_tokens::Column::Expired, Expr::value(true))
            .filter(session_tokens::Column::Expired.eq(false))
            .filter(session_tokens::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await
            .context("mark session tokens expired")?;
        Ok(result.rows_affected)
    }
}

fn token_from_model(model: session_tokens::Model) -> Result<SessionToken, AuthServiceError> {
    Ok(SessionToken {
        id: model.id,
        account_id: model.account_id,
        account_kind: model
            .account_kind
            .parse()
            .context("decode session token kind")?,
        raw_value: model.raw_value,
        issued_at: model.issued_at,
        expires_at: model.expires_at,
        revoked: model.revoked,
        expired: model.expired,
    })
}

// ── OTP delivery via outbox ──────────────────────────────────────────────────

/// Writes an `otp_issued` outbox row for the SMS worker.
#[derive(Clone)]
pub struct DbOtpDelivery {
    pub db: DatabaseConnection,
}

impl OtpDelivery for DbOtpDelivery {
    async fn deliver(
        &self,
        phone: &str,
        purpose: OtpPurpose,
        otp: &IssuedOtp,
    ) -> Result<(), AuthServiceError> {
        let event = OutboxEvent {
            id: Uuid::now_v7(),
            kind: OTP_ISSUED_EVENT.to_owned(),
            payload: json!({
                "phone": phone,
                "purpose": purpose.as_str(),
                "code": otp.code,
                "expires_at": otp.expires_at,
            }),
            idempotency_key: format!("{OTP_ISSUED_EVENT}:{}", otp.challenge_id),
        };
        insert_outbox_event(&self.db, &event)
            .await
            .context("insert otp outbox event")?;
        Ok(())
    }
}

async fn insert_outbox_event<C: ConnectionTrait>(
    conn: &C,
    event: &OutboxEvent,
) -> Result<(), DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(conn)
    .await?;
    Ok(())
}
