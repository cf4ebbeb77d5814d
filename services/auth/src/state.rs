use sea_orm::DatabaseConnection;

use crate::domain::types::{OtpPolicy, SessionPolicy};
use crate::infra::clock::SystemClock;
use crate::infra::db::{
    DbAccountRepository, DbOtpChallengeRepository, DbOtpDelivery, DbSessionTokenRepository,
};
use crate::usecase::gate::{GateUseCase, PublicPaths};
use crate::usecase::token::ValidateTokenUseCase;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub otp_policy: OtpPolicy,
    pub session_policy: SessionPolicy,
    pub public_paths: PublicPaths,
}

impl AppState {
    pub fn account_repo(&self) -> DbAccountRepository {
        DbAccountRepository {
            db: self.db.clone(),
        }
    }

    pub fn otp_challenge_repo(&self) -> DbOtpChallengeRepository {
        DbOtpChallengeRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_token_repo(&self) -> DbSessionTokenRepository {
        DbSessionTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn otp_delivery(&self) -> DbOtpDelivery {
        DbOtpDelivery {
            db: self.db.clone(),
        }
    }

    pub fn clock(&self) -> SystemClock {
        SystemClock
    }

    pub fn gate(
        &self,
    ) -> GateUseCase<DbAccountRepository, DbSessionTokenRepository, SystemClock> {
        GateUseCase {
            public_paths: self.public_paths.clone(),
            validator: ValidateTokenUseCase {
                accounts: self.account_repo(),
                tokens: self.session_token_repo(),
                clock: self.clock(),
                jwt_secret: self.jwt_secret.clone(),
            },
        }
    }
}
