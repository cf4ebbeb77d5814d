use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use bazaar_auth_types::principal::Principal;
use bazaar_domain::account::AccountKind;

use crate::error::AuthServiceError;
use crate::handlers::OtpSentResponse;
use crate::state::AppState;
use crate::usecase::password::{
    ChangePasswordUseCase, RequestPasswordResetInput, RequestPasswordResetUseCase,
    ResetPasswordInput, ResetPasswordUseCase,
};

// ── POST /auth/{kind}/password/reset ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub phone: String,
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Path(kind): Path<AccountKind>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<(StatusCode, Json<OtpSentResponse>), AuthServiceError> {
    let usecase = RequestPasswordResetUseCase {
        accounts: state.account_repo(),
        challenges: state.otp_challenge_repo(),
        delivery: state.otp_delivery(),
        clock: state.clock(),
        otp_policy: state.otp_policy,
    };
    let issued = usecase
        .execute(RequestPasswordResetInput {
            kind,
            phone: body.phone,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(OtpSentResponse::new(&issued, &state.otp_policy)),
    ))
}

// ── POST /auth/{kind}/password/reset/verify ──────────────────────────────────

#[derive(Deserialize)]
pub struct PasswordResetVerifyRequest {
    pub phone: String,
    pub code: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(kind): Path<AccountKind>,
    Json(body): Json<PasswordResetVerifyRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = ResetPasswordUseCase {
        accounts: state.account_repo(),
        challenges: state.otp_challenge_repo(),
        clock: state.clock(),
        otp_policy: state.otp_policy,
    };
    usecase
        .execute(ResetPasswordInput {
            kind,
            phone: body.phone,
            code: body.code,
            new_password: body.new_password,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── PUT /auth/password ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = ChangePasswordUseCase {
        accounts: state.account_repo(),
        clock: state.clock(),
    };
    usecase.execute(principal, &body.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}
