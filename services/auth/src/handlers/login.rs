use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use bazaar_domain::account::AccountKind;

use crate::error::AuthServiceError;
use crate::handlers::{OtpSentResponse, SessionResponse};
use crate::state::AppState;
use crate::usecase::login::{
    OtpLoginInput, OtpLoginUseCase, PasswordLoginInput, PasswordLoginUseCase,
    RequestLoginOtpInput, RequestLoginOtpUseCase,
};

// ── POST /auth/{kind}/login ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PasswordLoginRequest {
    pub phone: String,
    pub password: String,
}

pub async fn password_login(
    State(state): State<AppState>,
    Path(kind): Path<AccountKind>,
    Json(body): Json<PasswordLoginRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AuthServiceError> {
    let usecase = PasswordLoginUseCase {
        accounts: state.account_repo(),
        tokens: state.session_token_repo(),
        clock: state.clock(),
        session_policy: state.session_policy,
        jwt_secret: state.jwt_secret.clone(),
    };
    let session = usecase
        .execute(PasswordLoginInput {
            kind,
            phone: body.phone,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

// ── POST /auth/{kind}/login/otp ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginOtpRequest {
    pub phone: String,
}

pub async fn request_login_otp(
    State(state): State<AppState>,
    Path(kind): Path<AccountKind>,
    Json(body): Json<LoginOtpRequest>,
) -> Result<(StatusCode, Json<OtpSentResponse>), AuthServiceError> {
    let usecase = RequestLoginOtpUseCase {
        accounts: state.account_repo(),
        challenges: state.otp_challenge_repo(),
        delivery: state.otp_delivery(),
        clock: state.clock(),
        otp_policy: state.otp_policy,
    };
    let issued = usecase
        .execute(RequestLoginOtpInput {
            kind,
            phone: body.phone,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(OtpSentResponse::new(&issued, &state.otp_policy)),
    ))
}

// ── POST /auth/{kind}/login/otp/verify ───────────────────────────────────────

#[derive(Deserialize)]
pub struct OtpLoginRequest {
    pub phone: String,
    pub code: String,
}

pub async fn otp_login(
    State(state): State<AppState>,
    Path(kind): Path<AccountKind>,
    Json(body): Json<OtpLoginRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AuthServiceError> {
    let usecase = OtpLoginUseCase {
        accounts: state.account_repo(),
        challenges: state.otp_challenge_repo(),
        tokens: state.session_token_repo(),
        clock: state.clock(),
        otp_policy: state.otp_policy,
        session_policy: state.session_policy,
        jwt_secret: state.jwt_secret.clone(),
    };
    let session = usecase
        .execute(OtpLoginInput {
            kind,
            phone: body.phone,
            code: body.code,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}
