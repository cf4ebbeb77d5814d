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
use crate::usecase::signup::{
    CompleteSignupInput, CompleteSignupUseCase, RequestSignupInput, RequestSignupUseCase,
};

// ── POST /auth/{kind}/signup ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupRequest {
    pub phone: String,
    pub display_name: Option<String>,
}

pub async fn request_signup(
    State(state): State<AppState>,
    Path(kind): Path<AccountKind>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<OtpSentResponse>), AuthServiceError> {
    let usecase = RequestSignupUseCase {
        accounts: state.account_repo(),
        challenges: state.otp_challenge_repo(),
        delivery: state.otp_delivery(),
        clock: state.clock(),
        otp_policy: state.otp_policy,
    };
    let issued = usecase
        .execute(RequestSignupInput {
            kind,
            phone: body.phone,
            display_name: body.display_name,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(OtpSentResponse::new(&issued, &state.otp_policy)),
    ))
}

// ── POST /auth/{kind}/signup/verify ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupVerifyRequest {
    pub phone: String,
    pub code: String,
    pub password: Option<String>,
}

pub async fn complete_signup(
    State(state): State<AppState>,
    Path(kind): Path<AccountKind>,
    Json(body): Json<SignupVerifyRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AuthServiceError> {
    let usecase = CompleteSignupUseCase {
        accounts: state.account_repo(),
        challenges: state.otp_challenge_repo(),
        tokens: state.session_token_repo(),
        clock: state.clock(),
        otp_policy: state.otp_policy,
        session_policy: state.session_policy,
        jwt_secret: state.jwt_secret.clone(),
    };
    let session = usecase
        .execute(CompleteSignupInput {
            kind,
            phone: body.phone,
            code: body.code,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}
