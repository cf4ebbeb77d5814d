use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use bazaar_auth_types::bearer::bearer_token;
use bazaar_auth_types::principal::Principal;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::token::{RevokeAllUseCase, RevokeTokenUseCase};

// ── GET /auth/session ────────────────────────────────────────────────────────

pub async fn current_session(principal: Principal) -> Json<Principal> {
    Json(principal)
}

// ── DELETE /auth/session ─────────────────────────────────────────────────────

/// Logout: revokes only the token on this request.
pub async fn logout(
    State(state): State<AppState>,
    principal: Principal,
    headers: HeaderMap,
) -> Result<StatusCode, AuthServiceError> {
    let raw = bearer_token(&headers).map_err(|_| AuthServiceError::Unauthorized)?;
    let usecase = RevokeTokenUseCase {
        tokens: state.session_token_repo(),
    };
    usecase.execute(principal.account_kind, &raw).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /auth/sessions ────────────────────────────────────────────────────

pub async fn logout_all(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = RevokeAllUseCase {
        tokens: state.session_token_repo(),
    };
    usecase
        .execute(principal.account_kind, principal.account_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
