use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::gate::GateOutcome;

/// Authentication gate. Public paths pass through; everything else needs a live
/// session token and gets a [`Principal`] in its extensions.
///
/// [`Principal`]: bazaar_auth_types::principal::Principal
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthServiceError> {
    let outcome = state
        .gate()
        .execute(request.uri().path(), request.headers())
        .await
        .inspect_err(|e| {
            if e.is_token_failure() {
                debug!(reason = %e, path = %request.uri().path(), "gate rejected request");
            }
        })?;
    if let GateOutcome::Authenticated(principal) = outcome {
        request.extensions_mut().insert(principal);
    }
    Ok(next.run(request).await)
}
