use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use bazaar_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    health::{healthz, readyz},
    login::{otp_login, password_login, request_login_otp},
    password::{change_password, request_password_reset, reset_password},
    session::{current_session, logout, logout_all},
    signup::{complete_signup, request_signup},
};
use crate::middleware::authenticate;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Signup
        .route("/auth/{kind}/signup", post(request_signup))
        .route("/auth/{kind}/signup/verify", post(complete_signup))
        // Login
        .route("/auth/{kind}/login", post(password_login))
        .route("/auth/{kind}/login/otp", post(request_login_otp))
        .route("/auth/{kind}/login/otp/verify", post(otp_login))
        // Password
        .route("/auth/{kind}/password/reset", post(request_password_reset))
        .route("/auth/{kind}/password/reset/verify", post(reset_password))
        .route("/auth/password", put(change_password))
        // Sessions
        .route("/auth/session", get(current_session))
        .route("/auth/session", delete(logout))
        .route("/auth/sessions", delete(logout_all))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
        .with_state(state)
}
