use chrono::Duration;

use crate::domain::types::{OtpPolicy, SessionPolicy};
use crate::usecase::gate::PublicPaths;

/// Allow-list used when `PUBLIC_PATHS` is unset.
pub const DEFAULT_PUBLIC_PATHS: &str = "/healthz,/readyz,/auth/customer,/auth/seller,/store";

/// Auth service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing session tokens.
    pub jwt_secret: String,
    /// TCP port to listen on (default 3112). Env var: `AUTH_PORT`.
    pub auth_port: u16,
    pub otp_policy: OtpPolicy,
    pub session_policy: SessionPolicy,
    /// Env var: `PUBLIC_PATHS`, comma-separated prefixes.
    pub public_paths: PublicPaths,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_secs_or(name: &str, default: Duration) -> Duration {
    Duration::seconds(env_or(name, default.num_seconds()))
}

/// Shortest code the service will issue.
pub const MIN_OTP_LENGTH: usize = 4;

/// Longest code the service will issue.
pub const MAX_OTP_LENGTH: usize = 10;

/// Pull out-of-range OTP settings back to usable values.
fn clamp_otp_policy(policy: OtpPolicy) -> OtpPolicy {
    OtpPolicy {
        code_len: policy.code_len.clamp(MIN_OTP_LENGTH, MAX_OTP_LENGTH),
        ttl: policy.ttl.max(Duration::seconds(1)),
        max_resends_per_hour: policy.max_resends_per_hour.max(1),
        max_verify_attempts: policy.max_verify_attempts.max(1),
        ..policy
    }
}

/// OTP limits from `OTP_*` variables. Also read by the sweep binary, which needs no secret.
pub fn otp_policy_from_env() -> OtpPolicy {
    let default = OtpPolicy::default();
    clamp_otp_policy(OtpPolicy {
        code_len: env_or("OTP_LENGTH", default.code_len),
        ttl: env_secs_or("OTP_TTL_SECS", default.ttl),
        resend_cooldown: env_secs_or("OTP_RESEND_COOLDOWN_SECS", default.resend_cooldown),
        max_resends_per_hour: env_or("OTP_MAX_RESENDS_PER_HOUR", default.max_resends_per_hour),
        max_verify_attempts: env_or("OTP_MAX_VERIFY_ATTEMPTS", default.max_verify_attempts),
        retention: env_secs_or("OTP_RETENTION_SECS", default.retention),
    })
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let session_default = SessionPolicy::default();
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            auth_port: env_or("AUTH_PORT", 3112),
            otp_policy: otp_policy_from_env(),
            session_policy: SessionPolicy {
                ttl: env_secs_or("SESSION_TTL_SECS", session_default.ttl),
            },
            public_paths: PublicPaths::from_csv(
                &std::env::var("PUBLIC_PATHS").unwrap_or_else(|_| DEFAULT_PUBLIC_PATHS.to_owned()),
            ),
        }
    }
}
