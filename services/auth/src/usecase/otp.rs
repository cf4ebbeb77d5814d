use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use bazaar_domain::otp::OtpPurpose;

use crate::domain::repository::{Clock, OtpChallengeRepository};
use crate::domain::types::{
    IssuedOtp, OtpChallenge, OtpPolicy, RESEND_WINDOW_SECS, VerifiedChallenge,
};
use crate::error::AuthServiceError;
use crate::usecase::code::generate_code;
use crate::usecase::parse_phone;

/// Whole seconds until `remaining` has elapsed, rounded up, at least 1.
fn retry_after_secs(remaining: Duration) -> u64 {
    let millis = remaining.num_milliseconds().max(0);
    u64::try_from((millis + 999) / 1000).unwrap_or(1).max(1)
}

// ── IssueChallenge ───────────────────────────────────────────────────────────

pub struct IssueChallengeInput {
    pub phone: String,
    pub purpose: OtpPurpose,
    pub display_name: Option<String>,
}

pub struct IssueChallengeUseCase<O: OtpChallengeRepository, C: Clock> {
    pub challenges: O,
    pub clock: C,
    pub policy: OtpPolicy,
}

impl<O: OtpChallengeRepository, C: Clock> IssueChallengeUseCase<O, C> {
    pub async fn execute(&self, input: IssueChallengeInput) -> Result<IssuedOtp, AuthServiceError> {
        let phone = parse_phone(&input.phone)?;
        let now = self.clock.now();

        // 1. Cooldown against the latest challenge for this purpose.
        if let Some(latest) = self.challenges.latest(&phone, input.purpose).await? {
            let elapsed = now - latest.created_at;
            if elapsed < self.policy.resend_cooldown {
                info!(%phone, purpose = %input.purpose, "otp resend cooldown");
                return Err(AuthServiceError::RateLimited {
                    retry_after_secs: retry_after_secs(self.policy.resend_cooldown - elapsed),
                });
            }
        }

        // 2. Hourly cap across every purpose for the phone.
        let window = Duration::seconds(RESEND_WINDOW_SECS);
        let recent = self.challenges.issued_since(&phone, now - window).await?;
        if recent.len() as u64 >= self.policy.max_resends_per_hour {
            let oldest = recent.first().copied().unwrap_or(now);
            info!(%phone, issued = recent.len(), "otp hourly cap reached");
            return Err(AuthServiceError::RateLimited {
                retry_after_secs: retry_after_secs(oldest + window - now),
            });
        }

        // 3. Persist and hand back the code.
        let challenge = OtpChallenge {
            id: Uuid::now_v7(),
            phone,
            purpose: input.purpose,
            code: generate_code(self.policy.code_len),
            display_name: input.display_name,
            attempts: 0,
            used: false,
            created_at: now,
            expires_at: now + self.policy.ttl,
        };
        self.challenges.create(&challenge).await?;

        Ok(IssuedOtp {
            challenge_id: challenge.id,
            code: challenge.code,
            expires_at: challenge.expires_at,
        })
    }
}

// ── VerifyChallenge ──────────────────────────────────────────────────────────

pub struct VerifyChallengeInput {
    pub phone: String,
    pub purpose: OtpPurpose,
    pub code: String,
}

pub struct VerifyChallengeUseCase<O: OtpChallengeRepository, C: Clock> {
    pub challenges: O,
    pub clock: C,
    pub policy: OtpPolicy,
}

impl<O: OtpChallengeRepository, C: Clock> VerifyChallengeUseCase<O, C> {
    pub async fn execute(
        &self,
        input: VerifyChallengeInput,
    ) -> Result<VerifiedChallenge, AuthServiceError> {
        let phone = parse_phone(&input.phone)?;
        let max = self.policy.max_verify_attempts;

        // Only the newest challenge counts; issuing a new one supersedes the rest.
        let challenge = self
            .challenges
            .latest(&phone, input.purpose)
            .await?
            .filter(|c| !c.used)
            .ok_or(AuthServiceError::ChallengeNotFound)?;

        // Expiry wins over everything, including a matching code.
        if challenge.is_expired_at(self.clock.now()) {
            return Err(AuthServiceError::ChallengeExpired);
        }
        if challenge.attempts >= max {
            return Err(AuthServiceError::ChallengeLockedOut);
        }

        if !codes_match(&challenge.code, &input.code) {
            if !self.challenges.record_failed_attempt(challenge.id, max).await? {
                return Err(AuthServiceError::ChallengeLockedOut);
            }
            if challenge.attempts + 1 >= max {
                warn!(%phone, purpose = %input.purpose, "otp challenge locked out");
            }
            return Err(AuthServiceError::InvalidCode);
        }

        if !self.challenges.mark_used(challenge.id, max).await? {
            return Err(AuthServiceError::ChallengeNotFound);
        }

        Ok(VerifiedChallenge {
            challenge_id: challenge.id,
            phone,
            purpose: input.purpose,
            display_name: challenge.display_name,
        })
    }
}

fn codes_match(expected: &str, submitted: &str) -> bool {
    !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(submitted.trim().as_bytes()))
}

/// Cutoff before which expired challenges may be pruned.
pub fn retention_cutoff(now: DateTime<Utc>, policy: &OtpPolicy) -> DateTime<Utc> {
    now - policy.retention
}
