use tracing::info;

use crate::domain::repository::{Clock, OtpChallengeRepository, SessionTokenRepository};
use crate::domain::types::{OtpPolicy, SweepReport};
use crate::error::AuthServiceError;
use crate::usecase::otp::retention_cutoff;

/// Housekeeping run, triggered externally. Validity checks never depend on it.
pub struct SweepUseCase<O: OtpChallengeRepository, T: SessionTokenRepository, C: Clock> {
    pub challenges: O,
    pub tokens: T,
    pub clock: C,
    pub otp_policy: OtpPolicy,
}

impl<O, T, C> SweepUseCase<O, T, C>
where
    O: OtpChallengeRepository,
    T: SessionTokenRepository,
    C: Clock,
{
    pub async fn execute(&self, tokens_only: bool) -> Result<SweepReport, AuthServiceError> {
        let now = self.clock.now();
        let mut report = SweepReport {
            tokens_expired: self.tokens.mark_expired(now).await?,
            ..SweepReport::default()
        };
        if !tokens_only {
            report.challenges_pruned = self
                .challenges
                .prune_expired_before(retention_cutoff(now, &self.otp_policy))
                .await?;
        }
        info!(
            tokens_expired = report.tokens_expired,
            challenges_pruned = report.challenges_pruned,
            "sweep finished"
        );
        Ok(report)
    }
}
