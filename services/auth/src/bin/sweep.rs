//! One-shot housekeeping run for an external scheduler.

use anyhow::Context as _;
use clap::Parser;
use sea_orm::Database;

use bazaar_auth::config::otp_policy_from_env;
use bazaar_auth::infra::clock::SystemClock;
use bazaar_auth::infra::db::{DbOtpChallengeRepository, DbSessionTokenRepository};
use bazaar_auth::usecase::sweep::SweepUseCase;
use bazaar_core::tracing::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "auth-sweep", about = "Flag expired session tokens and prune old OTP challenges")]
struct Args {
    /// Only flag expired session tokens; keep OTP challenges.
    #[arg(long)]
    tokens_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");
    let args = Args::parse();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;

    let db = Database::connect(&database_url).await?;
    let usecase = SweepUseCase {
        challenges: DbOtpChallengeRepository { db: db.clone() },
        tokens: DbSessionTokenRepository { db },
        clock: SystemClock,
        otp_policy: otp_policy_from_env(),
    };
    usecase.execute(args.tokens_only).await?;
    Ok(())
}
