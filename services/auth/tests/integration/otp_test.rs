use chrono::Duration;

use bazaar_auth::domain::repository::Clock;
use bazaar_auth::domain::types::OtpPolicy;
use bazaar_auth::error::AuthServiceError;
use bazaar_auth::usecase::otp::{
    IssueChallengeInput, IssueChallengeUseCase, VerifyChallengeInput, VerifyChallengeUseCase,
};
use bazaar_domain::otp::OtpPurpose;

use crate::helpers::{FixedClock, MockChallengeRepo, TEST_PHONE, test_otp_policy};

fn issuer(
    repo: &MockChallengeRepo,
    clock: &FixedClock,
    policy: OtpPolicy,
) -> IssueChallengeUseCase<MockChallengeRepo, FixedClock> {
    IssueChallengeUseCase {
        challenges: repo.clone(),
        clock: clock.clone(),
        policy,
    }
}

fn verifier(
    repo: &MockChallengeRepo,
    clock: &FixedClock,
) -> VerifyChallengeUseCase<MockChallengeRepo, FixedClock> {
    VerifyChallengeUseCase {
        challenges: repo.clone(),
        clock: clock.clone(),
        policy: test_otp_policy(),
    }
}

fn issue_input(purpose: OtpPurpose) -> IssueChallengeInput {
    IssueChallengeInput {
        phone: TEST_PHONE.to_owned(),
        purpose,
        display_name: None,
    }
}

fn verify_input(code: &str) -> VerifyChallengeInput {
    VerifyChallengeInput {
        phone: TEST_PHONE.to_owned(),
        purpose: OtpPurpose::Signup,
        code: code.to_owned(),
    }
}

/// A code guaranteed to differ from `code`.
fn wrong(code: &str) -> String {
    code.chars()
        .map(|c| if c == '0' { '1' } else { '0' })
        .collect()
}

// ── IssueChallenge ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_six_digit_code_with_default_ttl() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();

    let issued = issuer(&repo, &clock, test_otp_policy())
        .execute(issue_input(OtpPurpose::Signup))
        .await
        .unwrap();

    assert_eq!(issued.code.len(), 6);
    assert!(issued.code.bytes().all(|b| b.is_ascii_digit()));
    assert_eq!(issued.expires_at - clock.now(), Duration::minutes(5));

    let stored = repo.challenges_handle();
    let stored = stored.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].attempts, 0);
    assert!(!stored[0].used);
}

#[tokio::test]
async fn should_rate_limit_resend_within_cooldown() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let usecase = issuer(&repo, &clock, test_otp_policy());

    usecase.execute(issue_input(OtpPurpose::Signup)).await.unwrap();
    clock.advance(Duration::seconds(20));

    let result = usecase.execute(issue_input(OtpPurpose::Signup)).await;
    assert!(
        matches!(
            result,
            Err(AuthServiceError::RateLimited {
                retry_after_secs: 40
            })
        ),
        "expected RateLimited(40), got {result:?}"
    );
}

#[tokio::test]
async fn should_allow_resend_after_cooldown() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let usecase = issuer(&repo, &clock, test_otp_policy());

    usecase.execute(issue_input(OtpPurpose::Signup)).await.unwrap();
    clock.advance(Duration::seconds(60));

    assert!(usecase.execute(issue_input(OtpPurpose::Signup)).await.is_ok());
    assert_eq!(repo.challenges_handle().lock().unwrap().len(), 2);
}

#[tokio::test]
async fn should_apply_cooldown_per_purpose() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let usecase = issuer(&repo, &clock, test_otp_policy());

    usecase.execute(issue_input(OtpPurpose::Signup)).await.unwrap();
    assert!(usecase.execute(issue_input(OtpPurpose::Login)).await.is_ok());
}

#[tokio::test]
async fn should_reject_sixth_challenge_within_an_hour() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let usecase = issuer(&repo, &clock, test_otp_policy());

    for _ in 0..5 {
        usecase.execute(issue_input(OtpPurpose::Signup)).await.unwrap();
        clock.advance(Duration::seconds(61));
    }

    let result = usecase.execute(issue_input(OtpPurpose::Signup)).await;
    let Err(AuthServiceError::RateLimited { retry_after_secs }) = result else {
        panic!("expected RateLimited, got {result:?}");
    };
    // Oldest of the five was issued 305s ago.
    assert_eq!(retry_after_secs, 3600 - 305);
}

#[tokio::test]
async fn should_count_every_purpose_towards_hourly_cap() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let usecase = issuer(&repo, &clock, test_otp_policy());

    for purpose in [
        OtpPurpose::Signup,
        OtpPurpose::Login,
        OtpPurpose::PasswordReset,
    ] {
        usecase.execute(issue_input(purpose)).await.unwrap();
    }
    clock.advance(Duration::seconds(61));
    usecase.execute(issue_input(OtpPurpose::Signup)).await.unwrap();
    usecase.execute(issue_input(OtpPurpose::Login)).await.unwrap();

    let result = usecase.execute(issue_input(OtpPurpose::PasswordReset)).await;
    assert!(matches!(result, Err(AuthServiceError::RateLimited { .. })));
}

#[tokio::test]
async fn should_allow_issuance_once_hour_rolls_over() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let usecase = issuer(&repo, &clock, test_otp_policy());

    for _ in 0..5 {
        usecase.execute(issue_input(OtpPurpose::Signup)).await.unwrap();
        clock.advance(Duration::seconds(61));
    }
    clock.advance(Duration::hours(1));

    assert!(usecase.execute(issue_input(OtpPurpose::Signup)).await.is_ok());
}

#[tokio::test]
async fn should_reject_invalid_phone_before_store_access() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();

    let result = issuer(&repo, &clock, test_otp_policy())
        .execute(IssueChallengeInput {
            phone: "12-ab".to_owned(),
            purpose: OtpPurpose::Signup,
            display_name: None,
        })
        .await;

    assert!(matches!(result, Err(AuthServiceError::InvalidPhone)));
    assert!(repo.challenges_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_honour_configured_code_length() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let policy = OtpPolicy {
        code_len: 8,
        ..test_otp_policy()
    };

    let issued = issuer(&repo, &clock, policy)
        .execute(issue_input(OtpPurpose::Login))
        .await
        .unwrap();
    assert_eq!(issued.code.len(), 8);
}

// ── VerifyChallenge ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_verify_correct_code_and_mark_used() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let issued = issuer(&repo, &clock, test_otp_policy())
        .execute(IssueChallengeInput {
            display_name: Some("Asha".to_owned()),
            ..issue_input(OtpPurpose::Signup)
        })
        .await
        .unwrap();

    let verified = verifier(&repo, &clock)
        .execute(verify_input(&issued.code))
        .await
        .unwrap();

    assert_eq!(verified.challenge_id, issued.challenge_id);
    assert_eq!(verified.phone, TEST_PHONE);
    assert_eq!(verified.display_name.as_deref(), Some("Asha"));
    assert!(repo.challenges_handle().lock().unwrap()[0].used);
}

#[tokio::test]
async fn should_not_accept_same_code_twice() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let issued = issuer(&repo, &clock, test_otp_policy())
        .execute(issue_input(OtpPurpose::Signup))
        .await
        .unwrap();
    let usecase = verifier(&repo, &clock);

    usecase.execute(verify_input(&issued.code)).await.unwrap();
    let result = usecase.execute(verify_input(&issued.code)).await;

    assert!(
        matches!(result, Err(AuthServiceError::ChallengeNotFound)),
        "expected ChallengeNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_report_not_found_without_challenge() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();

    let result = verifier(&repo, &clock).execute(verify_input("123456")).await;
    assert!(matches!(result, Err(AuthServiceError::ChallengeNotFound)));
}

#[tokio::test]
async fn should_not_verify_against_other_purpose() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let issued = issuer(&repo, &clock, test_otp_policy())
        .execute(issue_input(OtpPurpose::Login))
        .await
        .unwrap();

    let result = verifier(&repo, &clock).execute(verify_input(&issued.code)).await;
    assert!(matches!(result, Err(AuthServiceError::ChallengeNotFound)));
}

#[tokio::test]
async fn should_reject_expired_challenge_even_with_correct_code() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let issued = issuer(&repo, &clock, test_otp_policy())
        .execute(issue_input(OtpPurpose::Signup))
        .await
        .unwrap();
    clock.advance(Duration::minutes(5));

    let result = verifier(&repo, &clock).execute(verify_input(&issued.code)).await;

    assert!(matches!(result, Err(AuthServiceError::ChallengeExpired)));
    let stored = repo.challenges_handle();
    let stored = stored.lock().unwrap();
    assert_eq!(stored[0].attempts, 0, "expiry is checked before the code");
    assert!(!stored[0].used);
}

#[tokio::test]
async fn should_verify_only_the_latest_challenge() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let usecase = issuer(&repo, &clock, test_otp_policy());
    let first = usecase.execute(issue_input(OtpPurpose::Signup)).await.unwrap();
    clock.advance(Duration::seconds(61));
    let second = usecase.execute(issue_input(OtpPurpose::Signup)).await.unwrap();
    // Keep the two codes apart regardless of what the generator drew.
    let first_code = wrong(&second.code);
    repo.challenges_handle().lock().unwrap()[0].code = first_code.clone();

    let verify = verifier(&repo, &clock);
    let result = verify.execute(verify_input(&first_code)).await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCode)));

    let verified = verify.execute(verify_input(&second.code)).await.unwrap();
    assert_eq!(verified.challenge_id, second.challenge_id);

    let stored = repo.challenges_handle();
    let stored = stored.lock().unwrap();
    assert_eq!(stored[0].id, first.challenge_id);
    assert!(!stored[0].used);
    assert_eq!(stored[1].attempts, 1, "the miss is charged to the newest challenge");
}

#[tokio::test]
async fn should_not_revive_superseded_challenge_once_latest_is_used() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let usecase = issuer(&repo, &clock, test_otp_policy());
    let first = usecase.execute(issue_input(OtpPurpose::Signup)).await.unwrap();
    clock.advance(Duration::seconds(61));
    let second = usecase.execute(issue_input(OtpPurpose::Signup)).await.unwrap();
    let verify = verifier(&repo, &clock);

    let verified = verify.execute(verify_input(&second.code)).await.unwrap();
    assert_eq!(verified.challenge_id, second.challenge_id);

    let replay = verify.execute(verify_input(&second.code)).await;
    assert!(
        matches!(replay, Err(AuthServiceError::ChallengeNotFound)),
        "expected ChallengeNotFound on replay, got {replay:?}"
    );

    let stale = verify.execute(verify_input(&first.code)).await;
    assert!(
        matches!(stale, Err(AuthServiceError::ChallengeNotFound)),
        "expected ChallengeNotFound for superseded code, got {stale:?}"
    );

    let stored = repo.challenges_handle();
    let stored = stored.lock().unwrap();
    assert!(!stored[0].used);
    assert_eq!(stored[0].attempts, 0, "superseded challenge is never consulted");
    assert_eq!(stored[1].attempts, 0);
}

#[tokio::test]
async fn should_not_resurrect_expired_challenge_behind_used_one() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let old = issuer(&repo, &clock, test_otp_policy())
        .execute(issue_input(OtpPurpose::Signup))
        .await
        .unwrap();
    clock.advance(Duration::minutes(10));

    let result = verifier(&repo, &clock).execute(verify_input(&old.code)).await;
    assert!(matches!(result, Err(AuthServiceError::ChallengeExpired)));

    let fresh = issuer(&repo, &clock, test_otp_policy())
        .execute(issue_input(OtpPurpose::Signup))
        .await
        .unwrap();
    let verified = verifier(&repo, &clock)
        .execute(verify_input(&fresh.code))
        .await
        .unwrap();
    assert_eq!(verified.challenge_id, fresh.challenge_id);

    // Nothing is pending once the newest challenge is consumed.
    let result = verifier(&repo, &clock).execute(verify_input(&old.code)).await;
    assert!(matches!(result, Err(AuthServiceError::ChallengeNotFound)));
}

#[tokio::test]
async fn should_count_wrong_guesses() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let issued = issuer(&repo, &clock, test_otp_policy())
        .execute(issue_input(OtpPurpose::Signup))
        .await
        .unwrap();

    let result = verifier(&repo, &clock)
        .execute(verify_input(&wrong(&issued.code)))
        .await;

    assert!(matches!(result, Err(AuthServiceError::InvalidCode)));
    assert_eq!(repo.challenges_handle().lock().unwrap()[0].attempts, 1);
}

#[tokio::test]
async fn should_lock_out_after_max_wrong_attempts() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let issued = issuer(&repo, &clock, test_otp_policy())
        .execute(issue_input(OtpPurpose::Signup))
        .await
        .unwrap();
    let usecase = verifier(&repo, &clock);

    for _ in 0..5 {
        let result = usecase.execute(verify_input(&wrong(&issued.code))).await;
        assert!(matches!(result, Err(AuthServiceError::InvalidCode)));
    }

    let result = usecase.execute(verify_input(&issued.code)).await;
    assert!(
        matches!(result, Err(AuthServiceError::ChallengeLockedOut)),
        "expected ChallengeLockedOut, got {result:?}"
    );

    let stored = repo.challenges_handle();
    let stored = stored.lock().unwrap();
    assert_eq!(stored[0].attempts, 5, "attempts never exceed the cap");
    assert!(!stored[0].used);
}

#[tokio::test]
async fn should_keep_lockout_on_further_wrong_guesses() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let issued = issuer(&repo, &clock, test_otp_policy())
        .execute(issue_input(OtpPurpose::Signup))
        .await
        .unwrap();
    let usecase = verifier(&repo, &clock);
    for _ in 0..5 {
        let _ = usecase.execute(verify_input(&wrong(&issued.code))).await;
    }

    let result = usecase.execute(verify_input(&wrong(&issued.code))).await;
    assert!(matches!(result, Err(AuthServiceError::ChallengeLockedOut)));
    assert_eq!(repo.challenges_handle().lock().unwrap()[0].attempts, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_cap_attempts_under_concurrent_wrong_guesses() {
    let repo = MockChallengeRepo::empty();
    let clock = FixedClock::new();
    let issued = issuer(&repo, &clock, test_otp_policy())
        .execute(issue_input(OtpPurpose::Signup))
        .await
        .unwrap();
    let guess = wrong(&issued.code);

    let mut guesses = tokio::task::JoinSet::new();
    for _ in 0..12 {
        let usecase = verifier(&repo, &clock);
        let guess = guess.clone();
        guesses.spawn(async move { usecase.execute(verify_input(&guess)).await });
    }

    let mut invalid = 0;
    while let Some(joined) = guesses.join_next().await {
        match joined.unwrap() {
            Err(AuthServiceError::InvalidCode) => invalid += 1,
            Err(AuthServiceError::ChallengeLockedOut) => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(invalid, 5, "only the first five misses are charged");
    assert_eq!(repo.challenges_handle().lock().unwrap()[0].attempts, 5);

    let result = verifier(&repo, &clock)
        .execute(verify_input(&issued.code))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::ChallengeLockedOut)),
        "expected ChallengeLockedOut, got {result:?}"
    );
    assert!(!repo.challenges_handle().lock().unwrap()[0].used);
}
