use chrono::Duration;

use bazaar_auth::domain::types::{AuthenticatedSession, SessionPolicy};
use bazaar_auth::error::AuthServiceError;
use bazaar_auth::usecase::login::{
    OtpLoginInput, OtpLoginUseCase, PasswordLoginInput, PasswordLoginUseCase,
    RequestLoginOtpInput, RequestLoginOtpUseCase,
};
use bazaar_auth::usecase::password::{
    ChangePasswordUseCase, RequestPasswordResetInput, RequestPasswordResetUseCase,
    ResetPasswordInput, ResetPasswordUseCase,
};
use bazaar_auth::usecase::signup::{
    CompleteSignupInput, CompleteSignupUseCase, RequestSignupInput, RequestSignupUseCase,
};
use bazaar_domain::account::{AccountKind, AccountStatus};
use bazaar_domain::otp::OtpPurpose;
use bazaar_testing::auth::MockPrincipal;

use crate::helpers::{
    FixedClock, MockAccountRepo, MockChallengeRepo, MockDelivery, MockTokenRepo, TEST_JWT_SECRET,
    TEST_PHONE, test_otp_policy, validator,
};

/// Shared stores and clock, with one builder per flow.
#[derive(Default)]
struct Harness {
    accounts: MockAccountRepo,
    challenges: MockChallengeRepo,
    tokens: MockTokenRepo,
    delivery: MockDelivery,
    clock: FixedClock,
}

impl Harness {
    fn request_signup(
        &self,
    ) -> RequestSignupUseCase<MockAccountRepo, MockChallengeRepo, MockDelivery, FixedClock> {
        RequestSignupUseCase {
            accounts: self.accounts.clone(),
            challenges: self.challenges.clone(),
            delivery: self.delivery.clone(),
            clock: self.clock.clone(),
            otp_policy: test_otp_policy(),
        }
    }

    fn complete_signup(
        &self,
    ) -> CompleteSignupUseCase<MockAccountRepo, MockChallengeRepo, MockTokenRepo, FixedClock> {
        CompleteSignupUseCase {
            accounts: self.accounts.clone(),
            challenges: self.challenges.clone(),
            tokens: self.tokens.clone(),
            clock: self.clock.clone(),
            otp_policy: test_otp_policy(),
            session_policy: SessionPolicy::default(),
            jwt_secret: TEST_JWT_SECRET.to_owned(),
        }
    }

    fn password_login(&self) -> PasswordLoginUseCase<MockAccountRepo, MockTokenRepo, FixedClock> {
        PasswordLoginUseCase {
            accounts: self.accounts.clone(),
            tokens: self.tokens.clone(),
            clock: self.clock.clone(),
            session_policy: SessionPolicy::default(),
            jwt_secret: TEST_JWT_SECRET.to_owned(),
        }
    }

    fn request_login_otp(
        &self,
    ) -> RequestLoginOtpUseCase<MockAccountRepo, MockChallengeRepo, MockDelivery, FixedClock> {
        RequestLoginOtpUseCase {
            accounts: self.accounts.clone(),
            challenges: self.challenges.clone(),
            delivery: self.delivery.clone(),
            clock: self.clock.clone(),
            otp_policy: test_otp_policy(),
        }
    }

    fn otp_login(
        &self,
    ) -> OtpLoginUseCase<MockAccountRepo, MockChallengeRepo, MockTokenRepo, FixedClock> {
        OtpLoginUseCase {
            accounts: self.accounts.clone(),
            challenges: self.challenges.clone(),
            tokens: self.tokens.clone(),
            clock: self.clock.clone(),
            otp_policy: test_otp_policy(),
            session_policy: SessionPolicy::default(),
            jwt_secret: TEST_JWT_SECRET.to_owned(),
        }
    }

    fn request_password_reset(
        &self,
    ) -> RequestPasswordResetUseCase<MockAccountRepo, MockChallengeRepo, MockDelivery, FixedClock>
    {
        RequestPasswordResetUseCase {
            accounts: self.accounts.clone(),
            challenges: self.challenges.clone(),
            delivery: self.delivery.clone(),
            clock: self.clock.clone(),
            otp_policy: test_otp_policy(),
        }
    }

    fn reset_password(&self) -> ResetPasswordUseCase<MockAccountRepo, MockChallengeRepo, FixedClock> {
        ResetPasswordUseCase {
            accounts: self.accounts.clone(),
            challenges: self.challenges.clone(),
            clock: self.clock.clone(),
            otp_policy: test_otp_policy(),
        }
    }

    /// Skip past the resend cooldown.
    fn wait_cooldown(&self) {
        self.clock.advance(Duration::seconds(61));
    }

    /// Request + complete signup, returning the first session.
    async fn sign_up(&self, kind: AccountKind, password: Option<&str>) -> AuthenticatedSession {
        self.request_signup()
            .execute(RequestSignupInput {
                kind,
                phone: TEST_PHONE.to_owned(),
                display_name: Some("Asha".to_owned()),
            })
            .await
            .unwrap();
        self.complete_signup()
            .execute(CompleteSignupInput {
                kind,
                phone: TEST_PHONE.to_owned(),
                code: self.delivery.last_code(),
                password: password.map(str::to_owned),
            })
            .await
            .unwrap()
    }

    async fn login_with_password(
        &self,
        kind: AccountKind,
        password: &str,
    ) -> Result<AuthenticatedSession, AuthServiceError> {
        self.password_login()
            .execute(PasswordLoginInput {
                kind,
                phone: TEST_PHONE.to_owned(),
                password: password.to_owned(),
            })
            .await
    }

    async fn login_with_otp(&self, kind: AccountKind) -> AuthenticatedSession {
        self.request_login_otp()
            .execute(RequestLoginOtpInput {
                kind,
                phone: TEST_PHONE.to_owned(),
            })
            .await
            .unwrap();
        self.otp_login()
            .execute(OtpLoginInput {
                kind,
                phone: TEST_PHONE.to_owned(),
                code: self.delivery.last_code(),
            })
            .await
            .unwrap()
    }

    async fn is_live(&self, session: &AuthenticatedSession) -> bool {
        validator(&self.accounts, &self.tokens, &self.clock)
            .execute(&session.token.raw_value, session.account.kind)
            .await
            .is_ok()
    }
}

// ── Signup ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_sign_up_customer_end_to_end() {
    let h = Harness::default();

    let issued = h
        .request_signup()
        .execute(RequestSignupInput {
            kind: AccountKind::Customer,
            phone: "98765 43210".to_owned(),
            display_name: Some("Asha".to_owned()),
        })
        .await
        .unwrap();

    {
        let accounts = h.accounts.accounts_handle();
        let accounts = accounts.lock().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].status, AccountStatus::Pending);
        assert_eq!(accounts[0].phone, TEST_PHONE);
        assert_eq!(accounts[0].password_hash, None);
    }
    {
        let sent = h.delivery.sent_handle();
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, TEST_PHONE);
        assert_eq!(sent[0].1, OtpPurpose::Signup);
        assert_eq!(sent[0].2.code, issued.code);
    }

    let session = h
        .complete_signup()
        .execute(CompleteSignupInput {
            kind: AccountKind::Customer,
            phone: TEST_PHONE.to_owned(),
            code: issued.code,
            password: Some("hunter2hunter2".to_owned()),
        })
        .await
        .unwrap();

    assert_eq!(session.account.status, AccountStatus::Enabled);
    assert_eq!(session.account.display_name.as_deref(), Some("Asha"));
    assert!(session.account.password_hash.is_some());
    assert_eq!(session.token.account_id, session.account.id);
    assert_eq!(h.tokens.live_count(session.account.id), 1);
    assert!(h.is_live(&session).await);
}

#[tokio::test]
async fn should_resend_signup_code_for_pending_account() {
    let h = Harness::default();
    let input = || RequestSignupInput {
        kind: AccountKind::Seller,
        phone: TEST_PHONE.to_owned(),
        display_name: None,
    };

    h.request_signup().execute(input()).await.unwrap();
    h.wait_cooldown();
    h.request_signup().execute(input()).await.unwrap();

    assert_eq!(h.accounts.accounts_handle().lock().unwrap().len(), 1);
    assert_eq!(h.delivery.sent_handle().lock().unwrap().len(), 2);
}

#[tokio::test]
async fn should_keep_name_from_latest_signup_request() {
    let h = Harness::default();
    let input = |name: &str| RequestSignupInput {
        kind: AccountKind::Customer,
        phone: TEST_PHONE.to_owned(),
        display_name: Some(name.to_owned()),
    };

    h.request_signup().execute(input("Asha")).await.unwrap();
    h.wait_cooldown();
    h.request_signup().execute(input("Ravi")).await.unwrap();

    let session = h
        .complete_signup()
        .execute(CompleteSignupInput {
            kind: AccountKind::Customer,
            phone: TEST_PHONE.to_owned(),
            code: h.delivery.last_code(),
            password: None,
        })
        .await
        .unwrap();

    assert_eq!(session.account.display_name.as_deref(), Some("Ravi"));
    assert_eq!(
        h.accounts.accounts_handle().lock().unwrap()[0]
            .display_name
            .as_deref(),
        Some("Ravi")
    );
}

#[tokio::test]
async fn should_rate_limit_signup_resend() {
    let h = Harness::default();
    let input = || RequestSignupInput {
        kind: AccountKind::Seller,
        phone: TEST_PHONE.to_owned(),
        display_name: None,
    };

    h.request_signup().execute(input()).await.unwrap();
    let result = h.request_signup().execute(input()).await;

    assert!(matches!(result, Err(AuthServiceError::RateLimited { .. })));
    assert_eq!(h.delivery.sent_handle().lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_reject_signup_for_enabled_account() {
    let h = Harness::default();
    h.sign_up(AccountKind::Customer, None).await;
    h.wait_cooldown();

    let result = h
        .request_signup()
        .execute(RequestSignupInput {
            kind: AccountKind::Customer,
            phone: TEST_PHONE.to_owned(),
            display_name: None,
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::AccountAlreadyExists)),
        "expected AccountAlreadyExists, got {result:?}"
    );
}

#[tokio::test]
async fn should_allow_seller_signup_with_customer_phone() {
    let h = Harness::default();
    let customer = h.sign_up(AccountKind::Customer, None).await;
    h.wait_cooldown();

    let seller = h.sign_up(AccountKind::Seller, None).await;

    assert_ne!(customer.account.id, seller.account.id);
    assert_eq!(seller.account.kind, AccountKind::Seller);
    assert!(h.is_live(&customer).await);
    assert!(h.is_live(&seller).await);
}

#[tokio::test]
async fn should_leave_account_pending_on_wrong_code() {
    let h = Harness::default();
    h.request_signup()
        .execute(RequestSignupInput {
            kind: AccountKind::Customer,
            phone: TEST_PHONE.to_owned(),
            display_name: None,
        })
        .await
        .unwrap();
    let wrong: String = h
        .delivery
        .last_code()
        .chars()
        .map(|c| if c == '9' { '8' } else { '9' })
        .collect();

    let result = h
        .complete_signup()
        .execute(CompleteSignupInput {
            kind: AccountKind::Customer,
            phone: TEST_PHONE.to_owned(),
            code: wrong,
            password: Some("never-stored".to_owned()),
        })
        .await;

    assert!(matches!(result, Err(AuthServiceError::InvalidCode)));
    let accounts = h.accounts.accounts_handle();
    let accounts = accounts.lock().unwrap();
    assert_eq!(accounts[0].status, AccountStatus::Pending);
    assert_eq!(accounts[0].password_hash, None);
    assert!(h.tokens.tokens_handle().lock().unwrap().is_empty());
}

// ── Password login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_log_in_with_password_after_signup() {
    let h = Harness::default();
    let signup = h.sign_up(AccountKind::Seller, Some("correct horse")).await;

    let session = h
        .login_with_password(AccountKind::Seller, "correct horse")
        .await
        .unwrap();

    assert_eq!(session.account.id, signup.account.id);
    assert!(h.is_live(&session).await);
}

#[tokio::test]
async fn should_keep_existing_sessions_on_password_login() {
    let h = Harness::default();
    let first = h.sign_up(AccountKind::Customer, Some("pw-one-two")).await;

    let second = h
        .login_with_password(AccountKind::Customer, "pw-one-two")
        .await
        .unwrap();

    assert!(h.is_live(&first).await);
    assert!(h.is_live(&second).await);
    assert_eq!(h.tokens.live_count(first.account.id), 2);
}

#[tokio::test]
async fn should_reject_wrong_password() {
    let h = Harness::default();
    h.sign_up(AccountKind::Customer, Some("right-password")).await;

    let result = h
        .login_with_password(AccountKind::Customer, "wrong-password")
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn should_reject_unknown_phone_as_bad_credentials() {
    let h = Harness::default();

    let result = h.login_with_password(AccountKind::Customer, "whatever").await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn should_reject_password_login_without_password_set() {
    let h = Harness::default();
    h.sign_up(AccountKind::Customer, None).await;

    let result = h.login_with_password(AccountKind::Customer, "").await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn should_refuse_password_login_for_pending_account() {
    let h = Harness::default();
    h.request_signup()
        .execute(RequestSignupInput {
            kind: AccountKind::Seller,
            phone: TEST_PHONE.to_owned(),
            display_name: None,
        })
        .await
        .unwrap();
    let account = h.accounts.accounts_handle().lock().unwrap()[0].clone();
    bazaar_auth::usecase::account::SetPasswordUseCase {
        accounts: h.accounts.clone(),
        clock: h.clock.clone(),
    }
    .execute(
        AccountKind::Seller,
        account.id,
        &bazaar_auth::password::hash_password("pending-pw").unwrap(),
    )
    .await
    .unwrap();

    let result = h.login_with_password(AccountKind::Seller, "pending-pw").await;
    assert!(
        matches!(result, Err(AuthServiceError::NotVerified)),
        "expected NotVerified, got {result:?}"
    );
    assert!(h.tokens.tokens_handle().lock().unwrap().is_empty());
}

// ── OTP login ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_revoke_prior_sessions_on_otp_login() {
    let h = Harness::default();
    let first = h.sign_up(AccountKind::Customer, Some("pw-pw-pw")).await;
    let second = h
        .login_with_password(AccountKind::Customer, "pw-pw-pw")
        .await
        .unwrap();
    h.wait_cooldown();

    let third = h.login_with_otp(AccountKind::Customer).await;

    assert!(!h.is_live(&first).await);
    assert!(!h.is_live(&second).await);
    assert!(h.is_live(&third).await);
    assert_eq!(h.tokens.live_count(third.account.id), 1);
}

#[tokio::test]
async fn should_refuse_login_otp_for_pending_account() {
    let h = Harness::default();
    h.request_signup()
        .execute(RequestSignupInput {
            kind: AccountKind::Customer,
            phone: TEST_PHONE.to_owned(),
            display_name: None,
        })
        .await
        .unwrap();
    h.wait_cooldown();

    let result = h
        .request_login_otp()
        .execute(RequestLoginOtpInput {
            kind: AccountKind::Customer,
            phone: TEST_PHONE.to_owned(),
        })
        .await;

    assert!(matches!(result, Err(AuthServiceError::NotVerified)));
    assert_eq!(h.delivery.sent_handle().lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_refuse_login_otp_for_unknown_account() {
    let h = Harness::default();

    let result = h
        .request_login_otp()
        .execute(RequestLoginOtpInput {
            kind: AccountKind::Seller,
            phone: TEST_PHONE.to_owned(),
        })
        .await;
    assert!(matches!(result, Err(AuthServiceError::AccountNotFound)));
}

#[tokio::test]
async fn should_not_accept_reset_code_for_login() {
    let h = Harness::default();
    h.sign_up(AccountKind::Customer, None).await;
    h.wait_cooldown();
    h.request_password_reset()
        .execute(RequestPasswordResetInput {
            kind: AccountKind::Customer,
            phone: TEST_PHONE.to_owned(),
        })
        .await
        .unwrap();

    let result = h
        .otp_login()
        .execute(OtpLoginInput {
            kind: AccountKind::Customer,
            phone: TEST_PHONE.to_owned(),
            code: h.delivery.last_code(),
        })
        .await;
    assert!(matches!(result, Err(AuthServiceError::ChallengeNotFound)));
}

// ── Password reset and change ────────────────────────────────────────────────

#[tokio::test]
async fn should_reset_password_via_otp() {
    let h = Harness::default();
    let before = h.sign_up(AccountKind::Seller, Some("old-password")).await;
    h.wait_cooldown();

    h.request_password_reset()
        .execute(RequestPasswordResetInput {
            kind: AccountKind::Seller,
            phone: TEST_PHONE.to_owned(),
        })
        .await
        .unwrap();
    h.reset_password()
        .execute(ResetPasswordInput {
            kind: AccountKind::Seller,
            phone: TEST_PHONE.to_owned(),
            code: h.delivery.last_code(),
            new_password: "new-password".to_owned(),
        })
        .await
        .unwrap();

    assert!(matches!(
        h.login_with_password(AccountKind::Seller, "old-password").await,
        Err(AuthServiceError::InvalidCredentials)
    ));
    assert!(
        h.login_with_password(AccountKind::Seller, "new-password")
            .await
            .is_ok()
    );
    // Reset leaves existing sessions alone.
    assert!(h.is_live(&before).await);
}

#[tokio::test]
async fn should_reject_reset_request_for_unknown_account() {
    let h = Harness::default();

    let result = h
        .request_password_reset()
        .execute(RequestPasswordResetInput {
            kind: AccountKind::Customer,
            phone: TEST_PHONE.to_owned(),
        })
        .await;
    assert!(matches!(result, Err(AuthServiceError::AccountNotFound)));
    assert!(h.delivery.sent_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_change_password_for_principal() {
    let h = Harness::default();
    let session = h.sign_up(AccountKind::Customer, Some("first-pw")).await;

    ChangePasswordUseCase {
        accounts: h.accounts.clone(),
        clock: h.clock.clone(),
    }
    .execute(
        MockPrincipal::new(session.account.id, AccountKind::Customer).principal(),
        "second-pw",
    )
    .await
    .unwrap();

    assert!(
        h.login_with_password(AccountKind::Customer, "second-pw")
            .await
            .is_ok()
    );
    assert!(h.is_live(&session).await);
}

#[tokio::test]
async fn should_not_change_password_across_kinds() {
    let h = Harness::default();
    let session = h.sign_up(AccountKind::Customer, None).await;

    let result = ChangePasswordUseCase {
        accounts: h.accounts.clone(),
        clock: h.clock.clone(),
    }
    .execute(
        MockPrincipal::new(session.account.id, AccountKind::Seller).principal(),
        "whatever",
    )
    .await;
    assert!(matches!(result, Err(AuthServiceError::AccountNotFound)));
}
