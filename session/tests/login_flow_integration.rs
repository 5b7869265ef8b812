//! Integration tests for the login-flow state machine.
//!
//! Each test drives the real store (reducers + effect execution) against
//! mock providers and walks a complete screen sequence.

#![allow(clippy::unwrap_used)] // Test code can unwrap

use std::collections::BTreeMap;
use std::time::Duration;

use certflow_session::actions::AppAction;
use certflow_session::mocks::{MockProviders, test_config};
use certflow_session::providers::sso::{SdkTicket, SdkUserDetails};
use certflow_session::service::{SessionStore, build_store};
use certflow_session::state::{LoginScreen, OtpContext, UserStatus, VerificationStatus};
use certflow_session::storage::COOKIE_TICKET_ID;
use certflow_session::storage::CookieJar;

const WAIT: Duration = Duration::from_secs(2);

fn ticket(id: &str) -> SdkTicket {
    SdkTicket {
        ticket_id: id.to_string(),
        enc_ticket: format!("enc-{id}"),
    }
}

fn details(email: &str) -> SdkUserDetails {
    let mut email_list = BTreeMap::new();
    email_list.insert(email.to_string(), VerificationStatus::Verified);

    SdkUserDetails {
        sso_id: "sso-1".to_string(),
        primary_email: Some(email.to_string()),
        email_id: Some(email.to_string()),
        first_name: Some("Asha".to_string()),
        login_id: Some(email.to_string()),
        email_list,
        mobile_list: BTreeMap::new(),
    }
}

fn setup() -> (MockProviders, SessionStore) {
    let mocks = MockProviders::new();
    let store = build_store(mocks.environment(test_config()));
    (mocks, store)
}

async fn send_and_wait(store: &SessionStore, action: AppAction) {
    let mut handle = store.send(action).await.unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();
}

async fn type_otp(store: &SessionStore, code: &str) {
    for (index, digit) in code.chars().enumerate() {
        send_and_wait(
            store,
            AppAction::OtpDigitChanged {
                index,
                value: digit.to_string(),
            },
        )
        .await;
    }
}

#[tokio::test]
async fn password_login_walks_to_success() {
    let (mocks, store) = setup();
    mocks.sso.set_exists_status(UserStatus::Verified);
    mocks
        .sso
        .set_session_after_auth(ticket("t1"), details("user@example.com"));

    send_and_wait(
        &store,
        AppAction::EmailOrMobileChanged {
            value: "user@example.com".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::CheckUserSubmitted).await;

    assert_eq!(
        store.state(|s| s.login_flow.screen).await,
        LoginScreen::PasswordLogin
    );

    send_and_wait(
        &store,
        AppAction::PasswordChanged {
            value: "secret1!".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::PasswordLoginSubmitted).await;

    // No plans queued, so the flow lands on the terminal screen
    assert_eq!(
        store.state(|s| s.login_flow.screen).await,
        LoginScreen::Success
    );

    // The shared session state observed the new identity immediately
    assert!(store.state(|s| s.session.is_login).await);
    assert_eq!(
        store.state(|s| s.session.ticket_id.clone()).await,
        Some("t1".to_string())
    );

    // Cookies were written in the same continuation as the resolution
    assert_eq!(mocks.cookies.get(COOKIE_TICKET_ID), Some("t1".to_string()));

    // The login changed SDK state, so the read was forced fresh
    assert!(mocks.sso.recreate_count() >= 1);
}

#[tokio::test]
async fn registration_walks_through_signup_otp() {
    let (mocks, store) = setup();
    mocks.sso.set_exists_status(UserStatus::Unregistered);
    mocks
        .sso
        .set_session_after_auth(ticket("t2"), details("new@example.com"));

    send_and_wait(
        &store,
        AppAction::EmailOrMobileChanged {
            value: "new@example.com".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::CheckUserSubmitted).await;

    assert_eq!(
        store.state(|s| s.login_flow.screen).await,
        LoginScreen::SetPassword
    );

    send_and_wait(
        &store,
        AppAction::NameChanged {
            value: "Asha".to_string(),
        },
    )
    .await;
    send_and_wait(
        &store,
        AppAction::PasswordChanged {
            value: "secret1!".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::RegisterSubmitted).await;

    assert_eq!(
        store.state(|s| s.login_flow.screen).await,
        LoginScreen::OtpLogin
    );
    assert_eq!(
        store.state(|s| s.login_flow.otp_context).await,
        OtpContext::Signup
    );

    type_otp(&store, "123456").await;
    send_and_wait(&store, AppAction::OtpVerifySubmitted).await;

    // Signup context selected the signup verification path
    assert_eq!(mocks.sso.call_count("verify_signup_otp"), 1);
    assert_eq!(mocks.sso.call_count("verify_login_otp"), 0);

    assert_eq!(
        store.state(|s| s.login_flow.screen).await,
        LoginScreen::Success
    );
    assert!(store.state(|s| s.session.is_login).await);
}

#[tokio::test]
async fn stale_registration_response_cannot_misroute_login_otp() {
    let (mocks, store) = setup();
    mocks
        .sso
        .set_session_after_auth(ticket("t3"), details("user@example.com"));

    send_and_wait(
        &store,
        AppAction::EmailOrMobileChanged {
            value: "user@example.com".to_string(),
        },
    )
    .await;

    // A registration left its response behind...
    send_and_wait(
        &store,
        AppAction::RegistrationSucceeded {
            response: certflow_session::state::RegistrationResponse {
                identifier: "user@example.com".to_string(),
                ..certflow_session::state::RegistrationResponse::default()
            },
        },
    )
    .await;

    // ...but the user then chose login-via-OTP
    send_and_wait(&store, AppAction::OtpSent).await;
    assert_eq!(
        store.state(|s| s.login_flow.otp_context).await,
        OtpContext::Login
    );
    assert!(
        store
            .state(|s| s.login_flow.registration_response.is_some())
            .await
    );

    type_otp(&store, "654321").await;
    send_and_wait(&store, AppAction::OtpVerifySubmitted).await;

    // The explicit flow tag routed verification, not the stale response
    assert_eq!(mocks.sso.call_count("verify_login_otp"), 1);
    assert_eq!(mocks.sso.call_count("verify_signup_otp"), 0);
}

#[tokio::test]
async fn incorrect_otp_shows_specific_message_and_keeps_screen() {
    let (mocks, store) = setup();
    mocks.sso.fail_verification_with_incorrect_otp();

    send_and_wait(
        &store,
        AppAction::EmailOrMobileChanged {
            value: "user@example.com".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::OtpSent).await;
    type_otp(&store, "111111").await;
    send_and_wait(&store, AppAction::OtpVerifySubmitted).await;

    assert_eq!(
        store.state(|s| s.login_flow.screen).await,
        LoginScreen::OtpLogin
    );
    assert_eq!(
        store.state(|s| s.login_flow.otp_error.clone()).await,
        "Incorrect OTP, please try again"
    );
    assert!(!store.state(|s| s.session.is_login).await);
}

#[tokio::test]
async fn forgot_password_resets_and_returns_to_password_login() {
    let (mocks, store) = setup();
    mocks.sso.set_exists_status(UserStatus::Verified);

    send_and_wait(
        &store,
        AppAction::EmailOrMobileChanged {
            value: "user@example.com".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::CheckUserSubmitted).await;
    send_and_wait(&store, AppAction::ForgotPasswordRequested).await;

    assert_eq!(
        store.state(|s| s.login_flow.screen).await,
        LoginScreen::ForgotPasswordReset
    );
    assert_eq!(
        store.state(|s| s.login_flow.otp_context).await,
        OtpContext::ForgotPassword
    );
    assert_eq!(mocks.sso.call_count("send_forgot_password_otp"), 1);

    type_otp(&store, "246810").await;
    send_and_wait(
        &store,
        AppAction::PasswordChanged {
            value: "fresh-pass1!".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::ResetPasswordSubmitted).await;

    assert_eq!(mocks.sso.call_count("reset_password"), 1);
    assert_eq!(
        store.state(|s| s.login_flow.screen).await,
        LoginScreen::PasswordLogin
    );
    // The password field never carries the new password back
    assert!(store.state(|s| s.login_flow.password.is_empty()).await);
}

#[tokio::test]
async fn failed_password_login_shows_generic_banner() {
    let (mocks, store) = setup();
    mocks.sso.set_exists_status(UserStatus::Verified);
    mocks.sso.fail_password_login();

    send_and_wait(
        &store,
        AppAction::EmailOrMobileChanged {
            value: "user@example.com".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::CheckUserSubmitted).await;
    send_and_wait(
        &store,
        AppAction::PasswordChanged {
            value: "wrong-pass1!".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::PasswordLoginSubmitted).await;

    assert_eq!(
        store.state(|s| s.login_flow.screen).await,
        LoginScreen::PasswordLogin
    );
    let banner = store.state(|s| s.login_flow.flow_error.clone()).await;
    assert_eq!(banner, Some("Something went wrong, please try again".to_string()));
    assert!(!store.state(|s| s.session.is_login).await);
}

#[tokio::test]
async fn duplicate_registration_maps_to_specific_message() {
    let (mocks, store) = setup();
    mocks.sso.set_exists_status(UserStatus::Unregistered);
    mocks.sso.fail_registration_user_exists();

    send_and_wait(
        &store,
        AppAction::EmailOrMobileChanged {
            value: "dup@example.com".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::CheckUserSubmitted).await;
    send_and_wait(
        &store,
        AppAction::NameChanged {
            value: "Asha".to_string(),
        },
    )
    .await;
    send_and_wait(
        &store,
        AppAction::PasswordChanged {
            value: "secret1!".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::RegisterSubmitted).await;

    let banner = store.state(|s| s.login_flow.flow_error.clone()).await;
    assert_eq!(
        banner,
        Some("An account already exists for this identifier".to_string())
    );
    assert_eq!(
        store.state(|s| s.login_flow.screen).await,
        LoginScreen::SetPassword
    );
}

#[tokio::test]
async fn auth_completion_broadcasts_login_checked() {
    let (mocks, store) = setup();
    mocks.sso.set_exists_status(UserStatus::Verified);
    mocks
        .sso
        .set_session_after_auth(ticket("t4"), details("user@example.com"));

    let mut actions = store.subscribe_actions();

    send_and_wait(
        &store,
        AppAction::EmailOrMobileChanged {
            value: "user@example.com".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::CheckUserSubmitted).await;
    send_and_wait(
        &store,
        AppAction::PasswordChanged {
            value: "secret1!".to_string(),
        },
    )
    .await;
    send_and_wait(&store, AppAction::PasswordLoginSubmitted).await;

    // External listeners observe the login check on the action broadcast
    let observed = tokio::time::timeout(WAIT, async {
        loop {
            if let Ok(AppAction::LoginChecked { is_logged }) = actions.recv().await {
                return is_logged;
            }
        }
    })
    .await
    .unwrap();
    assert!(observed);
}
