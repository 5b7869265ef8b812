//! Mock SSO SDK client.
//!
//! Scriptable, call-recording implementation of [`SsoClient`]. State is
//! shared through `Arc`, so a clone inside the environment and the copy a
//! test holds observe the same session.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{CODE_INCORRECT_OTP, Result, SessionError};
use crate::providers::sso::{RegistrationRequest, SdkTicket, SdkUserDetails, SsoClient,
    VerifyOutcome};
use crate::state::{ChannelContext, RegistrationResponse, UserStatus};

#[derive(Default)]
struct Inner {
    /// When set, `ensure_ready`/`recreate` fail with `SdkUnavailable`.
    unavailable: bool,

    /// Current valid session, if any.
    logged_in: Option<(SdkTicket, SdkUserDetails)>,

    /// Session installed by a successful password login or OTP
    /// verification.
    session_after_auth: Option<(SdkTicket, SdkUserDetails)>,

    /// Existence-check classification.
    exists_status: UserStatus,

    /// When set, registration fails with this error.
    register_error: Option<SessionError>,

    /// When set, password login fails with this error.
    password_error: Option<SessionError>,

    /// When set, OTP verification fails with this error.
    verify_error: Option<SessionError>,

    /// When set, OTP send/resend fails with this error.
    send_otp_error: Option<SessionError>,

    /// When set, password reset fails with this error.
    reset_error: Option<SessionError>,

    /// When set, sign-out fails with this error.
    sign_out_error: Option<SessionError>,

    /// Ordered record of calls.
    calls: Vec<String>,

    /// How many times the SDK instance was re-created.
    recreate_count: u32,
}

/// Mock SSO SDK client.
#[derive(Clone, Default)]
pub struct MockSsoClient {
    inner: Arc<Mutex<Inner>>,
}

impl MockSsoClient {
    /// Create a mock with no session and no scripted failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::unwrap_used)] // Mutex poison in a mock is unrecoverable
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    fn record(&self, call: &str) {
        self.lock().calls.push(call.to_string());
    }

    /// Script a currently valid logged-in session.
    pub fn set_logged_in(&self, ticket: SdkTicket, details: SdkUserDetails) {
        self.lock().logged_in = Some((ticket, details));
    }

    /// Script the session that a successful password login or OTP
    /// verification installs.
    pub fn set_session_after_auth(&self, ticket: SdkTicket, details: SdkUserDetails) {
        self.lock().session_after_auth = Some((ticket, details));
    }

    /// Script the existence-check classification.
    pub fn set_exists_status(&self, status: UserStatus) {
        self.lock().exists_status = status;
    }

    /// Make the SDK unavailable (script never loads).
    pub fn set_unavailable(&self) {
        self.lock().unavailable = true;
    }

    /// Script an incorrect-OTP rejection (code 414) for verification.
    pub fn fail_verification_with_incorrect_otp(&self) {
        self.lock().verify_error = Some(SessionError::Sdk {
            code: CODE_INCORRECT_OTP,
            message: "OTP mismatch".to_string(),
        });
    }

    /// Script a credential rejection for password login.
    pub fn fail_password_login(&self) {
        self.lock().password_error = Some(SessionError::Sdk {
            code: 401,
            message: String::new(),
        });
    }

    /// Script a duplicate-account rejection for registration.
    pub fn fail_registration_user_exists(&self) {
        self.lock().register_error = Some(SessionError::Sdk {
            code: 409,
            message: "An account already exists for this identifier".to_string(),
        });
    }

    /// Make sign-out fail; cleanup must still run.
    pub fn fail_sign_out(&self) {
        self.lock().sign_out_error = Some(SessionError::Internal("sign-out exploded".to_string()));
    }

    /// Ordered record of every call made.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of calls whose name starts with `prefix`.
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// How many times the SDK instance was re-created.
    #[must_use]
    pub fn recreate_count(&self) -> u32 {
        self.lock().recreate_count
    }

    /// Whether a session is currently installed.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.lock().logged_in.is_some()
    }
}

#[async_trait]
impl SsoClient for MockSsoClient {
    async fn ensure_ready(&self) -> Result<()> {
        self.record("ensure_ready");
        if self.lock().unavailable {
            Err(SessionError::SdkUnavailable)
        } else {
            Ok(())
        }
    }

    async fn recreate(&self) -> Result<()> {
        self.record("recreate");
        let mut inner = self.lock();
        if inner.unavailable {
            return Err(SessionError::SdkUnavailable);
        }
        inner.recreate_count += 1;
        Ok(())
    }

    async fn get_valid_logged_in_user(&self, _channel: &ChannelContext) -> Result<SdkTicket> {
        self.record("get_valid_logged_in_user");
        let inner = self.lock();
        if inner.unavailable {
            return Err(SessionError::SdkUnavailable);
        }
        inner
            .logged_in
            .as_ref()
            .map(|(ticket, _)| ticket.clone())
            .ok_or(SessionError::NotLoggedIn)
    }

    async fn get_user_details(
        &self,
        ticket_id: &str,
        _channel: &ChannelContext,
    ) -> Result<SdkUserDetails> {
        self.record("get_user_details");
        let inner = self.lock();
        match &inner.logged_in {
            Some((ticket, details)) if ticket.ticket_id == ticket_id => Ok(details.clone()),
            _ => Err(SessionError::NotLoggedIn),
        }
    }

    async fn check_user_exists(
        &self,
        identifier: &str,
        _channel: &ChannelContext,
    ) -> Result<UserStatus> {
        self.record(&format!("check_user_exists:{identifier}"));
        Ok(self.lock().exists_status)
    }

    async fn register_user(
        &self,
        request: &RegistrationRequest,
        _channel: &ChannelContext,
    ) -> Result<RegistrationResponse> {
        self.record(&format!("register_user:{}", request.identifier));
        if let Some(e) = self.lock().register_error.clone() {
            return Err(e);
        }
        Ok(RegistrationResponse {
            identifier: request.identifier.clone(),
            sso_id: Some("sso-new".to_string()),
            email_id: Some(request.identifier.clone()),
            first_name: Some(request.name.clone()),
        })
    }

    async fn password_login(
        &self,
        identifier: &str,
        _password: &str,
        _channel: &ChannelContext,
    ) -> Result<SdkTicket> {
        self.record(&format!("password_login:{identifier}"));
        let mut inner = self.lock();
        if let Some(e) = inner.password_error.clone() {
            return Err(e);
        }
        let session = inner.session_after_auth.clone();
        match session {
            Some((ticket, details)) => {
                inner.logged_in = Some((ticket.clone(), details));
                Ok(ticket)
            },
            None => Err(SessionError::Sdk {
                code: 401,
                message: String::new(),
            }),
        }
    }

    async fn send_login_otp(&self, identifier: &str, _channel: &ChannelContext) -> Result<()> {
        self.record(&format!("send_login_otp:{identifier}"));
        match self.lock().send_otp_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn resend_signup_otp(&self, identifier: &str, _channel: &ChannelContext) -> Result<()> {
        self.record(&format!("resend_signup_otp:{identifier}"));
        match self.lock().send_otp_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn send_forgot_password_otp(
        &self,
        identifier: &str,
        _channel: &ChannelContext,
    ) -> Result<()> {
        self.record(&format!("send_forgot_password_otp:{identifier}"));
        match self.lock().send_otp_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn verify_signup_otp(
        &self,
        identifier: &str,
        _otp: &str,
        _channel: &ChannelContext,
    ) -> Result<VerifyOutcome> {
        self.record(&format!("verify_signup_otp:{identifier}"));
        self.complete_verification(identifier)
    }

    async fn verify_login_otp(
        &self,
        identifier: &str,
        _otp: &str,
        _channel: &ChannelContext,
    ) -> Result<VerifyOutcome> {
        self.record(&format!("verify_login_otp:{identifier}"));
        self.complete_verification(identifier)
    }

    async fn reset_password(
        &self,
        identifier: &str,
        _otp: &str,
        _new_password: &str,
        _channel: &ChannelContext,
    ) -> Result<()> {
        self.record(&format!("reset_password:{identifier}"));
        match self.lock().reset_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn sign_out(&self, _channel: &ChannelContext) -> Result<()> {
        self.record("sign_out");
        let mut inner = self.lock();
        if let Some(e) = inner.sign_out_error.clone() {
            return Err(e);
        }
        inner.logged_in = None;
        Ok(())
    }
}

impl MockSsoClient {
    fn complete_verification(&self, identifier: &str) -> Result<VerifyOutcome> {
        let mut inner = self.lock();
        if let Some(e) = inner.verify_error.clone() {
            return Err(e);
        }

        let session = inner.session_after_auth.clone();
        match session {
            Some((ticket, details)) => {
                inner.logged_in = Some((ticket.clone(), details.clone()));
                Ok(VerifyOutcome {
                    ticket: Some(ticket),
                    sso_id: Some(details.sso_id),
                    email_id: details.email_id,
                    first_name: details.first_name,
                    login_id: details.login_id,
                })
            },
            None => Ok(VerifyOutcome {
                sso_id: Some("sso-new".to_string()),
                email_id: Some(identifier.to_string()),
                ..VerifyOutcome::default()
            }),
        }
    }
}
