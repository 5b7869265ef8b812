//! Login-flow reducer.
//!
//! This module implements the multi-screen login/registration state
//! machine:
//!
//! ```text
//! LoginInput ──check──▶ SetPassword ──register──▶ OtpLogin
//!     │                                              │
//!     └──check──▶ PasswordLogin ──password login─────┤
//!                     │    │                         │
//!                     │    └──send OTP──▶ OtpLogin ──┤
//!                     └──forgot──▶ ForgotPasswordReset
//!                                                    │
//!                              PlanSelection ◀── verify ──▶ Success
//! ```
//!
//! Validation runs before any effect is described; a failed validation
//! sets the field's own error string and dispatches nothing. Each loading
//! flag gates exactly one button, so an in-flight submission cannot be
//! duplicated.

use certflow_core::effect::Effect;
use certflow_core::reducer::Reducer;
use certflow_core::{SmallVec, smallvec};

use crate::actions::AppAction;
use crate::environment::SessionEnvironment;
use crate::error::Result;
use crate::providers::sso::RegistrationRequest;
use crate::service::fetch_fresh_identity;
use crate::state::{
    AppState, ChannelContext, LoginScreen, OTP_LEN, OtpContext, UserInfo, UserStatus,
};
use crate::validate;

/// Login-flow reducer.
///
/// Pure state machine over [`crate::state::LoginFlowState`]; every async
/// step is described as an effect against the injected SSO client.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginFlowReducer;

impl LoginFlowReducer {
    fn check_user_effect(
        env: SessionEnvironment,
        channel: ChannelContext,
        identifier: String,
    ) -> Effect<AppAction> {
        Effect::future(async move {
            match env.sso.check_user_exists(&identifier, &channel).await {
                Ok(status) => Some(AppAction::UserStatusResolved { status }),
                Err(e) => Some(AppAction::CheckUserFailed {
                    message: e.user_message(),
                }),
            }
        })
    }

    fn register_effect(
        env: SessionEnvironment,
        channel: ChannelContext,
        request: RegistrationRequest,
    ) -> Effect<AppAction> {
        Effect::future(async move {
            match env.sso.register_user(&request, &channel).await {
                Ok(response) => Some(AppAction::RegistrationSucceeded { response }),
                Err(e) => Some(AppAction::RegistrationFailed {
                    message: e.user_message(),
                }),
            }
        })
    }

    fn password_login_effect(
        env: SessionEnvironment,
        channel: ChannelContext,
        identifier: String,
        password: String,
    ) -> Effect<AppAction> {
        Effect::future(async move {
            match env
                .sso
                .password_login(&identifier, &password, &channel)
                .await
            {
                Ok(ticket) => {
                    // The login changed SDK-side state; force a fresh read.
                    // If the detail fetch fails, the ticket we already hold
                    // is the best-effort identity.
                    let fallback = UserInfo {
                        ticket_id: Some(ticket.ticket_id.clone()),
                        identifier: Some(identifier.clone()),
                        is_logged: true,
                        ..UserInfo::default()
                    };
                    let user_info = fetch_fresh_identity(&env, &channel)
                        .await
                        .unwrap_or(fallback);
                    Some(AppAction::AuthCompleted { user_info })
                },
                Err(e) => Some(AppAction::AuthFailed {
                    message: e.user_message(),
                }),
            }
        })
    }

    fn verify_otp_effect(
        env: SessionEnvironment,
        channel: ChannelContext,
        identifier: String,
        otp: String,
        context: OtpContext,
    ) -> Effect<AppAction> {
        Effect::future(async move {
            let outcome: Result<_> = match context {
                OtpContext::Signup => env.sso.verify_signup_otp(&identifier, &otp, &channel).await,
                // Forgot-password OTPs are consumed by the reset screen;
                // anything else on this screen is a login verification
                _ => env.sso.verify_login_otp(&identifier, &otp, &channel).await,
            };

            match outcome {
                Ok(verification) => {
                    let fallback = verification.fallback_user_info(&identifier);
                    let user_info = fetch_fresh_identity(&env, &channel)
                        .await
                        .unwrap_or(fallback);
                    Some(AppAction::AuthCompleted { user_info })
                },
                Err(e) => Some(AppAction::OtpVerifyFailed {
                    message: e.user_message(),
                }),
            }
        })
    }

    fn send_otp_effect(
        env: SessionEnvironment,
        channel: ChannelContext,
        identifier: String,
        resolved: AppAction,
    ) -> Effect<AppAction> {
        Effect::future(async move {
            match env.sso.send_login_otp(&identifier, &channel).await {
                Ok(()) => Some(resolved),
                Err(e) => Some(AppAction::SendOtpFailed {
                    message: e.user_message(),
                }),
            }
        })
    }

    fn resend_otp_effect(
        env: SessionEnvironment,
        channel: ChannelContext,
        identifier: String,
        context: OtpContext,
    ) -> Effect<AppAction> {
        Effect::future(async move {
            let result = match context {
                OtpContext::Signup => env.sso.resend_signup_otp(&identifier, &channel).await,
                OtpContext::ForgotPassword => {
                    env.sso
                        .send_forgot_password_otp(&identifier, &channel)
                        .await
                },
                _ => env.sso.send_login_otp(&identifier, &channel).await,
            };

            match result {
                Ok(()) => Some(AppAction::OtpResent),
                Err(e) => Some(AppAction::SendOtpFailed {
                    message: e.user_message(),
                }),
            }
        })
    }

    fn forgot_password_effect(
        env: SessionEnvironment,
        channel: ChannelContext,
        identifier: String,
    ) -> Effect<AppAction> {
        Effect::future(async move {
            match env
                .sso
                .send_forgot_password_otp(&identifier, &channel)
                .await
            {
                Ok(()) => Some(AppAction::ResetOtpSent),
                Err(e) => Some(AppAction::SendOtpFailed {
                    message: e.user_message(),
                }),
            }
        })
    }

    fn reset_password_effect(
        env: SessionEnvironment,
        channel: ChannelContext,
        identifier: String,
        otp: String,
        new_password: String,
    ) -> Effect<AppAction> {
        Effect::future(async move {
            match env
                .sso
                .reset_password(&identifier, &otp, &new_password, &channel)
                .await
            {
                Ok(()) => Some(AppAction::PasswordResetCompleted),
                Err(e) => Some(AppAction::ResetPasswordFailed {
                    message: e.user_message(),
                }),
            }
        })
    }
}

impl Reducer for LoginFlowReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = SessionEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per state-machine transition
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let flow = &mut state.login_flow;

        match action {
            // ═══════════════════════════════════════════════════════════════════
            // Field Edits - setting a value clears its own error, never another's
            // ═══════════════════════════════════════════════════════════════════
            AppAction::EmailOrMobileChanged { value } => {
                flow.email_or_mobile = value;
                flow.email_or_mobile_error.clear();
                smallvec![Effect::None]
            },

            AppAction::PasswordChanged { value } => {
                flow.password = value;
                flow.password_error.clear();
                smallvec![Effect::None]
            },

            AppAction::NameChanged { value } => {
                flow.name = value;
                flow.name_error.clear();
                smallvec![Effect::None]
            },

            AppAction::MobileChanged { value } => {
                flow.mobile = value;
                flow.mobile_error.clear();
                smallvec![Effect::None]
            },

            AppAction::OtpDigitChanged { index, value } => {
                let is_digit = value.is_empty()
                    || (value.len() == 1 && value.chars().all(|c| c.is_ascii_digit()));
                if index < OTP_LEN && is_digit {
                    flow.otp[index] = value;
                    flow.otp_error.clear();
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Existence Check
            // ═══════════════════════════════════════════════════════════════════
            AppAction::CheckUserSubmitted => {
                if flow.is_checking_user {
                    return smallvec![Effect::None];
                }

                let message = validate::validate_email_or_mobile(&flow.email_or_mobile);
                if !message.is_empty() {
                    flow.email_or_mobile_error = message;
                    return smallvec![Effect::None];
                }

                flow.is_checking_user = true;
                smallvec![Self::check_user_effect(
                    env.clone(),
                    state.channel.clone(),
                    state.login_flow.email_or_mobile.clone(),
                )]
            },

            AppAction::UserStatusResolved { status } => {
                flow.is_checking_user = false;
                flow.user_status = status;
                flow.screen = match status {
                    UserStatus::Unregistered | UserStatus::Unverified => LoginScreen::SetPassword,
                    UserStatus::Verified => LoginScreen::PasswordLogin,
                    UserStatus::Unknown => {
                        flow.email_or_mobile_error =
                            "Something went wrong, please try again".to_string();
                        flow.screen
                    },
                };
                smallvec![Effect::None]
            },

            AppAction::CheckUserFailed { message } => {
                flow.is_checking_user = false;
                flow.email_or_mobile_error = message;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Registration
            // ═══════════════════════════════════════════════════════════════════
            AppAction::RegisterSubmitted => {
                if flow.is_loading {
                    return smallvec![Effect::None];
                }

                flow.name_error = validate::validate_name(&flow.name);
                flow.password_error = validate::validate_password(&flow.password);
                flow.mobile_error = if flow.mobile.is_empty() {
                    String::new()
                } else {
                    validate::validate_mobile(&flow.mobile)
                };

                if !(flow.name_error.is_empty()
                    && flow.password_error.is_empty()
                    && flow.mobile_error.is_empty())
                {
                    return smallvec![Effect::None];
                }

                flow.is_loading = true;
                let request = RegistrationRequest {
                    identifier: flow.email_or_mobile.clone(),
                    name: flow.name.trim().to_string(),
                    password: flow.password.clone(),
                    mobile: if flow.mobile.is_empty() {
                        None
                    } else {
                        Some(flow.mobile.clone())
                    },
                };
                smallvec![Self::register_effect(
                    env.clone(),
                    state.channel.clone(),
                    request
                )]
            },

            AppAction::RegistrationSucceeded { response } => {
                flow.is_loading = false;
                flow.registration_response = Some(response);
                flow.otp_context = OtpContext::Signup;
                flow.otp = std::array::from_fn(|_| String::new());
                flow.otp_error.clear();
                flow.screen = LoginScreen::OtpLogin;
                smallvec![Effect::None]
            },

            AppAction::RegistrationFailed { message } => {
                flow.is_loading = false;
                flow.flow_error = Some(message);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Password Login
            // ═══════════════════════════════════════════════════════════════════
            AppAction::PasswordLoginSubmitted => {
                if flow.is_loading {
                    return smallvec![Effect::None];
                }

                if flow.password.is_empty() {
                    flow.password_error = "Please enter your password".to_string();
                    return smallvec![Effect::None];
                }

                flow.is_loading = true;
                smallvec![Self::password_login_effect(
                    env.clone(),
                    state.channel.clone(),
                    state.login_flow.email_or_mobile.clone(),
                    state.login_flow.password.clone(),
                )]
            },

            // ═══════════════════════════════════════════════════════════════════
            // OTP Send / Resend
            // ═══════════════════════════════════════════════════════════════════
            AppAction::SendOtpRequested => {
                if flow.is_sending_otp {
                    return smallvec![Effect::None];
                }

                flow.is_sending_otp = true;
                smallvec![Self::send_otp_effect(
                    env.clone(),
                    state.channel.clone(),
                    state.login_flow.email_or_mobile.clone(),
                    AppAction::OtpSent,
                )]
            },

            AppAction::OtpSent => {
                flow.is_sending_otp = false;
                // Sole write of the login context: never set by registration
                flow.otp_context = OtpContext::Login;
                flow.otp = std::array::from_fn(|_| String::new());
                flow.otp_error.clear();
                flow.screen = LoginScreen::OtpLogin;
                smallvec![Effect::None]
            },

            AppAction::ResendOtpRequested => {
                if flow.is_resending_otp {
                    return smallvec![Effect::None];
                }

                flow.is_resending_otp = true;
                smallvec![Self::resend_otp_effect(
                    env.clone(),
                    state.channel.clone(),
                    state.login_flow.email_or_mobile.clone(),
                    state.login_flow.otp_context,
                )]
            },

            AppAction::OtpResent => {
                flow.is_resending_otp = false;
                smallvec![Effect::None]
            },

            AppAction::SendOtpFailed { message } => {
                flow.is_sending_otp = false;
                flow.is_resending_otp = false;
                flow.is_loading = false;
                flow.flow_error = Some(message);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════════
            // OTP Verification
            // ═══════════════════════════════════════════════════════════════════
            AppAction::OtpVerifySubmitted => {
                if flow.is_verifying_otp {
                    return smallvec![Effect::None];
                }

                let code = flow.otp_code();
                let message = validate::validate_otp(&code);
                if !message.is_empty() {
                    flow.otp_error = message;
                    return smallvec![Effect::None];
                }

                flow.is_verifying_otp = true;
                smallvec![Self::verify_otp_effect(
                    env.clone(),
                    state.channel.clone(),
                    state.login_flow.email_or_mobile.clone(),
                    code,
                    state.login_flow.otp_context,
                )]
            },

            AppAction::OtpVerifyFailed { message } => {
                flow.is_verifying_otp = false;
                flow.otp_error = message;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Forgot Password
            // ═══════════════════════════════════════════════════════════════════
            AppAction::ForgotPasswordRequested => {
                if flow.is_sending_otp {
                    return smallvec![Effect::None];
                }

                flow.is_sending_otp = true;
                smallvec![Self::forgot_password_effect(
                    env.clone(),
                    state.channel.clone(),
                    state.login_flow.email_or_mobile.clone(),
                )]
            },

            AppAction::ResetOtpSent => {
                flow.is_sending_otp = false;
                flow.otp_context = OtpContext::ForgotPassword;
                flow.otp = std::array::from_fn(|_| String::new());
                flow.otp_error.clear();
                flow.password.clear();
                flow.password_error.clear();
                flow.screen = LoginScreen::ForgotPasswordReset;
                smallvec![Effect::None]
            },

            AppAction::ResetPasswordSubmitted => {
                if flow.is_loading {
                    return smallvec![Effect::None];
                }

                let code = flow.otp_code();
                flow.otp_error = validate::validate_otp(&code);
                flow.password_error = validate::validate_password(&flow.password);
                if !(flow.otp_error.is_empty() && flow.password_error.is_empty()) {
                    return smallvec![Effect::None];
                }

                flow.is_loading = true;
                smallvec![Self::reset_password_effect(
                    env.clone(),
                    state.channel.clone(),
                    state.login_flow.email_or_mobile.clone(),
                    code,
                    state.login_flow.password.clone(),
                )]
            },

            AppAction::PasswordResetCompleted => {
                flow.is_loading = false;
                flow.screen = LoginScreen::PasswordLogin;
                flow.password.clear();
                flow.password_error.clear();
                flow.otp = std::array::from_fn(|_| String::new());
                flow.otp_context = OtpContext::None;
                smallvec![Effect::None]
            },

            AppAction::ResetPasswordFailed { message } => {
                flow.is_loading = false;
                flow.otp_error = message;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Completion
            // ═══════════════════════════════════════════════════════════════════
            AppAction::AuthCompleted { .. } => {
                flow.is_loading = false;
                flow.is_verifying_otp = false;
                flow.flow_error = None;
                flow.screen = if flow.available_plans.is_empty() {
                    LoginScreen::Success
                } else {
                    LoginScreen::PlanSelection
                };
                smallvec![Effect::None]
            },

            AppAction::AuthFailed { message } => {
                flow.is_loading = false;
                flow.is_verifying_otp = false;
                flow.flow_error = Some(message);
                smallvec![Effect::None]
            },

            AppAction::PlansLoaded { plans } => {
                // Never overwrite a populated catalog: the plan context
                // already persisted to session storage must stay coherent
                if flow.available_plans.is_empty() {
                    flow.available_plans = plans;
                }
                smallvec![Effect::None]
            },

            AppAction::FlowReset => {
                state.login_flow = crate::state::LoginFlowState::default();
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════════
            // Other Actions (Not Handled by the Login Flow)
            // ═══════════════════════════════════════════════════════════════════
            _ => smallvec![Effect::None],
        }
    }
}
