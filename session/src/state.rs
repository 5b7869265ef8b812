//! Application state types.
//!
//! This module defines the store-held state for the session core. The store
//! is the single source of truth: four domains (session/auth, login-flow UI,
//! analytics, channel routing) live under [`AppState`] and are mutated only
//! through reducer actions.
//!
//! All types are `Clone` to support the functional architecture pattern.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::plan::PaymentPlan;

// ═══════════════════════════════════════════════════════════════════════
// Root State
// ═══════════════════════════════════════════════════════════════════════

/// Root application state.
///
/// # Examples
///
/// ```
/// # use certflow_session::state::AppState;
/// let state = AppState::default();
/// assert!(!state.session.is_login);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Authentication/session info.
    pub session: SessionState,

    /// Login-flow UI state machine.
    pub login_flow: LoginFlowState,

    /// Analytics counters and dimension maps.
    pub analytics: AnalyticsState,

    /// Merchant routing context, set once by `init()` and passed to every
    /// SDK call.
    pub channel: ChannelContext,
}

// ═══════════════════════════════════════════════════════════════════════
// Session / Auth Domain
// ═══════════════════════════════════════════════════════════════════════

/// Verification status of a contact identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    /// Contact has been verified via OTP.
    Verified,
    /// Contact exists but has not been verified.
    Unverified,
}

impl VerificationStatus {
    /// Whether this contact may be used where a verified contact is
    /// required.
    #[must_use]
    pub const fn is_verified(self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Resolved identity of the logged-in user.
///
/// Created on successful SSO resolution; cleared on logout or failed
/// validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// SSO identifier.
    pub sso_id: String,

    /// Primary email address.
    pub primary_email: Option<String>,

    /// Email identifier used by the SDK.
    pub email_id: Option<String>,

    /// First name.
    pub first_name: Option<String>,

    /// Login identifier (email or mobile the user signed in with).
    pub login_id: Option<String>,

    /// Session ticket id mirrored into the `TicketId` cookie.
    pub ticket_id: Option<String>,

    /// The identifier the current flow operated on.
    pub identifier: Option<String>,

    /// Whether the SDK considers this user logged in.
    pub is_logged: bool,

    /// Email identifiers with their verification status.
    pub email_list: BTreeMap<String, VerificationStatus>,

    /// Mobile identifiers with their verification status.
    pub mobile_list: BTreeMap<String, VerificationStatus>,
}

impl UserInfo {
    /// First verified email, falling back to the primary email when the
    /// list does not contradict it.
    #[must_use]
    pub fn verified_email(&self) -> Option<String> {
        self.email_list
            .iter()
            .find(|(_, status)| status.is_verified())
            .map(|(email, _)| email.clone())
    }

    /// First verified mobile number.
    #[must_use]
    pub fn verified_mobile(&self) -> Option<String> {
        self.mobile_list
            .iter()
            .find(|(_, status)| status.is_verified())
            .map(|(mobile, _)| mobile.clone())
    }
}

/// User tier classified from entitlement permission strings.
///
/// Classification is ordered, first-matching-rule-wins; see
/// [`crate::entitlement::classify_user_type`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    /// No entitlement history.
    #[default]
    New,
    /// Eligible to buy, nothing purchased.
    Free,
    /// Active trial (subscribed + cancelled + can-buy combination).
    Trial,
    /// Active paid subscription.
    Paid,
    /// Cancelled subscription still within its term.
    Cancelled,
    /// Subscription expired.
    Expired,
}

impl UserType {
    /// Classification label used in analytics dimensions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Free => "free",
            Self::Trial => "trial",
            Self::Paid => "Paid",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication/session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Resolved identity, if any.
    pub user_info: Option<UserInfo>,

    /// The single authoritative login flag, derived from
    /// `user_info.is_logged`. Route guards and UI consume this and nothing
    /// else.
    pub is_login: bool,

    /// Ordered capability strings from the entitlement endpoint.
    pub permissions: Vec<String>,

    /// Ordered feature strings from the entitlement endpoint.
    pub accessible_features: Vec<String>,

    /// Classified user tier.
    pub user_type: UserType,

    /// Opaque subscription record from the entitlement payload.
    pub subscription_detail: Option<serde_json::Value>,

    /// Session ticket id. Invalidated together with `user_token` on logout.
    pub ticket_id: Option<String>,

    /// Refreshed one-time token from the entitlement endpoint.
    pub user_token: Option<String>,

    /// Whether a `group_subscription` permission was seen.
    pub is_group_user: bool,

    /// True while the initial login round-trip is in flight.
    pub login_processing: bool,

    /// 0→1 flush marker for the after-login continuation stack. Once set,
    /// continuations run immediately instead of queuing.
    pub after_login_done: bool,
}

/// Merchant routing context passed to every SDK call.
///
/// Immutable per session once `init()` has run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelContext {
    /// Channel merchant code.
    pub merchant: String,

    /// Channel platform identifier.
    pub platform: String,
}

// ═══════════════════════════════════════════════════════════════════════
// Login Flow Domain
// ═══════════════════════════════════════════════════════════════════════

/// Screens of the login flow state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginScreen {
    /// Email/mobile entry (initial screen).
    #[default]
    LoginInput,
    /// Registration: name + password (+ optional mobile).
    SetPassword,
    /// Password entry for a verified user.
    PasswordLogin,
    /// Six-digit OTP entry.
    OtpLogin,
    /// OTP + new password after a reset request.
    ForgotPasswordReset,
    /// Plan catalog; selection hands off to the payment continuation.
    PlanSelection,
    /// Terminal screen; continuing resets the flow.
    Success,
}

/// Classification returned by the existence check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    /// Not yet checked.
    #[default]
    Unknown,
    /// No account for this identifier.
    Unregistered,
    /// Account exists but was never verified.
    Unverified,
    /// Verified account.
    Verified,
}

/// Which flow the pending OTP belongs to.
///
/// This explicit tag is the discriminator for OTP verification. The
/// registration response is kept separately for identity fallback, so a
/// stale value can never misroute a concurrent forgot-password flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpContext {
    /// No OTP in flight.
    #[default]
    None,
    /// OTP sent by registration.
    Signup,
    /// OTP sent for login.
    Login,
    /// OTP sent for a password reset.
    ForgotPassword,
}

/// Identity fields echoed by the registration call, used as a best-effort
/// fallback when the post-verification detail fetch fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    /// Identifier the account was registered with.
    pub identifier: String,

    /// SSO id, if issued at registration time.
    pub sso_id: Option<String>,

    /// Email id, if present.
    pub email_id: Option<String>,

    /// First name, if present.
    pub first_name: Option<String>,
}

/// Number of OTP digits.
pub const OTP_LEN: usize = 6;

/// Login-flow UI state.
///
/// Ephemeral: reset on completion or when the hosting modal closes. Each
/// input field is paired with its own error string; setting a field's value
/// always clears its own error and never another field's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginFlowState {
    /// Current state-machine node.
    pub screen: LoginScreen,

    /// Email or mobile identifier input.
    pub email_or_mobile: String,
    /// Error for the identifier field.
    pub email_or_mobile_error: String,

    /// Password input.
    pub password: String,
    /// Error for the password field.
    pub password_error: String,

    /// Name input (registration).
    pub name: String,
    /// Error for the name field.
    pub name_error: String,

    /// Mobile input (registration, optional).
    pub mobile: String,
    /// Error for the mobile field.
    pub mobile_error: String,

    /// OTP digits.
    pub otp: [String; OTP_LEN],
    /// Error for the OTP field.
    pub otp_error: String,

    /// Classification from the existence check.
    pub user_status: UserStatus,

    /// Which flow the pending OTP belongs to.
    pub otp_context: OtpContext,

    /// Identity fallback from registration. Set only by the registration
    /// step, never by login-OTP send.
    pub registration_response: Option<RegistrationResponse>,

    /// Gate for the existence-check button.
    pub is_checking_user: bool,
    /// Gate for the send-OTP button.
    pub is_sending_otp: bool,
    /// Gate for the verify-OTP button.
    pub is_verifying_otp: bool,
    /// Gate for the resend-OTP button.
    pub is_resending_otp: bool,
    /// Gate for the screen's primary submit button.
    pub is_loading: bool,

    /// Plan catalog offered on the plan-selection screen. Populated once
    /// per flow lifetime; never overwritten once non-empty, so the plan
    /// context already persisted to session storage cannot be clobbered.
    pub available_plans: Vec<PaymentPlan>,

    /// Banner-level error for auth failures.
    pub flow_error: Option<String>,
}

impl Default for LoginFlowState {
    fn default() -> Self {
        Self {
            screen: LoginScreen::default(),
            email_or_mobile: String::new(),
            email_or_mobile_error: String::new(),
            password: String::new(),
            password_error: String::new(),
            name: String::new(),
            name_error: String::new(),
            mobile: String::new(),
            mobile_error: String::new(),
            otp: std::array::from_fn(|_| String::new()),
            otp_error: String::new(),
            user_status: UserStatus::default(),
            otp_context: OtpContext::default(),
            registration_response: None,
            is_checking_user: false,
            is_sending_otp: false,
            is_verifying_otp: false,
            is_resending_otp: false,
            is_loading: false,
            available_plans: Vec::new(),
            flow_error: None,
        }
    }
}

impl LoginFlowState {
    /// The OTP digits joined into a single code.
    #[must_use]
    pub fn otp_code(&self) -> String {
        self.otp.concat()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Analytics Domain
// ═══════════════════════════════════════════════════════════════════════

/// Analytics counters and dimension maps.
///
/// The dimension maps mirror the `updateGAEvents`/`updateCSEvents`
/// session-storage merge-maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsState {
    /// Total actions dispatched through the store.
    pub dispatches: u64,

    /// GA dimension map.
    pub ga_events: BTreeMap<String, String>,

    /// Comscore dimension map.
    pub cs_events: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_logged_out_on_login_input() {
        let state = AppState::default();
        assert!(!state.session.is_login);
        assert!(state.session.user_info.is_none());
        assert_eq!(state.login_flow.screen, LoginScreen::LoginInput);
        assert_eq!(state.login_flow.otp_context, OtpContext::None);
    }

    #[test]
    fn otp_code_joins_digits_in_order() {
        let mut flow = LoginFlowState::default();
        for (i, digit) in ["1", "2", "3", "4", "5", "6"].iter().enumerate() {
            flow.otp[i] = (*digit).to_string();
        }
        assert_eq!(flow.otp_code(), "123456");
    }

    #[test]
    fn verified_contact_lookup_skips_unverified_entries() {
        let mut info = UserInfo::default();
        info.email_list
            .insert("a@example.com".to_string(), VerificationStatus::Unverified);
        info.email_list
            .insert("b@example.com".to_string(), VerificationStatus::Verified);
        info.mobile_list
            .insert("9876543210".to_string(), VerificationStatus::Unverified);

        assert_eq!(info.verified_email(), Some("b@example.com".to_string()));
        assert_eq!(info.verified_mobile(), None);
    }

    #[test]
    fn user_type_labels_match_analytics_dimensions() {
        assert_eq!(UserType::New.as_str(), "New");
        assert_eq!(UserType::Trial.to_string(), "trial");
        assert_eq!(UserType::Expired.as_str(), "expired");
    }
}
