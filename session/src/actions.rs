//! Application actions.
//!
//! This module defines all possible inputs to the session reducers.
//! Actions follow the command/event split: **commands** express user or
//! service intent (`CheckUserSubmitted`, `LogoutRequested`), **events**
//! carry the results of async effects back into the reducers
//! (`UserStatusResolved`, `AuthCompleted`).
//!
//! # Architecture Note
//!
//! Actions are the **only** way to mutate the store. Event payloads carry
//! plain strings for errors (the user-facing message), keeping the enum
//! cheap to clone and broadcast.

use serde::{Deserialize, Serialize};

use crate::plan::PaymentPlan;
use crate::state::{ChannelContext, RegistrationResponse, UserInfo, UserStatus, UserType};

/// Which analytics dimension map a tracked event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalyticsTarget {
    /// GA dimensions (`updateGAEvents`).
    Ga,
    /// Comscore dimensions (`updateCSEvents`).
    Cs,
}

/// Application action.
///
/// One enum spans the session, login-flow, and analytics domains; the
/// combined reducer routes every action through all three reducers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Session / Auth Domain
    // ═══════════════════════════════════════════════════════════════════════
    /// Channel routing context resolved from configuration.
    ChannelConfigured {
        /// Merchant/platform context.
        channel: ChannelContext,
    },

    /// A login round-trip resolved a user.
    ///
    /// Cookie writes for this resolution happen in the same continuation
    /// that dispatches this action, so no observer sees a ticket cookie
    /// without the matching store entry.
    LoginResolved {
        /// Resolved identity.
        user_info: UserInfo,
    },

    /// A login round-trip concluded without a user (SDK says not logged
    /// in, SDK unavailable, or validation failed). Clears auth state.
    LoginFailed,

    /// Out-of-band notification that a login check concluded.
    ///
    /// This is an **event** produced by effects so that it reaches the
    /// action broadcast, where external listeners observe it the way
    /// hosted-page listeners observed the DOM `loginCheck` event.
    LoginChecked {
        /// Whether the check concluded logged-in.
        is_logged: bool,
    },

    /// Entitlements resolved for the configured product.
    PermissionsResolved {
        /// Ordered capability strings.
        permissions: Vec<String>,
        /// Ordered feature strings.
        accessible_features: Vec<String>,
        /// Opaque subscription record.
        subscription_detail: Option<serde_json::Value>,
        /// Classified tier.
        user_type: UserType,
        /// Refreshed one-time token, when returned.
        token: Option<String>,
    },

    /// The after-login continuation stack was flushed.
    AfterLoginProcessed,

    /// Session cleared (logout cleanup).
    LoggedOut,

    // ═══════════════════════════════════════════════════════════════════════
    // Login Flow - Field Edits
    // ═══════════════════════════════════════════════════════════════════════
    /// Identifier input edited.
    EmailOrMobileChanged {
        /// New value.
        value: String,
    },

    /// Password input edited.
    PasswordChanged {
        /// New value.
        value: String,
    },

    /// Name input edited.
    NameChanged {
        /// New value.
        value: String,
    },

    /// Mobile input edited.
    MobileChanged {
        /// New value.
        value: String,
    },

    /// One OTP digit edited.
    OtpDigitChanged {
        /// Digit position, 0-based.
        index: usize,
        /// New digit (single character or empty).
        value: String,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Login Flow - Existence Check
    // ═══════════════════════════════════════════════════════════════════════
    /// Identifier submitted from the login-input screen.
    CheckUserSubmitted,

    /// Existence check resolved.
    UserStatusResolved {
        /// Classification for the submitted identifier.
        status: UserStatus,
    },

    /// Existence check failed.
    CheckUserFailed {
        /// User-facing message.
        message: String,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Login Flow - Registration
    // ═══════════════════════════════════════════════════════════════════════
    /// Registration form submitted.
    RegisterSubmitted,

    /// Registration succeeded; a signup OTP is on its way.
    RegistrationSucceeded {
        /// Identity fields echoed by the SDK, kept for fallback.
        response: RegistrationResponse,
    },

    /// Registration rejected.
    RegistrationFailed {
        /// User-facing message.
        message: String,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Login Flow - Password Login
    // ═══════════════════════════════════════════════════════════════════════
    /// Password submitted on the password-login screen.
    PasswordLoginSubmitted,

    // ═══════════════════════════════════════════════════════════════════════
    // Login Flow - OTP
    // ═══════════════════════════════════════════════════════════════════════
    /// "Login via OTP" chosen on the password-login screen.
    SendOtpRequested,

    /// Login OTP sent; switch to the OTP screen.
    OtpSent,

    /// Resend requested on the OTP screen.
    ResendOtpRequested,

    /// OTP resent.
    OtpResent,

    /// OTP send/resend failed.
    SendOtpFailed {
        /// User-facing message.
        message: String,
    },

    /// OTP submitted for verification.
    OtpVerifySubmitted,

    /// OTP verification rejected.
    OtpVerifyFailed {
        /// User-facing message.
        message: String,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Login Flow - Forgot Password
    // ═══════════════════════════════════════════════════════════════════════
    /// "Forgot password" chosen on the password-login screen.
    ForgotPasswordRequested,

    /// Reset OTP sent; switch to the reset screen.
    ResetOtpSent,

    /// OTP + new password submitted on the reset screen.
    ResetPasswordSubmitted,

    /// Password reset completed; back to password login.
    PasswordResetCompleted,

    /// Password reset rejected.
    ResetPasswordFailed {
        /// User-facing message.
        message: String,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Login Flow - Completion
    // ═══════════════════════════════════════════════════════════════════════
    /// A login or registration-verification sequence fully resolved,
    /// including the identity fetch.
    ///
    /// Both the session reducer (shared auth state) and the login-flow
    /// reducer (screen advance) handle this event.
    AuthCompleted {
        /// Resolved identity (fresh fetch, or response fallback).
        user_info: UserInfo,
    },

    /// A login sequence failed past validation.
    AuthFailed {
        /// User-facing banner message.
        message: String,
    },

    /// Plan catalog loaded for the plan-selection screen.
    PlansLoaded {
        /// Offered plans.
        plans: Vec<PaymentPlan>,
    },

    /// Flow dismissed or completed; return to the initial screen.
    FlowReset,

    // ═══════════════════════════════════════════════════════════════════════
    // Analytics
    // ═══════════════════════════════════════════════════════════════════════
    /// Record an analytics dimension and mirror it to session storage.
    TrackEvent {
        /// Which dimension map to update.
        target: AnalyticsTarget,
        /// Dimension key.
        key: String,
        /// Dimension value.
        value: String,
    },
}
