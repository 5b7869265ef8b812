//! SSO SDK adapter.
//!
//! The third-party SSO SDK is a dynamically loaded script exposing a
//! constructor and callback-style methods. This trait converts each
//! callback-based SDK operation into an awaitable result, isolating the
//! callback style (and the ambient script global) to the implementation
//! behind this one seam.
//!
//! SDK readiness is bounded: [`SsoClient::ensure_ready`] polls for the
//! exposed class up to a configured number of attempts before giving up.
//! Absence after the cap is a recoverable condition (the caller degrades
//! to "not logged in"), not a fatal error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::state::{ChannelContext, UserInfo, UserStatus, VerificationStatus};

/// Opaque session credential pair issued by the SSO provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkTicket {
    /// Ticket id, mirrored into the `TicketId` cookie.
    pub ticket_id: String,

    /// Encrypted ticket, mirrored into the `encTicket` cookie.
    pub enc_ticket: String,
}

/// Full user record returned by the SDK's detail call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdkUserDetails {
    /// SSO identifier.
    pub sso_id: String,

    /// Primary email.
    pub primary_email: Option<String>,

    /// Email identifier.
    pub email_id: Option<String>,

    /// First name.
    pub first_name: Option<String>,

    /// Login identifier.
    pub login_id: Option<String>,

    /// Email identifiers with verification status.
    pub email_list: BTreeMap<String, VerificationStatus>,

    /// Mobile identifiers with verification status.
    pub mobile_list: BTreeMap<String, VerificationStatus>,
}

/// Registration input for an unregistered or unverified identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Identifier being registered (email or mobile).
    pub identifier: String,

    /// Display name.
    pub name: String,

    /// Chosen password.
    pub password: String,

    /// Optional mobile number captured alongside an email registration.
    pub mobile: Option<String>,
}

/// Result of an OTP verification call.
///
/// Identity fields are best-effort: the canonical identity comes from a
/// forced detail fetch afterwards, and these fields are the fallback when
/// that fetch fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    /// Fresh ticket, when verification established a session.
    pub ticket: Option<SdkTicket>,

    /// SSO id echoed on the verification response.
    pub sso_id: Option<String>,

    /// Email id echoed on the verification response.
    pub email_id: Option<String>,

    /// First name echoed on the verification response.
    pub first_name: Option<String>,

    /// Login id echoed on the verification response.
    pub login_id: Option<String>,
}

impl VerifyOutcome {
    /// Best-effort identity extracted directly from this response.
    ///
    /// Used when the post-verification detail fetch fails; the rest of the
    /// app still observes the new identity immediately.
    #[must_use]
    pub fn fallback_user_info(&self, identifier: &str) -> UserInfo {
        UserInfo {
            sso_id: self.sso_id.clone().unwrap_or_default(),
            primary_email: self.email_id.clone(),
            email_id: self.email_id.clone(),
            first_name: self.first_name.clone(),
            login_id: self.login_id.clone(),
            ticket_id: self.ticket.as_ref().map(|t| t.ticket_id.clone()),
            identifier: Some(identifier.to_string()),
            is_logged: true,
            email_list: BTreeMap::new(),
            mobile_list: BTreeMap::new(),
        }
    }
}

/// Awaitable adapter over the callback-style SSO SDK.
///
/// Every call carries the per-session [`ChannelContext`]. Implementations
/// must map SDK business rejections to [`crate::error::SessionError::Sdk`]
/// and an unavailable SDK to
/// [`crate::error::SessionError::SdkUnavailable`].
#[async_trait]
pub trait SsoClient: Send + Sync {
    /// One readiness attempt: load the SDK script if absent and check
    /// whether its class is available.
    ///
    /// The session service bounds the retries; implementations perform a
    /// single check per call.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SessionError::SdkUnavailable`] when the
    /// class is not (yet) present.
    async fn ensure_ready(&self) -> Result<()>;

    /// Re-create the SDK instance, discarding any SDK-side session cache.
    ///
    /// Used before reads that must observe a just-changed login state.
    ///
    /// # Errors
    ///
    /// Returns an error when the SDK is unavailable.
    async fn recreate(&self) -> Result<()>;

    /// The SDK's "get valid logged-in user" operation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SessionError::NotLoggedIn`] when no valid
    /// session exists.
    async fn get_valid_logged_in_user(&self, channel: &ChannelContext) -> Result<SdkTicket>;

    /// Fetch the full user record for a ticket.
    ///
    /// # Errors
    ///
    /// Returns an error when the ticket is stale or the SDK call fails.
    async fn get_user_details(
        &self,
        ticket_id: &str,
        channel: &ChannelContext,
    ) -> Result<SdkUserDetails>;

    /// Check whether an identifier has an account and whether it is
    /// verified.
    ///
    /// # Errors
    ///
    /// Returns an error when the SDK call fails.
    async fn check_user_exists(
        &self,
        identifier: &str,
        channel: &ChannelContext,
    ) -> Result<UserStatus>;

    /// Register a new account; the SDK sends a signup OTP.
    ///
    /// # Errors
    ///
    /// Returns a business rejection when the identifier already has an
    /// account.
    async fn register_user(
        &self,
        request: &RegistrationRequest,
        channel: &ChannelContext,
    ) -> Result<crate::state::RegistrationResponse>;

    /// Password login for a verified identifier.
    ///
    /// # Errors
    ///
    /// Returns a business rejection on bad credentials.
    async fn password_login(
        &self,
        identifier: &str,
        password: &str,
        channel: &ChannelContext,
    ) -> Result<SdkTicket>;

    /// Send a login OTP to a verified identifier.
    ///
    /// # Errors
    ///
    /// Returns an error when the SDK call fails.
    async fn send_login_otp(&self, identifier: &str, channel: &ChannelContext) -> Result<()>;

    /// Re-send the signup OTP issued at registration.
    ///
    /// # Errors
    ///
    /// Returns an error when the SDK call fails.
    async fn resend_signup_otp(&self, identifier: &str, channel: &ChannelContext) -> Result<()>;

    /// Send a password-reset OTP.
    ///
    /// # Errors
    ///
    /// Returns an error when the SDK call fails.
    async fn send_forgot_password_otp(
        &self,
        identifier: &str,
        channel: &ChannelContext,
    ) -> Result<()>;

    /// Verify the OTP sent at registration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SessionError::Sdk`] with code 414 on an
    /// incorrect OTP.
    async fn verify_signup_otp(
        &self,
        identifier: &str,
        otp: &str,
        channel: &ChannelContext,
    ) -> Result<VerifyOutcome>;

    /// Verify a login OTP.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SessionError::Sdk`] with code 414 on an
    /// incorrect OTP.
    async fn verify_login_otp(
        &self,
        identifier: &str,
        otp: &str,
        channel: &ChannelContext,
    ) -> Result<VerifyOutcome>;

    /// Reset the password using a forgot-password OTP.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SessionError::Sdk`] with code 414 on an
    /// incorrect OTP.
    async fn reset_password(
        &self,
        identifier: &str,
        otp: &str,
        new_password: &str,
        channel: &ChannelContext,
    ) -> Result<()>;

    /// Sign the user out of the SSO session.
    ///
    /// # Errors
    ///
    /// Returns an error when the SDK call fails; callers must still run
    /// their cleanup.
    async fn sign_out(&self, channel: &ChannelContext) -> Result<()>;
}

/// Build a [`UserInfo`] from a detail record and the resolving ticket.
#[must_use]
pub fn user_info_from_details(details: SdkUserDetails, ticket_id: String) -> UserInfo {
    UserInfo {
        sso_id: details.sso_id,
        primary_email: details.primary_email,
        email_id: details.email_id,
        first_name: details.first_name,
        login_id: details.login_id.clone(),
        ticket_id: Some(ticket_id),
        identifier: details.login_id,
        is_logged: true,
        email_list: details.email_list,
        mobile_list: details.mobile_list,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_user_info_marks_logged_in() {
        let outcome = VerifyOutcome {
            ticket: Some(SdkTicket {
                ticket_id: "t1".to_string(),
                enc_ticket: "e1".to_string(),
            }),
            sso_id: Some("sso-9".to_string()),
            email_id: Some("user@example.com".to_string()),
            first_name: None,
            login_id: None,
        };

        let info = outcome.fallback_user_info("user@example.com");
        assert!(info.is_logged);
        assert_eq!(info.sso_id, "sso-9");
        assert_eq!(info.ticket_id, Some("t1".to_string()));
        assert_eq!(info.identifier, Some("user@example.com".to_string()));
    }

    #[test]
    fn user_info_from_details_carries_contact_lists() {
        let mut details = SdkUserDetails {
            sso_id: "sso-1".to_string(),
            ..SdkUserDetails::default()
        };
        details
            .email_list
            .insert("a@example.com".to_string(), VerificationStatus::Verified);

        let info = user_info_from_details(details, "t9".to_string());
        assert!(info.is_logged);
        assert_eq!(info.ticket_id, Some("t9".to_string()));
        assert_eq!(
            info.email_list.get("a@example.com"),
            Some(&VerificationStatus::Verified)
        );
    }
}
