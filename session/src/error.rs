//! Error types for session, login-flow, and payment operations.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// SDK business-rejection code for an incorrect OTP.
pub const CODE_INCORRECT_OTP: i64 = 414;

/// Error taxonomy for the session core.
///
/// Failures are organized by origin: the SSO SDK, the entitlement endpoint,
/// transport, and payment initiation. Service methods never let these escape
/// as panics; they degrade to "not logged in" or map to an error route.
#[derive(Debug, Error, Clone)]
pub enum SessionError {
    // ═══════════════════════════════════════════════════════════
    // SSO SDK
    // ═══════════════════════════════════════════════════════════
    /// The SDK rejected the operation with a business code
    /// (e.g. 414 for an incorrect OTP, duplicate-account codes).
    #[error("SDK rejected operation (code {code}): {message}")]
    Sdk {
        /// Provider business code.
        code: i64,
        /// Provider message.
        message: String,
    },

    /// The SDK script failed to load, or its class never materialized
    /// within the bounded readiness poll.
    ///
    /// Treated as equivalent to "not logged in" - never blocks the rest of
    /// the app.
    #[error("SSO SDK unavailable")]
    SdkUnavailable,

    /// No valid logged-in user.
    #[error("not logged in")]
    NotLoggedIn,

    // ═══════════════════════════════════════════════════════════
    // Entitlement / transaction endpoints
    // ═══════════════════════════════════════════════════════════
    /// Non-2xx response from an endpoint.
    #[error("API error (status {status})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Application-level code from the response body, if present.
        code: Option<i64>,
    },

    /// Transport-level failure (connection refused, DNS, TLS).
    #[error("HTTP transport error: {0}")]
    Http(String),

    /// Request exceeded its deadline.
    #[error("request timed out")]
    Timeout,

    /// The transaction endpoint rejected the deal code.
    #[error("invalid deal code")]
    InvalidDealCode {
        /// The rejected value, if the endpoint echoed it back.
        invalid_value: Option<String>,
    },

    /// The merchant requires a verified contact and the user has none.
    #[error("no verified contact available for transaction")]
    MissingVerifiedContact,

    // ═══════════════════════════════════════════════════════════
    // Internal
    // ═══════════════════════════════════════════════════════════
    /// A payload failed to serialize or deserialize.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not be exposed to users).
    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Returns `true` if this error is due to invalid user input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Sdk { .. } | Self::InvalidDealCode { .. } | Self::MissingVerifiedContact
        )
    }

    /// User-facing message for this error.
    ///
    /// Business rejections keep a specific message so the user can correct
    /// a specific input; everything else collapses into a generic
    /// retry-eligible banner. Wrong-password and locked-account are
    /// deliberately indistinguishable here to avoid leaking
    /// account-existence information.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Sdk { code, .. } if *code == CODE_INCORRECT_OTP => {
                "Incorrect OTP, please try again".to_string()
            },
            Self::Sdk { message, .. } if !message.is_empty() => message.clone(),
            Self::InvalidDealCode { .. } => "This offer code is not valid".to_string(),
            Self::MissingVerifiedContact => {
                "A verified email or mobile number is required".to_string()
            },
            _ => "Something went wrong, please try again".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incorrect_otp_keeps_specific_message() {
        let err = SessionError::Sdk {
            code: CODE_INCORRECT_OTP,
            message: "OTP mismatch".to_string(),
        };
        assert_eq!(err.user_message(), "Incorrect OTP, please try again");
    }

    #[test]
    fn transport_errors_collapse_to_generic_banner() {
        let err = SessionError::Http("connection refused".to_string());
        assert_eq!(err.user_message(), "Something went wrong, please try again");

        let timeout = SessionError::Timeout;
        assert_eq!(timeout.user_message(), err.user_message());
    }

    #[test]
    fn business_rejections_are_user_errors() {
        assert!(
            SessionError::Sdk {
                code: CODE_INCORRECT_OTP,
                message: String::new()
            }
            .is_user_error()
        );
        assert!(!SessionError::Timeout.is_user_error());
    }
}
