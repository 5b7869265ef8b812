//! Provider traits for external dependencies.
//!
//! This module defines traits for every external dependency of the session
//! core. Providers are **interfaces**, not implementations: reducers and
//! the service depend on these traits, and the embedding application
//! supplies concrete implementations (or the bundled mocks in tests).
//!
//! - [`SsoClient`]: the third-party SSO SDK, adapted from its
//!   callback style into awaitable results
//! - [`EntitlementApi`]: the OAuth-style user-token endpoint
//! - [`PaymentApi`]: the transaction-initiation endpoint
//! - [`Navigator`]: the hosting page (redirects, referrer, blocking loader)
//!
//! Cookie and session-storage access live in [`crate::storage`].

pub mod entitlements;
pub mod navigator;
pub mod payment;
pub mod sso;

pub use entitlements::{EntitlementApi, HttpEntitlementApi, ProductDetail, UserTokenData,
    UserTokenRequest, UserTokenResponse};
pub use navigator::Navigator;
pub use payment::{HttpPaymentApi, PaymentApi, TransactionBody, TransactionRequest,
    TransactionResponse};
pub use sso::{RegistrationRequest, SdkTicket, SdkUserDetails, SsoClient, VerifyOutcome};
