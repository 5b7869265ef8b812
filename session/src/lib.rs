//! # Certflow Session
//!
//! The login/registration/payment orchestration core of the certflow
//! certification-program portal.
//!
//! This crate reconciles three independent asynchronous authority sources -
//! the third-party SSO SDK, cookie-based session state, and the payment
//! plan persisted in session storage - while driving the multi-screen
//! login flow and the redirect-based handoff to the hosted checkout.
//!
//! ## Architecture
//!
//! State lives in one store and is mutated only through reducer actions:
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! - [`state::AppState`]: session/auth, login-flow, analytics, and channel
//!   domains under one root
//! - [`reducers`]: the session, login-flow, and analytics reducers,
//!   combined over the shared state
//! - [`service::SessionService`]: the SSO session lifecycle - init,
//!   permission resolution, logout, forced refresh, the after-login
//!   continuation stack, and the bounded login poller
//! - [`checkout::CheckoutFlow`]: the payment continuation handshake across
//!   the authentication redirect boundary
//! - [`storage`]: cookie and session-storage bridge with typed,
//!   merge-not-replace records
//! - [`providers`]: traits for the SSO SDK, entitlement endpoint,
//!   transaction endpoint, and hosting page
//!
//! ## Example: wiring the core
//!
//! ```ignore
//! use certflow_session::prelude::*;
//!
//! let config = MerchantConfig::new("ET", "ETPR")
//!     .with_auth_domain("https://auth.example.com")
//!     .with_subs_domain("https://subs.example.com")
//!     .with_login_host("https://login.example.com");
//!
//! let env = SessionEnvironment::new(sso, entitlements, payments, cookies, storage, navigator, config);
//! let store = build_store(env.clone());
//! let service = SessionService::new(store, env);
//!
//! service.init().await;
//! let logged_in = service.store().state(|s| s.session.is_login).await;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod checkout;
pub mod config;
pub mod entitlement;
pub mod environment;
pub mod error;
pub mod plan;
pub mod providers;
pub mod reducers;
pub mod service;
pub mod state;
pub mod storage;
pub mod validate;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use actions::AppAction;
pub use checkout::{CheckoutFlow, ErrorRoute};
pub use config::MerchantConfig;
pub use environment::SessionEnvironment;
pub use error::{Result, SessionError};
pub use plan::PaymentPlan;
pub use service::{SessionService, SessionStore, build_store};
pub use state::{AppState, LoginScreen, UserInfo, UserType};

/// Convenience imports for embedding applications.
pub mod prelude {
    pub use crate::actions::AppAction;
    pub use crate::checkout::CheckoutFlow;
    pub use crate::config::MerchantConfig;
    pub use crate::environment::SessionEnvironment;
    pub use crate::plan::PaymentPlan;
    pub use crate::service::{SessionService, build_store};
    pub use crate::state::{AppState, LoginScreen, UserInfo, UserType};
}
