//! Mock providers for testing.
//!
//! In-memory, deterministic implementations of every provider trait, plus
//! a [`MockProviders`] bundle that assembles a full test environment. All
//! mocks share their state through `Arc`, so the copy held by a test
//! observes the calls made through the copy inside the environment.

use std::sync::Arc;

use crate::config::MerchantConfig;
use crate::environment::SessionEnvironment;
use crate::storage::{MemoryCookieJar, MemoryStorageArea};

pub use apis::{MockEntitlementApi, MockPaymentApi};
pub use navigator::{LoaderEvent, RecordingNavigator};
pub use sso::MockSsoClient;

pub mod apis;
pub mod navigator;
pub mod sso;

/// Configuration used by the bundled test environment.
#[must_use]
pub fn test_config() -> MerchantConfig {
    MerchantConfig::new("ET", "ETPR")
        .with_auth_domain("https://auth.example.com")
        .with_subs_domain("https://subs.example.com")
        .with_login_host("https://login.example.com")
        .with_site_host("https://certs.example.com")
        .with_cookie_domain(".example.com")
        .with_client("web-client", "CERT")
}

/// The full set of mock providers behind one environment.
#[derive(Clone, Default)]
pub struct MockProviders {
    /// SSO SDK mock.
    pub sso: MockSsoClient,

    /// Entitlement endpoint mock.
    pub entitlements: MockEntitlementApi,

    /// Transaction endpoint mock.
    pub payments: MockPaymentApi,

    /// In-memory cookie jar.
    pub cookies: MemoryCookieJar,

    /// In-memory session storage.
    pub storage: MemoryStorageArea,

    /// Recording navigator.
    pub navigator: RecordingNavigator,
}

impl MockProviders {
    /// Create a fresh provider set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble an environment over these providers.
    #[must_use]
    pub fn environment(&self, config: MerchantConfig) -> SessionEnvironment {
        SessionEnvironment::new(
            Arc::new(self.sso.clone()),
            Arc::new(self.entitlements.clone()),
            Arc::new(self.payments.clone()),
            Arc::new(self.cookies.clone()),
            Arc::new(self.storage.clone()),
            Arc::new(self.navigator.clone()),
            config,
        )
    }
}

/// A ready-to-use test environment over fresh mocks.
///
/// For tests that need to script or inspect the mocks, build a
/// [`MockProviders`] and call [`MockProviders::environment`] instead.
#[must_use]
pub fn test_environment() -> SessionEnvironment {
    MockProviders::new().environment(test_config())
}
