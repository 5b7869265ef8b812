//! Injected dependencies for the session reducers and service.
//!
//! Explicit dependency injection: the environment is built after the
//! providers exist and passed into the store constructor, so there is no
//! lazy-singleton wiring and no circular import ordering. Reducers read
//! providers from here when describing effects; the service holds a clone
//! for its own imperative work.

use std::sync::Arc;

use certflow_core::environment::{Clock, SystemClock};

use crate::config::MerchantConfig;
use crate::providers::{EntitlementApi, Navigator, PaymentApi, SsoClient};
use crate::storage::{CookieJar, StorageArea};

/// Dependencies injected into the session reducers and service.
#[derive(Clone)]
pub struct SessionEnvironment {
    /// SSO SDK adapter.
    pub sso: Arc<dyn SsoClient>,

    /// Entitlement endpoint client.
    pub entitlements: Arc<dyn EntitlementApi>,

    /// Transaction-initiation endpoint client.
    pub payments: Arc<dyn PaymentApi>,

    /// Hosting-page cookies.
    pub cookies: Arc<dyn CookieJar>,

    /// Hosting-page session storage.
    pub storage: Arc<dyn StorageArea>,

    /// Hosting-page navigation.
    pub navigator: Arc<dyn Navigator>,

    /// Time source.
    pub clock: Arc<dyn Clock>,

    /// Merchant configuration.
    pub config: MerchantConfig,
}

impl SessionEnvironment {
    /// Assemble an environment from its providers.
    #[must_use]
    #[allow(clippy::too_many_arguments)] // One argument per injected dependency
    pub fn new(
        sso: Arc<dyn SsoClient>,
        entitlements: Arc<dyn EntitlementApi>,
        payments: Arc<dyn PaymentApi>,
        cookies: Arc<dyn CookieJar>,
        storage: Arc<dyn StorageArea>,
        navigator: Arc<dyn Navigator>,
        config: MerchantConfig,
    ) -> Self {
        Self {
            sso,
            entitlements,
            payments,
            cookies,
            storage,
            navigator,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source (tests).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl std::fmt::Debug for SessionEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEnvironment")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
