//! Session configuration.
//!
//! This module provides the configuration consumed by the session service,
//! login flow, and payment continuation. Configuration values are provided
//! by the embedding application; nothing here reads ambient globals, which
//! keeps the one genuinely environment-coupled seam (the hosting page)
//! behind the [`crate::providers::Navigator`] and storage traits.

use std::time::Duration;

/// Permission string that short-circuits upgrade eligibility and marks the
/// user as part of a group subscription.
pub const PERMISSION_GROUP_SUBSCRIPTION: &str = "group_subscription";

/// Merchant-scoped configuration for the session core.
///
/// # Example
///
/// ```
/// use certflow_session::config::MerchantConfig;
///
/// let config = MerchantConfig::new("ET", "ETPR")
///     .with_auth_domain("https://auth.example.com")
///     .with_subs_domain("https://subs.example.com")
///     .with_login_host("https://login.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct MerchantConfig {
    /// Merchant code (e.g. "ET"). Routed into every SDK call and endpoint
    /// path.
    pub merchant: String,

    /// Platform identifier passed to the SDK (e.g. "WEB").
    pub platform: String,

    /// Product code matched against the entitlement payload's
    /// `productDetails` entries (e.g. "ETPR").
    pub product_code: String,

    /// `x-client-id` header for the entitlement endpoint.
    pub client_id: String,

    /// `x-device-id` header for the entitlement endpoint.
    pub device_id: String,

    /// `x-site-app-code` header for the entitlement endpoint.
    pub app_code: String,

    /// Base URL of the entitlement/OAuth host.
    pub auth_domain: String,

    /// Base URL of the subscription host (transaction initiation).
    pub subs_domain: String,

    /// Login host used for redirect-based authentication handoffs; also the
    /// referrer that marks a return from a payment-initiated login.
    pub login_host: String,

    /// Base URL of the portal itself; payment failures redirect to
    /// merchant-scoped error routes under it.
    pub site_host: String,

    /// Domain that session cookies are scoped to.
    pub cookie_domain: String,

    /// Geo region (country code) used in the transaction path.
    pub geo_region: String,

    /// Upgrade-eligibility policy (merchant carve-outs).
    pub upgrade_policy: UpgradePolicy,

    /// Merchants that refuse transaction initiation without a verified
    /// contact, redirecting to an error route instead.
    pub verified_contact_merchants: Vec<String>,

    /// Bounded SDK readiness poll: attempts before giving up.
    pub sdk_ready_attempts: u32,

    /// Bounded SDK readiness poll: pause between attempts.
    pub sdk_ready_interval: Duration,

    /// Fixed delay applied by the standard (non-direct) payment initiation
    /// path before calling the transaction endpoint.
    pub standard_initiation_delay: Duration,

    /// Background login poller settings.
    pub poller: PollerConfig,
}

impl MerchantConfig {
    /// Create a configuration for the given merchant and product codes.
    #[must_use]
    pub fn new(merchant: impl Into<String>, product_code: impl Into<String>) -> Self {
        let merchant = merchant.into();
        Self {
            upgrade_policy: UpgradePolicy::blocking(vec![merchant.clone()]),
            merchant,
            platform: "WEB".to_string(),
            product_code: product_code.into(),
            client_id: String::new(),
            device_id: uuid::Uuid::new_v4().to_string(),
            app_code: String::new(),
            auth_domain: String::new(),
            subs_domain: String::new(),
            login_host: String::new(),
            site_host: String::new(),
            cookie_domain: String::new(),
            geo_region: "IN".to_string(),
            verified_contact_merchants: Vec::new(),
            sdk_ready_attempts: 10,
            sdk_ready_interval: Duration::from_millis(100),
            standard_initiation_delay: Duration::from_millis(300),
            poller: PollerConfig::default(),
        }
    }

    /// Set the platform identifier.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Set the entitlement host.
    #[must_use]
    pub fn with_auth_domain(mut self, auth_domain: impl Into<String>) -> Self {
        self.auth_domain = auth_domain.into();
        self
    }

    /// Set the subscription host.
    #[must_use]
    pub fn with_subs_domain(mut self, subs_domain: impl Into<String>) -> Self {
        self.subs_domain = subs_domain.into();
        self
    }

    /// Set the login host.
    #[must_use]
    pub fn with_login_host(mut self, login_host: impl Into<String>) -> Self {
        self.login_host = login_host.into();
        self
    }

    /// Set the portal host used for error routes.
    #[must_use]
    pub fn with_site_host(mut self, site_host: impl Into<String>) -> Self {
        self.site_host = site_host.into();
        self
    }

    /// Set the cookie domain.
    #[must_use]
    pub fn with_cookie_domain(mut self, cookie_domain: impl Into<String>) -> Self {
        self.cookie_domain = cookie_domain.into();
        self
    }

    /// Set the entitlement endpoint headers.
    #[must_use]
    pub fn with_client(
        mut self,
        client_id: impl Into<String>,
        app_code: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.app_code = app_code.into();
        self
    }

    /// Override the upgrade-eligibility policy.
    #[must_use]
    pub fn with_upgrade_policy(mut self, policy: UpgradePolicy) -> Self {
        self.upgrade_policy = policy;
        self
    }

    /// Set the merchants that require a verified contact for transactions.
    #[must_use]
    pub fn with_verified_contact_merchants(mut self, merchants: Vec<String>) -> Self {
        self.verified_contact_merchants = merchants;
        self
    }

    /// Override the background login poller settings.
    #[must_use]
    pub const fn with_poller(mut self, poller: PollerConfig) -> Self {
        self.poller = poller;
        self
    }

    /// Override the SDK readiness poll bounds.
    #[must_use]
    pub const fn with_sdk_ready(mut self, attempts: u32, interval: Duration) -> Self {
        self.sdk_ready_attempts = attempts;
        self.sdk_ready_interval = interval;
        self
    }

    /// Whether this merchant requires a verified contact for transactions.
    #[must_use]
    pub fn requires_verified_contact(&self) -> bool {
        self.verified_contact_merchants
            .iter()
            .any(|m| m == &self.merchant)
    }
}

/// Upgrade-eligibility policy.
///
/// The original system hard-coded per-merchant carve-outs; they are carried
/// here as data so the rules can be completed or retired per deployment
/// without touching flow code.
#[derive(Debug, Clone, Default)]
pub struct UpgradePolicy {
    /// Merchants whose users never see the upgrade CTA, even when otherwise
    /// eligible.
    pub blocked_merchants: Vec<String>,
}

impl UpgradePolicy {
    /// Policy that blocks the upgrade CTA for the given merchants.
    #[must_use]
    pub const fn blocking(blocked_merchants: Vec<String>) -> Self {
        Self { blocked_merchants }
    }

    /// Whether the upgrade CTA is blocked for `merchant`.
    #[must_use]
    pub fn blocks(&self, merchant: &str) -> bool {
        self.blocked_merchants.iter().any(|m| m == merchant)
    }
}

/// Background login poller bounds.
///
/// The poller watches for an out-of-band login (e.g. completed in a popup
/// driven by the SDK) and must terminate even when login never resolves:
/// it stops at the iteration cap or the wall-clock ceiling, whichever
/// comes first.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    /// Pause between checks.
    pub interval: Duration,

    /// Maximum number of checks.
    pub max_iterations: u32,

    /// Hard wall-clock ceiling across all checks.
    pub max_duration: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_iterations: 30,
            max_duration: Duration::from_secs(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_merchant_blocks_upgrade_by_default() {
        let config = MerchantConfig::new("ET", "ETPR");
        assert!(config.upgrade_policy.blocks("ET"));
        assert!(!config.upgrade_policy.blocks("TIMES"));
    }

    #[test]
    fn custom_policy_replaces_default_carve_out() {
        let config = MerchantConfig::new("ET", "ETPR")
            .with_upgrade_policy(UpgradePolicy::blocking(vec!["OTHER".to_string()]));
        assert!(!config.upgrade_policy.blocks("ET"));
        assert!(config.upgrade_policy.blocks("OTHER"));
    }

    #[test]
    fn verified_contact_requirement_is_merchant_scoped() {
        let config = MerchantConfig::new("ET", "ETPR")
            .with_verified_contact_merchants(vec!["ET".to_string()]);
        assert!(config.requires_verified_contact());

        let other = MerchantConfig::new("TIMES", "TPR");
        assert!(!other.requires_verified_contact());
    }
}
