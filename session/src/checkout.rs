//! Payment continuation handshake.
//!
//! Bridges a client-side plan selection across the authentication redirect
//! boundary: the selected plan is persisted (merge, not replace) before any
//! step that can leave the page, and the flow resumes from the persisted
//! record on return. The gateway handoff is a full-page navigation to the
//! returned `resultUrl` - the core never implements payment processing.
//!
//! Every recognized failure is routed to a distinct merchant-scoped error
//! URL so the failure is attributable post-hoc from the URL alone.

use std::time::Duration;

use crate::environment::SessionEnvironment;
use crate::error::{Result, SessionError};
use crate::plan::PaymentPlan;
use crate::providers::payment::{TransactionBody, TransactionRequest};
use crate::service::SessionStore;
use crate::state::UserInfo;
use crate::storage::StorageAreaExt;

/// Merchant-scoped error routes for payment failures.
///
/// Each maps to a distinct `errorType` query value, so the failure class
/// is diagnosable from the redirect URL without an in-page error boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRoute {
    /// The endpoint rejected the request outright (HTTP 400).
    BadRequest,
    /// The deal code was rejected.
    InvalidDealCode,
    /// The 30-second initiation deadline expired.
    Timeout,
    /// The merchant requires a verified contact and none exists.
    VerifiedContactRequired,
    /// Anything else.
    Generic,
}

impl ErrorRoute {
    /// The `errorType` query value for this route.
    #[must_use]
    pub const fn error_type(self) -> &'static str {
        match self {
            Self::BadRequest => "badRequest",
            Self::InvalidDealCode => "invalidDealCode",
            Self::Timeout => "timeout",
            Self::VerifiedContactRequired => "verifiedContactRequired",
            Self::Generic => "generic",
        }
    }

    /// Full redirect URL for this route under the configured portal host.
    #[must_use]
    pub fn url(self, site_host: &str, merchant: &str) -> String {
        format!(
            "{site_host}/payment/error?errorType={}&merchant={merchant}",
            self.error_type()
        )
    }
}

/// Classify an initiation failure into its error route.
fn route_for(error: &SessionError) -> ErrorRoute {
    match error {
        SessionError::Timeout => ErrorRoute::Timeout,
        SessionError::InvalidDealCode { .. } => ErrorRoute::InvalidDealCode,
        SessionError::MissingVerifiedContact => ErrorRoute::VerifiedContactRequired,
        SessionError::Api { status: 400, .. } => ErrorRoute::BadRequest,
        _ => ErrorRoute::Generic,
    }
}

/// The payment continuation flow.
pub struct CheckoutFlow {
    store: SessionStore,
    env: SessionEnvironment,
}

impl CheckoutFlow {
    /// Create the flow over the store and environment.
    #[must_use]
    pub const fn new(store: SessionStore, env: SessionEnvironment) -> Self {
        Self { store, env }
    }

    /// Continue a selected plan toward checkout.
    ///
    /// Shows the blocking loader, persists the plan with merge semantics
    /// (fields set earlier, like `checkReferer`, survive), then initiates
    /// the transaction - or, when unauthenticated, marks the plan and
    /// hands off to the login host. The loader is always hidden in a final
    /// step regardless of outcome.
    ///
    /// # Errors
    ///
    /// Returns the initiation failure after the error-route redirect has
    /// been issued; callers may ignore it.
    pub async fn continue_to_pay(&self, plan: &PaymentPlan) -> Result<()> {
        self.env.navigator.show_blocking_loader();

        if let Err(e) = self.env.storage.persist_selected_plan(plan) {
            tracing::warn!(error = %e, "failed to persist selected plan");
        }

        // Direct plans skip the standard path's settle delay
        let delay = if plan.direct {
            None
        } else {
            Some(self.env.config.standard_initiation_delay)
        };

        let outcome = self.initiate(plan, delay).await;

        self.env.navigator.hide_blocking_loader();
        outcome
    }

    /// Shared structure of the direct and standard initiation paths.
    async fn initiate(&self, plan: &PaymentPlan, delay: Option<Duration>) -> Result<()> {
        let config = &self.env.config;

        let (is_login, user_info) = self
            .store
            .state(|s| (s.session.is_login, s.session.user_info.clone()))
            .await;

        let Some(user) = user_info.filter(|_| is_login) else {
            // Auth gate: mark the persisted plan so the return leg knows
            // this selection was already in motion, then hand off to login
            self.env.navigator.hide_blocking_loader();
            let _ = self.env.storage.mark_selected_plan_check_referer(true);
            let login_url = format!("{}?ru={}", config.login_host, config.merchant);
            self.env.navigator.redirect(&login_url);
            return Ok(());
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let body = match self.build_body(plan, &user) {
            Ok(body) => body,
            Err(e) => {
                self.redirect_error(route_for(&e));
                return Err(e);
            },
        };

        let request = TransactionRequest {
            merchant: config.merchant.clone(),
            product_code: config.product_code.clone(),
            plan_code: plan.plan_code.clone(),
            geo_region: config.geo_region.clone(),
            body,
        };

        match self.env.payments.initiate_transaction(&request).await {
            Ok(response) => {
                if let Some(result_url) = response.result_url {
                    // Gateway handoff is a full navigation, by design
                    self.env.navigator.redirect(&result_url);
                    Ok(())
                } else {
                    let error = SessionError::Internal(
                        "transaction initiation returned no result URL".to_string(),
                    );
                    self.redirect_error(ErrorRoute::Generic);
                    Err(error)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, plan_code = %plan.plan_code, "transaction initiation failed");
                self.redirect_error(route_for(&e));
                Err(e)
            },
        }
    }

    /// Build the initiation body from plan, identity, attribution, and geo
    /// data.
    ///
    /// Identity is chosen by verified-contact precedence: verified email,
    /// then verified mobile. Merchants configured to require a verified
    /// contact fail here instead of proceeding with an unverified one.
    fn build_body(&self, plan: &PaymentPlan, user: &UserInfo) -> Result<TransactionBody> {
        let (email, mobile) = if let Some(email) = user.verified_email() {
            (Some(email), None)
        } else if let Some(mobile) = user.verified_mobile() {
            (None, Some(mobile))
        } else if self.env.config.requires_verified_contact() {
            return Err(SessionError::MissingVerifiedContact);
        } else {
            (
                user.primary_email.clone().or_else(|| user.email_id.clone()),
                None,
            )
        };

        Ok(TransactionBody {
            plan_code: plan.plan_code.clone(),
            final_plan_price: plan.final_plan_price,
            currency: plan.currency.clone(),
            recurring: plan.recurring,
            auto_renew: plan.auto_renew,
            deal_code: plan.deal_code.clone(),
            si_consent: plan.si_consent.clone(),
            ab_test_key: plan.ab_test_key.clone(),
            udf6: plan.udf6.clone(),
            udf7: plan.udf7.clone(),
            udf8: plan.udf8.clone(),
            is_extend: plan.is_extend,
            is_renew: plan.is_renew,
            email,
            mobile,
            acquisition: self.env.storage.acq_sources(),
            initiated_at: self.env.clock.now(),
        })
    }

    /// Redirect to the merchant-scoped error route.
    fn redirect_error(&self, route: ErrorRoute) {
        let config = &self.env.config;
        let url = route.url(&config.site_host, &config.merchant);
        tracing::warn!(error_type = route.error_type(), "redirecting to payment error route");
        self.env.navigator.redirect(&url);
    }
}

impl std::fmt::Debug for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}
