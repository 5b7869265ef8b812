//! SSO session service.
//!
//! The service reconciles in-browser session cookies with the result of
//! the third-party SDK handshake, resolves entitlements, and owns the
//! after-login continuation stack. It is a facade over the store,
//! constructed after the store and providers exist (explicit dependency
//! injection - no lazy-singleton wiring).
//!
//! Failure semantics: no public method lets a provider error escape as a
//! panic or an unhandled error; every failure degrades to "not logged in"
//! plus cleanup. Cookie writes and the matching store update for one login
//! resolution happen in the same continuation after the awaited SDK call,
//! so no observer sees a ticket cookie without the store entry or vice
//! versa.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use certflow_runtime::Store;

use crate::actions::AppAction;
use crate::checkout::CheckoutFlow;
use crate::environment::SessionEnvironment;
use crate::error::{Result, SessionError};
use crate::providers::entitlements::UserTokenRequest;
use crate::providers::sso::{SdkTicket, user_info_from_details};
use crate::reducers::{AppReducer, app_reducer};
use crate::state::{AppState, ChannelContext, LoginScreen, UserInfo};
use crate::storage::{
    COOKIE_ENC_TICKET, COOKIE_ONE_TIME_TOKEN, COOKIE_SSO_ID, COOKIE_TICKET_ID, Cookie,
    LOGOUT_STORAGE_KEYS, SESSION_COOKIES, StorageAreaExt, set_cookie_if_changed,
};

/// The application store.
pub type SessionStore = Store<AppState, AppAction, SessionEnvironment, AppReducer>;

/// Build the application store over the given environment.
#[must_use]
pub fn build_store(env: SessionEnvironment) -> SessionStore {
    Store::new(AppState::default(), app_reducer(), env)
}

/// Mirror a ticket resolution into the session cookies.
///
/// Writes happen only when values actually changed, to avoid redundant
/// cookie churn on every login check.
pub(crate) fn persist_session_cookies(env: &SessionEnvironment, ticket: &SdkTicket, sso_id: &str) {
    let domain = env.config.cookie_domain.as_str();
    set_cookie_if_changed(
        env.cookies.as_ref(),
        Cookie::new(COOKIE_TICKET_ID, ticket.ticket_id.as_str(), domain),
    );
    set_cookie_if_changed(
        env.cookies.as_ref(),
        Cookie::new(COOKIE_ENC_TICKET, ticket.enc_ticket.as_str(), domain),
    );
    set_cookie_if_changed(
        env.cookies.as_ref(),
        Cookie::new(COOKIE_SSO_ID, sso_id, domain),
    );
}

/// Re-create the SDK session and read the identity with a fresh server
/// round-trip, bypassing any SDK-side cache.
///
/// Used after operations that are known to change login state (OTP
/// verification, password login) to avoid stale reads. Cookies are
/// persisted in the same continuation as the successful read.
///
/// # Errors
///
/// Returns the SDK error when no fresh identity could be resolved; the
/// caller falls back to whatever identity fields it already holds.
pub(crate) async fn fetch_fresh_identity(
    env: &SessionEnvironment,
    channel: &ChannelContext,
) -> Result<UserInfo> {
    env.sso.recreate().await?;
    let ticket = env.sso.get_valid_logged_in_user(channel).await?;
    let details = env.sso.get_user_details(&ticket.ticket_id, channel).await?;
    persist_session_cookies(env, &ticket, &details.sso_id);
    Ok(user_info_from_details(details, ticket.ticket_id))
}

/// Queued continuations deferred until the login round-trip completes.
struct AfterLoginStack {
    callbacks: Vec<Box<dyn FnOnce() + Send>>,
    done: bool,
}

/// SSO session service.
///
/// # Example
///
/// ```ignore
/// let env = SessionEnvironment::new(sso, entitlements, payments, cookies, storage, navigator, config);
/// let store = build_store(env.clone());
/// let service = SessionService::new(store, env);
/// service.init().await;
/// ```
pub struct SessionService {
    store: SessionStore,
    env: SessionEnvironment,
    checkout: CheckoutFlow,
    after_login: Mutex<AfterLoginStack>,
    /// Set when init detects a return from a payment-initiated login
    /// redirect (persisted plan flagged `check_referer` + matching
    /// referrer).
    returning_from_login: AtomicBool,
    /// One-shot guard: plan resumption fires at most once per flow
    /// instance, whichever of the success transition or the poller gets
    /// there first.
    resumption_fired: AtomicBool,
}

impl SessionService {
    /// Create the service over an existing store and environment.
    #[must_use]
    pub fn new(store: SessionStore, env: SessionEnvironment) -> Self {
        Self {
            checkout: CheckoutFlow::new(store.clone(), env.clone()),
            store,
            env,
            after_login: Mutex::new(AfterLoginStack {
                callbacks: Vec::new(),
                done: false,
            }),
            returning_from_login: AtomicBool::new(false),
            resumption_fired: AtomicBool::new(false),
        }
    }

    /// The store this service operates on.
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The payment continuation flow.
    #[must_use]
    pub const fn checkout(&self) -> &CheckoutFlow {
        &self.checkout
    }

    /// Idempotent process bootstrap.
    ///
    /// Sets the channel context, records a return from a payment-initiated
    /// login redirect when the referrer matches the login host, then
    /// resolves the current user. Never fails outward: every failure
    /// degrades to "not logged in".
    pub async fn init(&self) {
        let config = &self.env.config;
        let channel = ChannelContext {
            merchant: config.merchant.clone(),
            platform: config.platform.clone(),
        };
        let _ = self
            .store
            .send(AppAction::ChannelConfigured { channel })
            .await;

        // A persisted plan flagged check_referer means the payment flow
        // sent the user to login; trust it only when the referrer agrees
        if let Some(plan) = self.env.storage.selected_plan() {
            if plan.check_referer {
                let referrer_matches = self
                    .env
                    .navigator
                    .referrer()
                    .is_some_and(|r| r.starts_with(&config.login_host));
                if referrer_matches {
                    tracing::debug!("returning from payment-initiated login");
                    self.returning_from_login.store(true, Ordering::SeqCst);
                }
            }
        }

        self.get_user_detail().await;
    }

    /// Poll for SDK readiness, bounded by the configured attempt cap.
    ///
    /// Each attempt asks the adapter once; absence after the cap is a
    /// recoverable "not logged in", never a hard failure.
    async fn sdk_ready_bounded(&self) -> Result<()> {
        let config = &self.env.config;
        let mut last = SessionError::SdkUnavailable;

        for attempt in 0..config.sdk_ready_attempts {
            match self.env.sso.ensure_ready().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::trace!(attempt, error = %e, "SDK not ready yet");
                    last = e;
                },
            }
            tokio::time::sleep(config.sdk_ready_interval).await;
        }

        Err(last)
    }

    /// Resolve the current user through the SDK.
    ///
    /// On success, persists session cookies (only when changed), stores
    /// the identity, resolves entitlements, and flushes the after-login
    /// stack. On any failure, degrades to "not logged in".
    pub async fn get_user_detail(&self) {
        if let Err(e) = self.sdk_ready_bounded().await {
            tracing::warn!(error = %e, "SSO SDK never became ready");
            self.handle_not_logged_in().await;
            return;
        }

        let channel = self.store.state(|s| s.channel.clone()).await;

        let ticket = match self.env.sso.get_valid_logged_in_user(&channel).await {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::debug!(error = %e, "no valid logged-in user");
                self.handle_not_logged_in().await;
                return;
            },
        };

        match self.env.sso.get_user_details(&ticket.ticket_id, &channel).await {
            Ok(details) => {
                // Cookie writes and the store update belong to the same
                // continuation: nothing observes one without the other
                persist_session_cookies(&self.env, &ticket, &details.sso_id);
                let user_info = user_info_from_details(details, ticket.ticket_id.clone());
                let _ = self.store.send(AppAction::LoginResolved { user_info }).await;

                if let Err(e) = self.get_permissions().await {
                    tracing::warn!(error = %e, "entitlement resolution failed");
                }

                self.finish_login_processing().await;

                if self.returning_from_login.swap(false, Ordering::SeqCst) {
                    self.resume_returning_plan().await;
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "user detail fetch failed");
                self.handle_not_logged_in().await;
            },
        }
    }

    /// Force a fresh identity read, bypassing SDK-side caches.
    ///
    /// Resolves exactly once, with either the fresh identity or the error,
    /// even when the SDK is unavailable.
    ///
    /// # Errors
    ///
    /// Returns the SDK error when no fresh identity could be resolved; the
    /// session has already been degraded to "not logged in" in that case.
    pub async fn get_user_detail_forced(&self) -> Result<UserInfo> {
        let channel = self.store.state(|s| s.channel.clone()).await;

        match fetch_fresh_identity(&self.env, &channel).await {
            Ok(user_info) => {
                let _ = self
                    .store
                    .send(AppAction::LoginResolved {
                        user_info: user_info.clone(),
                    })
                    .await;
                if let Err(e) = self.get_permissions().await {
                    tracing::warn!(error = %e, "entitlement resolution failed");
                }
                self.finish_login_processing().await;
                Ok(user_info)
            },
            Err(e) => {
                self.handle_not_logged_in().await;
                Err(e)
            },
        }
    }

    /// Resolve entitlements through the user-token endpoint.
    ///
    /// Aborts early without a network call when no SSO id is present. A
    /// payload without an entry for the configured product logs a warning
    /// and skips permission assignment - that is not an error.
    ///
    /// # Errors
    ///
    /// Returns a structured error on a non-2xx status or malformed
    /// payload; callers degrade rather than propagate.
    pub async fn get_permissions(&self) -> Result<()> {
        let config = &self.env.config;

        let sso_id = self.env.cookies.get(COOKIE_SSO_ID);
        let sso_id = match sso_id {
            Some(id) => id,
            None => {
                let from_state = self
                    .store
                    .state(|s| s.session.user_info.as_ref().map(|u| u.sso_id.clone()))
                    .await;
                match from_state {
                    Some(id) if !id.is_empty() => id,
                    _ => {
                        tracing::debug!("no sso id; skipping entitlement resolution");
                        return Ok(());
                    },
                }
            },
        };

        let ticket_id = self
            .store
            .state(|s| s.session.ticket_id.clone())
            .await
            .or_else(|| self.env.cookies.get(COOKIE_TICKET_ID))
            .unwrap_or_default();

        let request = UserTokenRequest {
            merchant: config.merchant.clone(),
            ticket_id,
            sso_id,
            client_id: config.client_id.clone(),
            device_id: config.device_id.clone(),
            app_code: config.app_code.clone(),
        };

        let response = self.env.entitlements.fetch_user_token(&request).await?;

        let product = response
            .data
            .product_details
            .iter()
            .find(|p| p.product_code == config.product_code);

        let Some(product) = product else {
            tracing::warn!(
                product_code = %config.product_code,
                "entitlement payload has no entry for the configured product; skipping"
            );
            return Ok(());
        };

        let user_type = crate::entitlement::classify_user_type(&product.permissions);
        let _ = self
            .store
            .send(AppAction::PermissionsResolved {
                permissions: product.permissions.clone(),
                accessible_features: product.accessible_features.clone(),
                subscription_detail: product.subscription_detail.clone(),
                user_type,
                token: response.data.token.clone(),
            })
            .await;

        if let Some(token) = &response.data.token {
            self.env.cookies.set(Cookie::new(
                COOKIE_ONE_TIME_TOKEN,
                token.as_str(),
                config.cookie_domain.as_str(),
            ));
        }

        Ok(())
    }

    /// Queue a continuation for after the login round-trip completes.
    ///
    /// While processing is in flight the continuation is stacked; after
    /// the flush it runs immediately. Each queued continuation fires
    /// exactly once.
    pub fn after_login_call<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let Ok(mut stack) = self.after_login.lock() else {
                tracing::error!("after-login stack poisoned; dropping continuation");
                return;
            };
            if !stack.done {
                stack.callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    /// Flush the after-login stack and mark processing done.
    ///
    /// The stack is drained atomically with setting the marker, so the
    /// flush happens exactly once per login episode; re-entrant calls
    /// find an empty stack and do nothing.
    async fn finish_login_processing(&self) {
        let callbacks = {
            let Ok(mut stack) = self.after_login.lock() else {
                return;
            };
            if stack.done {
                // Already flushed this episode: the marker action below is
                // idempotent, the stack is not drained twice
                Vec::new()
            } else {
                stack.done = true;
                std::mem::take(&mut stack.callbacks)
            }
        };

        let _ = self.store.send(AppAction::AfterLoginProcessed).await;

        for callback in callbacks {
            callback();
        }
    }

    /// Degrade to logged-out state and release queued continuations.
    async fn handle_not_logged_in(&self) {
        let _ = self.store.send(AppAction::LoginFailed).await;
        self.finish_login_processing().await;
    }

    /// Re-validate against the SDK.
    ///
    /// When the resolved ticket matches the one already in the store the
    /// login was already processed: only the after-login stack is flushed,
    /// skipping a redundant full refresh.
    pub async fn verify_login(&self) {
        let channel = self.store.state(|s| s.channel.clone()).await;

        match self.env.sso.get_valid_logged_in_user(&channel).await {
            Ok(ticket) => {
                let current = self.store.state(|s| s.session.ticket_id.clone()).await;
                if current.as_deref() == Some(ticket.ticket_id.as_str()) {
                    self.finish_login_processing().await;
                } else {
                    let _ = self.get_user_detail_forced().await;
                }
            },
            Err(_) => self.handle_not_logged_in().await,
        }
    }

    /// Sign out and clean up.
    ///
    /// Cleanup is unconditional: even when the SDK sign-out fails, the
    /// store auth slices clear, the plan/analytics storage keys are
    /// removed, and the session cookie set expires.
    pub async fn logout(&self) {
        let channel = self.store.state(|s| s.channel.clone()).await;

        if let Err(e) = self.env.sso.sign_out(&channel).await {
            tracing::warn!(error = %e, "SDK sign-out failed; clearing session anyway");
        }

        let _ = self.store.send(AppAction::LoggedOut).await;
        let _ = self.store.send(AppAction::FlowReset).await;

        for key in LOGOUT_STORAGE_KEYS {
            self.env.storage.remove(key);
        }
        for name in SESSION_COOKIES {
            self.env
                .cookies
                .remove(name, self.env.config.cookie_domain.as_str());
        }

        // A fresh login episode queues continuations again
        if let Ok(mut stack) = self.after_login.lock() {
            stack.done = false;
            stack.callbacks.clear();
        }
        self.resumption_fired.store(false, Ordering::SeqCst);
    }

    /// Complete the success screen.
    ///
    /// Resets the flow, then either resumes a pending plan (at most once
    /// per flow instance) or invokes the caller's success continuation.
    pub async fn complete_success<F>(&self, on_success: F)
    where
        F: FnOnce() + Send,
    {
        let _ = self.store.send(AppAction::FlowReset).await;

        if !self.resume_pending_plan().await {
            on_success();
        }
    }

    /// Resume a freshly selected plan persisted before an auth gate.
    ///
    /// Fires at most once per flow instance; a plan still flagged
    /// `check_referer` is not fresh and is left for init's referrer check.
    pub async fn resume_pending_plan(&self) -> bool {
        let Some(plan) = self.env.storage.selected_plan() else {
            return false;
        };
        if plan.check_referer {
            return false;
        }
        if self.resumption_fired.swap(true, Ordering::SeqCst) {
            return false;
        }

        tracing::debug!(plan_code = %plan.plan_code, "resuming pending plan");
        let _ = self.checkout.continue_to_pay(&plan).await;
        true
    }

    /// Resume the plan that initiated a login redirect, after init
    /// verified the referrer.
    async fn resume_returning_plan(&self) {
        let Some(mut plan) = self.env.storage.selected_plan() else {
            return;
        };
        if !plan.check_referer {
            return;
        }

        let _ = self.env.storage.mark_selected_plan_check_referer(false);
        plan.check_referer = false;

        if !self.resumption_fired.swap(true, Ordering::SeqCst) {
            tracing::debug!(plan_code = %plan.plan_code, "resuming plan after login return");
            let _ = self.checkout.continue_to_pay(&plan).await;
        }
    }

    /// Background reconciliation: watch for an out-of-band login.
    ///
    /// Bounded by the configured iteration cap and wall-clock ceiling,
    /// whichever comes first - the poller terminates even when login never
    /// resolves. On detecting the `ssoid` cookie plus the store's login
    /// flag, and only when the flow is not on plan selection with no plans
    /// queued, the flow resets and either a pending plan resumes or
    /// `on_success` runs.
    ///
    /// Returns `true` when the out-of-band login was handled.
    pub async fn run_login_poller<F>(&self, on_success: F) -> bool
    where
        F: FnOnce() + Send,
    {
        let poller = self.env.config.poller;
        let started = Instant::now();

        for _ in 0..poller.max_iterations {
            if started.elapsed() >= poller.max_duration {
                break;
            }

            let has_sso_cookie = self.env.cookies.get(COOKIE_SSO_ID).is_some();
            let (is_login, screen, plans_queued) = self
                .store
                .state(|s| {
                    (
                        s.session.is_login,
                        s.login_flow.screen,
                        !s.login_flow.available_plans.is_empty(),
                    )
                })
                .await;

            if has_sso_cookie && is_login {
                // Never close a flow the user hasn't finished
                if screen == LoginScreen::PlanSelection || plans_queued {
                    tracing::debug!("out-of-band login ignored: plan selection active");
                } else {
                    let _ = self.store.send(AppAction::FlowReset).await;
                    if !self.resume_pending_plan().await {
                        on_success();
                    }
                    return true;
                }
            }

            tokio::time::sleep(poller.interval).await;
        }

        false
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}
