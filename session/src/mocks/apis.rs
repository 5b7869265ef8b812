//! Mock entitlement and transaction endpoint clients.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{Result, SessionError};
use crate::providers::entitlements::{EntitlementApi, UserTokenRequest, UserTokenResponse};
use crate::providers::payment::{PaymentApi, TransactionRequest, TransactionResponse};

#[derive(Default)]
struct EntitlementInner {
    response: Option<UserTokenResponse>,
    error: Option<SessionError>,
    requests: Vec<UserTokenRequest>,
}

/// Mock entitlement endpoint.
#[derive(Clone, Default)]
pub struct MockEntitlementApi {
    inner: Arc<Mutex<EntitlementInner>>,
}

impl MockEntitlementApi {
    /// Create a mock returning an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::unwrap_used)] // Mutex poison in a mock is unrecoverable
    fn lock(&self) -> std::sync::MutexGuard<'_, EntitlementInner> {
        self.inner.lock().unwrap()
    }

    /// Script the response payload.
    pub fn set_response(&self, response: UserTokenResponse) {
        self.lock().response = Some(response);
    }

    /// Script a failure.
    pub fn set_error(&self, error: SessionError) {
        self.lock().error = Some(error);
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<UserTokenRequest> {
        self.lock().requests.clone()
    }
}

#[async_trait]
impl EntitlementApi for MockEntitlementApi {
    async fn fetch_user_token(&self, request: &UserTokenRequest) -> Result<UserTokenResponse> {
        let mut inner = self.lock();
        inner.requests.push(request.clone());

        if let Some(e) = inner.error.clone() {
            return Err(e);
        }
        Ok(inner.response.clone().unwrap_or_default())
    }
}

#[derive(Default)]
struct PaymentInner {
    response: Option<TransactionResponse>,
    error: Option<SessionError>,
    requests: Vec<TransactionRequest>,
}

/// Mock transaction-initiation endpoint.
#[derive(Clone, Default)]
pub struct MockPaymentApi {
    inner: Arc<Mutex<PaymentInner>>,
}

impl MockPaymentApi {
    /// Create a mock returning an empty response (no `resultUrl`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::unwrap_used)] // Mutex poison in a mock is unrecoverable
    fn lock(&self) -> std::sync::MutexGuard<'_, PaymentInner> {
        self.inner.lock().unwrap()
    }

    /// Script a successful initiation handing off to `result_url`.
    pub fn set_result_url(&self, result_url: impl Into<String>) {
        self.lock().response = Some(TransactionResponse {
            result_url: Some(result_url.into()),
            ..TransactionResponse::default()
        });
    }

    /// Script a failure.
    pub fn set_error(&self, error: SessionError) {
        self.lock().error = Some(error);
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<TransactionRequest> {
        self.lock().requests.clone()
    }
}

#[async_trait]
impl PaymentApi for MockPaymentApi {
    async fn initiate_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        let mut inner = self.lock();
        inner.requests.push(request.clone());

        if let Some(e) = inner.error.clone() {
            return Err(e);
        }
        Ok(inner.response.clone().unwrap_or_default())
    }
}
