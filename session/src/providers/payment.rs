//! Transaction-initiation endpoint client.
//!
//! The payment gateway itself is a hosted checkout: this client only asks
//! the subscription host to open a transaction and hands back the
//! `resultUrl` for a full-page redirect.
//!
//! ```text
//! POST {subs_domain}/subscription/merchant/{merchant}/product/{product}
//!      /plan/{planCode}/geoRegion/{geo}/initiateTransaction
//! ```
//!
//! The request is bounded by a fixed 30-second deadline; expiry maps to
//! [`SessionError::Timeout`] so the caller can route it distinctly from a
//! generic failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SessionError};
use crate::plan::AcqSources;

/// Fixed deadline for transaction initiation.
pub const INITIATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Error code the endpoint uses for a rejected deal code.
const ERROR_CODE_INVALID_DEAL: &str = "INVALID_DEAL_CODE";

/// Routing and body for a transaction-initiation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRequest {
    /// Merchant code in the path.
    pub merchant: String,

    /// Product code in the path.
    pub product_code: String,

    /// Plan code in the path.
    pub plan_code: String,

    /// Geo region (country code) in the path.
    pub geo_region: String,

    /// JSON body.
    pub body: TransactionBody,
}

/// Body of a transaction-initiation call: plan metadata, acquisition
/// attribution, and the merchant-selected identity field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBody {
    /// Plan code (repeated in the body for the gateway).
    pub plan_code: String,

    /// Final price charged.
    pub final_plan_price: f64,

    /// ISO currency code.
    pub currency: String,

    /// Whether this is a recurring plan.
    pub recurring: bool,

    /// Auto-renew consent.
    pub auto_renew: bool,

    /// Deal code, when one was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_code: Option<String>,

    /// Standing-instruction consent token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub si_consent: Option<String>,

    /// A/B test bucket key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ab_test_key: Option<String>,

    /// Pass-through user-defined field 6.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udf6: Option<String>,

    /// Pass-through user-defined field 7.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udf7: Option<String>,

    /// Pass-through user-defined field 8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udf8: Option<String>,

    /// Extension of an existing subscription.
    pub is_extend: bool,

    /// Renewal of an expired subscription.
    pub is_renew: bool,

    /// Identity: verified email chosen by precedence, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Identity: verified mobile, when email was not available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,

    /// Acquisition attribution captured at first touch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition: Option<AcqSources>,

    /// When the initiation was started.
    pub initiated_at: DateTime<Utc>,
}

/// Transaction-initiation response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Hosted checkout URL; a full-page redirect target.
    #[serde(default)]
    pub result_url: Option<String>,

    /// Application-level status code on failure.
    #[serde(default)]
    pub code: Option<i64>,

    /// Error code on failure.
    #[serde(default)]
    pub error_code: Option<String>,

    /// The rejected value, when the failure names one.
    #[serde(default)]
    pub invalid_value: Option<String>,

    /// Human-readable failure message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Client for the transaction-initiation endpoint.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// Open a transaction for the given plan.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Timeout`] when the 30-second deadline expires
    /// - [`SessionError::InvalidDealCode`] when the endpoint rejects the
    ///   deal code
    /// - [`SessionError::Api`] on other non-2xx statuses
    /// - [`SessionError::Http`] on transport failure
    async fn initiate_transaction(&self, request: &TransactionRequest)
    -> Result<TransactionResponse>;
}

/// HTTP implementation of [`PaymentApi`].
#[derive(Debug, Clone)]
pub struct HttpPaymentApi {
    /// Subscription host base URL.
    base_url: String,

    /// HTTP client for making requests.
    http_client: Client,
}

impl HttpPaymentApi {
    /// Create a client against the given subscription host.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: Client::new(),
        }
    }
}

#[async_trait]
impl PaymentApi for HttpPaymentApi {
    async fn initiate_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResponse> {
        let url = format!(
            "{}/subscription/merchant/{}/product/{}/plan/{}/geoRegion/{}/initiateTransaction",
            self.base_url,
            request.merchant,
            request.product_code,
            request.plan_code,
            request.geo_region,
        );

        let response = self
            .http_client
            .post(&url)
            .timeout(INITIATE_TIMEOUT)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SessionError::Timeout
                } else {
                    SessionError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            // Failure bodies still carry structure; use it to distinguish
            // a rejected deal code from a generic rejection
            let failure = response.json::<TransactionResponse>().await.ok();
            if let Some(failure) = &failure {
                if failure.error_code.as_deref() == Some(ERROR_CODE_INVALID_DEAL) {
                    return Err(SessionError::InvalidDealCode {
                        invalid_value: failure.invalid_value.clone(),
                    });
                }
            }
            tracing::warn!(status = status.as_u16(), "transaction initiation rejected");
            return Err(SessionError::Api {
                status: status.as_u16(),
                code: failure.and_then(|f| f.code),
            });
        }

        response
            .json::<TransactionResponse>()
            .await
            .map_err(|e| SessionError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;

    #[test]
    fn body_omits_absent_identity_and_attribution() {
        let body = TransactionBody {
            plan_code: "A".to_string(),
            final_plan_price: 499.0,
            currency: "INR".to_string(),
            ..TransactionBody::default()
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["planCode"], "A");
        assert!(json.get("email").is_none());
        assert!(json.get("mobile").is_none());
        assert!(json.get("acquisition").is_none());
    }

    #[test]
    fn response_deserializes_success_and_failure_shapes() {
        let success: TransactionResponse =
            serde_json::from_str(r#"{"resultUrl":"https://pay.example.com/t/1"}"#).unwrap();
        assert_eq!(
            success.result_url,
            Some("https://pay.example.com/t/1".to_string())
        );

        let failure: TransactionResponse = serde_json::from_str(
            r#"{"code":400,"errorCode":"INVALID_DEAL_CODE","invalidValue":"FEST"}"#,
        )
        .unwrap();
        assert_eq!(failure.error_code, Some("INVALID_DEAL_CODE".to_string()));
        assert_eq!(failure.invalid_value, Some("FEST".to_string()));
    }
}
