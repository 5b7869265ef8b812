//! Entitlement endpoint client.
//!
//! Resolves fine-grained entitlements through the OAuth-style user-token
//! endpoint:
//!
//! ```text
//! GET {auth_domain}/auth/{merchant}/userToken?grantType=refresh_token
//! x-client-id / x-device-id / x-sso-id / x-site-app-code / X-TICKET-ID
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Headers and routing for a user-token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTokenRequest {
    /// Merchant code in the endpoint path.
    pub merchant: String,

    /// `X-TICKET-ID` header.
    pub ticket_id: String,

    /// `x-sso-id` header.
    pub sso_id: String,

    /// `x-client-id` header.
    pub client_id: String,

    /// `x-device-id` header.
    pub device_id: String,

    /// `x-site-app-code` header.
    pub app_code: String,
}

/// Entitlement payload for one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    /// Product code; matched against the configured product.
    pub product_code: String,

    /// Ordered capability strings.
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Ordered feature strings.
    #[serde(default)]
    pub accessible_features: Vec<String>,

    /// Opaque subscription record.
    #[serde(default)]
    pub subscription_detail: Option<serde_json::Value>,

    /// Whether the product is currently subscribed.
    #[serde(default)]
    pub subscribed: Option<bool>,

    /// Product reference code.
    #[serde(default)]
    pub prc: Option<String>,
}

/// `data` payload of the user-token response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTokenData {
    /// SSO id the token was issued for.
    #[serde(default)]
    pub sso_id: Option<String>,

    /// Email id on record.
    #[serde(default)]
    pub email_id: Option<String>,

    /// First name on record.
    #[serde(default)]
    pub fname: Option<String>,

    /// Refreshed one-time token, mirrored into the `OTR` cookie when
    /// present.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-product entitlement entries.
    #[serde(default)]
    pub product_details: Vec<ProductDetail>,
}

/// User-token response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserTokenResponse {
    /// Application-level status code.
    #[serde(default)]
    pub code: i64,

    /// Payload.
    #[serde(default)]
    pub data: UserTokenData,
}

/// Client for the entitlement endpoint.
#[async_trait]
pub trait EntitlementApi: Send + Sync {
    /// Fetch the user token and per-product entitlements.
    ///
    /// # Errors
    ///
    /// Returns a structured [`SessionError::Api`] on a non-2xx status or
    /// malformed payload; transport failures map to [`SessionError::Http`].
    async fn fetch_user_token(&self, request: &UserTokenRequest) -> Result<UserTokenResponse>;
}

/// HTTP implementation of [`EntitlementApi`].
#[derive(Debug, Clone)]
pub struct HttpEntitlementApi {
    /// Entitlement host base URL.
    base_url: String,

    /// HTTP client for making requests.
    http_client: Client,
}

impl HttpEntitlementApi {
    /// Create a client against the given entitlement host.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: Client::new(),
        }
    }
}

#[async_trait]
impl EntitlementApi for HttpEntitlementApi {
    async fn fetch_user_token(&self, request: &UserTokenRequest) -> Result<UserTokenResponse> {
        let url = format!(
            "{}/auth/{}/userToken?grantType=refresh_token",
            self.base_url, request.merchant
        );

        let response = self
            .http_client
            .get(&url)
            .header("x-client-id", &request.client_id)
            .header("x-device-id", &request.device_id)
            .header("x-sso-id", &request.sso_id)
            .header("x-site-app-code", &request.app_code)
            .header("X-TICKET-ID", &request.ticket_id)
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
            tracing::warn!(status = status.as_u16(), "user token request rejected");
            return Err(SessionError::Api {
                status: status.as_u16(),
                code: None,
            });
        }

        response.json::<UserTokenResponse>().await.map_err(|e| {
            tracing::warn!(error = %e, "malformed user token payload");
            SessionError::Api {
                status: status.as_u16(),
                code: None,
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;

    #[test]
    fn product_details_deserialize_from_wire_shape() {
        let payload = r#"{
            "code": 200,
            "data": {
                "ssoId": "sso-1",
                "emailId": "user@example.com",
                "fname": "Asha",
                "token": "otr-token",
                "productDetails": [
                    {
                        "productCode": "ETPR",
                        "permissions": ["subscribed"],
                        "accessibleFeatures": ["reports"],
                        "subscribed": true,
                        "prc": "P1"
                    }
                ]
            }
        }"#;

        let response: UserTokenResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.code, 200);
        assert_eq!(response.data.token, Some("otr-token".to_string()));

        let product = &response.data.product_details[0];
        assert_eq!(product.product_code, "ETPR");
        assert_eq!(product.permissions, vec!["subscribed".to_string()]);
    }

    #[test]
    fn missing_optional_fields_default() {
        let response: UserTokenResponse = serde_json::from_str(r#"{"code": 200}"#).unwrap();
        assert!(response.data.product_details.is_empty());
        assert!(response.data.token.is_none());
    }
}
