//! Payment plan value object and acquisition attribution.
//!
//! A [`PaymentPlan`] is both the catalog entry offered on the
//! plan-selection screen and, once selected, the hand-off artifact
//! persisted to session storage across the redirect to login and back.
//! The serialized field names are a consumer-facing contract shared with
//! the hosting pages; do not rename them.

use serde::{Deserialize, Serialize};

/// Unit of a plan period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanPeriodUnit {
    /// Days.
    Day,
    /// Months.
    #[default]
    Month,
    /// Years.
    Year,
}

/// A purchasable offering selectable before checkout handoff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlan {
    /// Unique plan key; also part of the transaction endpoint path.
    pub plan_code: String,

    /// Display name.
    #[serde(default)]
    pub plan_name: String,

    /// Final price after discounts.
    #[serde(default)]
    pub final_plan_price: f64,

    /// ISO currency code.
    #[serde(default)]
    pub currency: String,

    /// Period length.
    #[serde(default)]
    pub plan_period: u32,

    /// Period unit.
    #[serde(default)]
    pub plan_period_unit: PlanPeriodUnit,

    /// Whether this is a recurring plan.
    #[serde(default)]
    pub recurring: bool,

    /// Flat discount applied to the list price.
    #[serde(default)]
    pub flat_discount: f64,

    /// Deal code applied at selection time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_code: Option<String>,

    /// Direct initiation path: skip the standard path's fixed delay.
    #[serde(default)]
    pub direct: bool,

    /// Extension of an existing subscription.
    #[serde(default)]
    pub is_extend: bool,

    /// Renewal of an expired subscription.
    #[serde(default)]
    pub is_renew: bool,

    /// Auto-renew consent.
    #[serde(default)]
    pub auto_renew: bool,

    /// Standing-instruction consent token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub si_consent: Option<String>,

    /// A/B test bucket key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ab_test_key: Option<String>,

    /// Pass-through user-defined field 6.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udf6: Option<String>,

    /// Pass-through user-defined field 7.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udf7: Option<String>,

    /// Pass-through user-defined field 8.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udf8: Option<String>,

    /// Set when the plan was already in motion before a login redirect:
    /// the referer must be verified before resuming. A plan without this
    /// flag resumes immediately.
    ///
    /// Serialized only when set, so persisting a freshly selected plan
    /// merges over an earlier record without clearing the flag; clearing
    /// goes through the explicit storage patch.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub check_referer: bool,
}

impl PaymentPlan {
    /// Create a plan with the given code; remaining fields default.
    #[must_use]
    pub fn new(plan_code: impl Into<String>) -> Self {
        Self {
            plan_code: plan_code.into(),
            ..Self::default()
        }
    }
}

/// Acquisition-source attribution persisted under `acqSourcesData`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcqSources {
    /// UTM source.
    #[serde(default)]
    pub utm_source: Option<String>,

    /// UTM medium.
    #[serde(default)]
    pub utm_medium: Option<String>,

    /// UTM campaign.
    #[serde(default)]
    pub utm_campaign: Option<String>,

    /// Referral URL recorded at first touch.
    #[serde(default)]
    pub referral_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;

    #[test]
    fn plan_serializes_with_camel_case_contract_keys() {
        let mut plan = PaymentPlan::new("MONTHLY_499");
        plan.check_referer = true;
        plan.deal_code = Some("FEST".to_string());

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["planCode"], "MONTHLY_499");
        assert_eq!(json["checkReferer"], true);
        assert_eq!(json["dealCode"], "FEST");
    }

    #[test]
    fn plan_deserializes_from_partial_payload() {
        let plan: PaymentPlan = serde_json::from_str(r#"{"planCode":"A"}"#).unwrap();
        assert_eq!(plan.plan_code, "A");
        assert!(!plan.check_referer);
        assert_eq!(plan.plan_period_unit, PlanPeriodUnit::Month);
    }
}
