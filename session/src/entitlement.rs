//! Entitlement classification.
//!
//! Pure functions over the permission strings returned by the entitlement
//! endpoint: user-tier classification and upgrade eligibility.

use crate::config::{PERMISSION_GROUP_SUBSCRIPTION, UpgradePolicy};
use crate::state::UserType;

/// Permission string: active subscription.
pub const PERMISSION_SUBSCRIBED: &str = "subscribed";
/// Permission string: subscription cancelled.
pub const PERMISSION_CANCELLED: &str = "cancelled_subscription";
/// Permission string: subscription expired.
pub const PERMISSION_EXPIRED: &str = "expired_subscription";
/// Permission string: eligible to buy a subscription.
pub const PERMISSION_CAN_BUY: &str = "can_buy_subscription";

fn has(permissions: &[String], permission: &str) -> bool {
    permissions.iter().any(|p| p == permission)
}

/// Classify the user tier from entitlement permission strings.
///
/// Evaluation is ordered and first-matching-rule-wins; the rule order is a
/// contract, because several permissions co-occur:
///
/// 1. expired
/// 2. trial (subscribed + cancelled + can-buy together)
/// 3. cancelled
/// 4. paid (subscribed)
/// 5. free (can-buy)
/// 6. new (nothing matched)
///
/// # Examples
///
/// ```
/// use certflow_session::entitlement::classify_user_type;
/// use certflow_session::state::UserType;
///
/// let permissions = vec![
///     "subscribed".to_string(),
///     "cancelled_subscription".to_string(),
///     "can_buy_subscription".to_string(),
/// ];
/// assert_eq!(classify_user_type(&permissions), UserType::Trial);
/// ```
#[must_use]
pub fn classify_user_type(permissions: &[String]) -> UserType {
    if has(permissions, PERMISSION_EXPIRED) {
        UserType::Expired
    } else if has(permissions, PERMISSION_SUBSCRIBED)
        && has(permissions, PERMISSION_CANCELLED)
        && has(permissions, PERMISSION_CAN_BUY)
    {
        UserType::Trial
    } else if has(permissions, PERMISSION_CANCELLED) {
        UserType::Cancelled
    } else if has(permissions, PERMISSION_SUBSCRIBED) {
        UserType::Paid
    } else if has(permissions, PERMISSION_CAN_BUY) {
        UserType::Free
    } else {
        UserType::New
    }
}

/// Whether a `group_subscription` permission is present.
#[must_use]
pub fn is_group_user(permissions: &[String]) -> bool {
    has(permissions, PERMISSION_GROUP_SUBSCRIPTION)
}

/// Outcome of the upgrade-eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeEligibility {
    /// Whether the upgrade/buy CTA may be shown.
    pub eligible: bool,

    /// Whether the user was recognized as part of a group subscription.
    pub is_group_user: bool,
}

/// Check whether the current user may be offered an upgrade/buy CTA.
///
/// A `group_subscription` permission short-circuits to "not eligible" and
/// marks the user as a group user. Merchant carve-outs come from the
/// injected [`UpgradePolicy`] rather than hard-coded branches.
#[must_use]
pub fn check_permissions(
    permissions: &[String],
    merchant: &str,
    policy: &UpgradePolicy,
) -> UpgradeEligibility {
    if is_group_user(permissions) {
        return UpgradeEligibility {
            eligible: false,
            is_group_user: true,
        };
    }

    if policy.blocks(merchant) {
        return UpgradeEligibility {
            eligible: false,
            is_group_user: false,
        };
    }

    let eligible = matches!(
        classify_user_type(permissions),
        UserType::New | UserType::Free | UserType::Expired | UserType::Cancelled
    );

    UpgradeEligibility {
        eligible,
        is_group_user: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn expired_wins_over_everything() {
        assert_eq!(
            classify_user_type(&perms(&["expired_subscription"])),
            UserType::Expired
        );
        assert_eq!(
            classify_user_type(&perms(&[
                "expired_subscription",
                "subscribed",
                "cancelled_subscription",
                "can_buy_subscription",
            ])),
            UserType::Expired
        );
    }

    #[test]
    fn trial_combo_beats_cancelled_and_subscribed() {
        assert_eq!(
            classify_user_type(&perms(&[
                "subscribed",
                "cancelled_subscription",
                "can_buy_subscription",
            ])),
            UserType::Trial
        );
    }

    #[test]
    fn cancelled_without_full_combo() {
        assert_eq!(
            classify_user_type(&perms(&["cancelled_subscription"])),
            UserType::Cancelled
        );
        assert_eq!(
            classify_user_type(&perms(&["subscribed", "cancelled_subscription"])),
            UserType::Cancelled
        );
    }

    #[test]
    fn subscribed_alone_is_paid() {
        assert_eq!(classify_user_type(&perms(&["subscribed"])), UserType::Paid);
    }

    #[test]
    fn can_buy_alone_is_free() {
        assert_eq!(
            classify_user_type(&perms(&["can_buy_subscription"])),
            UserType::Free
        );
    }

    #[test]
    fn empty_permissions_classify_as_new() {
        assert_eq!(classify_user_type(&[]), UserType::New);
        assert_eq!(
            classify_user_type(&perms(&["unrelated_permission"])),
            UserType::New
        );
    }

    #[test]
    fn group_subscription_short_circuits_eligibility() {
        let policy = UpgradePolicy::default();
        let result = check_permissions(
            &perms(&["group_subscription", "can_buy_subscription"]),
            "TIMES",
            &policy,
        );
        assert!(!result.eligible);
        assert!(result.is_group_user);
    }

    #[test]
    fn blocked_merchant_never_sees_upgrade_cta() {
        let policy = UpgradePolicy::blocking(vec!["ET".to_string()]);

        let blocked = check_permissions(&perms(&["can_buy_subscription"]), "ET", &policy);
        assert!(!blocked.eligible);
        assert!(!blocked.is_group_user);

        let allowed = check_permissions(&perms(&["can_buy_subscription"]), "TIMES", &policy);
        assert!(allowed.eligible);
    }

    #[test]
    fn paid_users_are_not_upgrade_targets() {
        let policy = UpgradePolicy::default();
        let result = check_permissions(&perms(&["subscribed"]), "TIMES", &policy);
        assert!(!result.eligible);
    }
}
