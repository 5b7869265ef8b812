//! Client-side field validation.
//!
//! Each validator returns an empty string for "valid" or the user-facing
//! message - never a boolean-only result, so the message is preserved for
//! direct display next to the field. Validation runs before dispatch; a
//! non-empty result means the async action is never started.

use crate::state::OTP_LEN;

/// Symbols accepted in a password.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_-+=[]{}|;:'\",.<>/?~";

/// Validate an email address (`local@domain.tld` shape).
#[must_use]
pub fn validate_email(email: &str) -> String {
    const MESSAGE: &str = "Please enter a valid email address";

    if email.len() < 3 || email.len() > 255 {
        return MESSAGE.to_string();
    }

    let Some((local, domain)) = email.split_once('@') else {
        return MESSAGE.to_string();
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return MESSAGE.to_string();
    }

    let valid_local = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    if !local.chars().all(valid_local) || !domain.chars().all(valid_domain) {
        return MESSAGE.to_string();
    }

    // Domain needs a TLD and no empty labels
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return MESSAGE.to_string();
    }

    String::new()
}

/// Validate a mobile number: exactly 10 digits, first digit 6-9.
#[must_use]
pub fn validate_mobile(mobile: &str) -> String {
    const MESSAGE: &str = "Please enter a valid 10-digit mobile number";

    if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
        return MESSAGE.to_string();
    }

    if !matches!(mobile.as_bytes()[0], b'6'..=b'9') {
        return MESSAGE.to_string();
    }

    String::new()
}

/// Validate an identifier that may be either an email or a mobile number.
#[must_use]
pub fn validate_email_or_mobile(value: &str) -> String {
    if value.chars().all(|c| c.is_ascii_digit()) {
        validate_mobile(value)
    } else if validate_email(value).is_empty() {
        String::new()
    } else {
        "Please enter a valid email address or mobile number".to_string()
    }
}

/// Validate a password: 6-14 characters with at least one lowercase letter,
/// one digit, and one symbol from [`PASSWORD_SYMBOLS`].
#[must_use]
pub fn validate_password(password: &str) -> String {
    const MESSAGE: &str =
        "Password must be 6-14 characters with a lowercase letter, a number, and a symbol";

    let len = password.chars().count();
    if !(6..=14).contains(&len) {
        return MESSAGE.to_string();
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if has_lower && has_digit && has_symbol {
        String::new()
    } else {
        MESSAGE.to_string()
    }
}

/// Validate a display name: at least 2 characters after trimming.
#[must_use]
pub fn validate_name(name: &str) -> String {
    if name.trim().chars().count() >= 2 {
        String::new()
    } else {
        "Please enter your name".to_string()
    }
}

/// Validate an OTP: exactly 6 numeric digits.
#[must_use]
pub fn validate_otp(otp: &str) -> String {
    if otp.len() == OTP_LEN && otp.chars().all(|c| c.is_ascii_digit()) {
        String::new()
    } else {
        "Please enter the 6-digit OTP".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_emails_pass() {
        assert_eq!(validate_email("user@example.com"), "");
        assert_eq!(validate_email("user+tag@sub.example.co"), "");
    }

    #[test]
    fn invalid_emails_return_message() {
        for bad in ["invalid", "@example.com", "user@", "user@nodot", "a@b..c"] {
            assert!(!validate_email(bad).is_empty(), "{bad} should be invalid");
        }
    }

    #[test]
    fn mobile_requires_ten_digits_starting_six_to_nine() {
        assert_eq!(validate_mobile("9876543210"), "");
        assert_eq!(validate_mobile("6000000000"), "");
        assert!(!validate_mobile("5876543210").is_empty());
        assert!(!validate_mobile("987654321").is_empty());
        assert!(!validate_mobile("98765432100").is_empty());
        assert!(!validate_mobile("98765a3210").is_empty());
    }

    #[test]
    fn identifier_accepts_either_shape() {
        assert_eq!(validate_email_or_mobile("user@example.com"), "");
        assert_eq!(validate_email_or_mobile("9876543210"), "");
        assert!(!validate_email_or_mobile("1234567890").is_empty());
        assert!(!validate_email_or_mobile("not-an-email").is_empty());
    }

    #[test]
    fn password_requires_symbol() {
        // No symbol: rejected even though length, lowercase, and digit hold
        assert!(!validate_password("abc123").is_empty());
        assert_eq!(validate_password("abc123!"), "");
    }

    #[test]
    fn password_bounds_are_inclusive() {
        assert_eq!(validate_password("ab1!xy"), ""); // 6 chars
        assert_eq!(validate_password("ab1!xyab1!xyab"), ""); // 14 chars
        assert!(!validate_password("a1!bc").is_empty()); // 5 chars
        assert!(!validate_password("ab1!xyab1!xyab1").is_empty()); // 15 chars
    }

    #[test]
    fn name_needs_two_characters_after_trim() {
        assert_eq!(validate_name("Jo"), "");
        assert!(!validate_name("  J  ").is_empty());
        assert!(!validate_name("").is_empty());
    }

    #[test]
    fn otp_must_be_six_numeric_digits() {
        assert_eq!(validate_otp("123456"), "");
        assert!(!validate_otp("12345").is_empty());
        assert!(!validate_otp("1234567").is_empty());
        assert!(!validate_otp("12345a").is_empty());
    }

    proptest! {
        // validate_password(s) == "" iff length 6-14 AND >=1 lowercase AND
        // >=1 digit AND >=1 symbol from the defined set
        #[test]
        fn password_validity_round_trips(s in "\\PC{0,20}") {
            let len = s.chars().count();
            let expected = (6..=14).contains(&len)
                && s.chars().any(|c| c.is_ascii_lowercase())
                && s.chars().any(|c| c.is_ascii_digit())
                && s.chars().any(|c| PASSWORD_SYMBOLS.contains(c));
            prop_assert_eq!(validate_password(&s).is_empty(), expected);
        }
    }
}
