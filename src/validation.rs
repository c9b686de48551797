// Validation utilities module
// Provides custom validation functions for domain-specific rules

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

static COUPON_CODE_RE: OnceLock<Regex> = OnceLock::new();

/// Validates the shape of a coupon code applied at order completion:
/// an uppercase prefix, a dash, then characters from the unambiguous
/// alphabet (no 0/O/1/I)
pub fn validate_coupon_code_format(code: &str) -> Result<(), ValidationError> {
    let re = COUPON_CODE_RE
        .get_or_init(|| Regex::new(r"^[A-Z]+-[A-HJ-NP-Z2-9]+$").expect("valid literal regex"));

    if re.is_match(code) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_coupon_code_format"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coupon_codes() {
        assert!(validate_coupon_code_format("WELCOME-A7KX9Q2M").is_ok());
        assert!(validate_coupon_code_format("BDAY-ZZZZ2222").is_ok());
        assert!(validate_coupon_code_format("COMEBACK-ABCDEFGH").is_ok());
    }

    #[test]
    fn test_codes_with_ambiguous_characters_are_rejected() {
        assert!(validate_coupon_code_format("WELCOME-A0KX9Q2M").is_err());
        assert!(validate_coupon_code_format("WELCOME-AOKX9Q2M").is_err());
        assert!(validate_coupon_code_format("WELCOME-A1KX9Q2M").is_err());
        assert!(validate_coupon_code_format("WELCOME-AIKX9Q2M").is_err());
    }

    #[test]
    fn test_malformed_codes_are_rejected() {
        assert!(validate_coupon_code_format("").is_err());
        assert!(validate_coupon_code_format("welcome-a7kx9q2m").is_err());
        assert!(validate_coupon_code_format("NODASH").is_err());
        assert!(validate_coupon_code_format("WELCOME-").is_err());
    }

    #[test]
    fn test_generated_codes_pass_validation() {
        for _ in 0..50 {
            let code = crate::loyalty::code::generate_code("WELCOME-", 8);
            assert!(validate_coupon_code_format(&code).is_ok(), "code {}", code);
        }
    }
}
