//! Field rules shared by the request DTOs.
//!
//! Length and format problems are `Validation` errors (422); the password
//! policy is a business rule and reports `BadRequest` (400).

use once_cell::sync::Lazy;
use regex::Regex;

use super::DomainError;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;
pub const EMAIL_MAX_LEN: usize = 100;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

/// Trim `value` and check its length in characters. Returns the trimmed value.
pub fn require_len(field: &str, value: &str, min: usize, max: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 && min > 0 {
        return Err(DomainError::Validation(format!("{} cannot be empty", field)));
    }
    if len < min {
        return Err(DomainError::Validation(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    if len > max {
        return Err(DomainError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

/// Normalize an email (trim + lower-case) and check its shape.
pub fn validate_email(value: &str) -> Result<String, DomainError> {
    let email = value.trim().to_lowercase();
    if email.len() > EMAIL_MAX_LEN || !EMAIL_RE.is_match(&email) {
        return Err(DomainError::Validation(
            "A valid email address is required".to_string(),
        ));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(DomainError::BadRequest(
            "Password must be at least 8 characters long".to_string(),
        ));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(DomainError::BadRequest(
            "Password must be at most 128 characters long".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(DomainError::BadRequest(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(DomainError::BadRequest(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(DomainError::BadRequest(
            "Password must contain at least one digit".to_string(),
        ));
    }
    Ok(())
}

/// Reject negative, NaN and infinite amounts.
pub fn non_negative(field: &str, value: f64) -> Result<f64, DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::Validation(format!(
            "{} cannot be negative",
            field
        )));
    }
    Ok(value)
}

pub fn in_range(field: &str, value: i64, min: i64, max: i64) -> Result<i64, DomainError> {
    if value < min || value > max {
        return Err(DomainError::Validation(format!(
            "{} must be between {} and {}",
            field, min, max
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_len_trims_before_counting() {
        assert_eq!(require_len("name", "  Asha  ", 2, 100).unwrap(), "Asha");
        assert!(matches!(
            require_len("name", "   ", 2, 100),
            Err(DomainError::Validation(_))
        ));
        assert!(require_len("name", "A", 2, 100).is_err());
        assert!(require_len("name", &"x".repeat(101), 2, 100).is_err());
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(
            validate_email(" Customer@Test.com ").unwrap(),
            "customer@test.com"
        );
        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("two words@test.com").is_err());
    }

    #[test]
    fn password_policy() {
        assert!(validate_password("StrongPass1").is_ok());
        for weak in ["short", "alllowercase1", "ALLUPPERCASE1", "NoDigitsHere"] {
            assert!(
                matches!(validate_password(weak), Err(DomainError::BadRequest(_))),
                "{} should be rejected",
                weak
            );
        }
    }

    #[test]
    fn amounts_and_ranges() {
        assert_eq!(non_negative("price", 0.0).unwrap(), 0.0);
        assert!(non_negative("price", -0.5).is_err());
        assert!(non_negative("price", f64::NAN).is_err());
        assert!(in_range("quantity", 1000, 1, 1000).is_ok());
        assert!(in_range("quantity", 1001, 1, 1000).is_err());
        assert!(in_range("quantity", 0, 1, 1000).is_err());
    }
}
