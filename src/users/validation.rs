use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, Result};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns the trimmed name.
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    Ok(name.to_string())
}

/// Returns the normalized email.
pub fn validate_email(email: &str) -> Result<String> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Email is invalid".to_string()));
    }
    Ok(email)
}

/// Returns the trimmed password.
pub fn validate_password(password: &str) -> Result<String> {
    let password = password.trim();
    if password.chars().count() < 7 {
        return Err(AppError::Validation(
            "Password must be at least 7 characters long".to_string(),
        ));
    }
    if password.to_lowercase().contains("password") {
        return Err(AppError::Validation(
            "Password cannot contain \"password\"".to_string(),
        ));
    }
    Ok(password.to_string())
}

pub fn validate_age(age: i32) -> Result<i32> {
    if age < 0 {
        return Err(AppError::Validation("Age must be a positive number".to_string()));
    }
    Ok(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(validate_email("  Alice@X.com ").unwrap(), "alice@x.com");
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[test]
    fn password_rules() {
        assert_eq!(validate_password(" secret123 ").unwrap(), "secret123");
        assert!(validate_password("short").is_err());
        assert!(validate_password("MyPassWord99").is_err());
    }

    #[test]
    fn name_and_age_rules() {
        assert_eq!(validate_name("  Alice ").unwrap(), "Alice");
        assert!(validate_name("   ").is_err());
        assert_eq!(validate_age(0).unwrap(), 0);
        assert!(validate_age(-1).is_err());
    }
}
