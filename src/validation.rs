//! Boundary validation: raw request bodies in, validated input types out.
//!
//! Services only ever receive the validated types defined here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::user::{UserRole, UserUpdate};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub const MAX_EMAIL_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed")]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Trims and lower-cases an email; emails are case-insensitive identity keys.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(raw: Option<&str>, errors: &mut ValidationErrors) -> String {
    let email = raw.map(normalize_email).unwrap_or_default();
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if email.chars().count() > MAX_EMAIL_LEN {
        errors.add("email", "Email must be at most 255 characters");
    } else if !EMAIL_PATTERN.is_match(&email) {
        errors.add("email", "Email must be a valid email address");
    }
    email
}

impl SignUpRequest {
    pub fn validate(self) -> Result<SignUpInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let email = check_email(self.email.as_deref(), &mut errors);

        let password = self.password.unwrap_or_default();
        let length = password.chars().count();
        if password.is_empty() {
            errors.add("password", "Password is required");
        } else if length < MIN_PASSWORD_LEN {
            errors.add("password", "Password must be at least 6 characters");
        } else if length > MAX_PASSWORD_LEN {
            errors.add("password", "Password must be at most 128 characters");
        }

        errors.into_result(|| SignUpInput { email, password })
    }
}

impl SignInRequest {
    pub fn validate(self) -> Result<SignInInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let email = check_email(self.email.as_deref(), &mut errors);

        let password = self.password.unwrap_or_default();
        if password.is_empty() {
            errors.add("password", "Password is required");
        }

        errors.into_result(|| SignInInput { email, password })
    }
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let email = self
            .email
            .as_deref()
            .map(|raw| check_email(Some(raw), &mut errors));

        let role = match self.role.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<UserRole>() {
                Ok(role) => Some(role),
                Err(_) => {
                    errors.add("role", "Role must be one of: user, admin");
                    None
                }
            },
        };

        if email.is_none() && self.role.is_none() {
            errors.add("body", "At least one field must be provided for update");
        }

        errors.into_result(|| UserUpdate { email, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_normalizes_email() {
        let input = SignUpRequest {
            email: Some("  A@B.com ".to_string()),
            password: Some("Secret123".to_string()),
        }
        .validate()
        .unwrap();

        assert_eq!(input.email, "a@b.com");
        assert_eq!(input.password, "Secret123");
    }

    #[test]
    fn test_sign_up_collects_every_field_error() {
        let errors = SignUpRequest::default().validate().unwrap_err();
        assert!(errors.has_field("email"));
        assert!(errors.has_field("password"));
        assert_eq!(errors.errors().len(), 2);
    }

    #[test]
    fn test_sign_up_rejects_bad_email_and_short_password() {
        let errors = SignUpRequest {
            email: Some("not-an-email".to_string()),
            password: Some("abc".to_string()),
        }
        .validate()
        .unwrap_err();

        assert_eq!(
            errors.errors()[0].message,
            "Email must be a valid email address"
        );
        assert_eq!(
            errors.errors()[1].message,
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_sign_up_rejects_overlong_password() {
        let errors = SignUpRequest {
            email: Some("a@b.com".to_string()),
            password: Some("x".repeat(MAX_PASSWORD_LEN + 1)),
        }
        .validate()
        .unwrap_err();

        assert!(errors.has_field("password"));
    }

    #[test]
    fn test_email_length_counts_characters() {
        // 212 characters but 412 bytes.
        let multibyte = format!("{}@example.com", "é".repeat(200));
        let input = SignUpRequest {
            email: Some(multibyte.clone()),
            password: Some("Secret123".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(input.email, multibyte);

        let overlong = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
        let errors = SignUpRequest {
            email: Some(overlong),
            password: Some("Secret123".to_string()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            errors.errors()[0].message,
            "Email must be at most 255 characters"
        );
    }

    #[test]
    fn test_sign_in_accepts_any_non_empty_password() {
        let input = SignInRequest {
            email: Some("a@b.com".to_string()),
            password: Some("x".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(input.password, "x");
    }

    #[test]
    fn test_update_requires_a_field() {
        let errors = UpdateUserRequest::default().validate().unwrap_err();
        assert!(errors.has_field("body"));
    }

    #[test]
    fn test_update_role_must_be_known() {
        let errors = UpdateUserRequest {
            email: None,
            role: Some("superuser".to_string()),
        }
        .validate()
        .unwrap_err();
        assert!(errors.has_field("role"));
        assert!(!errors.has_field("body"));
    }

    #[test]
    fn test_update_parses_fields() {
        let update = UpdateUserRequest {
            email: Some("New@Example.com".to_string()),
            role: Some("admin".to_string()),
        }
        .validate()
        .unwrap();

        assert_eq!(update.email.as_deref(), Some("new@example.com"));
        assert_eq!(update.role, Some(UserRole::Admin));
    }
}
