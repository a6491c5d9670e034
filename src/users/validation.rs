use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

pub const CELLPHONE_MAX_LEN: usize = 20;
pub const JOB_MAX_LEN: usize = 100;
pub const NAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalized email, or a validation error naming the `email` field.
pub fn clean_email(raw: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(ApiError::validation("email", "Invalid email"));
    }
    Ok(email)
}

pub fn clean_username(raw: &str) -> Result<String, ApiError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ApiError::validation("username", "Username may not be blank"));
    }
    check_len("username", username, NAME_MAX_LEN)?;
    Ok(username.to_string())
}

pub fn clean_name(field: &str, raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    check_len(field, name, NAME_MAX_LEN)?;
    Ok(name.to_string())
}

/// Blank input clears the field.
pub fn clean_optional(field: &str, raw: &str, max: usize) -> Result<Option<String>, ApiError> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    check_len(field, value, max)?;
    Ok(Some(value.to_string()))
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::validation(
            field,
            format!("Ensure this field has no more than {max} characters"),
        ));
    }
    Ok(())
}
