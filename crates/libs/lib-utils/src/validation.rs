//! # Validation Utilities
//!
//! Input validation helpers for request payloads.

/// Validate that a string is not empty or whitespace.
pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate email shape: one `@`, a non-empty local part, and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), String> {
    let invalid = || Err("Invalid email format".to_string());

    if email.chars().any(char::is_whitespace) {
        return invalid();
    }

    let Some((local, domain)) = email.split_once('@') else {
        return invalid();
    };

    if local.is_empty() || domain.contains('@') {
        return invalid();
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return invalid();
    }

    Ok(())
}

/// Validate that a value has between `min` and `max` characters (inclusive).
pub fn validate_length(value: &str, min: usize, max: usize, field_name: &str) -> Result<(), String> {
    let len = value.chars().count();
    if len < min {
        Err(format!("{} must be at least {} characters", field_name, min))
    } else if len > max {
        Err(format!("{} must be at most {} characters", field_name, max))
    } else {
        Ok(())
    }
}
