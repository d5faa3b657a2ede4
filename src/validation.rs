//! Field validation utilities.

use std::time::Duration;

/// Validate that a string is not empty.
pub fn validate_non_empty(s: &str, field: &str) -> crate::types::Result<()> {
    if s.trim().is_empty() {
        return Err(crate::types::Error::validation(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(())
}

/// Validate that a duration is not zero.
pub fn validate_non_zero_duration(d: Duration, field: &str) -> crate::types::Result<()> {
    if d.is_zero() {
        return Err(crate::types::Error::validation(format!(
            "{} must be positive",
            field
        )));
    }
    Ok(())
}
