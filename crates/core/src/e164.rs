//! E.164 phone number validation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::GatewayError;

static E164_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9]\d{7,14}$").expect("static E.164 pattern is valid"));

/// Validate that `value` matches the E.164 shape required throughout the gateway.
///
/// Returns the validated string unchanged so callers can use this as a
/// parse-don't-validate constructor at the boundary.
pub fn validate_e164(value: &str) -> Result<String, GatewayError> {
    if E164_PATTERN.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(GatewayError::InvalidE164(value.to_string()))
    }
}
