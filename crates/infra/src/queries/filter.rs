//! Criteria expression builders
//!
//! The service takes filter criteria as free-form expression strings
//! (`this.FIELD = value`). Values are interpolated here and nowhere else:
//! string literals get their single quotes doubled, and numeric values must
//! parse as integers before they reach an expression at all.

/// Equality filter against a string field, with the value single-quoted and
/// embedded quotes doubled.
#[must_use]
pub fn string_equals(field: &str, value: &str) -> String {
    let escaped = value.replace('\'', "''");
    format!("this.{field} = '{escaped}'")
}

/// Equality filter against a numeric field.
///
/// The value is validated rather than quoted: anything that is not a plain
/// integer is rejected so it can never be spliced into an expression.
///
/// # Errors
/// Returns the offending value when it does not parse as an integer.
pub fn numeric_equals(field: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.parse::<i64>().is_ok() {
        Ok(format!("this.{field} = {trimmed}"))
    } else {
        Err(format!("invalid numeric value '{value}' for field {field}"))
    }
}
