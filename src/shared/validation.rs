use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

use crate::shared::constants::{is_known_code, EYE_COLORS, HAIR_COLORS, STATES};

/// US ZIP or ZIP+4
/// - Valid: "30303", "30303-1234"
/// - Invalid: "3030", "303031234", "30303-12"
pub static POSTAL_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(?:-\d{4})?$").expect("valid postal code regex"));

/// Login names: letters, digits and `@ . + - _`
/// - Valid: "jdoe", "j.doe+night@precinct4"
/// - Invalid: "j doe", "", "jdoe!"
pub static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

/// Incident numbers are printed on reports and used as directory names,
/// so they are limited to letters, digits and `- _ .`
pub static INCIDENT_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid incident regex"));

fn code_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

pub fn validate_eye_color(value: &str) -> Result<(), ValidationError> {
    if is_known_code(EYE_COLORS, value) {
        Ok(())
    } else {
        Err(code_error("eye_color", "Not a valid NCIC eye color code"))
    }
}

pub fn validate_hair_color(value: &str) -> Result<(), ValidationError> {
    if is_known_code(HAIR_COLORS, value) {
        Ok(())
    } else {
        Err(code_error("hair_color", "Not a valid NCIC hair color code"))
    }
}

pub fn validate_state_code(value: &str) -> Result<(), ValidationError> {
    if is_known_code(STATES, value) {
        Ok(())
    } else {
        Err(code_error("state", "Not a valid US state abbreviation"))
    }
}

/// Empty postal codes are allowed; anything else must be a ZIP code
pub fn validate_postal_code(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || POSTAL_CODE_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(code_error("postal_code", "Postal code must be 12345 or 12345-6789"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postal_code() {
        assert!(validate_postal_code("30303").is_ok());
        assert!(validate_postal_code("30303-1234").is_ok());
        assert!(validate_postal_code("").is_ok());
        assert!(validate_postal_code("3030").is_err());
        assert!(validate_postal_code("303031234").is_err());
        assert!(validate_postal_code("30303-12").is_err());
    }

    #[test]
    fn test_username_regex() {
        assert!(USERNAME_REGEX.is_match("jdoe"));
        assert!(USERNAME_REGEX.is_match("j.doe+night@precinct4"));
        assert!(!USERNAME_REGEX.is_match("j doe"));
        assert!(!USERNAME_REGEX.is_match(""));
        assert!(!USERNAME_REGEX.is_match("jdoe!"));
    }

    #[test]
    fn test_incident_number_regex() {
        assert!(INCIDENT_NUMBER_REGEX.is_match("2024-000123"));
        assert!(INCIDENT_NUMBER_REGEX.is_match("A1"));
        assert!(!INCIDENT_NUMBER_REGEX.is_match("../etc"));
        assert!(!INCIDENT_NUMBER_REGEX.is_match("24/001"));
        assert!(!INCIDENT_NUMBER_REGEX.is_match(""));
    }

    #[test]
    fn test_ncic_codes() {
        assert!(validate_eye_color("HAZ").is_ok());
        assert!(validate_eye_color("BLD").is_err());
        assert!(validate_hair_color("BLD").is_ok());
        assert!(validate_hair_color("haz").is_err());
    }

    #[test]
    fn test_state_codes() {
        assert!(validate_state_code("GA").is_ok());
        assert!(validate_state_code("PR").is_ok());
        assert!(validate_state_code("ga").is_err());
        assert!(validate_state_code("XX").is_err());
    }
}
