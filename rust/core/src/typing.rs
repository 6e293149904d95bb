// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier rules and input checks shared by every entity.

use crate::error::{Error, Result};

/// Longest identifier accepted by downstream simulation engines.
pub const MAX_IDENTIFIER_LENGTH: usize = 100;

#[inline]
fn is_legal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Checks an identifier: ASCII letters, digits, `.`, `_` and `-`, between 1
/// and 100 characters.
pub fn valid_identifier(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidIdentifier {
            value: value.to_string(),
            reason: "identifier cannot be empty".to_string(),
        });
    }
    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(Error::InvalidIdentifier {
            value: value.to_string(),
            reason: format!(
                "identifier has {} characters but the limit is {}",
                value.len(),
                MAX_IDENTIFIER_LENGTH
            ),
        });
    }
    if let Some(c) = value.chars().find(|&c| !is_legal_char(c)) {
        return Err(Error::InvalidIdentifier {
            value: value.to_string(),
            reason: format!("illegal character \"{}\"", c),
        });
    }
    Ok(())
}

/// Replaces illegal characters with underscores and truncates to the
/// identifier length limit.
pub fn clean_string(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if is_legal_char(c) { c } else { '_' })
        .take(MAX_IDENTIFIER_LENGTH)
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// A cleaned identifier with a random 8 character suffix, for entities
/// derived from free-text names.
pub fn clean_and_id_string(value: &str) -> String {
    let mut base = clean_string(value);
    base.truncate(MAX_IDENTIFIER_LENGTH - 9);
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", base, &suffix[..8])
}

/// Checks that a number lies within an inclusive range.
pub fn float_in_range(value: f64, min: f64, max: f64, name: &str) -> Result<f64> {
    if value.is_nan() || value < min || value > max {
        return Err(Error::InvalidValue(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_legal_identifiers() {
        assert!(valid_identifier("Room_1.Zone-A").is_ok());
        assert!(valid_identifier(&"a".repeat(100)).is_ok());
    }

    #[test]
    fn rejects_illegal_identifiers() {
        assert!(valid_identifier("").is_err());
        assert!(valid_identifier("has space").is_err());
        assert!(valid_identifier("café").is_err());
        assert!(valid_identifier(&"a".repeat(101)).is_err());
    }

    #[test]
    fn cleaning_produces_valid_identifiers() {
        assert_eq!(clean_string("Living Room #2"), "Living_Room__2");
        let id = clean_and_id_string(&"x y".repeat(60));
        assert!(valid_identifier(&id).is_ok());
        assert_eq!(id.len(), MAX_IDENTIFIER_LENGTH);
    }

    #[test]
    fn range_check() {
        assert!(float_in_range(0.5, 0.0, 1.0, "ratio").is_ok());
        assert!(float_in_range(1.5, 0.0, 1.0, "ratio").is_err());
        assert!(float_in_range(f64::NAN, 0.0, 1.0, "ratio").is_err());
    }
}
