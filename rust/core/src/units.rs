// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model units and conversion
//!
//! Every model carries one of a fixed set of length units. Tolerances and
//! conversions are derived from the unit's multiplier to meters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length units of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Units {
    #[default]
    Meters,
    Millimeters,
    Feet,
    Inches,
    Centimeters,
}

impl Units {
    pub const ALL: [Units; 5] = [
        Units::Meters,
        Units::Millimeters,
        Units::Feet,
        Units::Inches,
        Units::Centimeters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Meters => "Meters",
            Units::Millimeters => "Millimeters",
            Units::Feet => "Feet",
            Units::Inches => "Inches",
            Units::Centimeters => "Centimeters",
        }
    }

    pub fn by_name(name: &str) -> Result<Self> {
        Units::ALL
            .iter()
            .copied()
            .find(|u| u.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::InvalidValue(format!("unknown units \"{}\"", name)))
    }

    /// Multiplier that converts a length in these units to meters
    #[inline]
    pub fn to_meters(&self) -> f64 {
        match self {
            Units::Meters => 1.0,
            Units::Millimeters => 0.001, // Most common in BIM exports
            Units::Feet => 0.3048,
            Units::Inches => 0.0254,
            Units::Centimeters => 0.01,
        }
    }

    /// Multiplier that converts a length in these units to `target`
    #[inline]
    pub fn conversion_factor_to(&self, target: Units) -> f64 {
        self.to_meters() / target.to_meters()
    }

    /// Typical model tolerance: about a centimeter, rounded to the unit
    pub fn default_tolerance(&self) -> f64 {
        match self {
            Units::Meters => 0.01,
            Units::Millimeters => 1.0,
            Units::Feet => 0.01,
            Units::Inches => 0.1,
            Units::Centimeters => 1.0,
        }
    }

    fn from_abbreviation(abbr: &str) -> Option<Self> {
        match abbr.trim().to_ascii_lowercase().as_str() {
            "m" | "meter" | "meters" => Some(Units::Meters),
            "mm" | "millimeter" | "millimeters" => Some(Units::Millimeters),
            "ft" | "'" | "foot" | "feet" => Some(Units::Feet),
            "in" | "\"" | "inch" | "inches" => Some(Units::Inches),
            "cm" | "centimeter" | "centimeters" => Some(Units::Centimeters),
            _ => None,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a distance such as `"3ft"`, `"250 mm"` or `"2.5"` into
/// `destination` units. A bare number is taken to already be in
/// `destination` units.
pub fn parse_distance_string(value: &str, destination: Units) -> Result<f64> {
    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
        .unwrap_or(value.len());
    let (number, suffix) = value.split_at(split);
    let number: f64 = number
        .trim()
        .parse()
        .map_err(|_| Error::InvalidValue(format!("\"{}\" is not a distance", value)))?;
    if suffix.trim().is_empty() {
        return Ok(number);
    }
    let units = Units::from_abbreviation(suffix)
        .ok_or_else(|| Error::InvalidValue(format!("unknown unit \"{}\"", suffix.trim())))?;
    Ok(number * units.conversion_factor_to(destination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn conversion_factors() {
        assert_relative_eq!(Units::Feet.conversion_factor_to(Units::Meters), 0.3048);
        assert_relative_eq!(Units::Meters.conversion_factor_to(Units::Millimeters), 1000.0);
        assert_relative_eq!(Units::Inches.conversion_factor_to(Units::Feet), 1.0 / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn names() {
        assert_eq!(Units::by_name("feet").unwrap(), Units::Feet);
        assert!(Units::by_name("Furlongs").is_err());
        assert_eq!(Units::default(), Units::Meters);
    }

    #[test]
    fn parse_distances() {
        assert_relative_eq!(parse_distance_string("3ft", Units::Meters).unwrap(), 0.9144, epsilon = 1e-12);
        assert_relative_eq!(parse_distance_string("250 mm", Units::Meters).unwrap(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(parse_distance_string("2.5", Units::Feet).unwrap(), 2.5);
        assert!(parse_distance_string("abc", Units::Meters).is_err());
        assert!(parse_distance_string("3 parsecs", Units::Meters).is_err());
    }
}
