// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI configuration loaded from environment variables.

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// CLI configuration. Command line flags take precedence.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// `HONEYBEE_LOG_FORMAT`: `pretty` or `json`.
    pub log_format: LogFormat,
    /// `HONEYBEE_TOLERANCE`: overrides the model's distance tolerance.
    pub tolerance: Option<f64>,
    /// `HONEYBEE_ANGLE_TOLERANCE`: overrides the model's angle tolerance, in degrees.
    pub angle_tolerance: Option<f64>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Unparseable values fall back to the defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_format: match var("HONEYBEE_LOG_FORMAT").as_deref().map(str::trim) {
                Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            tolerance: var("HONEYBEE_TOLERANCE")
                .and_then(|v| v.trim().parse().ok())
                .filter(|t: &f64| *t >= 0.0),
            angle_tolerance: var("HONEYBEE_ANGLE_TOLERANCE")
                .and_then(|v| v.trim().parse().ok())
                .filter(|t: &f64| *t >= 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        Config::from_vars(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn defaults_without_environment() {
        let c = config(&[]);
        assert_eq!(c.log_format, LogFormat::Pretty);
        assert!(c.tolerance.is_none());
        assert!(c.angle_tolerance.is_none());
    }

    #[test]
    fn reads_overrides() {
        let c = config(&[
            ("HONEYBEE_LOG_FORMAT", "JSON"),
            ("HONEYBEE_TOLERANCE", " 0.001 "),
            ("HONEYBEE_ANGLE_TOLERANCE", "0.5"),
        ]);
        assert_eq!(c.log_format, LogFormat::Json);
        assert_eq!(c.tolerance, Some(0.001));
        assert_eq!(c.angle_tolerance, Some(0.5));
    }

    #[test]
    fn ignores_bad_numbers() {
        let c = config(&[("HONEYBEE_TOLERANCE", "tiny"), ("HONEYBEE_ANGLE_TOLERANCE", "-1")]);
        assert!(c.tolerance.is_none());
        assert!(c.angle_tolerance.is_none());
    }
}
