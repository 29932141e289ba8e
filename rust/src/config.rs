//! Configuration types for the timeline engine.

use crate::logging::VERBOSITY_DEBUG;

/// Environment variable overriding [`EngineConfig::slack_epsilon`].
pub const ENV_SLACK_EPSILON: &str = "TIMELINE_SLACK_EPSILON";
/// Environment variable overriding [`EngineConfig::verbosity`].
pub const ENV_VERBOSITY: &str = "TIMELINE_VERBOSITY";
/// Environment variable overriding [`EngineConfig::critical_path_enabled`].
pub const ENV_CRITICAL_PATH: &str = "ENABLE_CRITICAL_PATH_ANALYSIS";

/// Runtime configuration shared by the store and the CPM solver.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Absolute tolerance (seconds) under which slack counts as zero.
    pub slack_epsilon: f64,
    /// Verbosity level: 0=silent, 1=changes, 2=passes, 3=debug.
    pub verbosity: u8,
    /// Whether critical path queries are served at all.
    pub critical_path_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slack_epsilon: 1e-6,
            verbosity: 0,
            critical_path_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Build a configuration from the process environment.
    ///
    /// Unset or unparsable variables keep their default value.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let slack_epsilon = lookup(ENV_SLACK_EPSILON)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|eps| eps.is_finite() && *eps > 0.0)
            .unwrap_or(defaults.slack_epsilon);

        let verbosity = lookup(ENV_VERBOSITY)
            .and_then(|v| v.trim().parse::<u8>().ok())
            .map(|v| v.min(VERBOSITY_DEBUG))
            .unwrap_or(defaults.verbosity);

        let critical_path_enabled = lookup(ENV_CRITICAL_PATH)
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.critical_path_enabled);

        Self {
            slack_epsilon,
            verbosity,
            critical_path_enabled,
        }
    }

    pub fn with_slack_epsilon(mut self, slack_epsilon: f64) -> Self {
        self.slack_epsilon = slack_epsilon;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_critical_path_enabled(mut self, enabled: bool) -> Self {
        self.critical_path_enabled = enabled;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!((config.slack_epsilon - 1e-6).abs() < 1e-12);
        assert_eq!(config.verbosity, 0);
        assert!(config.critical_path_enabled);
    }

    #[test]
    fn test_lookup_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_SLACK_EPSILON, "0.5"),
            (ENV_VERBOSITY, "2"),
            (ENV_CRITICAL_PATH, "false"),
        ]));
        assert!((config.slack_epsilon - 0.5).abs() < 1e-12);
        assert_eq!(config.verbosity, 2);
        assert!(!config.critical_path_enabled);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_SLACK_EPSILON, "-1"),
            (ENV_VERBOSITY, "loud"),
            (ENV_CRITICAL_PATH, "maybe"),
        ]));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_verbosity_is_capped() {
        let config = EngineConfig::from_lookup(lookup_from(&[(ENV_VERBOSITY, "9")]));
        assert_eq!(config.verbosity, VERBOSITY_DEBUG);
    }

    #[test]
    fn test_builder_setters() {
        let config = EngineConfig::default()
            .with_slack_epsilon(1e-3)
            .with_verbosity(1)
            .with_critical_path_enabled(false);
        assert!((config.slack_epsilon - 1e-3).abs() < 1e-12);
        assert_eq!(config.verbosity, 1);
        assert!(!config.critical_path_enabled);
    }
}
