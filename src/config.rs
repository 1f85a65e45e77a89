//! Engine configuration.
//!
//! Tunables for the scheduling passes. All values have sensible defaults and
//! can be overridden from a TOML file, so a partial file such as
//! `hours_per_day = 6.0` is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables shared by the critical-path and allocation passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Conversion constant between estimated hours and elapsed days. This is
    /// the only working-calendar modeling the engine does.
    pub hours_per_day: f64,
    /// Timeline origin for the forward pass, in days. Tasks with no
    /// predecessors start here.
    pub project_start_day: f64,
    /// Required project finish, in days from the origin. Binding for the
    /// backward pass: a deadline earlier than the computed finish is reported
    /// as violated, never silently extended.
    pub deadline_day: Option<f64>,
    /// Tolerance when comparing slack values for criticality.
    pub slack_epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hours_per_day: 8.0,
            project_start_day: 0.0,
            deadline_day: None,
            slack_epsilon: 1e-9,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Deadline expressed in days, with the given deadline (if any) taking
    /// precedence over the configured one.
    pub fn effective_deadline(&self, override_day: Option<f64>) -> Option<f64> {
        override_day.or(self.deadline_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.hours_per_day, 8.0);
        assert_eq!(config.project_start_day, 0.0);
        assert!(config.deadline_day.is_none());
        assert!(config.slack_epsilon > 0.0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str("hours_per_day = 6.0").unwrap();
        assert_eq!(config.hours_per_day, 6.0);
        assert_eq!(config.project_start_day, 0.0);
    }

    #[test]
    fn override_takes_precedence() {
        let config = EngineConfig {
            deadline_day: Some(10.0),
            ..Default::default()
        };
        assert_eq!(config.effective_deadline(Some(5.0)), Some(5.0));
        assert_eq!(config.effective_deadline(None), Some(10.0));
    }
}
