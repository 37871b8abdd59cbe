//! Runtime configuration for the coordinator and screens.

use serde::{Deserialize, Serialize};

use crate::error::{GoalTrackError, Result};
use crate::scenes::ErrorContent;

/// Configuration for screen behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interval between elapsed-time refreshes on the workout screen.
    /// Default: 1000ms
    pub tick_interval_ms: u64,

    /// Shown when there is neither a connection nor a cached catalog.
    pub offline_error: ErrorContent,

    /// Wipe the persisted catalog before the launch screen appears.
    /// Default: false
    pub reset_store_on_launch: bool,

    /// Passed to every router present/dismiss.
    /// Default: true
    pub animate_transitions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            offline_error: ErrorContent::offline(),
            reset_store_on_launch: false,
            animate_transitions: true,
        }
    }
}

impl Config {
    /// Parse a partial JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json).map_err(|e| GoalTrackError::Config {
            message: e.to_string(),
        })?;
        if config.tick_interval_ms == 0 {
            return Err(GoalTrackError::Config {
                message: "tick_interval_ms must be positive".to_string(),
            });
        }
        Ok(config)
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"tick_interval_ms": 250}"#).unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert!(config.animate_transitions);
        assert_eq!(config.offline_error, ErrorContent::offline());
    }

    #[test]
    fn test_rejects_zero_tick() {
        assert!(matches!(
            Config::from_json(r#"{"tick_interval_ms": 0}"#),
            Err(GoalTrackError::Config { .. })
        ));
        assert!(matches!(
            Config::from_json("not json"),
            Err(GoalTrackError::Config { .. })
        ));
    }
}
