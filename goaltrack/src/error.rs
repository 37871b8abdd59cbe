//! Unified error handling for goaltrack.
//!
//! Collaborator failures, catalog validation and workout-session misuse all
//! surface as [`GoalTrackError`]. Screens decide whether a failure is shown to
//! the user or only logged; nothing in the core aborts the process.

use crate::model::SessionState;

/// Unified error type for goaltrack operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GoalTrackError {
    /// Remote request failed or returned a non-success status
    #[error("{}", format_http(.message, .status))]
    Http { message: String, status: Option<u16> },

    /// Response body could not be decoded into a goal catalog
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// No network path is available
    #[error("No network connection")]
    Offline,

    /// Local store read/write failed
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Health-data provider failed or denied access
    #[error("Health data error: {message}")]
    Health { message: String },

    /// Body mass index cannot be computed without weight and height
    #[error("Body mass index requires both weight and height")]
    MissingBodyMassIndex,

    /// Catalog item violates a catalog invariant
    #[error("Invalid goal '{id}': {message}")]
    InvalidGoal { id: String, message: String },

    /// Workout interval ends before it starts
    #[error("Workout interval ends before it starts")]
    InvalidInterval,

    /// Workout session operation is not valid in the current state
    #[error("Cannot {action} a workout session that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    /// A workout needs at least one interval
    #[error("Workout has no intervals")]
    EmptyWorkout,

    /// Configuration could not be parsed
    #[error("Configuration error: {message}")]
    Config { message: String },
}

fn format_http(message: &str, status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP error ({}): {}", code, message),
        None => format!("HTTP error: {}", message),
    }
}

impl GoalTrackError {
    /// Whether the failure came from the network path rather than the data.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, GoalTrackError::Offline | GoalTrackError::Http { .. })
    }
}

impl From<serde_json::Error> for GoalTrackError {
    fn from(err: serde_json::Error) -> Self {
        GoalTrackError::Decode {
            message: err.to_string(),
        }
    }
}

/// Result type alias for goaltrack operations.
pub type Result<T> = std::result::Result<T, GoalTrackError>;

/// Extension trait for converting Option to GoalTrackError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a health-data error.
    fn ok_or_health(self, message: &str) -> Result<T>;

    /// Convert Option to Result with a persistence error.
    fn ok_or_persistence(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_health(self, message: &str) -> Result<T> {
        self.ok_or_else(|| GoalTrackError::Health {
            message: message.to_string(),
        })
    }

    fn ok_or_persistence(self, message: &str) -> Result<T> {
        self.ok_or_else(|| GoalTrackError::Persistence {
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GoalTrackError::Http {
            message: "not found".to_string(),
            status: Some(404),
        };
        assert_eq!(err.to_string(), "HTTP error (404): not found");

        let err = GoalTrackError::InvalidTransition {
            action: "start",
            state: SessionState::Active,
        };
        assert!(err.to_string().contains("start"));
        assert!(err.to_string().contains("active"));
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(GoalTrackError::Offline.is_connectivity());
        assert!(GoalTrackError::Http {
            message: "timeout".into(),
            status: None
        }
        .is_connectivity());
        assert!(!GoalTrackError::EmptyWorkout.is_connectivity());
    }

    #[test]
    fn test_option_ext() {
        let none: Option<f64> = None;
        assert!(matches!(
            none.ok_or_health("no samples"),
            Err(GoalTrackError::Health { .. })
        ));
        assert_eq!(Some(3).ok_or_persistence("missing"), Ok(3));
    }
}
