//! Headless screen controllers.
//!
//! Each screen owns its view-state, talks to collaborators through
//! [`Services`](crate::services::Services) and reports to the coordinator with
//! its own event enum.

pub mod error_view;
pub mod goals;
pub mod launch;
pub mod profile;
pub mod workout;

pub use error_view::{ErrorContent, ErrorEvent, ErrorScreen};
pub use goals::{GoalCard, GoalsEvent, GoalsScreen, GoalsViewModel};
pub use launch::{LaunchEvent, LaunchScreen};
pub use profile::{ProfileEvent, ProfileScreen};
pub use workout::{WorkoutEvent, WorkoutScreen, WorkoutViewModel};
