//! Value types: goal catalog, workouts, workout session, health profile.

pub mod goal;
pub mod profile;
pub mod session;
pub mod workout;

pub use goal::{ActivityKind, DailyProgress, Goal, GoalType, Item, Reward, Trophy};
pub use profile::{BiologicalSex, BloodType, HealthProfile};
pub use session::{SessionState, WorkoutSession};
pub use workout::{format_elapsed, Workout, WorkoutInterval, CALORIES_PER_HOUR};
