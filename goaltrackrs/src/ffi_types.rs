//! FFI-safe types with UniFFI derives.
//!
//! These mirror goaltrack types with flat fields Swift and Kotlin can read
//! directly. Conversion happens at the FFI boundary. UniFFI derives are only
//! added with the `ffi` feature.

use serde::{Deserialize, Serialize};

use goaltrack::{ActivityKind, DailyProgress, Goal, GoalCard, Item, Workout, WorkoutInterval};

use crate::persistence::WorkoutRecord;

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum FfiActivityKind {
    Walking,
    Running,
}

impl From<ActivityKind> for FfiActivityKind {
    fn from(kind: ActivityKind) -> Self {
        match kind {
            ActivityKind::Walking => FfiActivityKind::Walking,
            ActivityKind::Running => FfiActivityKind::Running,
        }
    }
}

impl From<FfiActivityKind> for ActivityKind {
    fn from(kind: FfiActivityKind) -> Self {
        match kind {
            FfiActivityKind::Walking => ActivityKind::Walking,
            FfiActivityKind::Running => ActivityKind::Running,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FfiItem {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Wire name: step, walking_distance or running_distance
    pub kind: String,
    pub goal: u32,
    /// Image asset name of the trophy, if the item carries a reward
    pub trophy: Option<String>,
    pub points: Option<u32>,
    pub goal_label: String,
}

impl From<&Item> for FfiItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            kind: item.kind.wire_name().to_string(),
            goal: item.goal,
            trophy: item.reward.map(|r| r.trophy.image_name().to_string()),
            points: item.reward.map(|r| r.points),
            goal_label: item.goal_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FfiGoal {
    pub items: Vec<FfiItem>,
    pub next_page_token: Option<String>,
}

impl From<Goal> for FfiGoal {
    fn from(goal: Goal) -> Self {
        Self {
            items: goal.items.iter().map(FfiItem::from).collect(),
            next_page_token: goal.next_page_token,
        }
    }
}

/// Today's totals as read from the health store.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FfiDailyProgress {
    pub steps: Option<f64>,
    /// Meters
    pub walking_distance: Option<f64>,
    /// Meters
    pub running_distance: Option<f64>,
}

impl From<FfiDailyProgress> for DailyProgress {
    fn from(p: FfiDailyProgress) -> Self {
        DailyProgress {
            steps: p.steps,
            walking_distance: p.walking_distance,
            running_distance: p.running_distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FfiGoalCard {
    pub item: FfiItem,
    pub progress_today: f64,
    pub ratio: f64,
    pub reward_granted: bool,
}

impl From<GoalCard> for FfiGoalCard {
    fn from(card: GoalCard) -> Self {
        Self {
            item: FfiItem::from(&card.item),
            progress_today: card.progress_today,
            ratio: card.ratio,
            reward_granted: card.reward_granted,
        }
    }
}

/// Result of a one-shot fetch. `error` is set when `goal` is not.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FfiFetchResult {
    pub goal: Option<FfiGoal>,
    pub error: Option<String>,
    /// True when the failure was a connectivity problem
    pub offline: bool,
}

// ============================================================================
// Workouts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FfiWorkoutInterval {
    /// Unix timestamp (milliseconds since epoch)
    pub start_ms: i64,
    pub end_ms: i64,
    /// Meters, when distance was tracked
    pub distance: Option<f64>,
}

impl From<&WorkoutInterval> for FfiWorkoutInterval {
    fn from(interval: &WorkoutInterval) -> Self {
        Self {
            start_ms: interval.start().timestamp_millis(),
            end_ms: interval.end().timestamp_millis(),
            distance: interval.distance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FfiWorkoutSummary {
    pub intervals: Vec<FfiWorkoutInterval>,
    pub duration_secs: f64,
    pub distance: f64,
    pub energy_kcal: f64,
    pub elapsed_label: String,
}

impl From<&Workout> for FfiWorkoutSummary {
    fn from(workout: &Workout) -> Self {
        Self {
            intervals: workout
                .intervals()
                .iter()
                .map(FfiWorkoutInterval::from)
                .collect(),
            duration_secs: workout.duration().num_milliseconds() as f64 / 1000.0,
            distance: workout.distance(),
            energy_kcal: workout.energy_burned(),
            elapsed_label: goaltrack::format_elapsed(workout.duration()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct FfiWorkoutRecord {
    pub id: i64,
    pub goal_id: Option<String>,
    pub activity: FfiActivityKind,
    pub start_ms: i64,
    pub end_ms: i64,
    pub duration_secs: f64,
    pub distance: f64,
    pub energy_kcal: f64,
}

impl From<WorkoutRecord> for FfiWorkoutRecord {
    fn from(r: WorkoutRecord) -> Self {
        Self {
            id: r.id,
            goal_id: r.goal_id,
            activity: r.activity.into(),
            start_ms: r.start.timestamp_millis(),
            end_ms: r.end.timestamp_millis(),
            duration_secs: r.duration_secs,
            distance: r.distance_m,
            energy_kcal: r.energy_kcal,
        }
    }
}
