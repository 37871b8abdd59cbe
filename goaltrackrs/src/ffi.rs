//! FFI bindings for mobile platforms (iOS/Android).
//!
//! Stateless helpers plus calls into the global goal store. All functions are
//! prefixed with `ffi_` to avoid clashing with the Rust API.

use chrono::{Duration, TimeZone, Utc};
use log::{info, warn};

use goaltrack::{
    format_elapsed, DailyProgress, Goal, GoalCard, GoalStore, GoalTrackError, Result, Workout,
    WorkoutInterval,
};

use crate::ffi_types::{
    FfiActivityKind, FfiDailyProgress, FfiFetchResult, FfiGoal, FfiGoalCard, FfiWorkoutInterval,
    FfiWorkoutRecord, FfiWorkoutSummary,
};
use crate::http::{fetch_goals_blocking, ClientConfig};
use crate::init_logging;
use crate::persistence::with_goal_store;

fn client_config(config_json: Option<String>) -> Result<ClientConfig> {
    match config_json {
        Some(json) => ClientConfig::from_json(&json),
        None => Ok(ClientConfig::default()),
    }
}

fn workout_from(intervals: Vec<FfiWorkoutInterval>) -> Result<Workout> {
    let mut converted = Vec::with_capacity(intervals.len());
    for interval in intervals {
        let start = Utc.timestamp_millis_opt(interval.start_ms).single();
        let end = Utc.timestamp_millis_opt(interval.end_ms).single();
        let (Some(start), Some(end)) = (start, end) else {
            return Err(GoalTrackError::InvalidInterval);
        };
        converted.push(WorkoutInterval::new(start, end, interval.distance)?);
    }
    Workout::new(converted)
}

fn stored_goal() -> Option<Goal> {
    match with_goal_store(|store| store.load_persisted()) {
        Some(Ok(goal)) => goal,
        Some(Err(e)) => {
            warn!("[FFI] Failed to load catalog: {}", e);
            None
        }
        None => None,
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Fetch the catalog once. `config_json` overrides the client defaults.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn ffi_fetch_goals(config_json: Option<String>) -> FfiFetchResult {
    init_logging();
    let result = client_config(config_json).and_then(|config| fetch_goals_blocking(&config));
    match result {
        Ok(goal) => FfiFetchResult {
            goal: Some(goal.into()),
            error: None,
            offline: false,
        },
        Err(e) => FfiFetchResult {
            goal: None,
            offline: e.is_connectivity(),
            error: Some(e.to_string()),
        },
    }
}

/// Fetch the catalog and, on success, replace the stored copy with it.
/// A failed fetch leaves the stored catalog untouched.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn ffi_fetch_and_persist_goals(config_json: Option<String>) -> FfiFetchResult {
    init_logging();
    let result = client_config(config_json).and_then(|config| fetch_goals_blocking(&config));
    match result {
        Ok(goal) => {
            if let Some(Err(e)) = with_goal_store(|store| store.persist(&goal)) {
                warn!("[FFI] Fetched catalog not persisted: {}", e);
            }
            info!("[FFI] Fetched {} goals", goal.items.len());
            FfiFetchResult {
                goal: Some(goal.into()),
                error: None,
                offline: false,
            }
        }
        Err(e) => {
            warn!("[FFI] Fetch failed, keeping stored catalog: {}", e);
            FfiFetchResult {
                goal: stored_goal().map(FfiGoal::from),
                offline: e.is_connectivity(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// Cards for the stored catalog, in catalog order.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn ffi_goal_cards(progress: FfiDailyProgress) -> Vec<FfiGoalCard> {
    let progress: DailyProgress = progress.into();
    stored_goal()
        .map(|goal| {
            goal.items
                .iter()
                .map(|item| {
                    let card = GoalCard::configure(item, progress.for_type(item.kind));
                    FfiGoalCard::from(card)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Points earned today against the stored catalog.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn ffi_points_today(progress: FfiDailyProgress) -> u32 {
    let progress: DailyProgress = progress.into();
    stored_goal()
        .map(|goal| goal.points_today(&progress))
        .unwrap_or(0)
}

// ============================================================================
// Workouts
// ============================================================================

#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn ffi_workout_summary(intervals: Vec<FfiWorkoutInterval>) -> Option<FfiWorkoutSummary> {
    match workout_from(intervals) {
        Ok(workout) => Some(FfiWorkoutSummary::from(&workout)),
        Err(e) => {
            warn!("[FFI] Invalid workout: {}", e);
            None
        }
    }
}

/// Append a finished workout to the local log. Returns its id.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn ffi_record_workout(
    goal_id: Option<String>,
    activity: FfiActivityKind,
    intervals: Vec<FfiWorkoutInterval>,
) -> Option<i64> {
    let workout = match workout_from(intervals) {
        Ok(workout) => workout,
        Err(e) => {
            warn!("[FFI] Invalid workout: {}", e);
            return None;
        }
    };
    let recorded = with_goal_store(|store| {
        store.record_workout(goal_id.as_deref(), activity.into(), &workout)
    })?;
    match recorded {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("[FFI] Failed to record workout: {}", e);
            None
        }
    }
}

#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn ffi_recent_workouts(limit: u32) -> Vec<FfiWorkoutRecord> {
    match with_goal_store(|store| store.recent_workouts(limit)) {
        Some(Ok(records)) => records.into_iter().map(FfiWorkoutRecord::from).collect(),
        Some(Err(e)) => {
            warn!("[FFI] Failed to list workouts: {}", e);
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// `HH:MM:SS` for an elapsed time in seconds.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn ffi_format_elapsed(seconds: i64) -> String {
    format_elapsed(Duration::seconds(seconds))
}
