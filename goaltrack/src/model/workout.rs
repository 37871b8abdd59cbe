//! Completed workout intervals and their derived energy estimate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GoalTrackError, Result};

/// Fixed burn rate used for every activity type.
pub const CALORIES_PER_HOUR: f64 = 250.0;

/// One contiguous stretch of exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct WorkoutInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    /// Meters covered, only for distance workouts.
    distance: Option<f64>,
}

impl WorkoutInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, distance: Option<f64>) -> Result<Self> {
        if end < start {
            return Err(GoalTrackError::InvalidInterval);
        }
        Ok(Self {
            start,
            end,
            distance: distance.map(|d| d.max(0.0)),
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Kilocalories at [`CALORIES_PER_HOUR`].
    pub fn energy_burned(&self) -> f64 {
        CALORIES_PER_HOUR * (seconds(self.duration()) / 3600.0)
    }
}

/// A finished session: one or more intervals, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWorkout")]
pub struct Workout {
    intervals: Vec<WorkoutInterval>,
}

// Deserialization goes through the constructors so stored or received
// workouts hold the same invariants as built ones.

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(default)]
    distance: Option<f64>,
}

impl TryFrom<RawInterval> for WorkoutInterval {
    type Error = GoalTrackError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        WorkoutInterval::new(raw.start, raw.end, raw.distance)
    }
}

#[derive(Deserialize)]
struct RawWorkout {
    intervals: Vec<WorkoutInterval>,
}

impl TryFrom<RawWorkout> for Workout {
    type Error = GoalTrackError;

    fn try_from(raw: RawWorkout) -> Result<Self> {
        Workout::new(raw.intervals)
    }
}

impl Workout {
    pub fn new(intervals: Vec<WorkoutInterval>) -> Result<Self> {
        if intervals.is_empty() {
            return Err(GoalTrackError::EmptyWorkout);
        }
        Ok(Self { intervals })
    }

    pub fn intervals(&self) -> &[WorkoutInterval] {
        &self.intervals
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.intervals[0].start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.intervals[self.intervals.len() - 1].end
    }

    pub fn duration(&self) -> Duration {
        self.intervals
            .iter()
            .fold(Duration::zero(), |acc, interval| acc + interval.duration())
    }

    /// Total meters; 0 for step workouts.
    pub fn distance(&self) -> f64 {
        self.intervals.iter().filter_map(|i| i.distance).sum()
    }

    pub fn energy_burned(&self) -> f64 {
        self.intervals.iter().map(WorkoutInterval::energy_burned).sum()
    }
}

fn seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

/// Elapsed time as `HH:MM:SS`. Negative durations render as zero.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_interval_rejects_reversed_bounds() {
        assert_eq!(
            WorkoutInterval::new(at(10), at(5), None),
            Err(GoalTrackError::InvalidInterval)
        );
        assert!(WorkoutInterval::new(at(5), at(5), None).is_ok());
    }

    #[test]
    fn test_interval_energy() {
        let interval = WorkoutInterval::new(at(0), at(1800), Some(2500.0)).unwrap();
        assert_eq!(interval.duration(), Duration::seconds(1800));
        assert!((interval.energy_burned() - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_workout_aggregates() {
        let workout = Workout::new(vec![
            WorkoutInterval::new(at(0), at(600), Some(100.0)).unwrap(),
            WorkoutInterval::new(at(600), at(1500), Some(200.0)).unwrap(),
        ])
        .unwrap();
        assert_eq!(workout.distance(), 300.0);
        assert_eq!(workout.duration(), Duration::seconds(1500));
        assert_eq!(workout.start(), at(0));
        assert_eq!(workout.end(), at(1500));
        let expected = 250.0 * (600.0 / 3600.0) + 250.0 * (900.0 / 3600.0);
        assert!((workout.energy_burned() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_workout_rejected() {
        assert_eq!(Workout::new(Vec::new()), Err(GoalTrackError::EmptyWorkout));
    }

    #[test]
    fn test_step_workout_has_no_distance() {
        let workout =
            Workout::new(vec![WorkoutInterval::new(at(0), at(60), None).unwrap()]).unwrap();
        assert_eq!(workout.distance(), 0.0);
    }

    #[test]
    fn test_deserialize_rejects_empty_workout() {
        let result = serde_json::from_str::<Workout>(r#"{"intervals": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rejects_reversed_interval() {
        let json = r#"{"start": "2024-05-01T01:00:00Z", "end": "2024-05-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<WorkoutInterval>(json).is_err());

        let json = format!(r#"{{"intervals": [{}]}}"#, json);
        assert!(serde_json::from_str::<Workout>(&json).is_err());
    }

    #[test]
    fn test_deserialize_valid_workout() {
        let workout = Workout::new(vec![
            WorkoutInterval::new(at(0), at(600), Some(100.0)).unwrap(),
            WorkoutInterval::new(at(600), at(900), None).unwrap(),
        ])
        .unwrap();
        let json = serde_json::to_string(&workout).unwrap();
        let decoded: Workout = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, workout);
        assert_eq!(decoded.start(), at(0));

        let json = r#"{"start": "2024-05-01T00:00:00Z", "end": "2024-05-01T00:30:00Z"}"#;
        let interval: WorkoutInterval = serde_json::from_str(json).unwrap();
        assert_eq!(interval.distance(), None);
        assert_eq!(interval.duration(), Duration::minutes(30));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::zero()), "00:00:00");
        assert_eq!(format_elapsed(Duration::seconds(3725)), "01:02:05");
        assert_eq!(format_elapsed(Duration::seconds(-4)), "00:00:00");
    }
}
