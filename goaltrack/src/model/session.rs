//! Workout session state machine.
//!
//! ```text
//! NotStarted --start--> Active --end--> Finished
//!      ^                                   |
//!      +---------------clear---------------+
//! ```
//!
//! Elapsed-time ticks and distance updates come from outside (timer, location
//! tracker) and never change the state tag.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::workout::{Workout, WorkoutInterval};
use crate::error::{GoalTrackError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    NotStarted,
    Active,
    Finished,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::NotStarted => "not started",
            SessionState::Active => "active",
            SessionState::Finished => "finished",
        })
    }
}

/// A single workout in progress. Owned by one workout screen.
#[derive(Debug, Clone)]
pub struct WorkoutSession {
    state: SessionState,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    distance: Option<f64>,
    intervals: Vec<WorkoutInterval>,
}

impl Default for WorkoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkoutSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::NotStarted,
            start_date: None,
            end_date: None,
            distance: None,
            intervals: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// Last cumulative distance reported while active.
    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    pub fn intervals(&self) -> &[WorkoutInterval] {
        &self.intervals
    }

    pub fn start(&mut self) -> Result<()> {
        self.start_at(Utc::now())
    }

    /// Begin the session. Only valid once, from `NotStarted`.
    pub fn start_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != SessionState::NotStarted {
            return Err(GoalTrackError::InvalidTransition {
                action: "start",
                state: self.state,
            });
        }
        self.start_date = Some(now);
        self.state = SessionState::Active;
        debug!("[WorkoutSession] Started at {}", now);
        Ok(())
    }

    /// Record cumulative distance. Ignored unless active.
    pub fn update_distance(&mut self, meters: f64) {
        if self.state != SessionState::Active || !meters.is_finite() || meters < 0.0 {
            return;
        }
        self.distance = Some(meters);
    }

    pub fn end(&mut self, distance: Option<f64>) -> Result<()> {
        self.end_at(Utc::now(), distance)
    }

    /// Close the running interval. `distance` overrides the tracked value.
    pub fn end_at(&mut self, now: DateTime<Utc>, distance: Option<f64>) -> Result<()> {
        let start = match (self.state, self.start_date) {
            (SessionState::Active, Some(start)) => start,
            _ => {
                return Err(GoalTrackError::InvalidTransition {
                    action: "end",
                    state: self.state,
                });
            }
        };
        // Clock may have stepped backwards while the session ran.
        let end = now.max(start);
        let distance = distance.or(self.distance);
        self.intervals.push(WorkoutInterval::new(start, end, distance)?);
        self.end_date = Some(end);
        self.distance = distance;
        self.state = SessionState::Finished;
        debug!(
            "[WorkoutSession] Finished after {}s, distance {:?}",
            (end - start).num_seconds(),
            distance
        );
        Ok(())
    }

    /// Return to a fresh `NotStarted` session.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Finished workout, present only after a successful `end`.
    pub fn complete_workout(&self) -> Option<Workout> {
        if self.state != SessionState::Finished {
            return None;
        }
        Workout::new(self.intervals.clone()).ok()
    }

    /// Time since start, frozen at the end date once finished.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => end - start,
            (Some(start), None) => (now - start).max(Duration::zero()),
            _ => Duration::zero(),
        }
    }
}
