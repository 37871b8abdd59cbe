//! Collaborator contracts.
//!
//! Network, storage, health data, location and timers all live outside the
//! core. Asynchronous results come back through [`Completion`]/[`Notifier`],
//! so implementations are free to do their work on any thread.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::connectivity::ConnectivityMonitor;
use crate::error::Result;
use crate::model::{ActivityKind, Goal, HealthProfile, Workout};
use crate::runtime::{Completion, MainQueue, Notifier};

/// Remote goal catalog. Single attempt, no retry.
pub trait GoalService {
    fn fetch_goals(&self, done: Completion<Result<Goal>>);
}

/// Local copy of the last fetched catalog.
pub trait GoalStore {
    /// Replace whatever was stored with `goal`.
    fn persist(&self, goal: &Goal) -> Result<()>;
    fn load_persisted(&self) -> Result<Option<Goal>>;
    fn delete_all(&self) -> Result<()>;
}

/// Health-data provider.
pub trait HealthStore {
    fn authorize(&self, done: Completion<Result<bool>>);
    fn steps_today(&self, done: Completion<Result<f64>>);
    /// Meters covered today for `activity`.
    fn distance_today(&self, activity: ActivityKind, done: Completion<Result<f64>>);
    fn save_workout(&self, activity: ActivityKind, workout: Workout, done: Completion<Result<()>>);
    fn load_profile(&self, done: Completion<Result<HealthProfile>>);
    fn save_body_mass_index(&self, bmi: f64, date: DateTime<Utc>, done: Completion<Result<()>>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackingToken(pub u64);

/// Reports cumulative meters since `start_updates`.
pub trait LocationTracker {
    fn start_updates(&self, updates: Notifier<f64>) -> TrackingToken;
    fn stop_updates(&self, token: TrackingToken);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Repeating timer.
pub trait Ticker {
    fn schedule(&self, interval: Duration, ticks: Notifier<()>) -> TimerToken;
    fn invalidate(&self, token: TimerToken);
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// In-memory [`GoalStore`], useful when no on-disk store is configured.
#[derive(Debug, Default)]
pub struct MemoryGoalStore {
    goal: RefCell<Option<Goal>>,
}

impl MemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GoalStore for MemoryGoalStore {
    fn persist(&self, goal: &Goal) -> Result<()> {
        *self.goal.borrow_mut() = Some(goal.clone());
        Ok(())
    }

    fn load_persisted(&self) -> Result<Option<Goal>> {
        Ok(self.goal.borrow().clone())
    }

    fn delete_all(&self) -> Result<()> {
        self.goal.borrow_mut().take();
        Ok(())
    }
}

/// Everything a screen may need, shared by the coordinator.
#[derive(Clone)]
pub struct Services {
    pub queue: MainQueue,
    pub connectivity: ConnectivityMonitor,
    pub goals: Rc<dyn GoalService>,
    pub store: Rc<dyn GoalStore>,
    pub health: Rc<dyn HealthStore>,
    pub location: Rc<dyn LocationTracker>,
    pub ticker: Rc<dyn Ticker>,
    pub clock: Rc<dyn Clock>,
    pub config: Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_replaces() {
        let store = MemoryGoalStore::new();
        assert_eq!(store.load_persisted().unwrap(), None);

        let first = Goal::from_json(
            r#"{"items": [{"id": "a", "title": "", "description": "", "type": "step", "goal": 5}]}"#,
        )
        .unwrap();
        store.persist(&first).unwrap();
        store.persist(&Goal::default()).unwrap();
        assert_eq!(store.load_persisted().unwrap(), Some(Goal::default()));

        store.delete_all().unwrap();
        assert_eq!(store.load_persisted().unwrap(), None);
    }
}
