//! Shared fakes and app harness for integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use goaltrack::{
    ActivityKind, Clock, Completion, Config, ConnectivityMonitor, Goal, GoalService, GoalStore,
    GoalTrackError, HealthProfile, HealthStore, HomeCoordinator, LocationTracker, MainQueue,
    MemoryGoalStore, Notifier, Result, RootRouter, Router, RouterFactory, Services, Ticker,
    TimerToken, TrackingToken, Window, WindowRouterFactory, Workout,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Three items: 10k steps (5 pts), 5 km run (50 pts), 2 km walk (no reward).
pub fn catalog() -> Goal {
    Goal::from_json(
        r#"{
        "items": [
            {"id": "1", "title": "Daily steps", "description": "Walk 10k steps",
             "type": "step", "goal": 10000,
             "reward": {"trophy": "bronze_medal", "points": 5}},
            {"id": "2", "title": "5k", "description": "Run 5 km",
             "type": "running_distance", "goal": 5000,
             "reward": {"trophy": "gold_medal", "points": 50}},
            {"id": "3", "title": "Stroll", "description": "Walk 2 km",
             "type": "walking_distance", "goal": 2000}
        ],
        "nextPageToken": "page-2"
    }"#,
    )
    .expect("valid catalog")
}

// ============================================================================
// Fakes
// ============================================================================

/// Completes immediately with the configured response unless holding.
pub struct FakeGoalService {
    response: RefCell<Result<Goal>>,
    holding: Cell<bool>,
    held: RefCell<Vec<Completion<Result<Goal>>>>,
    calls: Cell<usize>,
}

impl FakeGoalService {
    pub fn new(response: Result<Goal>) -> Self {
        Self {
            response: RefCell::new(response),
            holding: Cell::new(false),
            held: RefCell::new(Vec::new()),
            calls: Cell::new(0),
        }
    }

    pub fn set_response(&self, response: Result<Goal>) {
        *self.response.borrow_mut() = response;
    }

    pub fn hold(&self) {
        self.holding.set(true);
    }

    /// Complete every held request with the configured response.
    pub fn release(&self) {
        self.holding.set(false);
        let held: Vec<_> = self.held.borrow_mut().drain(..).collect();
        for done in held {
            done.complete(self.response.borrow().clone());
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl GoalService for FakeGoalService {
    fn fetch_goals(&self, done: Completion<Result<Goal>>) {
        self.calls.set(self.calls.get() + 1);
        if self.holding.get() {
            self.held.borrow_mut().push(done);
        } else {
            done.complete(self.response.borrow().clone());
        }
    }
}

pub struct FakeHealthStore {
    pub steps: Cell<f64>,
    pub walking: Cell<f64>,
    pub running: Cell<f64>,
    pub profile: RefCell<HealthProfile>,
    pub fail_saves: Cell<bool>,
    pub saved_workouts: RefCell<Vec<(ActivityKind, Workout)>>,
    pub saved_bmi: RefCell<Vec<f64>>,
    pub authorize_calls: Cell<usize>,
}

impl Default for FakeHealthStore {
    fn default() -> Self {
        Self {
            steps: Cell::new(12_000.0),
            walking: Cell::new(2_500.0),
            running: Cell::new(1_000.0),
            profile: RefCell::new(HealthProfile {
                age: Some(34),
                weight_kg: Some(72.0),
                height_m: Some(1.8),
                ..Default::default()
            }),
            fail_saves: Cell::new(false),
            saved_workouts: RefCell::new(Vec::new()),
            saved_bmi: RefCell::new(Vec::new()),
            authorize_calls: Cell::new(0),
        }
    }
}

impl FakeHealthStore {
    fn save_result(&self) -> Result<()> {
        if self.fail_saves.get() {
            Err(GoalTrackError::Health {
                message: "sharing denied".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl HealthStore for FakeHealthStore {
    fn authorize(&self, done: Completion<Result<bool>>) {
        self.authorize_calls.set(self.authorize_calls.get() + 1);
        done.complete(Ok(true));
    }

    fn steps_today(&self, done: Completion<Result<f64>>) {
        done.complete(Ok(self.steps.get()));
    }

    fn distance_today(&self, activity: ActivityKind, done: Completion<Result<f64>>) {
        let meters = match activity {
            ActivityKind::Walking => self.walking.get(),
            ActivityKind::Running => self.running.get(),
        };
        done.complete(Ok(meters));
    }

    fn save_workout(&self, activity: ActivityKind, workout: Workout, done: Completion<Result<()>>) {
        let result = self.save_result();
        if result.is_ok() {
            self.saved_workouts.borrow_mut().push((activity, workout));
        }
        done.complete(result);
    }

    fn load_profile(&self, done: Completion<Result<HealthProfile>>) {
        done.complete(Ok(self.profile.borrow().clone()));
    }

    fn save_body_mass_index(&self, bmi: f64, _date: DateTime<Utc>, done: Completion<Result<()>>) {
        let result = self.save_result();
        if result.is_ok() {
            self.saved_bmi.borrow_mut().push(bmi);
        }
        done.complete(result);
    }
}

#[derive(Default)]
pub struct FakeLocationTracker {
    next: Cell<u64>,
    active: RefCell<HashMap<u64, Notifier<f64>>>,
}

impl FakeLocationTracker {
    pub fn report(&self, meters: f64) {
        for updates in self.active.borrow().values() {
            updates.notify(meters);
        }
    }

    pub fn active(&self) -> usize {
        self.active.borrow().len()
    }
}

impl LocationTracker for FakeLocationTracker {
    fn start_updates(&self, updates: Notifier<f64>) -> TrackingToken {
        let id = self.next.get() + 1;
        self.next.set(id);
        self.active.borrow_mut().insert(id, updates);
        TrackingToken(id)
    }

    fn stop_updates(&self, token: TrackingToken) {
        self.active.borrow_mut().remove(&token.0);
    }
}

#[derive(Default)]
pub struct FakeTicker {
    next: Cell<u64>,
    timers: RefCell<HashMap<u64, (Duration, Notifier<()>)>>,
}

impl FakeTicker {
    pub fn fire(&self) {
        for (_, ticks) in self.timers.borrow().values() {
            ticks.notify(());
        }
    }

    pub fn active(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn intervals(&self) -> Vec<Duration> {
        self.timers.borrow().values().map(|(i, _)| *i).collect()
    }
}

impl Ticker for FakeTicker {
    fn schedule(&self, interval: Duration, ticks: Notifier<()>) -> TimerToken {
        let id = self.next.get() + 1;
        self.next.set(id);
        self.timers.borrow_mut().insert(id, (interval, ticks));
        TimerToken(id)
    }

    fn invalidate(&self, token: TimerToken) {
        self.timers.borrow_mut().remove(&token.0);
    }
}

pub struct FakeClock {
    now: Cell<DateTime<Utc>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            now: Cell::new(Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).unwrap()),
        }
    }
}

impl FakeClock {
    pub fn advance(&self, seconds: i64) {
        self.now.set(self.now.get() + chrono::Duration::seconds(seconds));
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Fakes {
    pub queue: MainQueue,
    pub connectivity: ConnectivityMonitor,
    pub goals: Rc<FakeGoalService>,
    pub store: Rc<MemoryGoalStore>,
    pub health: Rc<FakeHealthStore>,
    pub location: Rc<FakeLocationTracker>,
    pub ticker: Rc<FakeTicker>,
    pub clock: Rc<FakeClock>,
}

impl Fakes {
    pub fn new(connected: bool) -> Self {
        init_logging();
        Self {
            queue: MainQueue::new(),
            connectivity: ConnectivityMonitor::new(connected),
            goals: Rc::new(FakeGoalService::new(Ok(catalog()))),
            store: Rc::new(MemoryGoalStore::new()),
            health: Rc::new(FakeHealthStore::default()),
            location: Rc::new(FakeLocationTracker::default()),
            ticker: Rc::new(FakeTicker::default()),
            clock: Rc::new(FakeClock::default()),
        }
    }

    pub fn services(&self, config: Config) -> Services {
        Services {
            queue: self.queue.clone(),
            connectivity: self.connectivity.clone(),
            goals: self.goals.clone(),
            store: self.store.clone(),
            health: self.health.clone(),
            location: self.location.clone(),
            ticker: self.ticker.clone(),
            clock: self.clock.clone(),
            config,
        }
    }
}

/// Coordinator driving a real headless window.
pub struct App {
    pub fakes: Fakes,
    pub window: Window,
    pub coordinator: Rc<HomeCoordinator>,
}

impl App {
    pub fn new(connected: bool, cached: Option<Goal>) -> Self {
        Self::with_config(connected, cached, Config::default())
    }

    pub fn with_config(connected: bool, cached: Option<Goal>, config: Config) -> Self {
        let fakes = Fakes::new(connected);
        if let Some(goal) = cached {
            fakes.store.persist(&goal).expect("memory store");
        }
        let window = Window::new(fakes.queue.clone());
        let root: Rc<dyn Router> = Rc::new(RootRouter::new(&window));
        let routers: Rc<dyn RouterFactory> = Rc::new(WindowRouterFactory::new(&window));
        let coordinator = HomeCoordinator::new(fakes.services(config), root, routers);
        Self {
            fakes,
            window,
            coordinator,
        }
    }

    /// Start the coordinator and settle the main queue.
    pub fn launch(&self) {
        self.coordinator.start();
        self.settle();
    }

    pub fn settle(&self) {
        self.fakes.queue.run_until_idle();
    }
}
