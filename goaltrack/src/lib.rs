//! # goaltrack
//!
//! Core of a fitness-goal tracker: a goal catalog with rewards, a workout
//! session state machine, and the coordinator/router layer that decides which
//! screen is shown, all without a GUI framework.
//!
//! ## Layout
//!
//! - [`model`]: goal catalog, daily progress, workouts, workout session
//! - [`runtime`]: UI-thread [`MainQueue`] and `Send` completion handles
//! - [`connectivity`]: injected publish/subscribe network monitor
//! - [`services`]: collaborator traits (fetch, store, health, location, timer)
//! - [`navigation`]: headless window, routers, delegates
//! - [`scenes`]: launch, goals, error, profile and workout screens
//! - [`coordinator`]: [`HomeCoordinator`]
//!
//! ## Quick Start
//!
//! ```
//! use goaltrack::{Goal, GoalType, DailyProgress};
//!
//! let catalog = Goal::from_json(r#"{"items": [
//!     {"id": "1", "title": "10k", "description": "", "type": "step",
//!      "goal": 10000, "reward": {"trophy": "gold_medal", "points": 20}}
//! ]}"#).unwrap();
//!
//! let progress = DailyProgress { steps: Some(12000.0), ..Default::default() };
//! assert_eq!(catalog.items[0].kind, GoalType::Step);
//! assert_eq!(catalog.points_today(&progress), 20);
//! ```

pub mod config;
pub mod connectivity;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod navigation;
pub mod runtime;
pub mod scenes;
pub mod services;

pub use config::Config;
pub use connectivity::{ConnectivityChange, ConnectivityMonitor, Subscription};
pub use coordinator::HomeCoordinator;
pub use error::{GoalTrackError, OptionExt, Result};
pub use model::{
    format_elapsed, ActivityKind, BiologicalSex, BloodType, DailyProgress, Goal, GoalType,
    HealthProfile, Item, Reward, SessionState, Trophy, Workout, WorkoutInterval, WorkoutSession,
    CALORIES_PER_HOUR,
};
pub use navigation::{
    Delegate, DelegateHandle, ModalRouter, NavigationRouter, OnDismissed, RootRouter, Router,
    RouterFactory, SceneKind, Screen, ScreenController, ScreenId, StackId, Window,
    WindowRouterFactory,
};
pub use runtime::{Completion, MainQueue, Notifier};
pub use scenes::{
    ErrorContent, ErrorEvent, ErrorScreen, GoalCard, GoalsEvent, GoalsScreen, GoalsViewModel,
    LaunchEvent, LaunchScreen, ProfileEvent, ProfileScreen, WorkoutEvent, WorkoutScreen,
    WorkoutViewModel,
};
pub use services::{
    Clock, GoalService, GoalStore, HealthStore, LocationTracker, MemoryGoalStore, Services,
    SystemClock, Ticker, TimerToken, TrackingToken,
};
