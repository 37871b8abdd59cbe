//! goaltrackrs - platform layer for goaltrack
//!
//! This crate provides:
//! - SQLite goal store implementing [`goaltrack::GoalStore`]
//! - reqwest-backed [`goaltrack::GoalService`]
//! - UniFFI bindings for iOS/Android (feature `ffi`)

// Re-export all public types from goaltrack
pub use goaltrack::*;

// Persistence layer with SQLite storage
pub mod persistence;
pub use persistence::{with_goal_store, SqliteGoalStore, WorkoutRecord, GOAL_STORE};

// HTTP client for the goal catalog
pub mod http;
pub use http::{fetch_goals_blocking, request_goals, ClientConfig, GoalFetcher};

// FFI bindings for mobile platforms (exported with the "ffi" feature)
pub mod ffi;
pub mod ffi_types;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android
#[cfg(target_os = "android")]
pub fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("goaltrack"),
    );
}

/// Initialize logging for iOS (unified logging)
#[cfg(target_os = "ios")]
pub fn init_logging() {
    use log::LevelFilter;
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = oslog::OsLogger::new("com.goaltrack")
            .level_filter(LevelFilter::Debug)
            .init();
    });
}

#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub fn init_logging() {
    // No-op on desktop; tests install env_logger themselves
}
