//! SQLite goal store against a real database file.

use chrono::{Duration, TimeZone, Utc};
use goaltrackrs::{
    ActivityKind, Goal, GoalStore, GoalType, SqliteGoalStore, Trophy, Workout, WorkoutInterval,
};
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn catalog() -> Goal {
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
    .unwrap()
}

fn open(dir: &TempDir) -> SqliteGoalStore {
    let path = dir.path().join("goals.db");
    SqliteGoalStore::open(path.to_str().unwrap()).unwrap()
}

fn workout(minutes: i64, meters: f64) -> Workout {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
    let end = start + Duration::minutes(minutes);
    Workout::new(vec![WorkoutInterval::new(start, end, Some(meters)).unwrap()]).unwrap()
}

#[test]
fn test_catalog_survives_reopen() {
    init_logging();
    let dir = TempDir::new().unwrap();
    {
        let store = open(&dir);
        store.persist(&catalog()).unwrap();
    }

    let store = open(&dir);
    let loaded = store.load_persisted().unwrap().expect("stored catalog");
    assert_eq!(loaded, catalog());
}

#[test]
fn test_item_order_and_rewards_preserved() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.persist(&catalog()).unwrap();

    let loaded = store.load_persisted().unwrap().unwrap();
    let ids: Vec<&str> = loaded.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(loaded.items[1].kind, GoalType::Running);
    assert_eq!(loaded.items[1].reward.unwrap().trophy, Trophy::Gold);
    assert_eq!(loaded.items[1].reward.unwrap().points, 50);
    assert!(loaded.items[2].reward.is_none());
    assert_eq!(loaded.next_page_token.as_deref(), Some("page-2"));
}

#[test]
fn test_persist_replaces_instead_of_merging() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.persist(&catalog()).unwrap();

    let replacement = Goal::from_json(
        r#"{"items": [{"id": "9", "title": "Run", "description": "",
            "type": "running_distance", "goal": 1000}]}"#,
    )
    .unwrap();
    store.persist(&replacement).unwrap();

    let loaded = store.load_persisted().unwrap().unwrap();
    assert_eq!(loaded, replacement);
    assert_eq!(store.item_count().unwrap(), 1);
}

#[test]
fn test_delete_all_then_reopen() {
    init_logging();
    let dir = TempDir::new().unwrap();
    {
        let store = open(&dir);
        store.persist(&catalog()).unwrap();
        store.delete_all().unwrap();
    }
    let store = open(&dir);
    assert!(store.load_persisted().unwrap().is_none());
}

#[test]
fn test_workout_log() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let store = open(&dir);

    let first = store
        .record_workout(Some("2"), ActivityKind::Running, &workout(30, 5000.0))
        .unwrap();
    let second = store
        .record_workout(None, ActivityKind::Walking, &workout(12, 900.0))
        .unwrap();
    assert!(second > first);

    let records = store.recent_workouts(10).unwrap();
    assert_eq!(records.len(), 2);
    let run = records.iter().find(|r| r.id == first).unwrap();
    assert_eq!(run.goal_id.as_deref(), Some("2"));
    assert_eq!(run.activity, ActivityKind::Running);
    assert_eq!(run.duration_secs, 1800.0);
    assert_eq!(run.distance_m, 5000.0);
    assert!((run.energy_kcal - 125.0).abs() < 1e-9);

    assert_eq!(store.recent_workouts(1).unwrap().len(), 1);

    // Clearing the catalog leaves the workout log alone.
    store.delete_all().unwrap();
    assert_eq!(store.recent_workouts(10).unwrap().len(), 2);
}
