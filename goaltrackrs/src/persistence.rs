//! # Goal Store
//!
//! SQLite copy of the last fetched goal catalog, plus a log of saved workouts.
//!
//! The catalog is a single slot: [`SqliteGoalStore::persist`] replaces both
//! catalog tables in one transaction, so readers see either the previous
//! catalog or the new one, never a mix.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info};
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use goaltrack::{
    ActivityKind, Goal, GoalStore, GoalTrackError, GoalType, Item, Result, Reward, Trophy, Workout,
};

/// Map rusqlite failures into the crate error type.
trait SqlResultExt<T> {
    fn persistence(self) -> Result<T>;
}

impl<T> SqlResultExt<T> for rusqlite::Result<T> {
    fn persistence(self) -> Result<T> {
        self.map_err(|e| GoalTrackError::Persistence {
            message: e.to_string(),
        })
    }
}

/// One saved workout, as listed back to the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: i64,
    pub goal_id: Option<String>,
    pub activity: ActivityKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_secs: f64,
    pub distance_m: f64,
    pub energy_kcal: f64,
}

pub struct SqliteGoalStore {
    db: Mutex<Connection>,
    db_path: String,
}

impl SqliteGoalStore {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (or create) the store at `db_path`.
    pub fn open(db_path: &str) -> Result<Self> {
        let db = Connection::open(db_path).persistence()?;
        Self::init_schema(&db).persistence()?;
        Ok(Self {
            db: Mutex::new(db),
            db_path: db_path.to_string(),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            -- Single-row catalog header
            CREATE TABLE IF NOT EXISTS catalog (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                next_page_token TEXT,
                fetched_at INTEGER NOT NULL
            );

            -- Catalog items in display order
            CREATE TABLE IF NOT EXISTS goal_items (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                kind TEXT NOT NULL,
                goal INTEGER NOT NULL,
                trophy TEXT,
                points INTEGER
            );

            -- Saved workouts
            CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                goal_id TEXT,
                activity TEXT NOT NULL,
                start_time INTEGER NOT NULL,
                end_time INTEGER NOT NULL,
                duration_secs REAL NOT NULL,
                distance_m REAL NOT NULL,
                energy_kcal REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_workouts_start ON workouts(start_time);
            "#,
        )
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| GoalTrackError::Persistence {
            message: "goal store lock poisoned".to_string(),
        })
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// When the stored catalog was written, if there is one.
    pub fn fetched_at(&self) -> Result<Option<DateTime<Utc>>> {
        let db = self.lock()?;
        let millis: Option<i64> = db
            .query_row("SELECT fetched_at FROM catalog WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()
            .persistence()?;
        Ok(millis.and_then(|ms| Utc.timestamp_millis_opt(ms).single()))
    }

    pub fn item_count(&self) -> Result<usize> {
        let db = self.lock()?;
        let count: i64 = db
            .query_row("SELECT COUNT(*) FROM goal_items", [], |row| row.get(0))
            .persistence()?;
        Ok(count as usize)
    }

    // ========================================================================
    // Workouts
    // ========================================================================

    /// Append a workout summary. Returns its row id.
    pub fn record_workout(
        &self,
        goal_id: Option<&str>,
        activity: ActivityKind,
        workout: &Workout,
    ) -> Result<i64> {
        let db = self.lock()?;
        db.execute(
            "INSERT INTO workouts
                (goal_id, activity, start_time, end_time, duration_secs, distance_m, energy_kcal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                goal_id,
                activity_name(activity),
                workout.start().timestamp_millis(),
                workout.end().timestamp_millis(),
                workout.duration().num_milliseconds() as f64 / 1000.0,
                workout.distance(),
                workout.energy_burned(),
            ],
        )
        .persistence()?;
        let id = db.last_insert_rowid();
        debug!("[GoalStore] Recorded workout {} ({:?})", id, activity);
        Ok(id)
    }

    /// Most recent workouts first.
    pub fn recent_workouts(&self, limit: u32) -> Result<Vec<WorkoutRecord>> {
        let db = self.lock()?;
        let mut stmt = db
            .prepare(
                "SELECT id, goal_id, activity, start_time, end_time,
                        duration_secs, distance_m, energy_kcal
                 FROM workouts ORDER BY start_time DESC, id DESC LIMIT ?1",
            )
            .persistence()?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, f64>(7)?,
                ))
            })
            .persistence()?;

        let mut records = Vec::new();
        for row in rows {
            let (id, goal_id, activity, start, end, duration_secs, distance_m, energy_kcal) =
                row.persistence()?;
            records.push(WorkoutRecord {
                id,
                goal_id,
                activity: parse_activity(&activity)?,
                start: timestamp(start)?,
                end: timestamp(end)?,
                duration_secs,
                distance_m,
                energy_kcal,
            });
        }
        Ok(records)
    }
}

impl GoalStore for SqliteGoalStore {
    fn persist(&self, goal: &Goal) -> Result<()> {
        let mut db = self.lock()?;
        let tx = db.transaction().persistence()?;
        tx.execute("DELETE FROM goal_items", []).persistence()?;
        tx.execute(
            "INSERT OR REPLACE INTO catalog (id, next_page_token, fetched_at) VALUES (1, ?1, ?2)",
            params![goal.next_page_token, Utc::now().timestamp_millis()],
        )
        .persistence()?;
        {
            let mut insert = tx
                .prepare(
                    "INSERT INTO goal_items
                        (position, id, title, description, kind, goal, trophy, points)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .persistence()?;
            for (position, item) in goal.items.iter().enumerate() {
                insert
                    .execute(params![
                        position as i64,
                        item.id,
                        item.title,
                        item.description,
                        item.kind.wire_name(),
                        item.goal,
                        item.reward.map(|r| r.trophy.image_name()),
                        item.reward.map(|r| r.points),
                    ])
                    .persistence()?;
            }
        }
        tx.commit().persistence()?;
        info!("[GoalStore] Persisted {} goals", goal.items.len());
        Ok(())
    }

    fn load_persisted(&self) -> Result<Option<Goal>> {
        let db = self.lock()?;
        let header: Option<Option<String>> = db
            .query_row(
                "SELECT next_page_token FROM catalog WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .persistence()?;
        let Some(next_page_token) = header else {
            return Ok(None);
        };

        let mut stmt = db
            .prepare(
                "SELECT id, title, description, kind, goal, trophy, points
                 FROM goal_items ORDER BY position",
            )
            .persistence()?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<u32>>(6)?,
                ))
            })
            .persistence()?;

        let mut items = Vec::new();
        for row in rows {
            let (id, title, description, kind, goal, trophy, points) = row.persistence()?;
            let reward = match (trophy, points) {
                (Some(trophy), Some(points)) => Some(Reward {
                    trophy: parse_trophy(&trophy)?,
                    points,
                }),
                _ => None,
            };
            items.push(Item {
                id,
                title,
                description,
                kind: parse_goal_type(&kind)?,
                goal,
                reward,
            });
        }
        debug!("[GoalStore] Loaded {} goals", items.len());
        Ok(Some(Goal {
            items,
            next_page_token,
        }))
    }

    fn delete_all(&self) -> Result<()> {
        let db = self.lock()?;
        db.execute_batch("DELETE FROM goal_items; DELETE FROM catalog;")
            .persistence()?;
        info!("[GoalStore] Cleared catalog");
        Ok(())
    }
}

// ============================================================================
// Column encoding
// ============================================================================

fn parse_wire<T: serde::de::DeserializeOwned>(value: &str, column: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|_| {
        GoalTrackError::Persistence {
            message: format!("unknown {} '{}'", column, value),
        }
    })
}

fn parse_goal_type(value: &str) -> Result<GoalType> {
    parse_wire(value, "goal type")
}

fn parse_trophy(value: &str) -> Result<Trophy> {
    parse_wire(value, "trophy")
}

fn parse_activity(value: &str) -> Result<ActivityKind> {
    parse_wire(value, "activity")
}

fn activity_name(activity: ActivityKind) -> &'static str {
    match activity {
        ActivityKind::Walking => "walking",
        ActivityKind::Running => "running",
    }
}

fn timestamp(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| GoalTrackError::Persistence {
            message: format!("invalid timestamp {}", millis),
        })
}

// ============================================================================
// Global Singleton
// ============================================================================

/// Global goal store instance.
///
/// Lets FFI calls share one open database without passing handles across the
/// FFI boundary.
pub static GOAL_STORE: Lazy<Mutex<Option<SqliteGoalStore>>> = Lazy::new(|| Mutex::new(None));

/// Run `f` against the global goal store, if initialized.
pub fn with_goal_store<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&SqliteGoalStore) -> R,
{
    let guard = GOAL_STORE.lock().ok()?;
    guard.as_ref().map(f)
}

// ============================================================================
// FFI Exports for the Goal Store
// ============================================================================

pub mod goal_store_ffi {
    use super::*;
    use crate::ffi_types::FfiGoal;
    use log::warn;

    /// Open the goal store at `db_path`. Call once at app startup.
    #[cfg_attr(feature = "ffi", uniffi::export)]
    pub fn goal_store_init(db_path: String) -> bool {
        crate::init_logging();
        info!("[GoalStore] Initializing with db: {}", db_path);

        match SqliteGoalStore::open(&db_path) {
            Ok(store) => match GOAL_STORE.lock() {
                Ok(mut guard) => {
                    *guard = Some(store);
                    true
                }
                Err(_) => false,
            },
            Err(e) => {
                warn!("[GoalStore] Failed to initialize: {}", e);
                false
            }
        }
    }

    #[cfg_attr(feature = "ffi", uniffi::export)]
    pub fn goal_store_is_initialized() -> bool {
        GOAL_STORE
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Replace the stored catalog with a fetch response body.
    #[cfg_attr(feature = "ffi", uniffi::export)]
    pub fn goal_store_persist_json(json: String) -> bool {
        let goal = match Goal::from_json(&json) {
            Ok(goal) => goal,
            Err(e) => {
                warn!("[GoalStore] Rejected catalog: {}", e);
                return false;
            }
        };
        matches!(with_goal_store(|store| store.persist(&goal)), Some(Ok(())))
    }

    #[cfg_attr(feature = "ffi", uniffi::export)]
    pub fn goal_store_load() -> Option<FfiGoal> {
        with_goal_store(|store| store.load_persisted())
            .and_then(|result| result.ok())
            .flatten()
            .map(FfiGoal::from)
    }

    /// Stored catalog in wire format, for callers that decode it themselves.
    #[cfg_attr(feature = "ffi", uniffi::export)]
    pub fn goal_store_load_json() -> Option<String> {
        with_goal_store(|store| store.load_persisted())
            .and_then(|result| result.ok())
            .flatten()
            .and_then(|goal| goal.to_json().ok())
    }

    #[cfg_attr(feature = "ffi", uniffi::export)]
    pub fn goal_store_clear() -> bool {
        matches!(with_goal_store(|store| store.delete_all()), Some(Ok(())))
    }

}
