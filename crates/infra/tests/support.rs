use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::OnceCell;
use shiftfence_domain::{ClockActionKind, ClockPayload, Coordinate, PendingClockAction};
use shiftfence_infra::database::DbManager;
use tempfile::TempDir;

static TRACING: OnceCell<()> = OnceCell::new();

/// Install a test subscriber once so `RUST_LOG`-filtered worker output is
/// visible when a test fails.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the full schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("migrations should run");

        Self { manager: Arc::new(manager), temp_dir }
    }

    /// Open a second manager against the same database file, simulating a
    /// process restart.
    pub fn reopen(&self) -> Arc<DbManager> {
        let manager = DbManager::new(self.manager.path(), 4).expect("db manager should reopen");
        manager.run_migrations().expect("migrations should be idempotent");
        Arc::new(manager)
    }

    /// Directory holding the database file.
    pub fn path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn coordinate(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).expect("valid coordinate")
}

pub fn pending_action(kind: ClockActionKind, note: &str) -> PendingClockAction {
    pending_action_at(kind, note, Utc::now())
}

pub fn pending_action_at(
    kind: ClockActionKind,
    note: &str,
    created_at: chrono::DateTime<Utc>,
) -> PendingClockAction {
    let payload =
        ClockPayload { coordinate: coordinate(18.4777, 73.8037), note: Some(note.to_string()) };
    PendingClockAction::new(kind, payload, created_at)
}
