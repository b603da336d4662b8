//! Storage Executor
//! Mission: Run blocking SQLite work off the async runtime, bounded by a timeout

pub mod errors;

pub use errors::{classify, StoreError};

use anyhow::{Context, Result};
use rusqlite::{Connection, InterruptHandle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Shared handle to the SQLite database.
///
/// Every call checks out its own connection, so clones can be used from any
/// number of request tasks without callers taking a lock. SQLite's
/// `busy_timeout` arbitrates concurrent writers.
#[derive(Clone, Debug)]
pub struct Database {
    path: Arc<PathBuf>,
    timeout: Duration,
}

impl Database {
    /// Open the database and verify it is reachable.
    ///
    /// Failure here is the only fatal storage condition: it happens at startup.
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Self> {
        let db = Self {
            path: Arc::new(path.as_ref().to_path_buf()),
            timeout,
        };

        let conn = db
            .connect()
            .with_context(|| format!("Failed to open database at {}", db.path.display()))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .context("Database did not answer a ping")?;

        info!(path = %db.path.display(), timeout_ms = timeout.as_millis() as u64, "Database ready");
        Ok(db)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Open a fresh connection with the per-connection pragmas applied.
    ///
    /// The busy wait is kept below the call timeout so a locked database
    /// surfaces as a driver error before the caller gives up.
    pub(crate) fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(self.path.as_path())?;
        conn.busy_timeout(self.timeout / 2)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }

    /// Run `work` on a blocking thread and classify whatever it fails with.
    ///
    /// `op` names the operation in diagnostics. The work runs inside a
    /// transaction. When the call outlives the configured timeout it is
    /// reported as `StoreError::Transient` and its transaction is rolled back,
    /// unless it had already started committing, in which case the caller
    /// waits for the real outcome.
    pub async fn run<T, F>(&self, op: &'static str, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let db = self.clone();
        let phase = Arc::new(AtomicU8::new(PHASE_RUNNING));
        let task_phase = phase.clone();
        let (interrupt_tx, mut interrupt_rx) = oneshot::channel::<InterruptHandle>();

        let mut task = tokio::task::spawn_blocking(move || {
            let conn = db.connect()?;
            let _ = interrupt_tx.send(conn.get_interrupt_handle());

            let tx = conn.unchecked_transaction()?;
            let value = work(&tx)?;
            if task_phase
                .compare_exchange(
                    PHASE_RUNNING,
                    PHASE_COMMITTING,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_err()
            {
                // Caller already reported a timeout; dropping `tx` rolls back
                return Err(interrupted());
            }
            tx.commit()?;
            Ok(value)
        });

        let outcome = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                let abandoned = phase
                    .compare_exchange(
                        PHASE_RUNNING,
                        PHASE_ABANDONED,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok();

                if abandoned {
                    if let Ok(handle) = interrupt_rx.try_recv() {
                        handle.interrupt();
                    }
                    warn!(
                        op,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Storage call timed out"
                    );
                    return Err(StoreError::Transient);
                }

                debug!(op, "Storage call timed out while committing; awaiting outcome");
                task.await
            }
        };

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(classify(op, &err)),
            Err(join_err) => {
                error!(op, error = %join_err, "Storage task aborted");
                Err(StoreError::Unknown)
            }
        }
    }
}

const PHASE_RUNNING: u8 = 0;
const PHASE_COMMITTING: u8 = 1;
const PHASE_ABANDONED: u8 = 2;

fn interrupted() -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
        Some("abandoned after timeout".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_db() -> (Database, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Database::open(temp_file.path(), Duration::from_secs(5)).unwrap();
        (db, temp_file)
    }

    #[tokio::test]
    async fn test_run_returns_value() {
        let (db, _temp) = test_db();

        let value = db
            .run("test.select", |conn| {
                conn.query_row("SELECT 40 + 2", [], |row| row.get::<_, i64>(0))
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_classifies_missing_row() {
        let (db, _temp) = test_db();

        let result = db
            .run("test.missing", |conn| {
                conn.query_row("SELECT 1 WHERE 0", [], |row| row.get::<_, i64>(0))
            })
            .await;

        assert_eq!(result, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled_per_connection() {
        let (db, _temp) = test_db();

        let enabled = db
            .run("test.pragma", |conn| {
                conn.query_row("PRAGMA foreign_keys", [], |row| row.get::<_, i64>(0))
            })
            .await
            .unwrap();

        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_timed_out_write_is_rolled_back() {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Database::open(temp_file.path(), Duration::from_millis(100)).unwrap();
        db.connect()
            .unwrap()
            .execute_batch("CREATE TABLE notes (body TEXT NOT NULL)")
            .unwrap();

        let result = db
            .run("test.slow_insert", |conn| {
                std::thread::sleep(Duration::from_millis(300));
                conn.execute("INSERT INTO notes (body) VALUES ('late')", [])
            })
            .await;
        assert_eq!(result, Err(StoreError::Transient));

        // Give the abandoned blocking task time to finish
        tokio::time::sleep(Duration::from_millis(500)).await;

        let count: i64 = db
            .connect()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_failed_work_is_rolled_back() {
        let (db, _temp) = test_db();
        db.connect()
            .unwrap()
            .execute_batch("CREATE TABLE notes (body TEXT NOT NULL UNIQUE)")
            .unwrap();

        let result = db
            .run("test.partial", |conn| {
                conn.execute("INSERT INTO notes (body) VALUES ('a')", [])?;
                conn.execute("INSERT INTO notes (body) VALUES ('a')", [])
            })
            .await;
        assert_eq!(result, Err(StoreError::ConstraintViolation));

        let count: i64 = db
            .connect()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_fails_for_unreachable_path() {
        let result = Database::open(
            "/nonexistent-dir/definitely/missing.db",
            Duration::from_millis(100),
        );
        assert!(result.is_err());
    }
}
