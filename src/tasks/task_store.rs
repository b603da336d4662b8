//! Task Storage
//! Mission: Persist tasks with the owner filter inside every statement

use crate::auth::account_store::affected_one;
use crate::storage::{Database, StoreError};
use crate::tasks::models::Task;
use anyhow::{Context, Result};
use rusqlite::{params, Row};
use tracing::info;
use uuid::Uuid;

/// Task storage with SQLite backend.
///
/// A row whose owner differs from the caller is indistinguishable from a row
/// that does not exist: both surface as `StoreError::NotFound`.
pub struct TaskStore {
    db: Database,
}

impl TaskStore {
    /// Create a new task store and initialize its schema
    pub fn new(db: Database) -> Result<Self> {
        let store = Self { db };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.db.connect().context("Failed to open tasks database")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES accounts(id) ON DELETE CASCADE
            )",
            [],
        )
        .context("Failed to create tasks table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id)",
            [],
        )
        .context("Failed to create tasks owner index")?;

        Ok(())
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Task>, StoreError> {
        let owner_id = owner_id.to_string();
        self.db
            .run("tasks.list_by_owner", move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title, owner_id FROM tasks WHERE owner_id = ?1 ORDER BY rowid",
                )?;
                let tasks = stmt
                    .query_map(params![owner_id], task_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(tasks)
            })
            .await
    }

    pub async fn get_by_id(&self, id: &str, owner_id: &str) -> Result<Task, StoreError> {
        let id = id.to_string();
        let owner_id = owner_id.to_string();
        self.db
            .run("tasks.get_by_id", move |conn| {
                conn.query_row(
                    "SELECT id, title, owner_id FROM tasks WHERE id = ?1 AND owner_id = ?2",
                    params![id, owner_id],
                    task_from_row,
                )
            })
            .await
    }

    /// Create a task with a server-assigned id
    pub async fn create(&self, title: &str, owner_id: &str) -> Result<Task, StoreError> {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            owner_id: owner_id.to_string(),
        };

        let row = task.clone();
        self.db
            .run("tasks.create", move |conn| {
                conn.execute(
                    "INSERT INTO tasks (id, title, owner_id) VALUES (?1, ?2, ?3)",
                    params![row.id, row.title, row.owner_id],
                )
            })
            .await?;

        info!(task_id = %task.id, owner_id = %task.owner_id, "✅ Created task");
        Ok(task)
    }

    /// Retitle `task.id`, but only where it belongs to `task.owner_id`.
    ///
    /// Compare and mutate happen in one statement; zero affected rows is the
    /// only failure signal.
    pub async fn update(&self, task: &Task) -> Result<(), StoreError> {
        let task = task.clone();
        self.db
            .run("tasks.update", move |conn| {
                let rows = conn.execute(
                    "UPDATE tasks SET title = ?1 WHERE id = ?2 AND owner_id = ?3",
                    params![task.title, task.id, task.owner_id],
                )?;
                affected_one(rows)
            })
            .await
    }

    pub async fn delete(&self, id: &str, owner_id: &str) -> Result<(), StoreError> {
        let task_id = id.to_string();
        let owner = owner_id.to_string();
        self.db
            .run("tasks.delete", move |conn| {
                let rows = conn.execute(
                    "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
                    params![task_id, owner],
                )?;
                affected_one(rows)
            })
            .await?;

        info!(task_id = %id, owner_id = %owner_id, "🗑️  Deleted task");
        Ok(())
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        owner_id: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::account_store::AccountStore;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    struct Fixture {
        tasks: TaskStore,
        accounts: AccountStore,
        _temp: NamedTempFile,
    }

    fn create_fixture() -> Fixture {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Database::open(temp_file.path(), Duration::from_secs(5)).unwrap();
        Fixture {
            accounts: AccountStore::new(db.clone()).unwrap(),
            tasks: TaskStore::new(db).unwrap(),
            _temp: temp_file,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_by_owner() {
        let f = create_fixture();
        let alice = f.accounts.create("alice", "h").await.unwrap();
        let bob = f.accounts.create("bob", "h").await.unwrap();

        let milk = f.tasks.create("buy milk", &alice.id).await.unwrap();
        f.tasks.create("walk dog", &bob.id).await.unwrap();

        assert_eq!(milk.owner_id, alice.id);
        assert_eq!(f.tasks.list_by_owner(&alice.id).await.unwrap(), vec![milk]);

        let bobs = f.tasks.list_by_owner(&bob.id).await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].title, "walk dog");
    }

    #[tokio::test]
    async fn test_other_owner_cannot_read() {
        let f = create_fixture();
        let alice = f.accounts.create("alice", "h").await.unwrap();
        let bob = f.accounts.create("bob", "h").await.unwrap();
        let task = f.tasks.create("buy milk", &alice.id).await.unwrap();

        assert_eq!(
            f.tasks.get_by_id(&task.id, &alice.id).await.unwrap(),
            task
        );

        // Someone else's row and a missing row look the same
        let foreign = f.tasks.get_by_id(&task.id, &bob.id).await;
        let missing = f.tasks.get_by_id("no-such-task", &bob.id).await;
        assert_eq!(foreign, Err(StoreError::NotFound));
        assert_eq!(foreign, missing);
    }

    #[tokio::test]
    async fn test_other_owner_cannot_update() {
        let f = create_fixture();
        let alice = f.accounts.create("alice", "h").await.unwrap();
        let bob = f.accounts.create("bob", "h").await.unwrap();
        let task = f.tasks.create("buy milk", &alice.id).await.unwrap();

        let hijack = Task {
            title: "pwned".to_string(),
            owner_id: bob.id.clone(),
            ..task.clone()
        };
        assert_eq!(f.tasks.update(&hijack).await, Err(StoreError::NotFound));

        let unchanged = f.tasks.get_by_id(&task.id, &alice.id).await.unwrap();
        assert_eq!(unchanged.title, "buy milk");
        assert_eq!(unchanged.owner_id, alice.id);
    }

    #[tokio::test]
    async fn test_owner_updates_title() {
        let f = create_fixture();
        let alice = f.accounts.create("alice", "h").await.unwrap();
        let task = f.tasks.create("buy milk", &alice.id).await.unwrap();

        let renamed = Task {
            title: "buy oat milk".to_string(),
            ..task.clone()
        };
        f.tasks.update(&renamed).await.unwrap();

        assert_eq!(
            f.tasks.get_by_id(&task.id, &alice.id).await.unwrap().title,
            "buy oat milk"
        );
    }

    #[tokio::test]
    async fn test_other_owner_cannot_delete() {
        let f = create_fixture();
        let alice = f.accounts.create("alice", "h").await.unwrap();
        let bob = f.accounts.create("bob", "h").await.unwrap();
        let task = f.tasks.create("buy milk", &alice.id).await.unwrap();

        assert_eq!(
            f.tasks.delete(&task.id, &bob.id).await,
            Err(StoreError::NotFound)
        );
        assert!(f.tasks.get_by_id(&task.id, &alice.id).await.is_ok());

        f.tasks.delete(&task.id, &alice.id).await.unwrap();
        assert_eq!(
            f.tasks.delete(&task.id, &alice.id).await,
            Err(StoreError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_unknown_owner_rejected_by_foreign_key() {
        let f = create_fixture();
        assert_eq!(
            f.tasks.create("orphan", "no-such-account").await,
            Err(StoreError::ConstraintViolation)
        );
    }

    #[tokio::test]
    async fn test_deleting_account_removes_its_tasks() {
        let f = create_fixture();
        let alice = f.accounts.create("alice", "h").await.unwrap();
        f.tasks.create("buy milk", &alice.id).await.unwrap();

        f.accounts.delete(&alice.id).await.unwrap();
        assert!(f.tasks.list_by_owner(&alice.id).await.unwrap().is_empty());
    }
}
