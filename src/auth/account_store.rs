//! Account Storage
//! Mission: Persist accounts in SQLite, unique by name, looked up by credential digest

use crate::auth::models::Account;
use crate::storage::{Database, StoreError};
use anyhow::{Context, Result};
use rusqlite::{params, Row};
use tracing::info;
use uuid::Uuid;

/// Account storage with SQLite backend
pub struct AccountStore {
    db: Database,
}

impl AccountStore {
    /// Create a new account store and initialize its schema
    pub fn new(db: Database) -> Result<Self> {
        let store = Self { db };
        store.init_db()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<()> {
        let conn = self.db.connect().context("Failed to open accounts database")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create accounts table")?;

        Ok(())
    }

    /// List every account (no pagination)
    pub async fn list_all(&self) -> Result<Vec<Account>, StoreError> {
        self.db
            .run("accounts.list_all", |conn| {
                let mut stmt =
                    conn.prepare("SELECT id, name, password_hash FROM accounts ORDER BY name")?;
                let accounts = stmt
                    .query_map([], account_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(accounts)
            })
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Account, StoreError> {
        let id = id.to_string();
        self.db
            .run("accounts.get_by_id", move |conn| {
                conn.query_row(
                    "SELECT id, name, password_hash FROM accounts WHERE id = ?1",
                    params![id],
                    account_from_row,
                )
            })
            .await
    }

    /// Look up the account whose name and password digest both match exactly
    pub async fn get_by_credential(
        &self,
        name: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError> {
        let name = name.to_string();
        let password_hash = password_hash.to_string();
        self.db
            .run("accounts.get_by_credential", move |conn| {
                conn.query_row(
                    "SELECT id, name, password_hash FROM accounts
                     WHERE name = ?1 AND password_hash = ?2",
                    params![name, password_hash],
                    account_from_row,
                )
            })
            .await
    }

    /// Create an account with a server-assigned id
    pub async fn create(&self, name: &str, password_hash: &str) -> Result<Account, StoreError> {
        let account = Account {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
        };

        let row = account.clone();
        self.db
            .run("accounts.create", move |conn| {
                conn.execute(
                    "INSERT INTO accounts (id, name, password_hash) VALUES (?1, ?2, ?3)",
                    params![row.id, row.name, row.password_hash],
                )
            })
            .await?;

        info!(account_id = %account.id, name = %account.name, "Created account");
        Ok(account)
    }

    /// Rename the account matching `account.id`
    pub async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let id = account.id.clone();
        let name = account.name.clone();
        self.db
            .run("accounts.update", move |conn| {
                let rows = conn.execute(
                    "UPDATE accounts SET name = ?1 WHERE id = ?2",
                    params![name, id],
                )?;
                affected_one(rows)
            })
            .await
    }

    /// Delete an account by id; an absent id is `NotFound`.
    ///
    /// Tasks owned by the account go with it (`ON DELETE CASCADE`).
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let account_id = id.to_string();
        self.db
            .run("accounts.delete", move |conn| {
                let rows = conn.execute("DELETE FROM accounts WHERE id = ?1", params![account_id])?;
                affected_one(rows)
            })
            .await?;

        info!(account_id = %id, "Deleted account");
        Ok(())
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

/// Zero affected rows means the keyed row was not there.
pub(crate) fn affected_one(rows: usize) -> rusqlite::Result<()> {
    if rows == 0 {
        Err(rusqlite::Error::QueryReturnedNoRows)
    } else {
        Ok(())
    }
}
