//! SQLite-backed task store.
//!
//! [`TaskStore`] is the persistence boundary. Reads go straight to the
//! pool. Every write goes through [`TaskStore::commit`], which hands the
//! pending [`ChangeSet`] to the configured [`PreCommitHook`] and then applies
//! all entries inside a single transaction.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     title TEXT NOT NULL CHECK (length(title) <= 100),
//!     description TEXT NOT NULL CHECK (length(description) <= 500),
//!     due_date TEXT NOT NULL,
//!     status TEXT NOT NULL,
//!     remarks TEXT,
//!     created_on TEXT NOT NULL,
//!     last_updated_on TEXT NOT NULL,
//!     created_by TEXT NOT NULL,
//!     last_updated_by TEXT NOT NULL
//! );
//! ```

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use taskdesk_model::{
    Actor, AuditInfo, ChangeSet, PendingChange, PreCommitHook, Task, TaskDetails, TaskId,
};

/// Errors surfaced by the task store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database rejected or failed an operation.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An update or delete matched no row.
    #[error("task {0} not found")]
    Missing(TaskId),
}

/// Result of a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Ids assigned to `Added` entries, in change-set order.
    pub inserted: Vec<TaskId>,
    /// Total rows written.
    pub rows_affected: u64,
}

const SELECT_COLUMNS: &str = "SELECT id, title, description, due_date, status, remarks, \
     created_on, last_updated_on, created_by, last_updated_by FROM tasks";

/// Task table access with a pre-commit hook on every write.
#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
    hook: Arc<dyn PreCommitHook>,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl TaskStore {
    /// Connects to `url`, creating the database file and table if missing.
    ///
    /// `sqlite::memory:` is pinned to one connection that never expires so
    /// the database lives as long as the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the URL is invalid, the database
    /// cannot be opened, or the schema cannot be created.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        hook: Arc<dyn PreCommitHook>,
    ) -> Result<Self, StoreError> {
        let is_memory = url.contains(":memory:") || url.contains("mode=memory");
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool_options = if is_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };
        let pool = pool_options.connect_with(options).await?;

        let store = Self { pool, hook };
        store.migrate().await?;
        tracing::info!(url = %url, "task store ready");
        Ok(store)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if SQLite cannot be initialised.
    pub async fn in_memory(hook: Arc<dyn PreCommitHook>) -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:", 1, hook).await
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL CHECK (length(title) <= 100),
                description TEXT NOT NULL CHECK (length(description) <= 500),
                due_date TEXT NOT NULL,
                status TEXT NOT NULL,
                remarks TEXT,
                created_on TEXT NOT NULL,
                last_updated_on TEXT NOT NULL,
                created_by TEXT NOT NULL,
                last_updated_by TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Lists tasks in ascending id order.
    ///
    /// A non-empty `search` keeps only tasks whose title contains it as a
    /// case-sensitive substring. `None` and `""` return everything.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Task>, StoreError> {
        let rows = match search.filter(|s| !s.is_empty()) {
            Some(term) => {
                sqlx::query(&format!(
                    "{SELECT_COLUMNS} WHERE instr(title, ?1) > 0 ORDER BY id"
                ))
                .bind(term)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY id"))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter()
            .map(row_to_task)
            .collect::<Result<_, _>>()
            .map_err(StoreError::from)
    }

    /// Looks up one task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the query fails.
    pub async fn find(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_task).transpose().map_err(StoreError::from)
    }

    /// Runs the pre-commit hook over `changes`, then writes them in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] if a `Modified` or `Deleted` entry
    /// matches no row, or [`StoreError::Database`] for any database failure.
    /// Nothing is written in either case.
    pub async fn commit(
        &self,
        mut changes: ChangeSet,
        actor: &Actor,
    ) -> Result<CommitOutcome, StoreError> {
        if changes.is_empty() {
            return Ok(CommitOutcome::default());
        }
        self.hook.before_commit(changes.as_mut_slice(), actor);

        let mut outcome = CommitOutcome::default();
        let mut tx = self.pool.begin().await?;

        for change in changes {
            tracing::trace!(kind = change.kind(), actor = %actor, "applying change");
            match change {
                PendingChange::Added { details, audit } => {
                    if !audit.is_stamped() {
                        tracing::warn!(title = %details.title, "inserting task without audit stamp");
                    }
                    let result = sqlx::query(
                        "INSERT INTO tasks (title, description, due_date, status, remarks, \
                         created_on, last_updated_on, created_by, last_updated_by) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    )
                    .bind(&details.title)
                    .bind(&details.description)
                    .bind(details.due_date)
                    .bind(&details.status)
                    .bind(&details.remarks)
                    .bind(audit.created_on)
                    .bind(audit.last_updated_on)
                    .bind(&audit.created_by)
                    .bind(&audit.last_updated_by)
                    .execute(&mut *tx)
                    .await?;
                    let id = TaskId::new(result.last_insert_rowid());
                    tracing::debug!(task_id = %id, actor = %actor, "task inserted");
                    outcome.inserted.push(id);
                    outcome.rows_affected += result.rows_affected();
                }
                PendingChange::Modified(task) => {
                    let result = sqlx::query(
                        "UPDATE tasks SET title = ?1, description = ?2, due_date = ?3, \
                         status = ?4, remarks = ?5, last_updated_on = ?6, last_updated_by = ?7 \
                         WHERE id = ?8",
                    )
                    .bind(&task.details.title)
                    .bind(&task.details.description)
                    .bind(task.details.due_date)
                    .bind(&task.details.status)
                    .bind(&task.details.remarks)
                    .bind(task.audit.last_updated_on)
                    .bind(&task.audit.last_updated_by)
                    .bind(task.id.get())
                    .execute(&mut *tx)
                    .await?;
                    if result.rows_affected() == 0 {
                        return Err(StoreError::Missing(task.id));
                    }
                    tracing::debug!(task_id = %task.id, actor = %actor, "task updated");
                    outcome.rows_affected += result.rows_affected();
                }
                PendingChange::Deleted(id) => {
                    let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
                        .bind(id.get())
                        .execute(&mut *tx)
                        .await?;
                    if result.rows_affected() == 0 {
                        return Err(StoreError::Missing(id));
                    }
                    tracing::debug!(task_id = %id, actor = %actor, "task deleted");
                    outcome.rows_affected += result.rows_affected();
                }
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }
}

fn row_to_task(row: &SqliteRow) -> Result<Task, sqlx::Error> {
    Ok(Task {
        id: TaskId::new(row.try_get("id")?),
        details: TaskDetails {
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            due_date: row.try_get("due_date")?,
            status: row.try_get("status")?,
            remarks: row.try_get("remarks")?,
        },
        audit: AuditInfo {
            created_on: row.try_get("created_on")?,
            last_updated_on: row.try_get("last_updated_on")?,
            created_by: row.try_get("created_by")?,
            last_updated_by: row.try_get("last_updated_by")?,
        },
    })
}
