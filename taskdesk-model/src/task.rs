//! The task entity.
//!
//! A [`Task`] is split into the caller-writable [`TaskDetails`] and the
//! hook-owned [`AuditInfo`]. Actions only ever construct or replace
//! details; audit fields are written exclusively by a
//! [`PreCommitHook`](crate::audit::PreCommitHook) right before a commit.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum allowed task description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Store-assigned task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw row id.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw row id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

/// The five business fields a caller may set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetails {
    /// Short title, at most [`MAX_TITLE_LENGTH`] characters.
    pub title: String,
    /// Description, at most [`MAX_DESCRIPTION_LENGTH`] characters.
    pub description: String,
    /// When the task is due.
    pub due_date: NaiveDateTime,
    /// Free-form status text.
    pub status: String,
    /// Optional remarks.
    pub remarks: Option<String>,
}

/// Provenance metadata stamped on every insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    /// Set once when the row is inserted.
    pub created_on: DateTime<Utc>,
    /// Refreshed on every modification.
    pub last_updated_on: DateTime<Utc>,
    /// Name of the actor that inserted the row.
    pub created_by: String,
    /// Name of the actor that last modified the row.
    pub last_updated_by: String,
}

impl AuditInfo {
    /// Audit info for an entity that has not been through a commit yet.
    #[must_use]
    pub const fn unstamped() -> Self {
        Self {
            created_on: DateTime::<Utc>::UNIX_EPOCH,
            last_updated_on: DateTime::<Utc>::UNIX_EPOCH,
            created_by: String::new(),
            last_updated_by: String::new(),
        }
    }

    /// Returns `true` once an insert has been stamped.
    #[must_use]
    pub fn is_stamped(&self) -> bool {
        !self.created_by.is_empty()
    }
}

impl Default for AuditInfo {
    fn default() -> Self {
        Self::unstamped()
    }
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Row identifier.
    pub id: TaskId,
    /// Caller-writable fields.
    pub details: TaskDetails,
    /// Hook-owned audit fields.
    pub audit: AuditInfo,
}

impl Task {
    /// Replaces the caller-writable fields, leaving id and audit untouched.
    pub fn apply_details(&mut self, details: TaskDetails) {
        self.details = details;
    }
}
