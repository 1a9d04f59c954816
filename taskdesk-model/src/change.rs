//! Pending change sets.
//!
//! A [`ChangeSet`] is the explicit unit of work handed to a store commit.
//! It replaces implicit change tracking: each entry states whether it is an
//! insert, an update, or a delete, and the commit hook and the store act on
//! exactly those entries.

use crate::task::{AuditInfo, Task, TaskDetails, TaskId};

/// One pending write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    /// A new row. The id is assigned by the store on insert.
    Added {
        /// Caller-supplied fields.
        details: TaskDetails,
        /// Audit fields, filled in by the commit hook.
        audit: AuditInfo,
    },
    /// An existing row whose details were replaced.
    Modified(Task),
    /// An existing row to remove.
    Deleted(TaskId),
}

impl PendingChange {
    /// Short label for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Modified(_) => "modified",
            Self::Deleted(_) => "deleted",
        }
    }
}

/// Ordered list of pending writes committed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<PendingChange>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Queues an insert.
    pub fn add(&mut self, details: TaskDetails) -> &mut Self {
        self.changes.push(PendingChange::Added {
            details,
            audit: AuditInfo::unstamped(),
        });
        self
    }

    /// Queues an update of an existing task.
    pub fn modify(&mut self, task: Task) -> &mut Self {
        self.changes.push(PendingChange::Modified(task));
        self
    }

    /// Queues a delete.
    pub fn delete(&mut self, id: TaskId) -> &mut Self {
        self.changes.push(PendingChange::Deleted(id));
        self
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of queued writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Iterates over queued writes in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PendingChange> {
        self.changes.iter()
    }

    /// Mutable view handed to a commit hook.
    pub fn as_mut_slice(&mut self) -> &mut [PendingChange] {
        &mut self.changes
    }
}

impl IntoIterator for ChangeSet {
    type Item = PendingChange;
    type IntoIter = std::vec::IntoIter<PendingChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
