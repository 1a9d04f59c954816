//! Audit stamping run immediately before every commit.
//!
//! The store calls a [`PreCommitHook`] with the full pending change set and
//! the acting [`Actor`] before it writes anything. [`AuditStamper`] is the
//! hook that fills in provenance:
//!
//! - `Added`: created-on, last-updated-on, created-by and last-updated-by
//!   all take the same clock reading and actor name.
//! - `Modified`: only last-updated-on and last-updated-by are refreshed.
//! - `Deleted`: untouched.

use std::sync::Arc;

use crate::change::PendingChange;
use crate::clock::{Clock, SystemClock};

/// Name recorded when no authenticated user is present.
pub const SYSTEM_ACTOR: &str = "System";

/// Identity a write is attributed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Actor {
    /// An authenticated user.
    User(String),
    /// No authenticated user.
    #[default]
    System,
}

impl Actor {
    /// Resolves an optional user name; absent or blank names become
    /// [`Actor::System`].
    #[must_use]
    pub fn from_user_name(name: Option<&str>) -> Self {
        match name {
            Some(n) if !n.trim().is_empty() => Self::User(n.to_string()),
            _ => Self::System,
        }
    }

    /// Name written into audit fields.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::User(name) => name,
            Self::System => SYSTEM_ACTOR,
        }
    }

    /// Returns `true` for an authenticated user.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Hook invoked by the store on the pending change set before any write.
pub trait PreCommitHook: Send + Sync {
    /// Mutates pending changes in place.
    fn before_commit(&self, changes: &mut [PendingChange], actor: &Actor);
}

/// Stamps audit fields on inserted and modified tasks.
#[derive(Clone)]
pub struct AuditStamper {
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuditStamper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditStamper").finish_non_exhaustive()
    }
}

impl Default for AuditStamper {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl AuditStamper {
    /// Creates a stamper reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl PreCommitHook for AuditStamper {
    fn before_commit(&self, changes: &mut [PendingChange], actor: &Actor) {
        // One reading per commit so created-on and last-updated-on agree.
        let now = self.clock.now();
        let name = actor.name();

        for change in changes.iter_mut() {
            match change {
                PendingChange::Added { audit, .. } => {
                    audit.created_on = now;
                    audit.last_updated_on = now;
                    audit.created_by = name.to_string();
                    audit.last_updated_by = name.to_string();
                }
                PendingChange::Modified(task) => {
                    task.audit.last_updated_on = now;
                    task.audit.last_updated_by = name.to_string();
                }
                PendingChange::Deleted(_) => {}
            }
        }

        tracing::trace!(actor = %actor, count = changes.len(), at = %now, "audit fields stamped");
    }
}
