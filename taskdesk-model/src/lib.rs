//! Shared model definitions for `TaskDesk`: the task entity, form
//! validation, pending change sets, and the audit-stamping commit hook.

pub mod audit;
pub mod change;
pub mod clock;
pub mod form;
pub mod task;

pub use audit::{Actor, AuditStamper, PreCommitHook, SYSTEM_ACTOR};
pub use change::{ChangeSet, PendingChange};
pub use clock::{Clock, SteppingClock, SystemClock};
pub use form::{FieldError, TaskForm, ValidationErrors};
pub use task::{AuditInfo, Task, TaskDetails, TaskId};
