//! Task form input and validation.
//!
//! [`TaskForm`] mirrors the posted form body field by field as raw strings,
//! so that a failed submission can be re-rendered exactly as the user typed
//! it. [`TaskForm::validate`] turns it into [`TaskDetails`] or reports every
//! failing field.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::task::{MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, Task, TaskDetails, TaskId};

/// Datetime formats accepted for the due date, tried in order.
const DUE_DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Format used when pre-filling a `datetime-local` input. Seconds are kept
/// so that re-posting an unchanged form stores the same due date.
const DUE_DATE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Raw task form as posted by the browser.
///
/// Every field defaults to empty so that a missing field shows up as a
/// validation error instead of a body rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskForm {
    /// Hidden id field carried by the edit form.
    pub id: String,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Due date, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM[:SS]`.
    pub due_date: String,
    /// Task status.
    pub status: String,
    /// Optional remarks.
    pub remarks: String,
}

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form field name the message belongs to.
    pub field: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// All validation failures for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Returns `true` if no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over all messages.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Messages recorded for one field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Returns `true` if the given field has at least one message.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn push(&mut self, field: &'static str, message: String) {
        self.0.push(FieldError { field, message });
    }
}

impl TaskForm {
    /// Builds a form pre-filled from a stored task.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.details.title.clone(),
            description: task.details.description.clone(),
            due_date: task
                .details
                .due_date
                .format(DUE_DATE_INPUT_FORMAT)
                .to_string(),
            status: task.details.status.clone(),
            remarks: task.details.remarks.clone().unwrap_or_default(),
        }
    }

    /// Parses the hidden id field, if present and numeric.
    #[must_use]
    pub fn task_id(&self) -> Option<TaskId> {
        self.id.parse().ok()
    }

    /// Validates the form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing every field that is missing,
    /// too long, or unparseable.
    pub fn validate(&self) -> Result<TaskDetails, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_text(&mut errors, "title", "Title", &self.title, Some(MAX_TITLE_LENGTH));
        check_text(
            &mut errors,
            "description",
            "Description",
            &self.description,
            Some(MAX_DESCRIPTION_LENGTH),
        );
        check_text(&mut errors, "status", "Status", &self.status, None);

        let due_date = if is_blank(&self.due_date) {
            errors.push("due_date", required_message("Due Date"));
            None
        } else {
            let parsed = parse_due_date(&self.due_date);
            if parsed.is_none() {
                errors.push(
                    "due_date",
                    format!("The value '{}' is not valid for Due Date.", self.due_date),
                );
            }
            parsed
        };

        match due_date {
            Some(due_date) if errors.is_empty() => Ok(TaskDetails {
                title: self.title.clone(),
                description: self.description.clone(),
                due_date,
                status: self.status.clone(),
                remarks: (!is_blank(&self.remarks)).then(|| self.remarks.clone()),
            }),
            _ => Err(errors),
        }
    }
}

/// Parses a due date in any of the accepted formats.
///
/// A bare date is taken to mean midnight.
#[must_use]
pub fn parse_due_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DUE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn required_message(label: &str) -> String {
    format!("The {label} field is required.")
}

fn check_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
    max_len: Option<usize>,
) {
    if is_blank(value) {
        errors.push(field, required_message(label));
        return;
    }
    if let Some(max) = max_len
        && value.chars().count() > max
    {
        errors.push(
            field,
            format!("The field {label} must be a string with a maximum length of {max}."),
        );
    }
}
