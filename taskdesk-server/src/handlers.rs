//! Task actions: list/search, details, create, edit, and delete.
//!
//! Each handler is stateless per request. Writes build a [`ChangeSet`] and
//! pass the acting user to [`TaskStore::commit`](crate::store::TaskStore::commit)
//! explicitly; audit fields are never set here.

use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use taskdesk_model::{ChangeSet, TaskForm, TaskId, ValidationErrors};

use crate::error::AppError;
use crate::server::AppState;
use crate::session::CurrentActor;
use crate::views::{self, FormMode};

/// Where successful writes redirect to.
pub const TASK_LIST: &str = "/Tasks/Index";

/// Query string of the list page.
#[derive(Debug, Default, serde::Deserialize)]
pub struct IndexQuery {
    /// Optional title filter.
    #[serde(default)]
    pub search: Option<String>,
}

fn parse_id(raw: &str) -> Result<TaskId, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// Names of the fields that failed validation, first occurrence only.
fn invalid_fields(errors: &ValidationErrors) -> Vec<&'static str> {
    let mut fields: Vec<&'static str> = Vec::new();
    for error in errors.iter() {
        if !fields.contains(&error.field) {
            fields.push(error.field);
        }
    }
    fields
}

/// `GET /Tasks/Index?search=`
pub async fn index(
    State(state): State<Arc<AppState>>,
    current: CurrentActor,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, AppError> {
    let search = query.search.as_deref().filter(|s| !s.is_empty());
    let tasks = state.store.list(search).await?;
    tracing::debug!(search = ?search, count = tasks.len(), "listed tasks");
    Ok(Html(views::task_list(&tasks, search, &current.actor)))
}

/// `GET /Tasks/Details/{id}`
pub async fn details(
    State(state): State<Arc<AppState>>,
    current: CurrentActor,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&raw_id)?;
    let Some(task) = state.store.find(id).await? else {
        tracing::debug!(task_id = %id, "details: no such task");
        return Err(AppError::NotFound);
    };
    Ok(Html(views::task_details(&task, &current.actor)))
}

/// `GET /Tasks/Details` without an id.
pub async fn missing_id() -> AppError {
    AppError::NotFound
}

/// `GET /Tasks/Create`
pub async fn create_form(current: CurrentActor) -> Html<String> {
    Html(views::task_form(
        FormMode::Create,
        &TaskForm::default(),
        None,
        &current.actor,
    ))
}

/// `POST /Tasks/Create`
pub async fn create(
    State(state): State<Arc<AppState>>,
    current: CurrentActor,
    Form(form): Form<TaskForm>,
) -> Result<Response, AppError> {
    let details = match form.validate() {
        Ok(details) => details,
        Err(errors) => {
            tracing::debug!(fields = ?invalid_fields(&errors), "create rejected by validation");
            return Ok(Html(views::task_form(
                FormMode::Create,
                &form,
                Some(&errors),
                &current.actor,
            ))
            .into_response());
        }
    };

    let mut changes = ChangeSet::new();
    changes.add(details);
    let outcome = state.store.commit(changes, &current.actor).await?;
    if let Some(id) = outcome.inserted.first() {
        tracing::info!(task_id = %id, actor = %current.actor, "task created");
    }
    Ok(Redirect::to(TASK_LIST).into_response())
}

/// `GET /Tasks/Edit/{id}`
pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    current: CurrentActor,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&raw_id)?;
    let task = state.store.find(id).await?.ok_or(AppError::NotFound)?;
    Ok(Html(views::task_form(
        FormMode::Edit(id),
        &TaskForm::from_task(&task),
        None,
        &current.actor,
    )))
}

/// `POST /Tasks/Edit/{id}`
///
/// The id in the path must match the id posted in the form. Only the five
/// detail fields are copied onto the stored row.
pub async fn edit(
    State(state): State<Arc<AppState>>,
    current: CurrentActor,
    Path(raw_id): Path<String>,
    Form(form): Form<TaskForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id)?;
    if form.task_id() != Some(id) {
        tracing::debug!(task_id = %id, posted = %form.id, "edit: id mismatch");
        return Err(AppError::NotFound);
    }

    let details = match form.validate() {
        Ok(details) => details,
        Err(errors) => {
            tracing::debug!(task_id = %id, fields = ?invalid_fields(&errors), "edit rejected by validation");
            return Ok(Html(views::task_form(
                FormMode::Edit(id),
                &form,
                Some(&errors),
                &current.actor,
            ))
            .into_response());
        }
    };

    let Some(mut task) = state.store.find(id).await? else {
        tracing::debug!(task_id = %id, "edit: no such task");
        return Err(AppError::NotFound);
    };
    task.apply_details(details);

    let mut changes = ChangeSet::new();
    changes.modify(task);
    state.store.commit(changes, &current.actor).await?;
    tracing::info!(task_id = %id, actor = %current.actor, "task updated");
    Ok(Redirect::to(TASK_LIST).into_response())
}

/// `GET /Tasks/Delete/{id}`
///
/// Unknown ids are reported as not found instead of reaching the store.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    current: CurrentActor,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id)?;
    if state.store.find(id).await?.is_none() {
        tracing::debug!(task_id = %id, "delete: no such task");
        return Err(AppError::NotFound);
    }

    let mut changes = ChangeSet::new();
    changes.delete(id);
    state.store.commit(changes, &current.actor).await?;
    tracing::info!(task_id = %id, actor = %current.actor, "task deleted");
    Ok(Redirect::to(TASK_LIST).into_response())
}
