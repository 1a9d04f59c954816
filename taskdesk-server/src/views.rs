//! Server-rendered HTML pages.
//!
//! Every page is built from plain strings; all user-controlled text passes
//! through [`escape`] before it is interpolated.

use std::fmt::Write as _;

use taskdesk_model::{Actor, Task, TaskForm, TaskId, ValidationErrors};

const DUE_DATE_DISPLAY: &str = "%Y-%m-%d %H:%M";
const AUDIT_DISPLAY: &str = "%Y-%m-%d %H:%M:%S UTC";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem auto;max-width:60rem}\
table{border-collapse:collapse;width:100%}td,th{border-bottom:1px solid #ddd;padding:.4rem;text-align:left}\
label{display:block;margin-top:.8rem}.field-error{color:#b00020}nav a,nav form{margin-right:1rem;display:inline}";

/// Which task form is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// `POST /Tasks/Create`.
    Create,
    /// `POST /Tasks/Edit/{id}`.
    Edit(TaskId),
}

/// Escapes text for HTML element content and double-quoted attributes.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, nav: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} - TaskDesk</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <nav>{nav}</nav>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        escape(title)
    )
}

fn nav(actor: &Actor) -> String {
    let mut nav = String::from(
        "<a href=\"/Tasks/Index\">Tasks</a><a href=\"/Tasks/Create\">New task</a>",
    );
    if actor.is_authenticated() {
        let _ = write!(
            nav,
            "<span>Signed in as {}</span> \
             <form method=\"post\" action=\"/Tasks/Logout\"><button type=\"submit\">Log out</button></form>",
            escape(actor.name())
        );
    } else {
        nav.push_str("<a href=\"/Account/Login\">Sign in</a>");
    }
    nav
}

fn layout(title: &str, actor: &Actor, body: &str) -> String {
    page(title, &nav(actor), body)
}

/// The task list with its search box.
#[must_use]
pub fn task_list(tasks: &[Task], search: Option<&str>, actor: &Actor) -> String {
    let search = search.unwrap_or_default();
    let mut body = format!(
        "<h1>Tasks</h1>\n<form method=\"get\" action=\"/Tasks/Index\">\
         <input type=\"text\" name=\"search\" value=\"{}\" placeholder=\"Search titles\">\
         <button type=\"submit\">Search</button></form>\n",
        escape(search)
    );

    if tasks.is_empty() {
        body.push_str("<p>No tasks found.</p>\n");
        return layout("Tasks", actor, &body);
    }

    body.push_str(
        "<table>\n<thead><tr><th>Title</th><th>Due</th><th>Status</th><th>Last updated</th><th></th></tr></thead>\n<tbody>\n",
    );
    for task in tasks {
        let id = task.id;
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{} by {}</td>\
             <td><a href=\"/Tasks/Details/{id}\">Details</a> \
             <a href=\"/Tasks/Edit/{id}\">Edit</a> \
             <a href=\"/Tasks/Delete/{id}\">Delete</a></td></tr>",
            escape(&task.details.title),
            task.details.due_date.format(DUE_DATE_DISPLAY),
            escape(&task.details.status),
            task.audit.last_updated_on.format(AUDIT_DISPLAY),
            escape(&task.audit.last_updated_by),
        );
    }
    body.push_str("</tbody>\n</table>\n");
    if !search.is_empty() {
        let _ = writeln!(
            body,
            "<p>{} result(s) for &quot;{}&quot;. <a href=\"/Tasks/Index\">Clear</a></p>",
            tasks.len(),
            escape(search)
        );
    }
    layout("Tasks", actor, &body)
}

/// One task with its audit trail.
#[must_use]
pub fn task_details(task: &Task, actor: &Actor) -> String {
    let id = task.id;
    let body = format!(
        "<h1>{title}</h1>\n<dl>\n\
         <dt>Id</dt><dd>{id}</dd>\n\
         <dt>Description</dt><dd>{description}</dd>\n\
         <dt>Due Date</dt><dd>{due}</dd>\n\
         <dt>Status</dt><dd>{status}</dd>\n\
         <dt>Remarks</dt><dd>{remarks}</dd>\n\
         <dt>Created On</dt><dd>{created_on}</dd>\n\
         <dt>Created By</dt><dd>{created_by}</dd>\n\
         <dt>Last Updated On</dt><dd>{updated_on}</dd>\n\
         <dt>Last Updated By</dt><dd>{updated_by}</dd>\n\
         </dl>\n<p><a href=\"/Tasks/Edit/{id}\">Edit</a> | <a href=\"/Tasks/Index\">Back to list</a></p>",
        title = escape(&task.details.title),
        description = escape(&task.details.description),
        due = task.details.due_date.format(DUE_DATE_DISPLAY),
        status = escape(&task.details.status),
        remarks = escape(task.details.remarks.as_deref().unwrap_or_default()),
        created_on = task.audit.created_on.format(AUDIT_DISPLAY),
        created_by = escape(&task.audit.created_by),
        updated_on = task.audit.last_updated_on.format(AUDIT_DISPLAY),
        updated_by = escape(&task.audit.last_updated_by),
    );
    layout(&task.details.title, actor, &body)
}

fn field_errors(errors: Option<&ValidationErrors>, field: &str) -> String {
    errors
        .map(|errs| {
            errs.for_field(field)
                .map(|msg| format!("<span class=\"field-error\">{}</span>", escape(msg)))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// The create or edit form, optionally with validation messages.
#[must_use]
pub fn task_form(
    mode: FormMode,
    form: &TaskForm,
    errors: Option<&ValidationErrors>,
    actor: &Actor,
) -> String {
    let (heading, action, hidden) = match mode {
        FormMode::Create => ("Create task".to_string(), "/Tasks/Create".to_string(), String::new()),
        FormMode::Edit(id) => (
            "Edit task".to_string(),
            format!("/Tasks/Edit/{id}"),
            format!("<input type=\"hidden\" name=\"id\" value=\"{id}\">"),
        ),
    };

    let summary = match errors {
        Some(errs) if !errs.is_empty() => {
            "<p class=\"field-error\">Please correct the errors below.</p>\n"
        }
        _ => "",
    };

    let body = format!(
        "<h1>{heading}</h1>\n{summary}<form method=\"post\" action=\"{action}\">\n{hidden}\n\
         <label>Title <input type=\"text\" name=\"title\" maxlength=\"100\" value=\"{title}\"></label>{title_err}\n\
         <label>Description <textarea name=\"description\" maxlength=\"500\">{description}</textarea></label>{description_err}\n\
         <label>Due Date <input type=\"datetime-local\" step=\"1\" name=\"due_date\" value=\"{due_date}\"></label>{due_err}\n\
         <label>Status <input type=\"text\" name=\"status\" value=\"{status}\"></label>{status_err}\n\
         <label>Remarks <textarea name=\"remarks\">{remarks}</textarea></label>{remarks_err}\n\
         <p><button type=\"submit\">Save</button> <a href=\"/Tasks/Index\">Back to list</a></p>\n</form>",
        title = escape(&form.title),
        title_err = field_errors(errors, "title"),
        description = escape(&form.description),
        description_err = field_errors(errors, "description"),
        due_date = escape(&form.due_date),
        due_err = field_errors(errors, "due_date"),
        status = escape(&form.status),
        status_err = field_errors(errors, "status"),
        remarks = escape(&form.remarks),
        remarks_err = field_errors(errors, "remarks"),
    );
    layout(&heading, actor, &body)
}

/// The sign-in form.
#[must_use]
pub fn login_form(user_name: &str, error: Option<&str>, actor: &Actor) -> String {
    let error = error
        .map(|e| format!("<p class=\"field-error\">{}</p>\n", escape(e)))
        .unwrap_or_default();
    let body = format!(
        "<h1>Sign in</h1>\n{error}<form method=\"post\" action=\"/Account/Login\">\n\
         <label>User name <input type=\"text\" name=\"user_name\" value=\"{}\"></label>\n\
         <label>Password <input type=\"password\" name=\"password\"></label>\n\
         <p><button type=\"submit\">Sign in</button></p>\n</form>",
        escape(user_name)
    );
    layout("Sign in", actor, &body)
}

/// Generic status page used for 404 and 500 responses.
#[must_use]
pub fn status_page(title: &str, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/Tasks/Index\">Back to list</a></p>",
        escape(title),
        escape(message)
    );
    page(title, "<a href=\"/Tasks/Index\">Tasks</a>", &body)
}
