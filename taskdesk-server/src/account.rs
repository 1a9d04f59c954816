//! Sign-in and sign-out.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::handlers::TASK_LIST;
use crate::server::AppState;
use crate::session::{self, CurrentActor};
use crate::views;

/// Posted sign-in form.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoginForm {
    /// Account name.
    pub user_name: String,
    /// Plaintext password.
    pub password: String,
}

/// `GET /Account/Login`
pub async fn login_form(current: CurrentActor) -> Html<String> {
    Html(views::login_form("", None, &current.actor))
}

/// `POST /Account/Login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    current: CurrentActor,
    Form(form): Form<LoginForm>,
) -> Response {
    if !state.users.verify(&form.user_name, &form.password) {
        tracing::warn!(user_name = %form.user_name, "failed sign-in");
        return Html(views::login_form(
            &form.user_name,
            Some("Invalid login attempt."),
            &current.actor,
        ))
        .into_response();
    }

    if let Some(old) = current.token.as_deref() {
        state.sessions.remove(old).await;
    }
    let token = state.sessions.create(&form.user_name).await;
    tracing::info!(user_name = %form.user_name, "signed in");

    let mut response = Redirect::to(TASK_LIST).into_response();
    session::set_cookie(response.headers_mut(), session::session_cookie(&token));
    response
}

/// `POST /Tasks/Logout`
///
/// Ends the session (if any), expires the cookie, and returns to the list.
pub async fn logout(State(state): State<Arc<AppState>>, current: CurrentActor) -> Response {
    if let Some(token) = current.token.as_deref()
        && let Some(user_name) = state.sessions.remove(token).await
    {
        tracing::info!(user_name = %user_name, "signed out");
    }

    let mut response = Redirect::to(TASK_LIST).into_response();
    session::set_cookie(response.headers_mut(), session::expired_session_cookie());
    response
}
