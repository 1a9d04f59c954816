//! Integration tests for sign-in, sign-out, and user attribution of writes.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use taskdesk_model::{AuditStamper, SYSTEM_ACTOR};
use taskdesk_server::server::{AppState, router};
use taskdesk_server::session::{SESSION_COOKIE, UserAccount, UserDirectory};
use taskdesk_server::store::TaskStore;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn make_state(require_login: bool) -> Arc<AppState> {
    let store = TaskStore::in_memory(Arc::new(AuditStamper::default()))
        .await
        .unwrap();
    let users = UserDirectory::new([
        UserAccount::with_password("alice", "s3cret"),
        UserAccount::with_password("bob", "hunter2"),
    ]);
    Arc::new(AppState::new(store, users).with_require_login(require_login))
}

async fn send(state: &Arc<AppState>, request: Request<Body>) -> Response {
    router(Arc::clone(state)).oneshot(request).await.unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn set_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

/// Signs in and returns the issued session token.
async fn sign_in(state: &Arc<AppState>, user: &str, password: &str) -> String {
    let body = format!("user_name={user}&password={password}");
    let response = send(state, post_form("/Account/Login", &body, None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = set_cookie(&response);
    let pair = cookie.split(';').next().unwrap();
    let (name, token) = pair.split_once('=').unwrap();
    assert_eq!(name, SESSION_COOKIE);
    token.to_string()
}

const TASK_BODY: &str = "title=Ship+report&description=Finalize+Q3+report\
                         &due_date=2025-12-01&status=Open";

// ---------------------------------------------------------------------------
// Sign in
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_page_renders() {
    let state = make_state(false).await;
    let response = send(&state, get("/Account/Login", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("name=\"user_name\""));
    assert!(html.contains("name=\"password\""));
}

#[tokio::test]
async fn login_sets_session_cookie_and_redirects() {
    let state = make_state(false).await;
    let response = send(
        &state,
        post_form("/Account/Login", "user_name=alice&password=s3cret", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/Tasks/Index"
    );
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("taskdesk_session="));
    assert!(cookie.contains("HttpOnly"));
    assert_eq!(state.sessions.len().await, 1);
}

#[tokio::test]
async fn bad_credentials_rerender_with_message() {
    let state = make_state(false).await;
    for body in [
        "user_name=alice&password=wrong",
        "user_name=carol&password=s3cret",
        "user_name=&password=",
    ] {
        let response = send(&state, post_form("/Account/Login", body, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let html = body_text(response).await;
        assert!(html.contains("Invalid login attempt."), "{body}");
    }
    assert_eq!(state.sessions.len().await, 0);
}

#[tokio::test]
async fn signed_in_pages_show_user_name() {
    let state = make_state(false).await;
    let token = sign_in(&state, "alice", "s3cret").await;

    let html = body_text(send(&state, get("/Tasks/Index", Some(&token))).await).await;
    assert!(html.contains("Signed in as alice"));

    let html = body_text(send(&state, get("/Tasks/Index", None)).await).await;
    assert!(html.contains("Sign in"));
    assert!(!html.contains("Signed in as"));
}

#[tokio::test]
async fn second_login_replaces_previous_session() {
    let state = make_state(false).await;
    let first = sign_in(&state, "alice", "s3cret").await;

    let response = send(
        &state,
        post_form("/Account/Login", "user_name=bob&password=hunter2", Some(&first)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(state.sessions.len().await, 1);
    assert!(state.sessions.user(&first).await.is_none());
}

// ---------------------------------------------------------------------------
// Attribution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn writes_are_stamped_with_signed_in_user() {
    let state = make_state(false).await;
    let alice = sign_in(&state, "alice", "s3cret").await;
    let bob = sign_in(&state, "bob", "hunter2").await;

    send(&state, post_form("/Tasks/Create", TASK_BODY, Some(&alice))).await;
    let id = state.store.list(None).await.unwrap()[0].id;

    let body = format!("id={id}&{TASK_BODY}&remarks=Reviewed");
    let response = send(
        &state,
        post_form(&format!("/Tasks/Edit/{id}"), &body, Some(&bob)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let task = state.store.find(id).await.unwrap().unwrap();
    assert_eq!(task.audit.created_by, "alice");
    assert_eq!(task.audit.last_updated_by, "bob");
}

#[tokio::test]
async fn unknown_token_writes_as_system() {
    let state = make_state(false).await;
    send(
        &state,
        post_form("/Tasks/Create", TASK_BODY, Some("not-a-session")),
    )
    .await;

    let task = state.store.list(None).await.unwrap().remove(0);
    assert_eq!(task.audit.created_by, SYSTEM_ACTOR);
}

// ---------------------------------------------------------------------------
// Sign out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_ends_session_and_expires_cookie() {
    let state = make_state(false).await;
    let token = sign_in(&state, "alice", "s3cret").await;

    let response = send(&state, post_form("/Tasks/Logout", "", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/Tasks/Index"
    );
    assert!(set_cookie(&response).contains("Max-Age=0"));
    assert!(state.sessions.user(&token).await.is_none());

    send(&state, post_form("/Tasks/Create", TASK_BODY, Some(&token))).await;
    let task = state.store.list(None).await.unwrap().remove(0);
    assert_eq!(task.audit.created_by, SYSTEM_ACTOR);
}

#[tokio::test]
async fn logout_without_session_still_redirects() {
    let state = make_state(false).await;
    let response = send(&state, post_form("/Tasks/Logout", "", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

// ---------------------------------------------------------------------------
// Required sign-in
// ---------------------------------------------------------------------------

#[tokio::test]
async fn required_login_redirects_anonymous_requests() {
    let state = make_state(true).await;
    for uri in ["/Tasks/Index", "/Tasks/Create", "/Tasks/Details/1"] {
        let response = send(&state, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/Account/Login",
            "{uri}"
        );
    }

    let response = send(&state, post_form("/Tasks/Create", TASK_BODY, None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(state.store.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn required_login_admits_signed_in_users() {
    let state = make_state(true).await;

    let response = send(&state, get("/Account/Login", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = sign_in(&state, "alice", "s3cret").await;
    let response = send(&state, get("/Tasks/Index", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}
