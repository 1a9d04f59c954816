//! Shared server state, routing, and startup.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use taskdesk_model::{AuditStamper, PreCommitHook};

use crate::config::ServerConfig;
use crate::session::{self, SessionStore, UserDirectory};
use crate::store::{StoreError, TaskStore};
use crate::{account, error, handlers};

/// State shared by every request.
#[derive(Debug)]
pub struct AppState {
    /// Task persistence.
    pub store: TaskStore,
    /// Live sign-in sessions.
    pub sessions: SessionStore,
    /// Accounts allowed to sign in.
    pub users: UserDirectory,
    /// Redirect anonymous task requests to the login page.
    pub require_login: bool,
}

impl AppState {
    /// Creates state around an existing store with no sign-in requirement.
    #[must_use]
    pub fn new(store: TaskStore, users: UserDirectory) -> Self {
        Self {
            store,
            sessions: SessionStore::new(),
            users,
            require_login: false,
        }
    }

    /// Sets whether task pages require a signed-in user.
    #[must_use]
    pub const fn with_require_login(mut self, require_login: bool) -> Self {
        self.require_login = require_login;
        self
    }

    /// Replaces the session store with one whose sessions last `ttl`.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = SessionStore::with_ttl(ttl);
        self
    }

    /// Opens the configured database with wall-clock audit stamping.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        let hook: Arc<dyn PreCommitHook> = Arc::new(AuditStamper::default());
        let store = TaskStore::connect(&config.database_url, config.max_connections, hook).await?;
        let users = UserDirectory::new(config.users.clone());
        if config.require_login && users.is_empty() {
            tracing::warn!("login is required but no accounts are configured");
        }
        let ttl = Duration::from_secs(config.session_ttl_minutes.saturating_mul(60));
        Ok(Self::new(store, users)
            .with_require_login(config.require_login)
            .with_session_ttl(ttl))
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut tasks = Router::new()
        .route("/", get(handlers::index))
        .route("/Tasks", get(handlers::index))
        .route("/Tasks/Index", get(handlers::index))
        .route("/Tasks/Details", get(handlers::missing_id))
        .route("/Tasks/Details/{id}", get(handlers::details))
        .route(
            "/Tasks/Create",
            get(handlers::create_form).post(handlers::create),
        )
        .route(
            "/Tasks/Edit/{id}",
            get(handlers::edit_form).post(handlers::edit),
        )
        .route(
            "/Tasks/Delete/{id}",
            get(handlers::delete).post(handlers::delete),
        );

    if state.require_login {
        tasks = tasks.route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_session,
        ));
    }

    tasks
        .route("/Tasks/Logout", post(account::logout))
        .route(
            "/Account/Login",
            get(account::login_form).post(account::login),
        )
        .fallback(|| async { error::not_found() })
        .with_state(state)
}

/// Redirects requests without a live session to the login page.
async fn require_session(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let signed_in = match session::session_token(request.headers()) {
        Some(token) => state.sessions.user(&token).await.is_some(),
        None => false,
    };
    if signed_in {
        next.run(request).await
    } else {
        tracing::debug!(path = %request.uri().path(), "anonymous request redirected to login");
        Redirect::to("/Account/Login").into_response()
    }
}

/// Starts the server with a pre-built [`AppState`] and returns the bound
/// address and a join handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<AppState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "http server error");
        }
    });

    Ok((bound_addr, handle))
}
