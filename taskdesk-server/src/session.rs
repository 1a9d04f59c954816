//! Sign-in sessions and the configured account directory.
//!
//! A session is an opaque UUID token carried in the [`SESSION_COOKIE`]
//! cookie and mapped to a username by the in-memory [`SessionStore`].
//! [`CurrentActor`] resolves a request to an [`Actor`], which handlers pass
//! explicitly to the task store so that audit stamping never reaches into
//! request state on its own.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use sha2::{Digest, Sha256};
use taskdesk_model::Actor;
use tokio::sync::RwLock;

use crate::server::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "taskdesk_session";

/// A configured account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct UserAccount {
    /// Login and display name.
    pub name: String,
    /// Lowercase hex SHA-256 of the password.
    pub password_sha256: String,
}

impl UserAccount {
    /// Builds an account from a plaintext password.
    #[must_use]
    pub fn with_password(name: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            password_sha256: hash_password(password),
        }
    }
}

/// Hex-encoded SHA-256 digest of a password.
#[must_use]
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Accounts allowed to sign in.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    accounts: HashMap<String, String>,
}

impl UserDirectory {
    /// Builds the directory from configured accounts. Later duplicates win.
    #[must_use]
    pub fn new(accounts: impl IntoIterator<Item = UserAccount>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|a| (a.name, a.password_sha256.to_ascii_lowercase()))
                .collect(),
        }
    }

    /// Returns `true` if `name` exists and `password` hashes to its digest.
    #[must_use]
    pub fn verify(&self, name: &str, password: &str) -> bool {
        self.accounts
            .get(name)
            .is_some_and(|expected| *expected == hash_password(password))
    }

    /// Number of configured accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` if no account is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Lifetime of a session when none is configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);

#[derive(Debug)]
struct Session {
    user_name: String,
    issued_at: Instant,
}

/// In-memory map of session tokens to usernames.
///
/// A session expires `ttl` after sign-in. Expired entries are refused by
/// [`SessionStore::user`] and swept on every [`SessionStore::create`].
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    /// Creates an empty session store with [`DEFAULT_SESSION_TTL`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty session store whose sessions last `ttl`.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn is_live(&self, session: &Session) -> bool {
        session.issued_at.elapsed() < self.ttl
    }

    /// Starts a session for `user_name`, returning its token.
    pub async fn create(&self, user_name: &str) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, s| self.is_live(s));
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::debug!(swept, "expired sessions removed");
        }

        sessions.insert(
            token.clone(),
            Session {
                user_name: user_name.to_string(),
                issued_at: Instant::now(),
            },
        );
        token
    }

    /// Returns the username bound to `token` while the session is live.
    pub async fn user(&self, token: &str) -> Option<String> {
        self.sessions
            .read()
            .await
            .get(token)
            .filter(|s| self.is_live(s))
            .map(|s| s.user_name.clone())
    }

    /// Ends a session, returning the username it belonged to.
    pub async fn remove(&self, token: &str) -> Option<String> {
        self.sessions
            .write()
            .await
            .remove(token)
            .map(|s| s.user_name)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Extracts the session token from the request's `Cookie` headers.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that installs a session token.
#[must_use]
pub fn session_cookie(token: &str) -> HeaderValue {
    let cookie = format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/");
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `Set-Cookie` value that expires the session cookie.
#[must_use]
pub fn expired_session_cookie() -> HeaderValue {
    HeaderValue::from_static("taskdesk_session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Appends a `Set-Cookie` header.
pub fn set_cookie(headers: &mut HeaderMap, value: HeaderValue) {
    headers.append(SET_COOKIE, value);
}

/// The actor behind the current request, plus its session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentActor {
    /// Who the request acts as.
    pub actor: Actor,
    /// The session token, when one was presented and is live.
    pub token: Option<String>,
}

impl FromRequestParts<Arc<AppState>> for CurrentActor {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(Self {
                actor: Actor::System,
                token: None,
            });
        };
        match state.sessions.user(&token).await {
            Some(name) => Ok(Self {
                actor: Actor::from_user_name(Some(&name)),
                token: Some(token),
            }),
            None => Ok(Self {
                actor: Actor::System,
                token: None,
            }),
        }
    }
}
