//! Configuration system for the `TaskDesk` server.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdesk/config.toml`)
//! 4. Compiled defaults

use std::path::{Path, PathBuf};

use crate::session::UserAccount;

/// Errors that can occur when loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

/// Default session lifetime: eight hours.
pub const DEFAULT_SESSION_TTL_MINUTES: u64 = 8 * 60;

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerSection,
    database: DatabaseSection,
    auth: AuthSection,
}

/// `[server]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerSection {
    bind_addr: Option<String>,
}

/// `[database]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct DatabaseSection {
    url: Option<String>,
    max_connections: Option<u32>,
}

/// `[auth]` section, including `[[auth.users]]` entries.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AuthSection {
    require_login: Option<bool>,
    session_ttl_minutes: Option<u64>,
    users: Vec<UserAccount>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "TaskDesk task tracker")]
pub struct ServerCliArgs {
    /// Address to bind the HTTP server to.
    #[arg(short, long, env = "TASKDESK_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/taskdesk/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Database connection string, e.g. `sqlite://taskdesk.db`.
    #[arg(long, env = "TASKDESK_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections.
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Redirect anonymous task requests to the login page.
    #[arg(long)]
    pub require_login: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDESK_LOG")]
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to (e.g., `127.0.0.1:5000`).
    pub bind_addr: String,
    /// Database connection string.
    pub database_url: String,
    /// Maximum number of pooled database connections.
    pub max_connections: u32,
    /// Whether task pages require a signed-in user.
    pub require_login: bool,
    /// Accounts allowed to sign in.
    pub users: Vec<UserAccount>,
    /// Minutes a session stays valid after sign-in.
    pub session_ttl_minutes: u64,
    /// Log level filter string.
    pub log_level: String,
    /// Optional log file path.
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            database_url: "sqlite://taskdesk.db".to_string(),
            max_connections: 5,
            require_login: false,
            users: Vec::new(),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, file))
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &ServerCliArgs, file: ServerConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or(file.server.bind_addr)
                .unwrap_or(defaults.bind_addr),
            database_url: cli
                .database_url
                .clone()
                .or(file.database.url)
                .unwrap_or(defaults.database_url),
            max_connections: cli
                .max_connections
                .or(file.database.max_connections)
                .unwrap_or(defaults.max_connections),
            require_login: cli.require_login
                || file.auth.require_login.unwrap_or(defaults.require_login),
            session_ttl_minutes: file
                .auth
                .session_ttl_minutes
                .unwrap_or(defaults.session_ttl_minutes),
            users: file.auth.users,
            log_level: cli.log_level.clone(),
            log_file: cli.log_file.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// An explicit path must exist; the default path may be absent.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ServerConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        return read_config_file(p, true);
    }
    match dirs::config_dir() {
        Some(dir) => read_config_file(&config_path_in(&dir), false),
        None => Ok(ServerConfigFile::default()),
    }
}

/// `<dir>/taskdesk/config.toml`.
fn config_path_in(dir: &Path) -> PathBuf {
    dir.join("taskdesk").join("config.toml")
}

fn read_config_file(path: &Path, required: bool) -> Result<ServerConfigFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(ServerConfigFile::default())
        }
        Err(e) => Err(ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
