//! `TaskDesk` server -- server-rendered task tracker.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 127.0.0.1:5000 with ./taskdesk.db
//! cargo run --bin taskdesk-server
//!
//! # Custom address and database
//! cargo run --bin taskdesk-server -- --bind 0.0.0.0:8080 --database-url sqlite:///var/lib/taskdesk/tasks.db
//!
//! # Or via environment variables
//! TASKDESK_ADDR=0.0.0.0:8080 TASKDESK_DATABASE_URL=sqlite::memory: cargo run --bin taskdesk-server
//! ```

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use taskdesk_server::config::{ServerCliArgs, ServerConfig};
use taskdesk_server::server::{self, AppState};
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Held until exit so buffered log lines are flushed.
    let _log_guard = init_logging(&config.log_level, config.log_file.as_deref());

    tracing::info!(
        addr = %config.bind_addr,
        database = %config.database_url,
        accounts = config.users.len(),
        require_login = config.require_login,
        "starting taskdesk server"
    );

    let state = match AppState::from_config(&config).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(error = %e, "failed to open task store");
            std::process::exit(1);
        }
    };
    let pool = state.store.pool().clone();

    match server::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, mut handle)) => {
            tracing::info!(addr = %bound_addr, "taskdesk listening");
            tokio::select! {
                result = &mut handle => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "http server task failed");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    handle.abort();
                }
            }
            pool.close().await;
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start http server");
            std::process::exit(1);
        }
    }
}

/// Initialise tracing to stderr, or to `file_path` through a non-blocking
/// writer whose guard must outlive the program.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some((log_dir, file_name)) = file_path.and_then(|p| {
        let dir = p.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
        Some((dir, p.file_name()?))
    }) else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        return None;
    };

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
