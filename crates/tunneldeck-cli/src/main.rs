//! tunneldeck - manage cloudflared tunnels, DNS routes and users from the terminal.
//!
//! Logs in, runs one command and exits. `watch` keeps the session alive and
//! reports renewals until the session ends.

mod commands;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tunneldeck_core::{Config, SessionEvent, TerminationReason, Tunneldeck};

use commands::Command;

/// Log file name prefix inside the configured log directory
const LOG_FILE_PREFIX: &str = "tunneldeck.log";

/// Exit status when the session is terminated mid-command
const SESSION_ENDED_EXIT_CODE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "tunneldeck", version, about = "Manage cloudflared tunnels through the tunnel web GUI backend")]
struct Cli {
    /// Backend API base URL (e.g. http://localhost:8080/api)
    #[arg(long, env = "TUNNELDECK_BASE_URL")]
    base_url: Option<String>,

    /// Username to log in with
    #[arg(short, long, env = "TUNNELDECK_USERNAME")]
    username: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, and also to a daily rolling file when `log_dir` is set.
/// The returned guard must be held for the life of the program.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn prompt_username() -> Result<String> {
    eprint!("Username: ");
    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

fn read_password() -> Result<String> {
    match std::env::var("TUNNELDECK_PASSWORD") {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}

/// The stored config with `username` remembered, or None if it is already.
/// Built from what was read from disk so command-line overrides are not saved.
fn remember_username(stored: &Config, username: &str) -> Option<Config> {
    if stored.last_username.as_deref() == Some(username) {
        return None;
    }
    Some(Config {
        last_username: Some(username.to_string()),
        ..stored.clone()
    })
}

/// Resolves when the core reports the session was terminated.
/// This is where a UI would navigate back to its login surface.
async fn session_terminated(mut events: broadcast::Receiver<SessionEvent>) -> TerminationReason {
    loop {
        match events.recv().await {
            Ok(SessionEvent::Terminated(reason)) => return reason,
            Ok(SessionEvent::Renewed) => info!("Session renewed"),
            Ok(event) => info!(?event, "Session event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed session events");
            }
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let stored = match Config::load() {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Warning: failed to load config ({:#}), using defaults", e);
            None
        }
    };
    let mut config = stored.clone().unwrap_or_default();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    let _log_guard = init_tracing(&config);
    info!(base_url = %config.base_url, "tunneldeck starting");

    let username = match cli.username.or_else(|| config.last_username.clone()) {
        Some(username) => username,
        None => prompt_username()?,
    };
    let password = read_password()?;

    let deck = Tunneldeck::new(&config).context("Failed to create API client")?;
    let terminated = session_terminated(deck.subscribe());

    let identity = deck
        .login(&username, &password)
        .await
        .context("Login failed")?;
    eprintln!("Logged in as {} ({})", identity.display_name, identity.role);

    // An unreadable config file is left as it is
    if let Some(updated) = stored.as_ref().and_then(|c| remember_username(c, &username)) {
        if let Err(e) = updated.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    let result = tokio::select! {
        result = commands::run(cli.command, &deck) => result,
        reason = terminated => {
            warn!(%reason, "Exiting after session termination");
            eprintln!("Session ended: {}. Please log in again.", reason);
            return Ok(ExitCode::from(SESSION_ENDED_EXIT_CODE));
        }
    };

    deck.logout().await;
    info!("tunneldeck shutting down");
    result.map(|()| ExitCode::SUCCESS)
}
