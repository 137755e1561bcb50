// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! changetail daemon (ctd)
//!
//! Tails a collection's change feed, archives each change as a JSON object
//! and announces it on an event topic.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lifecycle;
mod server;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ct_core::Config;

use crate::lifecycle::{LifecycleError, CONFIG_ENV};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse arguments
    let config_path =
        lifecycle::config_path(std::env::args().nth(1), std::env::var(CONFIG_ENV).ok());

    // Load configuration
    let config = Config::load(&config_path).map_err(LifecycleError::from)?;

    // Write startup marker to log (before tracing setup)
    write_startup_marker(&config)?;

    // Set up logging
    let log_guard = setup_logging(&config)?;

    info!("Starting ctd with config: {}", config_path.display());

    let shutdown = CancellationToken::new();

    // Start daemon
    let mut daemon = match lifecycle::startup(&config, shutdown.clone()).await {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let supervisor = match daemon.take_supervisor() {
        Some(handle) => handle.join(),
        None => return Err("supervisor not started".into()),
    };
    tokio::pin!(supervisor);

    info!(listen = ?daemon.listen_addr, "Daemon ready");

    let finished = tokio::select! {
        result = &mut supervisor => Some(result),

        // Graceful shutdown on SIGTERM
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            None
        }

        // Graceful shutdown on SIGINT
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
            None
        }
    };

    // Stop consuming after the in-flight record
    shutdown.cancel();
    let result = match finished {
        Some(result) => result,
        None => supervisor.await,
    };

    daemon.shutdown().await;

    match result {
        Ok(()) => {
            info!(pipeline = ?daemon.monitor.snapshot(), "Daemon stopped");
            Ok(())
        }
        Err(e) => {
            error!("Change pipeline supervisor gave up: {}", e);
            drop(log_guard);
            Err(LifecycleError::from(e).into())
        }
    }
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- ctd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- ctd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    let Some(log_path) = &config.daemon.log_path else {
        return Ok(());
    };

    // Create log directory if needed
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Append marker to log file with PID
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Some(log_path) = &config.daemon.log_path else {
        eprintln!("ERROR Failed to start daemon: {}", error);
        return;
    };
    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (non_blocking, guard) = match &config.daemon.log_path {
        Some(log_path) => {
            let bad_path = || LifecycleError::BadLogPath(log_path.clone());
            let file_appender = tracing_appender::rolling::never(
                log_path.parent().ok_or_else(bad_path)?,
                log_path.file_name().ok_or_else(bad_path)?,
            );
            tracing_appender::non_blocking(file_appender)
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    // Set up subscriber with env filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Colors only on a terminal stream
    let ansi = config.daemon.log_path.is_none();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(ansi).with_writer(non_blocking))
        .init();

    Ok(guard)
}
