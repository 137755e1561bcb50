// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use ct_adapters::{
    EventSink, FsObjectStore, HttpEventSink, JsonLinesFeed, NoOpEventSink, PublishError,
    TracedChangeFeed, TracedEventSink, TracedObjectStore,
};
use ct_core::{
    Config, ConfigError, EventEnvelope, PublishConfig, SinkKind, SystemClock, UuidIdGen,
};
use ct_engine::{
    PipelineConfig, PipelineDeps, PipelineMonitor, Supervisor, SupervisorError, SupervisorHandle,
};
use fs2::FileExt;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::server::{self, ServerState};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "CHANGETAIL_CONFIG";

/// Config file used when neither an argument nor the environment names one
pub const DEFAULT_CONFIG_FILE: &str = "changetail.toml";

/// Supervisor with concrete adapter types (wrapped with tracing)
pub type DaemonSupervisor = Supervisor<
    TracedChangeFeed<JsonLinesFeed>,
    TracedObjectStore<FsObjectStore>,
    TracedEventSink<ConfiguredSink>,
    SystemClock,
    UuidIdGen,
>;

/// Event sink selected by `publish.sink`
#[derive(Clone, Debug)]
pub enum ConfiguredSink {
    Http(HttpEventSink),
    Noop(NoOpEventSink),
}

impl ConfiguredSink {
    pub fn from_config(config: &PublishConfig) -> Result<Self, LifecycleError> {
        match config.sink {
            SinkKind::Noop => Ok(ConfiguredSink::Noop(NoOpEventSink::new())),
            SinkKind::Http => {
                let endpoint = config.endpoint.clone().ok_or_else(|| {
                    LifecycleError::Config(ConfigError::Invalid(
                        "publish.endpoint is required for the http sink".into(),
                    ))
                })?;
                let key = config.topic_key();
                if key.is_none() {
                    warn!(key_env = %config.key_env, "topic key not set, publishing without it");
                }
                Ok(ConfiguredSink::Http(HttpEventSink::new(
                    endpoint,
                    key,
                    config.timeout,
                )?))
            }
        }
    }
}

#[async_trait]
impl EventSink for ConfiguredSink {
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), PublishError> {
        match self {
            ConfiguredSink::Http(sink) => sink.send(envelope).await,
            ConfiguredSink::Noop(sink) => sink.send(envelope).await,
        }
    }
}

/// Pick the config file: first argument, then `CHANGETAIL_CONFIG`, then the default
pub fn config_path(arg: Option<String>, env: Option<String>) -> PathBuf {
    arg.or(env)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Pipeline settings derived from the connector config
pub fn pipeline_config(config: &Config) -> PipelineConfig {
    PipelineConfig {
        collection: config.feed.collection.clone(),
        subject: config.publish.subject.clone(),
        data_version: config.publish.data_version.clone(),
        full_document: config.feed.full_document,
        ..PipelineConfig::new(config.archive.container.clone())
    }
}

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: Option<File>,
    /// Counters shared with the pipeline and the liveness endpoint
    pub monitor: Arc<PipelineMonitor>,
    supervisor: Option<SupervisorHandle>,
    server: Option<JoinHandle<()>>,
    /// Address the liveness endpoint is bound to
    pub listen_addr: Option<SocketAddr>,
}

impl DaemonState {
    /// Take the supervisor handle to await it from the main loop
    pub fn take_supervisor(&mut self) -> Option<SupervisorHandle> {
        self.supervisor.take()
    }

    /// Shutdown the daemon gracefully.
    ///
    /// The shutdown token must already be cancelled.
    pub async fn shutdown(&mut self) {
        info!("Shutting down daemon...");

        // 1. Liveness endpoint stops on the cancelled token
        if let Some(server) = self.server.take() {
            if let Err(e) = server.await {
                warn!("Liveness endpoint task failed: {}", e);
            }
        }

        // 2. Remove PID file
        if let Some(lock_path) = &self.config.daemon.lock_path {
            if lock_path.exists() {
                if let Err(e) = std::fs::remove_file(lock_path) {
                    warn!("Failed to remove PID file: {}", e);
                }
            }
        }

        // 3. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Log path has no parent directory or file name: {0}")]
    BadLogPath(PathBuf),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind liveness endpoint at {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("Event sink error: {0}")]
    Sink(#[from] PublishError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Change pipeline supervisor stopped: {0}")]
    Supervisor(#[from] SupervisorError),
}

/// Start the daemon
pub async fn startup(
    config: &Config,
    shutdown: CancellationToken,
) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config, shutdown).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config, &e);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(
    config: &Config,
    shutdown: CancellationToken,
) -> Result<DaemonState, LifecycleError> {
    // 1. Acquire lock file FIRST - prevents two connectors archiving the same feed
    let lock_file = match &config.daemon.lock_path {
        Some(lock_path) => Some(acquire_lock(lock_path)?),
        None => None,
    };

    // 2. Create archive root
    std::fs::create_dir_all(&config.archive.root)?;

    // 3. Build the sink before anything runs (fail fast on bad publish config)
    let sink = ConfiguredSink::from_config(&config.publish)?;

    // 4. Bind liveness endpoint before starting work
    let listener = match config.daemon.listen {
        Some(addr) => Some(
            TcpListener::bind(addr)
                .await
                .map_err(|e| LifecycleError::BindFailed(addr, e))?,
        ),
        None => None,
    };
    let listen_addr = match &listener {
        Some(listener) => Some(listener.local_addr()?),
        None => None,
    };

    // 5. Set up adapters (wrapped with tracing for observability)
    let monitor = Arc::new(PipelineMonitor::new());
    let deps = PipelineDeps {
        feed: TracedChangeFeed::new(JsonLinesFeed::new(config.feed.source.clone())),
        store: TracedObjectStore::new(FsObjectStore::new(config.archive.root.clone())),
        sink: TracedEventSink::new(sink),
        monitor: Arc::clone(&monitor),
    };

    // 6. Start the supervisor (LAST - only after all validation passes)
    let supervisor: DaemonSupervisor = Supervisor::new(
        deps,
        pipeline_config(config),
        config.supervisor.clone(),
        SystemClock,
        UuidIdGen,
    );
    let supervisor = supervisor.start(shutdown.clone());

    let server = listener.map(|listener| {
        let state = ServerState::new(Arc::clone(&monitor), SystemClock);
        tokio::spawn(server::serve(listener, state, shutdown))
    });

    info!(
        collection = config.feed.collection.as_deref().unwrap_or("-"),
        container = %config.archive.container,
        root = %config.archive.root.display(),
        sink = ?config.publish.sink,
        listen = ?listen_addr,
        "Daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        monitor,
        supervisor: Some(supervisor),
        server,
        listen_addr,
    })
}

fn acquire_lock(lock_path: &Path) -> Result<File, LifecycleError> {
    use std::io::Write;

    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config, error: &LifecycleError) {
    // The lock belongs to another daemon when we failed to take it
    if matches!(error, LifecycleError::LockFailed(_)) {
        return;
    }
    if let Some(lock_path) = &config.daemon.lock_path {
        if lock_path.exists() {
            let _ = std::fs::remove_file(lock_path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
