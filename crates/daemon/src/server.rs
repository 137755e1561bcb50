// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness endpoint.
//!
//! Runs on its own task, independent of the change pipeline, so it keeps
//! answering while the supervisor restarts pipelines.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use ct_core::{Clock, PipelineState};
use ct_engine::{MonitorSnapshot, PipelineMonitor};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Service line reported by `GET /`
pub const SERVICE_NAME: &str = "MongoDB Source Connector";

#[derive(Clone)]
pub struct ServerState<C> {
    monitor: Arc<PipelineMonitor>,
    clock: C,
    started_at: DateTime<Utc>,
}

impl<C: Clock> ServerState<C> {
    pub fn new(monitor: Arc<PipelineMonitor>, clock: C) -> Self {
        let started_at = clock.now();
        Self {
            monitor,
            clock,
            started_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    uptime_secs: i64,
    pipeline: MonitorSnapshot,
}

pub fn router<C: Clock>(state: ServerState<C>) -> Router {
    Router::new()
        .route("/", get(status::<C>))
        .route("/health", get(health::<C>))
        .with_state(state)
}

async fn status<C: Clock>(State(state): State<ServerState<C>>) -> String {
    format!(
        "Server Time (UTC): {}\nChange Stream Service : {} {}",
        state.clock.now().format("%Y-%m-%d %H:%M:%S"),
        SERVICE_NAME,
        match state.monitor.state() {
            PipelineState::Watching => "in Progress",
            PipelineState::Idle => "Starting",
            PipelineState::Draining => "Stopping",
            PipelineState::Stopped => "Stopped",
        }
    )
}

async fn health<C: Clock>(State(state): State<ServerState<C>>) -> Json<Health> {
    let pipeline = state.monitor.snapshot();
    let status = if pipeline.state.is_processing() {
        "ok"
    } else {
        "degraded"
    };
    Json(Health {
        status,
        uptime_secs: (state.clock.now() - state.started_at).num_seconds(),
        pipeline,
    })
}

/// Serve until the shutdown token is cancelled
pub async fn serve<C: Clock>(
    listener: TcpListener,
    state: ServerState<C>,
    shutdown: CancellationToken,
) {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Liveness endpoint listening");
    }

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;
    if let Err(e) = result {
        error!("Liveness endpoint failed: {}", e);
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
