// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline monitoring counters.
//!
//! Shared between the supervisor, every pipeline instance it creates and the
//! liveness endpoint. Writers only ever increment; readers take a snapshot.

use crate::Outcome;
use ct_core::PipelineState;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct PipelineMonitor {
    entries: AtomicU64,
    no_ops: AtomicU64,
    archived: AtomicU64,
    published: AtomicU64,
    archive_failures: AtomicU64,
    publish_failures: AtomicU64,
    transient_errors: AtomicU64,
    restarts: AtomicU64,
    state: Mutex<PipelineState>,
}

/// Point-in-time copy of the monitor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub state: PipelineState,
    pub entries: u64,
    pub no_ops: u64,
    pub archived: u64,
    pub published: u64,
    pub archive_failures: u64,
    pub publish_failures: u64,
    pub transient_errors: u64,
    pub restarts: u64,
}

impl PipelineMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_outcome(&self, outcome: &Outcome) {
        self.entries.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Outcome::NoOp => &self.no_ops,
            Outcome::ArchiveFailed { .. } => &self.archive_failures,
            Outcome::PublishFailed { .. } => &self.publish_failures,
            Outcome::Published { .. } => &self.published,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if outcome.is_archived() {
            self.archived.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_transient_error(&self) {
        self.transient_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_state(&self, state: PipelineState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            state: self.state(),
            entries: self.entries.load(Ordering::Relaxed),
            no_ops: self.no_ops.load(Ordering::Relaxed),
            archived: self.archived.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            archive_failures: self.archive_failures.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
