// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use crate::Termination;
use thiserror::Error;

/// Errors starting a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("pipeline is already watching")]
    AlreadyWatching,
    #[error("pipeline has stopped and cannot be restarted")]
    Stopped,
}

/// Errors ending a supervisor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    #[error("gave up after {restarts} restarts: {last}")]
    GaveUp { restarts: u32, last: Termination },
    #[error("failed to start pipeline: {0}")]
    Start(#[from] StartError),
    #[error("supervisor task failed: {0}")]
    Panicked(String),
}
