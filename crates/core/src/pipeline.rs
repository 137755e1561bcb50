// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline lifecycle state machine
//!
//! `Idle → Watching → Draining → Stopped`. A watch loop that dies without a
//! shutdown request goes straight from `Watching` to `Stopped`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one pipeline instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    #[default]
    Idle,
    Watching,
    Draining,
    Stopped,
}

/// Lifecycle inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineInput {
    Start,
    Shutdown,
    Terminate,
}

impl PipelineState {
    /// Pure state transition; invalid inputs leave the state unchanged
    pub fn transition(self, input: PipelineInput) -> Self {
        match (self, input) {
            (PipelineState::Idle, PipelineInput::Start) => PipelineState::Watching,
            (PipelineState::Idle, PipelineInput::Shutdown) => PipelineState::Stopped,
            (PipelineState::Watching, PipelineInput::Shutdown) => PipelineState::Draining,
            (PipelineState::Watching | PipelineState::Draining, PipelineInput::Terminate) => {
                PipelineState::Stopped
            }
            (state, _) => state,
        }
    }

    /// Records are only processed while watching
    pub fn is_processing(&self) -> bool {
        matches!(self, PipelineState::Watching)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Stopped)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Watching => "watching",
            PipelineState::Draining => "draining",
            PipelineState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
