// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! changetail engine: archive, publish and supervise the change pipeline

mod archive;
mod error;
mod monitor;
mod outcome;
mod pipeline;
mod publish;
mod supervisor;

pub use archive::ArchiveWriter;
pub use error::{StartError, SupervisorError};
pub use monitor::{MonitorSnapshot, PipelineMonitor};
pub use outcome::Outcome;
pub use pipeline::{ChangePipeline, PipelineConfig, PipelineDeps, PipelineHandle, Termination};
pub use publish::NotificationPublisher;
pub use supervisor::{Supervisor, SupervisorHandle};
