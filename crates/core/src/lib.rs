// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ct-core: Core types for the changetail CDC connector
//!
//! This crate provides:
//! - The document model and change records consumed from a change feed
//! - Archive object keys and access-control policies
//! - Notification events and their sink envelope
//! - The pipeline state machine
//! - Clock and ID abstractions for deterministic tests
//! - TOML configuration

pub mod acl;
pub mod change;
pub mod clock;
pub mod config;
pub mod id;
pub mod notification;
pub mod object;
pub mod pipeline;
pub mod value;

// Re-exports
pub use acl::{AccessControl, AclError, Permissions, ARCHIVE_ACL};
pub use change::{
    ChangeEvent, ChangeRecord, FullDocument, OperationKind, ResumeToken, WatchOptions,
    IDENTITY_FIELD,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    ArchiveConfig, Config, ConfigError, DaemonConfig, FeedConfig, FeedSource, PublishConfig,
    RestartMode, SinkKind, SupervisorConfig,
};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use notification::{
    EventEnvelope, NotificationData, NotificationEvent, DEFAULT_DATA_VERSION, DEFAULT_SUBJECT,
};
pub use object::{ArchivedObject, ObjectKey};
pub use pipeline::{PipelineInput, PipelineState};
pub use value::{Document, Value};
