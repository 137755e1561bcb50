// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event sink adapters for notification delivery

mod http;
mod noop;

pub use http::{HttpEventSink, KEY_HEADER};
pub use noop::NoOpEventSink;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEventSink;

use async_trait::async_trait;
use ct_core::EventEnvelope;
use thiserror::Error;

/// Errors from publishing to an event sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("publish transport error: {0}")]
    Transport(String),
    #[error("sink rejected event ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("failed to encode event: {0}")]
    Encode(String),
}

/// Adapter for delivering event envelopes
#[async_trait]
pub trait EventSink: Clone + Send + Sync + 'static {
    /// Deliver one envelope; returns once the sink has accepted it
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), PublishError>;
}
