// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{EventSink, PublishError};
use async_trait::async_trait;
use ct_core::EventEnvelope;

/// Sink that accepts and discards every envelope
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpEventSink;

impl NoOpEventSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), PublishError> {
        tracing::debug!(
            id = %envelope.id,
            file_name = %envelope.data.file_name,
            "notification discarded"
        );
        Ok(())
    }
}
