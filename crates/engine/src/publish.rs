// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use ct_adapters::{EventSink, PublishError};
use ct_core::{IdGen, NotificationEvent};

/// Publishes one notification per call through an event sink
#[derive(Clone)]
pub struct NotificationPublisher<K, I> {
    sink: K,
    ids: I,
}

impl<K: EventSink, I: IdGen> NotificationPublisher<K, I> {
    pub fn new(sink: K, ids: I) -> Self {
        Self { sink, ids }
    }

    /// Wrap the event in a freshly identified envelope and send it.
    ///
    /// Returns the envelope id.
    pub async fn publish(&self, event: NotificationEvent) -> Result<String, PublishError> {
        let id = self.ids.next();
        let envelope = event.into_envelope(id.clone());
        self.sink.send(&envelope).await?;
        Ok(id)
    }
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
