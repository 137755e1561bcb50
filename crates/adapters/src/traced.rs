// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::feed::{ChangeFeed, ChangeStream, FeedError};
use crate::sink::{EventSink, PublishError};
use crate::store::{ObjectStore, StorageError};
use async_trait::async_trait;
use ct_core::{AccessControl, ChangeEvent, EventEnvelope, ObjectKey, WatchOptions};
use tracing::Instrument;

/// Wrapper that adds tracing to any ChangeFeed
#[derive(Clone)]
pub struct TracedChangeFeed<F> {
    inner: F,
}

impl<F> TracedChangeFeed<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<F: ChangeFeed> ChangeFeed for TracedChangeFeed<F> {
    type Stream = TracedChangeStream<F::Stream>;

    async fn open(&self, options: &WatchOptions) -> Result<Self::Stream, FeedError> {
        let span = tracing::info_span!(
            "feed.open",
            resume_after = ?options.resume_after.as_ref().map(|t| t.0.as_str()),
        );

        async move {
            tracing::info!(
                operations = ?options.operations,
                full_document = ?options.full_document,
                "opening change feed"
            );

            let start = std::time::Instant::now();
            let result = self.inner.open(options).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(_) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "feed opened"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "open failed"
                ),
            }

            result.map(|inner| TracedChangeStream { inner })
        }
        .instrument(span)
        .await
    }
}

/// Stream returned by [`TracedChangeFeed`]
pub struct TracedChangeStream<S> {
    inner: S,
}

#[async_trait]
impl<S: ChangeStream> ChangeStream for TracedChangeStream<S> {
    async fn next(&mut self) -> Result<Option<ChangeEvent>, FeedError> {
        let result = self.inner.next().await;
        match &result {
            Ok(Some(event)) => tracing::trace!(
                operation = %event.operation,
                token = ?event.resume_token.as_ref().map(|t| t.0.as_str()),
                fields = event.document.len(),
                "feed entry"
            ),
            Ok(None) => tracing::trace!("empty feed entry"),
            Err(FeedError::Closed) => tracing::debug!("feed closed"),
            Err(e) => tracing::debug!(error = %e, "feed entry failed"),
        }
        result
    }
}

/// Wrapper that adds tracing to any ObjectStore
#[derive(Clone)]
pub struct TracedObjectStore<S> {
    inner: S,
}

impl<S> TracedObjectStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for TracedObjectStore<S> {
    async fn create(
        &self,
        container: &str,
        key: &ObjectKey,
        content: &[u8],
    ) -> Result<u64, StorageError> {
        let span = tracing::info_span!("store.create", container, key = %key);

        async move {
            tracing::debug!(bytes = content.len(), "creating object");

            // Precondition: objects are only created inside their own container
            if !key.belongs_to(container) {
                tracing::error!("key does not belong to container");
                return Err(StorageError::InvalidPath(format!(
                    "key {} does not belong to container {}",
                    key, container
                )));
            }

            let start = std::time::Instant::now();
            let result = self.inner.create(container, key, content).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(0) => tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "store confirmed zero bytes"
                ),
                Ok(size) => tracing::info!(
                    size,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "object created"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "create failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn set_access_control(
        &self,
        container: &str,
        key: &ObjectKey,
        acl: &AccessControl,
    ) -> Result<(), StorageError> {
        let span = tracing::info_span!("store.set_acl", container, key = %key, acl = %acl);

        async move {
            let result = self.inner.set_access_control(container, key, acl).await;
            match &result {
                Ok(()) => tracing::debug!("access control applied"),
                Err(e) => tracing::error!(error = %e, "set access control failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any EventSink
#[derive(Clone)]
pub struct TracedEventSink<K> {
    inner: K,
}

impl<K> TracedEventSink<K> {
    pub fn new(inner: K) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<K: EventSink> EventSink for TracedEventSink<K> {
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), PublishError> {
        let span = tracing::info_span!(
            "sink.send",
            id = %envelope.id,
            event_type = %envelope.event_type,
        );

        async move {
            tracing::debug!(file_name = %envelope.data.file_name, "sending");

            // Precondition: a notification must point at an archived object
            if envelope.data.file_name.is_empty() {
                tracing::error!("notification does not reference an object");
                return Err(PublishError::Encode(
                    "notification does not reference an object".to_string(),
                ));
            }

            let start = std::time::Instant::now();
            let result = self.inner.send(envelope).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "event sent"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "send failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
