// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change pipeline: feed → archive → notification.
//!
//! One background task consumes the feed and handles records strictly one at
//! a time. The archive write and publish for a record finish before the next
//! record is read. An owned gate guarantees at most one consume loop per
//! pipeline instance.

use crate::archive::ArchiveWriter;
use crate::monitor::PipelineMonitor;
use crate::publish::NotificationPublisher;
use crate::{Outcome, StartError};
use ct_adapters::{ChangeFeed, ChangeStream, EventSink, FeedError, ObjectStore};
use ct_core::{
    ChangeEvent, ChangeRecord, Clock, FullDocument, IdGen, NotificationData, NotificationEvent,
    ObjectKey, PipelineInput, PipelineState, ResumeToken, WatchOptions, DEFAULT_DATA_VERSION,
    DEFAULT_SUBJECT,
};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Pipeline adapter dependencies
#[derive(Clone)]
pub struct PipelineDeps<F, S, K> {
    pub feed: F,
    pub store: S,
    pub sink: K,
    pub monitor: Arc<PipelineMonitor>,
}

/// Per-instance pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Archive container; also the object key prefix
    pub container: String,
    /// Collection name, for logs only
    pub collection: Option<String>,
    pub subject: String,
    pub data_version: String,
    pub full_document: FullDocument,
    /// Open the feed after this position
    pub resume_after: Option<ResumeToken>,
}

impl PipelineConfig {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            collection: None,
            subject: DEFAULT_SUBJECT.to_string(),
            data_version: DEFAULT_DATA_VERSION.to_string(),
            full_document: FullDocument::default(),
            resume_after: None,
        }
    }
}

/// Why a consume loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Shutdown was requested
    Shutdown,
    /// The feed closed or failed
    Fatal(FeedError),
    /// The consume loop panicked
    Panicked(String),
}

impl Termination {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Termination::Shutdown)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Shutdown => f.write_str("shutdown requested"),
            Termination::Fatal(e) => write!(f, "{}", e),
            Termination::Panicked(msg) => write!(f, "consume loop panicked: {}", msg),
        }
    }
}

/// Handle to a running consume loop
pub struct PipelineHandle {
    task: JoinHandle<Termination>,
}

impl PipelineHandle {
    /// Wait for the loop to end
    pub async fn join(self) -> Termination {
        match self.task.await {
            Ok(termination) => termination,
            Err(e) if e.is_panic() => Termination::Panicked(panic_message(e.into_panic())),
            // Cancelled only when the runtime itself is shutting down
            Err(_) => Termination::Shutdown,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Change pipeline for one watched collection
pub struct ChangePipeline<F, S, K, C, I> {
    inner: Arc<Inner<F, S, K, C, I>>,
}

impl<F, S, K, C, I> Clone for ChangePipeline<F, S, K, C, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<F, S, K, C, I> {
    feed: F,
    archive: ArchiveWriter<S>,
    publisher: NotificationPublisher<K, I>,
    clock: C,
    ids: I,
    config: PipelineConfig,
    monitor: Arc<PipelineMonitor>,
    /// Single-flight gate, held by the consume loop for its whole life
    gate: Arc<tokio::sync::Mutex<()>>,
    state: Mutex<PipelineState>,
    /// Resume token of the last record handled
    position: Mutex<Option<ResumeToken>>,
}

impl<F, S, K, C, I> ChangePipeline<F, S, K, C, I>
where
    F: ChangeFeed,
    S: ObjectStore,
    K: EventSink,
    C: Clock,
    I: IdGen,
{
    /// Create a pipeline; nothing runs until [`start`](Self::start)
    pub fn new(deps: PipelineDeps<F, S, K>, config: PipelineConfig, clock: C, ids: I) -> Self {
        let position = config.resume_after.clone();
        Self {
            inner: Arc::new(Inner {
                feed: deps.feed,
                archive: ArchiveWriter::new(deps.store, config.container.clone()),
                publisher: NotificationPublisher::new(deps.sink, ids.clone()),
                clock,
                ids,
                config,
                monitor: deps.monitor,
                gate: Arc::new(tokio::sync::Mutex::new(())),
                state: Mutex::new(PipelineState::Idle),
                position: Mutex::new(position),
            }),
        }
    }

    /// Open the change feed and consume it on a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, shutdown: CancellationToken) -> Result<PipelineHandle, StartError> {
        let guard = Arc::clone(&self.inner.gate)
            .try_lock_owned()
            .map_err(|_| StartError::AlreadyWatching)?;
        if self.state() != PipelineState::Idle {
            return Err(StartError::Stopped);
        }
        self.inner.apply(PipelineInput::Start);

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _guard = guard;
            let termination = inner.consume(&shutdown).await;
            inner.apply(PipelineInput::Terminate);
            termination
        });
        Ok(PipelineHandle { task })
    }

    /// Handle one feed entry end to end
    pub async fn process_one(&self, entry: Option<ChangeEvent>) -> Outcome {
        self.inner.process_one(entry).await
    }

    pub fn state(&self) -> PipelineState {
        self.inner.state()
    }

    /// Resume token of the last handled record, or the starting position
    pub fn position(&self) -> Option<ResumeToken> {
        self.inner
            .position
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl<F, S, K, C, I> Inner<F, S, K, C, I>
where
    F: ChangeFeed,
    S: ObjectStore,
    K: EventSink,
    C: Clock,
    I: IdGen,
{
    fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply(&self, input: PipelineInput) -> PipelineState {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let next = state.transition(input);
        if next != *state {
            tracing::debug!(from = %*state, to = %next, "pipeline state changed");
            *state = next;
        }
        self.monitor.set_state(next);
        next
    }

    async fn consume(&self, shutdown: &CancellationToken) -> Termination {
        let options = WatchOptions::default()
            .with_full_document(self.config.full_document)
            .resume_after(self.config.resume_after.clone());

        let opened = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                self.apply(PipelineInput::Shutdown);
                return Termination::Shutdown;
            }
            opened = self.feed.open(&options) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(error = %error, "failed to open change feed");
                return Termination::Fatal(error);
            }
        };

        tracing::info!(
            collection = self.config.collection.as_deref().unwrap_or("-"),
            container = %self.config.container,
            resume_after = ?options.resume_after.as_ref().map(|t| t.0.as_str()),
            "watching change feed"
        );

        while self.state().is_processing() {
            let entry = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    self.apply(PipelineInput::Shutdown);
                    break;
                }
                entry = stream.next() => entry,
            };

            match entry {
                Ok(entry) => {
                    let token = entry.as_ref().and_then(|e| e.resume_token.clone());
                    self.process_one(entry).await;
                    if let Some(token) = token {
                        *self.position.lock().unwrap_or_else(|e| e.into_inner()) = Some(token);
                    }
                }
                Err(FeedError::Transient(message)) => {
                    tracing::warn!(error = %message, "transient change feed error");
                    self.monitor.record_transient_error();
                }
                Err(error) => {
                    tracing::error!(error = %error, "change feed terminated");
                    return Termination::Fatal(error);
                }
            }
        }

        tracing::info!("change pipeline stopped");
        Termination::Shutdown
    }

    async fn process_one(&self, entry: Option<ChangeEvent>) -> Outcome {
        let Some(event) = entry else {
            tracing::info!("no changes tracked by change feed");
            self.monitor.record_outcome(&Outcome::NoOp);
            return Outcome::NoOp;
        };

        let record = ChangeRecord::observe(event, self.clock.now());
        let operation = record.operation;
        let object_key = ObjectKey::generate(&self.config.container, &self.ids);
        let data = NotificationData::for_object(&object_key);

        let outcome = match self.archive.write(&record.document, &object_key).await {
            Err(error) => {
                tracing::error!(
                    operation = %operation,
                    object_key = %object_key,
                    error = %error,
                    "unable to archive change"
                );
                Outcome::ArchiveFailed {
                    operation,
                    object_key,
                    error,
                }
            }
            Ok(object) => {
                tracing::info!(
                    operation = %operation,
                    object_key = %object.key,
                    size = object.size,
                    "change archived"
                );

                let event = NotificationEvent::new(
                    operation,
                    data,
                    self.clock.now(),
                    self.config.subject.clone(),
                    self.config.data_version.clone(),
                );
                match self.publisher.publish(event).await {
                    Ok(envelope_id) => {
                        tracing::info!(
                            operation = %operation,
                            object_key = %object.key,
                            file_name = %object.key,
                            envelope_id = %envelope_id,
                            "change archived and published"
                        );
                        Outcome::Published {
                            operation,
                            object,
                            envelope_id,
                        }
                    }
                    Err(error) => {
                        tracing::error!(
                            operation = %operation,
                            object_key = %object.key,
                            error = %error,
                            "change archived but notification failed; reconcile manually"
                        );
                        Outcome::PublishFailed {
                            operation,
                            object,
                            error,
                        }
                    }
                }
            }
        };

        self.monitor.record_outcome(&outcome);
        outcome
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
