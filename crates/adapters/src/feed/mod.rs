// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change feed adapters

mod jsonl;

pub use jsonl::JsonLinesFeed;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeChangeFeed, FakeChangeStream};

use async_trait::async_trait;
use ct_core::{ChangeEvent, WatchOptions};
use thiserror::Error;

/// Errors from the change feed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Reading one entry failed; the subscription is still usable
    #[error("transient feed error: {0}")]
    Transient(String),
    /// The subscription ended
    #[error("change feed closed")]
    Closed,
    /// The subscription failed and cannot continue
    #[error("change feed failed: {0}")]
    Fatal(String),
}

impl FeedError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FeedError::Transient(_))
    }
}

/// Source of change events for one watched collection
#[async_trait]
pub trait ChangeFeed: Clone + Send + Sync + 'static {
    type Stream: ChangeStream;

    /// Open a subscription
    async fn open(&self, options: &WatchOptions) -> Result<Self::Stream, FeedError>;
}

/// An open change feed subscription
#[async_trait]
pub trait ChangeStream: Send + 'static {
    /// Wait for the next entry.
    ///
    /// `Ok(None)` is an empty entry: the feed produced something, but there is
    /// no change to propagate.
    async fn next(&mut self) -> Result<Option<ChangeEvent>, FeedError>;
}
