// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake change feed for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ChangeFeed, ChangeStream, FeedError};
use async_trait::async_trait;
use ct_core::{ChangeEvent, WatchOptions};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// One scripted step delivered by the fake stream
#[derive(Debug, Clone)]
enum FeedStep {
    Entry(Option<ChangeEvent>),
    Fail(FeedError),
}

#[derive(Default)]
struct FakeFeedState {
    script: VecDeque<FeedStep>,
    opens: Vec<WatchOptions>,
    open_failures: VecDeque<FeedError>,
    hold_open: bool,
}

/// Fake change feed that replays a shared script.
///
/// Every opened stream pops from the same script, so a reopened
/// subscription continues where the previous one stopped. Once the script is
/// exhausted the stream reports `Closed`, or parks until [`close`] when
/// [`hold_open`] is set.
///
/// [`close`]: FakeChangeFeed::close
/// [`hold_open`]: FakeChangeFeed::hold_open
#[derive(Clone, Default)]
pub struct FakeChangeFeed {
    state: Arc<Mutex<FakeFeedState>>,
    released: Arc<Notify>,
    parked: Arc<Notify>,
}

impl FakeChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeFeedState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    pub fn push_change(&self, event: ChangeEvent) {
        self.with_state(|s| s.script.push_back(FeedStep::Entry(Some(event))));
    }

    pub fn push_empty(&self) {
        self.with_state(|s| s.script.push_back(FeedStep::Entry(None)));
    }

    pub fn push_error(&self, error: FeedError) {
        self.with_state(|s| s.script.push_back(FeedStep::Fail(error)));
    }

    pub fn fail_next_open(&self, error: FeedError) {
        self.with_state(|s| s.open_failures.push_back(error));
    }

    /// Keep streams open after the script runs out
    pub fn hold_open(&self) {
        self.with_state(|s| s.hold_open = true);
    }

    /// Release parked streams; they report `Closed`
    pub fn close(&self) {
        self.with_state(|s| s.hold_open = false);
        self.released.notify_waiters();
    }

    /// Wait until a stream has consumed the whole script and parked.
    ///
    /// Everything delivered before parking has been fully handled by the
    /// consumer, since it only asks for the next entry once done.
    pub async fn wait_parked(&self) {
        self.parked.notified().await;
    }

    pub fn opens(&self) -> Vec<WatchOptions> {
        self.with_state(|s| s.opens.clone())
    }

    pub fn open_count(&self) -> usize {
        self.with_state(|s| s.opens.len())
    }

    pub fn remaining(&self) -> usize {
        self.with_state(|s| s.script.len())
    }
}

#[async_trait]
impl ChangeFeed for FakeChangeFeed {
    type Stream = FakeChangeStream;

    async fn open(&self, options: &WatchOptions) -> Result<Self::Stream, FeedError> {
        self.with_state(|s| {
            s.opens.push(options.clone());
            match s.open_failures.pop_front() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        })?;
        Ok(FakeChangeStream { feed: self.clone() })
    }
}

/// Stream handed out by [`FakeChangeFeed`]
pub struct FakeChangeStream {
    feed: FakeChangeFeed,
}

#[async_trait]
impl ChangeStream for FakeChangeStream {
    async fn next(&mut self) -> Result<Option<ChangeEvent>, FeedError> {
        // Registered before reading state so a concurrent close() is not missed
        let released = self.feed.released.notified();
        let (step, hold) = self
            .feed
            .with_state(|s| (s.script.pop_front(), s.hold_open));

        match step {
            Some(FeedStep::Entry(entry)) => Ok(entry),
            Some(FeedStep::Fail(error)) => Err(error),
            None if hold => {
                self.feed.parked.notify_one();
                released.await;
                Err(FeedError::Closed)
            }
            None => Err(FeedError::Closed),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
