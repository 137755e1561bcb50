// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the change feed, the archive store and the
//! notification sink

pub mod feed;
pub mod sink;
pub mod store;
pub mod traced;

#[cfg(any(test, feature = "test-support"))]
mod journal;

pub use feed::{ChangeFeed, ChangeStream, FeedError, JsonLinesFeed};
pub use sink::{EventSink, HttpEventSink, NoOpEventSink, PublishError};
pub use store::{FsObjectStore, ObjectStore, StorageError};
pub use traced::{TracedChangeFeed, TracedEventSink, TracedObjectStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use feed::{FakeChangeFeed, FakeChangeStream};
#[cfg(any(test, feature = "test-support"))]
pub use journal::{CallJournal, JournalEntry};
#[cfg(any(test, feature = "test-support"))]
pub use sink::FakeEventSink;
#[cfg(any(test, feature = "test-support"))]
pub use store::{FakeObjectStore, StoreCall};
