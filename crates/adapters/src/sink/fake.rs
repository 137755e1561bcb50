// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake event sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{EventSink, PublishError};
use crate::journal::{CallJournal, JournalEntry};
use async_trait::async_trait;
use ct_core::EventEnvelope;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeSinkState {
    sent: Vec<EventEnvelope>,
    attempts: usize,
    faults: VecDeque<PublishError>,
}

/// Event sink that records delivered envelopes
#[derive(Clone, Default)]
pub struct FakeEventSink {
    state: Arc<Mutex<FakeSinkState>>,
    journal: Option<CallJournal>,
}

impl FakeEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record send attempts into a journal shared with other fakes
    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeSinkState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    pub fn fail_next(&self, error: PublishError) {
        self.with_state(|s| s.faults.push_back(error));
    }

    /// Envelopes the sink accepted
    pub fn sent(&self) -> Vec<EventEnvelope> {
        self.with_state(|s| s.sent.clone())
    }

    pub fn attempts(&self) -> usize {
        self.with_state(|s| s.attempts)
    }
}

#[async_trait]
impl EventSink for FakeEventSink {
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), PublishError> {
        if let Some(journal) = &self.journal {
            journal.record(JournalEntry::Send(envelope.data.file_name.clone()));
        }

        self.with_state(|s| {
            s.attempts += 1;
            if let Some(error) = s.faults.pop_front() {
                return Err(error);
            }
            s.sent.push(envelope.clone());
            Ok(())
        })
    }
}
