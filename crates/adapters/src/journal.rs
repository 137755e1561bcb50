// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared call journal for asserting ordering across fake adapters
#![cfg_attr(coverage_nightly, coverage(off))]

use std::sync::{Arc, Mutex};

/// One recorded adapter call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    /// Object store create attempt for a key
    Create(String),
    /// Event sink send attempt referencing a file name
    Send(String),
}

/// Append-only log shared by several fakes
#[derive(Clone, Default)]
pub struct CallJournal {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: JournalEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
