// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake object store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ObjectStore, StorageError};
use crate::journal::{CallJournal, JournalEntry};
use async_trait::async_trait;
use ct_core::{AccessControl, ObjectKey};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create {
        container: String,
        key: ObjectKey,
        content: Vec<u8>,
    },
    SetAccessControl {
        container: String,
        key: ObjectKey,
        acl: AccessControl,
    },
}

#[derive(Debug)]
enum CreateFault {
    Fail(StorageError),
    /// Create succeeds but the store confirms nothing was written
    ZeroBytes,
}

#[derive(Default)]
struct FakeStoreState {
    objects: HashMap<(String, ObjectKey), Vec<u8>>,
    acls: HashMap<(String, ObjectKey), AccessControl>,
    calls: Vec<StoreCall>,
    create_faults: VecDeque<CreateFault>,
    acl_faults: VecDeque<StorageError>,
}

/// In-memory object store that records calls
#[derive(Clone, Default)]
pub struct FakeObjectStore {
    state: Arc<Mutex<FakeStoreState>>,
    journal: Option<CallJournal>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record create attempts into a journal shared with other fakes
    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeStoreState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    pub fn fail_next_create(&self, error: StorageError) {
        self.with_state(|s| s.create_faults.push_back(CreateFault::Fail(error)));
    }

    pub fn confirm_zero_bytes_next(&self) {
        self.with_state(|s| s.create_faults.push_back(CreateFault::ZeroBytes));
    }

    pub fn fail_next_access_control(&self, error: StorageError) {
        self.with_state(|s| s.acl_faults.push_back(error));
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn object(&self, container: &str, key: &ObjectKey) -> Option<Vec<u8>> {
        self.with_state(|s| s.objects.get(&(container.to_string(), key.clone())).cloned())
    }

    pub fn access_control(&self, container: &str, key: &ObjectKey) -> Option<AccessControl> {
        self.with_state(|s| s.acls.get(&(container.to_string(), key.clone())).copied())
    }

    pub fn object_count(&self) -> usize {
        self.with_state(|s| s.objects.len())
    }

    /// Keys of every created object, in creation order
    pub fn created_keys(&self) -> Vec<ObjectKey> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter_map(|call| match call {
                    StoreCall::Create { key, .. } => Some(key.clone()),
                    StoreCall::SetAccessControl { .. } => None,
                })
                .collect()
        })
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn create(
        &self,
        container: &str,
        key: &ObjectKey,
        content: &[u8],
    ) -> Result<u64, StorageError> {
        if let Some(journal) = &self.journal {
            journal.record(JournalEntry::Create(key.to_string()));
        }

        self.with_state(|s| {
            s.calls.push(StoreCall::Create {
                container: container.to_string(),
                key: key.clone(),
                content: content.to_vec(),
            });

            let slot = (container.to_string(), key.clone());
            if s.objects.contains_key(&slot) {
                return Err(StorageError::AlreadyExists(key.to_string()));
            }

            match s.create_faults.pop_front() {
                Some(CreateFault::Fail(error)) => Err(error),
                Some(CreateFault::ZeroBytes) => {
                    s.objects.insert(slot, Vec::new());
                    Ok(0)
                }
                None => {
                    s.objects.insert(slot, content.to_vec());
                    Ok(content.len() as u64)
                }
            }
        })
    }

    async fn set_access_control(
        &self,
        container: &str,
        key: &ObjectKey,
        acl: &AccessControl,
    ) -> Result<(), StorageError> {
        self.with_state(|s| {
            s.calls.push(StoreCall::SetAccessControl {
                container: container.to_string(),
                key: key.clone(),
                acl: *acl,
            });

            if let Some(error) = s.acl_faults.pop_front() {
                return Err(error);
            }

            let slot = (container.to_string(), key.clone());
            if !s.objects.contains_key(&slot) {
                return Err(StorageError::Io(format!("no such object: {}", key)));
            }
            s.acls.insert(slot, *acl);
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
