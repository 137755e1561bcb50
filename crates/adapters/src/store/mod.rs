// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hierarchical object store adapters

mod fs;

pub use fs::FsObjectStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeObjectStore, StoreCall};

use async_trait::async_trait;
use ct_core::{AccessControl, ObjectKey};
use thiserror::Error;

/// Errors from object store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("object already exists: {0}")]
    AlreadyExists(String),
    #[error("access denied: {0}")]
    Denied(String),
    #[error("invalid object path: {0}")]
    InvalidPath(String),
    #[error("storage io error: {0}")]
    Io(String),
    #[error("write to {0} confirmed zero bytes")]
    EmptyWrite(String),
    #[error("failed to encode document: {0}")]
    Encode(String),
}

/// Store addressing objects as `<container>/<key>`
#[async_trait]
pub trait ObjectStore: Clone + Send + Sync + 'static {
    /// Create a new object holding `content`.
    ///
    /// Fails with `AlreadyExists` rather than overwriting. Returns the size
    /// the store confirms after the write is flushed.
    async fn create(
        &self,
        container: &str,
        key: &ObjectKey,
        content: &[u8],
    ) -> Result<u64, StorageError>;

    /// Apply an access control descriptor to an existing object
    async fn set_access_control(
        &self,
        container: &str,
        key: &ObjectKey,
        acl: &AccessControl,
    ) -> Result<(), StorageError>;
}
