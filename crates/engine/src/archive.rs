// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive writer: one JSON object per change record

use ct_adapters::{ObjectStore, StorageError};
use ct_core::{AccessControl, ArchivedObject, Document, ObjectKey};

/// Writes change documents into a container of an object store
#[derive(Clone)]
pub struct ArchiveWriter<S> {
    store: S,
    container: String,
}

impl<S: ObjectStore> ArchiveWriter<S> {
    pub fn new(store: S, container: impl Into<String>) -> Self {
        Self {
            store,
            container: container.into(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Create `key` holding the serialized document, then apply the archive ACL.
    ///
    /// A write the store confirms as zero bytes is an error even though the
    /// object exists.
    pub async fn write(
        &self,
        document: &Document,
        key: &ObjectKey,
    ) -> Result<ArchivedObject, StorageError> {
        let content = document
            .to_json_bytes()
            .map_err(|e| StorageError::Encode(e.to_string()))?;

        let size = self.store.create(&self.container, key, &content).await?;
        if size == 0 {
            return Err(StorageError::EmptyWrite(key.to_string()));
        }

        self.store
            .set_access_control(&self.container, key, &AccessControl::archive_default())
            .await?;

        Ok(ArchivedObject {
            container: self.container.clone(),
            key: key.clone(),
            size,
        })
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
