// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local filesystem object store

use super::{ObjectStore, StorageError};
use async_trait::async_trait;
use ct_core::{AccessControl, ObjectKey};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Object store rooted at a directory; containers are subdirectories
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, StorageError> {
        check_segment(container)?;
        Ok(self.root.join(container))
    }

    fn object_path(&self, container: &str, key: &ObjectKey) -> Result<PathBuf, StorageError> {
        check_segment(key.as_str())?;
        Ok(self.container_dir(container)?.join(key.as_str()))
    }
}

/// Containers and keys are single path segments
fn check_segment(segment: &str) -> Result<(), StorageError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || segment.contains('\\')
    {
        return Err(StorageError::InvalidPath(segment.to_string()));
    }
    Ok(())
}

fn map_io(path: &Path, error: std::io::Error) -> StorageError {
    let target = path.display().to_string();
    match error.kind() {
        ErrorKind::AlreadyExists => StorageError::AlreadyExists(target),
        ErrorKind::PermissionDenied => StorageError::Denied(target),
        _ => StorageError::Io(format!("{}: {}", target, error)),
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn create(
        &self,
        container: &str,
        key: &ObjectKey,
        content: &[u8],
    ) -> Result<u64, StorageError> {
        let dir = self.container_dir(container)?;
        let path = self.object_path(container, key)?;

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| map_io(&dir, e))?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| map_io(&path, e))?;
        file.write_all(content)
            .await
            .map_err(|e| map_io(&path, e))?;
        file.flush().await.map_err(|e| map_io(&path, e))?;
        file.sync_all().await.map_err(|e| map_io(&path, e))?;

        let metadata = file.metadata().await.map_err(|e| map_io(&path, e))?;
        Ok(metadata.len())
    }

    async fn set_access_control(
        &self,
        container: &str,
        key: &ObjectKey,
        acl: &AccessControl,
    ) -> Result<(), StorageError> {
        let path = self.object_path(container, key)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(acl.mode());
            tokio::fs::set_permissions(&path, permissions)
                .await
                .map_err(|e| map_io(&path, e))?;
        }

        #[cfg(not(unix))]
        {
            tokio::fs::metadata(&path)
                .await
                .map_err(|e| map_io(&path, e))?;
            tracing::debug!(%acl, "access control not supported on this platform");
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
