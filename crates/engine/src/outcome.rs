// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-record processing outcome

use ct_adapters::{PublishError, StorageError};
use ct_core::{ArchivedObject, ObjectKey, OperationKind};

/// What happened to one feed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Empty entry; nothing was written or published
    NoOp,
    /// Archived and announced
    Published {
        operation: OperationKind,
        object: ArchivedObject,
        envelope_id: String,
    },
    /// The archive write failed; nothing was published
    ArchiveFailed {
        operation: OperationKind,
        object_key: ObjectKey,
        error: StorageError,
    },
    /// Archived, but the notification was not delivered
    PublishFailed {
        operation: OperationKind,
        object: ArchivedObject,
        error: PublishError,
    },
}

impl Outcome {
    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            Outcome::NoOp => None,
            Outcome::Published { operation, .. }
            | Outcome::ArchiveFailed { operation, .. }
            | Outcome::PublishFailed { operation, .. } => Some(*operation),
        }
    }

    /// Key of the object this entry was (or would have been) archived under
    pub fn object_key(&self) -> Option<&ObjectKey> {
        match self {
            Outcome::NoOp => None,
            Outcome::ArchiveFailed { object_key, .. } => Some(object_key),
            Outcome::Published { object, .. } | Outcome::PublishFailed { object, .. } => {
                Some(&object.key)
            }
        }
    }

    /// Whether an object exists in the archive for this entry
    pub fn is_archived(&self) -> bool {
        matches!(
            self,
            Outcome::Published { .. } | Outcome::PublishFailed { .. }
        )
    }
}
