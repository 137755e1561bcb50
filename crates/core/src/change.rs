// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change feed entries
//!
//! A [`ChangeEvent`] is what a change feed yields. The pipeline stamps it with
//! the time it was observed and strips the store's identity field, turning it
//! into a [`ChangeRecord`].

use crate::value::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-internal identity field; never archived or published
pub const IDENTITY_FIELD: &str = "_id";

/// The kind of mutation observed on the watched collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [Self::Insert, Self::Update, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Parse a feed operation name, returning `None` for kinds the connector
    /// does not propagate (replace, drop, invalidate, ...)
    pub fn from_feed(name: &str) -> Option<Self> {
        match name {
            "insert" => Some(Self::Insert),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque change feed position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeToken(pub String);

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResumeToken {
    fn from(s: &str) -> Self {
        ResumeToken(s.to_string())
    }
}

/// How update entries carry their document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullDocument {
    /// Look up the whole current document for updates
    #[default]
    UpdateLookup,
    /// Only the changed fields (over the document key)
    Delta,
}

/// Subscription parameters handed to a change feed when it is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    pub operations: Vec<OperationKind>,
    pub full_document: FullDocument,
    pub resume_after: Option<ResumeToken>,
}

impl WatchOptions {
    pub fn resume_after(mut self, token: Option<ResumeToken>) -> Self {
        self.resume_after = token;
        self
    }

    pub fn with_full_document(mut self, mode: FullDocument) -> Self {
        self.full_document = mode;
        self
    }

    pub fn wants(&self, kind: OperationKind) -> bool {
        self.operations.contains(&kind)
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            operations: OperationKind::ALL.to_vec(),
            full_document: FullDocument::UpdateLookup,
            resume_after: None,
        }
    }
}

/// One entry as yielded by a change feed
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub operation: OperationKind,
    /// Post-change document (insert/update) or pre-change identity (delete)
    pub document: Document,
    pub resume_token: Option<ResumeToken>,
}

impl ChangeEvent {
    pub fn new(operation: OperationKind, document: Document) -> Self {
        Self {
            operation,
            document,
            resume_token: None,
        }
    }

    pub fn with_resume_token(mut self, token: impl Into<ResumeToken>) -> Self {
        self.resume_token = Some(token.into());
        self
    }
}

/// A change entry as processed by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub operation: OperationKind,
    pub document: Document,
    pub resume_token: Option<ResumeToken>,
    /// When the pipeline received the entry
    pub observed_at: DateTime<Utc>,
}

impl ChangeRecord {
    /// Normalize a feed entry: stamp it and strip the identity field
    pub fn observe(event: ChangeEvent, observed_at: DateTime<Utc>) -> Self {
        let mut document = event.document;
        document.remove(IDENTITY_FIELD);
        Self {
            operation: event.operation,
            document,
            resume_token: event.resume_token,
            observed_at,
        }
    }
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
