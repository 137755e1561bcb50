// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change feed read from a stream of JSON lines.
//!
//! Each line is one change stream entry in the document database's wire
//! shape:
//!
//! ```json
//! {"_id": {"_data": "8263..."}, "operationType": "insert",
//!  "fullDocument": {"_id": 1, "name": "a"}, "documentKey": {"_id": 1}}
//! ```
//!
//! Blank lines and `null` are empty entries. Operation kinds other than
//! insert/update/delete (drop, rename, invalidate, ...) are skipped.

use super::{ChangeFeed, ChangeStream, FeedError};
use async_trait::async_trait;
use ct_core::{
    ChangeEvent, Document, FeedSource, FullDocument, OperationKind, ResumeToken, WatchOptions,
};
use serde::Deserialize;
use std::io::ErrorKind;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

/// Feed that reads JSON lines from stdin or a file
#[derive(Clone, Debug)]
pub struct JsonLinesFeed {
    source: FeedSource,
}

impl JsonLinesFeed {
    pub fn new(source: FeedSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }
}

#[async_trait]
impl ChangeFeed for JsonLinesFeed {
    type Stream = JsonLinesStream;

    async fn open(&self, options: &WatchOptions) -> Result<Self::Stream, FeedError> {
        let reader: Box<dyn AsyncRead + Send + Unpin> = match &self.source {
            FeedSource::Stdin => Box::new(tokio::io::stdin()),
            FeedSource::Path(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    FeedError::Fatal(format!("cannot open {}: {}", path.display(), e))
                })?;
                Box::new(file)
            }
        };

        Ok(JsonLinesStream {
            lines: BufReader::new(reader).lines(),
            skip_until: options.resume_after.clone(),
            options: options.clone(),
        })
    }
}

/// Open subscription over a JSON lines reader
pub struct JsonLinesStream {
    lines: Lines<BufReader<Box<dyn AsyncRead + Send + Unpin>>>,
    options: WatchOptions,
    /// Entries up to and including this token were already processed
    skip_until: Option<ResumeToken>,
}

#[async_trait]
impl ChangeStream for JsonLinesStream {
    async fn next(&mut self) -> Result<Option<ChangeEvent>, FeedError> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    return Err(match &self.skip_until {
                        Some(target) => {
                            FeedError::Fatal(format!("resume token {} not found in feed", target))
                        }
                        None => FeedError::Closed,
                    })
                }
                Err(e) => return Err(classify_io(e)),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == "null" {
                if self.skip_until.is_some() {
                    continue;
                }
                return Ok(None);
            }

            let entry: WireChange = serde_json::from_str(trimmed)
                .map_err(|e| FeedError::Transient(format!("malformed change entry: {}", e)))?;
            let token = entry.id.as_ref().map(token_of);

            if let Some(target) = &self.skip_until {
                if token.as_ref() == Some(target) {
                    tracing::debug!(token = %target, "resumed after token");
                    self.skip_until = None;
                }
                continue;
            }

            let Some(operation) = OperationKind::from_feed(&entry.operation_type) else {
                tracing::trace!(operation = %entry.operation_type, "skipping entry");
                continue;
            };
            if !self.options.wants(operation) {
                continue;
            }

            let document = entry.into_document(operation, self.options.full_document);
            let mut event = ChangeEvent::new(operation, document);
            if let Some(token) = token {
                event = event.with_resume_token(token);
            }
            return Ok(Some(event));
        }
    }
}

fn classify_io(error: std::io::Error) -> FeedError {
    match error.kind() {
        // InvalidData is a line that is not UTF-8; later lines are still readable
        ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::InvalidData => {
            FeedError::Transient(error.to_string())
        }
        ErrorKind::UnexpectedEof => FeedError::Closed,
        _ => FeedError::Fatal(error.to_string()),
    }
}

/// Resume tokens are either a bare string or an object carrying `_data`
fn token_of(id: &serde_json::Value) -> ResumeToken {
    match id {
        serde_json::Value::String(s) => ResumeToken(s.clone()),
        serde_json::Value::Object(map) => match map.get("_data") {
            Some(serde_json::Value::String(data)) => ResumeToken(data.clone()),
            _ => ResumeToken(id.to_string()),
        },
        other => ResumeToken(other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChange {
    #[serde(rename = "_id", default)]
    id: Option<serde_json::Value>,
    operation_type: String,
    #[serde(default)]
    full_document: Option<Document>,
    #[serde(default)]
    document_key: Option<Document>,
    #[serde(default)]
    full_document_before_change: Option<Document>,
    #[serde(default)]
    update_description: Option<UpdateDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDescription {
    #[serde(default)]
    updated_fields: Document,
}

impl WireChange {
    fn into_document(self, operation: OperationKind, mode: FullDocument) -> Document {
        match (operation, mode) {
            (OperationKind::Insert, _) | (OperationKind::Update, FullDocument::UpdateLookup) => self
                .full_document
                .or(self.document_key)
                .unwrap_or_default(),
            (OperationKind::Update, FullDocument::Delta) => {
                let mut document = self.document_key.unwrap_or_default();
                if let Some(description) = self.update_description {
                    document.merge(description.updated_fields);
                }
                document
            }
            (OperationKind::Delete, _) => self
                .full_document_before_change
                .or(self.document_key)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
