// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Downstream notifications
//!
//! A notification points at an archived object; it never carries the
//! document itself.

use crate::change::OperationKind;
use crate::object::ObjectKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SUBJECT: &str = "MongoDB Change Stream Connector";
pub const DEFAULT_DATA_VERSION: &str = "1.0";

/// Reference payload carried by a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub file_name: String,
}

impl NotificationData {
    pub fn for_object(key: &ObjectKey) -> Self {
        Self {
            file_name: key.to_string(),
        }
    }
}

/// Announcement that an archived object now exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub event_type: String,
    pub data: NotificationData,
    pub event_time: DateTime<Utc>,
    pub subject: String,
    pub version: String,
}

impl NotificationEvent {
    pub fn new(
        operation: OperationKind,
        data: NotificationData,
        event_time: DateTime<Utc>,
        subject: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            event_type: operation.to_string(),
            data,
            event_time,
            subject: subject.into(),
            version: version.into(),
        }
    }

    /// Wrap in a sink envelope with the given envelope id
    pub fn into_envelope(self, id: String) -> EventEnvelope {
        EventEnvelope {
            id,
            event_type: self.event_type,
            subject: self.subject,
            event_time: self.event_time,
            data: self.data,
            data_version: self.version,
        }
    }
}

/// Wire form of one published event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub id: String,
    pub event_type: String,
    pub subject: String,
    pub event_time: DateTime<Utc>,
    pub data: NotificationData,
    pub data_version: String,
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
