// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP event sink posting envelopes to an event topic endpoint

use super::{EventSink, PublishError};
use async_trait::async_trait;
use ct_core::EventEnvelope;
use std::time::Duration;

/// Header carrying the topic access key
pub const KEY_HEADER: &str = "aeg-sas-key";

/// Posts each envelope as a one-element JSON array
#[derive(Clone, Debug)]
pub struct HttpEventSink {
    client: reqwest::Client,
    endpoint: String,
    key: Option<String>,
}

impl HttpEventSink {
    pub fn new(
        endpoint: impl Into<String>,
        key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), PublishError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(std::slice::from_ref(envelope));
        if let Some(key) = &self.key {
            request = request.header(KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                PublishError::Encode(e.to_string())
            } else {
                PublishError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(PublishError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
