// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connector configuration
//!
//! Loaded from a TOML file. Secrets are never stored in the file: the topic
//! key is read from the environment variable named by `publish.key_env`.

use crate::change::FullDocument;
use crate::notification::{DEFAULT_DATA_VERSION, DEFAULT_SUBJECT};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level connector configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub feed: FeedConfig,
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl Config {
    /// Read, parse and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::parse(&content)
    }

    /// Parse and validate config text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let container = &self.archive.container;
        if container.trim().is_empty() {
            return Err(ConfigError::Invalid("archive.container must not be empty".into()));
        }
        if container.contains(['/', '\\']) || container == "." || container == ".." {
            return Err(ConfigError::Invalid(format!(
                "archive.container must be a single path segment: {}",
                container
            )));
        }
        if self.publish.sink == SinkKind::Http && self.publish.endpoint.is_none() {
            return Err(ConfigError::Invalid(
                "publish.endpoint is required for the http sink".into(),
            ));
        }
        if self.publish.timeout.is_zero() {
            return Err(ConfigError::Invalid("publish.timeout must be non-zero".into()));
        }
        Ok(())
    }
}

/// Where change events are read from
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    #[default]
    Stdin,
    Path(PathBuf),
}

/// Change feed settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    /// Name of the watched collection (for logs only)
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub source: FeedSource,
    #[serde(default)]
    pub full_document: FullDocument,
}

/// Archive store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Root of the hierarchical store
    pub root: PathBuf,
    /// Logical container: directory name and object key prefix
    pub container: String,
}

/// Which event sink receives notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Http,
    #[default]
    Noop,
}

/// Notification publishing settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    #[serde(default)]
    pub sink: SinkKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable holding the topic key
    #[serde(default = "default_key_env")]
    pub key_env: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_data_version")]
    pub data_version: String,
}

impl PublishConfig {
    /// Topic key from the environment, if set and non-empty
    pub fn topic_key(&self) -> Option<String> {
        std::env::var(&self.key_env).ok().filter(|k| !k.is_empty())
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::default(),
            endpoint: None,
            key_env: default_key_env(),
            timeout: default_timeout(),
            subject: default_subject(),
            data_version: default_data_version(),
        }
    }
}

/// Whether a fatally terminated pipeline is replaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestartMode {
    #[default]
    Always,
    Never,
}

/// Supervisor restart policy
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorConfig {
    #[serde(default)]
    pub restart: RestartMode,
    /// Upper bound on restarts; unbounded when absent
    #[serde(default)]
    pub max_restarts: Option<u32>,
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,
}

impl SupervisorConfig {
    /// Whether another restart is allowed after `restarts` so far
    pub fn allows_restart(&self, restarts: u32) -> bool {
        match self.restart {
            RestartMode::Never => false,
            RestartMode::Always => self.max_restarts.is_none_or(|max| restarts < max),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart: RestartMode::default(),
            max_restarts: None,
            backoff: default_backoff(),
        }
    }
}

/// Process-level settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Log file; logs go to stdout when absent
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// Single-instance lock file
    #[serde(default)]
    pub lock_path: Option<PathBuf>,
    /// Liveness endpoint address
    #[serde(default)]
    pub listen: Option<SocketAddr>,
}

fn default_key_env() -> String {
    "CHANGETAIL_TOPIC_KEY".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

fn default_data_version() -> String {
    DEFAULT_DATA_VERSION.to_string()
}

fn default_backoff() -> Duration {
    Duration::from_secs(5)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
