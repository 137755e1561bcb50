// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive object naming

use crate::id::IdGen;
use serde::{Deserialize, Serialize};
use std::fmt;

const JSON_SUFFIX: &str = ".json";

/// Name of one archived object: `<container>-<id>.json`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Generate a fresh key under the given container
    pub fn generate(container: &str, ids: &impl IdGen) -> Self {
        Self(format!("{}-{}{}", container, ids.next(), JSON_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key was generated for `container`
    pub fn belongs_to(&self, container: &str) -> bool {
        self.0
            .strip_prefix(container)
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(|rest| rest.len() > JSON_SUFFIX.len() && rest.ends_with(JSON_SUFFIX))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A confirmed archive write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedObject {
    pub container: String,
    pub key: ObjectKey,
    /// Confirmed byte count reported by the store
    pub size: u64,
}
