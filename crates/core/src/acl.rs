// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POSIX-style access-control policies for archived objects
//!
//! Only the owner/group/other base entries are supported
//! (`user::rwx,group::r-x,other::---`); named user or group entries are
//! rejected.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Policy applied to every archived object
pub const ARCHIVE_ACL: &str = "user::rwx,group::rwx,other::rw-";

/// Errors parsing an access-control string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AclError {
    #[error("malformed acl entry: {0}")]
    MalformedEntry(String),
    #[error("unsupported acl scope: {0}")]
    UnsupportedScope(String),
    #[error("duplicate acl entry for {0}")]
    Duplicate(String),
    #[error("acl is missing the {0} entry")]
    Missing(&'static str),
}

/// Read/write/execute bits for one scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Permissions {
    fn parse(perms: &str, entry: &str) -> Result<Self, AclError> {
        let malformed = || AclError::MalformedEntry(entry.to_string());
        let bytes = perms.as_bytes();
        if bytes.len() != 3 {
            return Err(malformed());
        }
        let bit = |b: u8, expected: u8| match b {
            b'-' => Ok(false),
            b if b == expected => Ok(true),
            _ => Err(malformed()),
        };
        Ok(Self {
            read: bit(bytes[0], b'r')?,
            write: bit(bytes[1], b'w')?,
            execute: bit(bytes[2], b'x')?,
        })
    }

    /// Octal digit for this scope
    pub fn bits(&self) -> u32 {
        (u32::from(self.read) << 2) | (u32::from(self.write) << 1) | u32::from(self.execute)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read, 'r'),
            flag(self.write, 'w'),
            flag(self.execute, 'x')
        )
    }
}

/// Owner/group/other access-control list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessControl {
    pub user: Permissions,
    pub group: Permissions,
    pub other: Permissions,
}

impl AccessControl {
    /// The fixed policy for archived objects
    pub fn archive_default() -> Self {
        let all = Permissions {
            read: true,
            write: true,
            execute: true,
        };
        Self {
            user: all,
            group: all,
            other: Permissions {
                read: true,
                write: true,
                execute: false,
            },
        }
    }

    /// Equivalent POSIX file mode (e.g. `0o776`)
    pub fn mode(&self) -> u32 {
        (self.user.bits() << 6) | (self.group.bits() << 3) | self.other.bits()
    }
}

impl FromStr for AccessControl {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut user = None;
        let mut group = None;
        let mut other = None;

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut parts = entry.splitn(3, ':');
            let (Some(scope), Some(qualifier), Some(perms)) =
                (parts.next(), parts.next(), parts.next())
            else {
                return Err(AclError::MalformedEntry(entry.to_string()));
            };
            if !qualifier.is_empty() {
                return Err(AclError::UnsupportedScope(format!("{}:{}", scope, qualifier)));
            }

            let slot = match scope {
                "user" => &mut user,
                "group" => &mut group,
                "other" => &mut other,
                _ => return Err(AclError::UnsupportedScope(scope.to_string())),
            };
            if slot.is_some() {
                return Err(AclError::Duplicate(scope.to_string()));
            }
            *slot = Some(Permissions::parse(perms, entry)?);
        }

        Ok(Self {
            user: user.ok_or(AclError::Missing("user"))?,
            group: group.ok_or(AclError::Missing("group"))?,
            other: other.ok_or(AclError::Missing("other"))?,
        })
    }
}

impl fmt::Display for AccessControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user::{},group::{},other::{}",
            self.user, self.group, self.other
        )
    }
}

#[cfg(test)]
#[path = "acl_tests.rs"]
mod tests;
