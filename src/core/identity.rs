//! Stable row identity using prefixed ULIDs
//!
//! Checklist rows have no natural key: two rows may share every visible
//! column. Each row therefore carries a synthetic `RowId` assigned when the
//! row is created, so merges and deletes reference rows by ID rather than by
//! their transient position in the table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Prefix shared by every row identifier
pub const ROW_PREFIX: &str = "ROW";

/// A unique checklist row identifier (`ROW-<ULID>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId {
    ulid: Ulid,
}

impl RowId {
    /// Create a fresh identifier
    pub fn new() -> Self {
        Self { ulid: Ulid::new() }
    }

    /// Create a RowId from an existing ULID
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self { ulid }
    }

    /// Get the ULID component
    pub fn ulid(&self) -> Ulid {
        self.ulid
    }

    /// Parse a RowId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }

    /// Abbreviated form for tables: the last 8 ULID characters
    ///
    /// The leading ULID characters encode the creation time and repeat
    /// across rows created together; the tail is random.
    pub fn short(&self) -> String {
        let ulid = self.ulid.to_string();
        ulid[ulid.len() - 8..].to_string()
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", ROW_PREFIX, self.ulid)
    }
}

impl FromStr for RowId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        if !prefix.eq_ignore_ascii_case(ROW_PREFIX) {
            return Err(IdParseError::InvalidPrefix(prefix.to_string()));
        }

        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { ulid })
    }
}

impl Serialize for RowId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing row IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid row prefix: '{0}' (expected ROW)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in row ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),
}
