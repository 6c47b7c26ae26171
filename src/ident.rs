//! Migration identifiers
//!
//! An identifier is a `<timestamp>-<slug>` string: a decimal timestamp
//! prefix followed by a word/hyphen slug. Ordering is lexicographic on the
//! full string, which equals timestamp ordering for identifiers generated
//! by this system (millisecond prefixes share a width for centuries).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MigrateError;

/// A validated migration identifier of the form `<timestamp>-<slug>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationId(String);

impl MigrationId {
    /// The full identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The decimal timestamp prefix, without the slug
    pub fn timestamp_prefix(&self) -> &str {
        match self.0.split_once('-') {
            Some((prefix, _)) => prefix,
            None => &self.0,
        }
    }

    fn is_valid(s: &str) -> bool {
        let Some((prefix, slug)) = s.split_once('-') else {
            return false;
        };
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        !slug.is_empty()
            && slug
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    }
}

impl FromStr for MigrationId {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(MigrationId(s.to_string()))
        } else {
            Err(MigrateError::InvalidIdentifier(s.to_string()))
        }
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
