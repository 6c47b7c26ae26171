//! Error types for the migration orchestrator
//!
//! Every fallible operation in the crate returns [`MigrateResult`]. Lock
//! contention is intentionally not an error: it is reported through
//! [`crate::definitions::RunReport::LockContended`].

use std::time::Duration;

use thiserror::Error;

use crate::ident::MigrationId;

/// Result type for migration operations
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Error types for migration operations
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Invalid or missing operation parameters
    #[error("invalid arguments: {0}")]
    Arguments(String),

    /// A string that does not parse as `<timestamp>-<slug>`
    #[error("invalid migration identifier '{0}'")]
    InvalidIdentifier(String),

    /// An `only` target that is not a valid candidate for the operation
    #[error("migration '{0}' is not a valid target for this operation")]
    InvalidTarget(MigrationId),

    /// A selected migration has no backing file on disk
    #[error("migration '{0}' cannot be run down because it has no migration file")]
    MissingFile(MigrationId),

    /// The migration source cannot resolve an identifier to a unit of work
    #[error("unknown migration '{0}'")]
    UnknownMigration(MigrationId),

    /// A migration's forward/backward procedure failed
    #[error("migration '{name}' failed: {source}")]
    Execution {
        name: MigrationId,
        source: anyhow::Error,
    },

    /// A migration's forward/backward procedure exceeded the configured timeout
    #[error("migration '{name}' timed out after {timeout:?}")]
    Timeout {
        name: MigrationId,
        timeout: Duration,
    },

    /// Storage engine failure on load/add/remove/lock operations
    #[error("storage engine error: {0}")]
    Storage(String),

    /// Filesystem failure while scaffolding or listing migration files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
