//! Core types and structures for the migration system
//!
//! Defines the ledger entry shape, execution direction, per-operation
//! options, run reports, and the orchestrator configuration.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ident::MigrationId;

/// One successfully applied migration, as recorded in the ledger
///
/// `applied_at` is the shared batch timestamp: every entry produced by a
/// single `up` invocation carries the identical instant, which is what
/// makes rollback-by-batch possible. The same shape is returned by the
/// execution runner for each completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Migration identifier
    pub name: MigrationId,
    /// When the batch containing this migration was applied
    pub applied_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(name: MigrationId, applied_at: DateTime<Utc>) -> Self {
        Self { name, applied_at }
    }
}

/// Execution direction; `rollback` executes [`Direction::Down`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Run the migration's forward procedure
    Up,
    /// Run the migration's backward procedure
    Down,
}

/// Options for the `up` operation
#[derive(Debug, Clone, Default)]
pub struct UpOptions {
    /// Skip unran migrations older than the most recently applied one
    pub ignore_past: bool,
    /// Apply up to and including this migration
    pub until: Option<MigrationId>,
    /// Apply at most this many pending migrations
    pub count: Option<usize>,
    /// Apply exactly `until`, nothing else (requires `until`)
    pub only: bool,
    /// Compute and report the selection without executing anything
    pub dry_run: bool,
}

/// Options for the `down` operation
///
/// A downward migration always requires a target: either `until` or `count`.
#[derive(Debug, Clone, Default)]
pub struct DownOptions {
    /// Revert back through and including this migration
    pub until: Option<MigrationId>,
    /// Revert at most this many applied migrations
    pub count: Option<usize>,
    /// Revert exactly `until`, nothing else (requires `until`)
    pub only: bool,
    /// Compute and report the selection without executing anything
    pub dry_run: bool,
}

/// Options for the `rollback` operation
#[derive(Debug, Clone, Default)]
pub struct RollbackOptions {
    /// Compute and report the selection without executing anything
    pub dry_run: bool,
}

/// Outcome of an orchestrated operation
#[derive(Debug)]
pub enum RunReport {
    /// Nothing was selected; there is nothing to do
    Noop,
    /// Dry run: the migrations that would have been executed, in order
    DryRun(Vec<MigrationId>),
    /// Another run holds the lock; no migration was executed
    LockContended,
    /// The batch completed and was persisted
    Completed {
        /// One entry per executed migration, in execution order
        entries: Vec<LedgerEntry>,
        /// Total execution time in milliseconds
        execution_time_ms: u128,
    },
}

impl RunReport {
    /// The identifiers this operation executed (or would execute, for a dry run)
    pub fn names(&self) -> Vec<MigrationId> {
        match self {
            RunReport::Noop | RunReport::LockContended => Vec::new(),
            RunReport::DryRun(names) => names.clone(),
            RunReport::Completed { entries, .. } => {
                entries.iter().map(|e| e.name.clone()).collect()
            }
        }
    }
}

/// Status of a single migration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Present on disk but not recorded in the ledger
    Pending,
    /// Recorded in the ledger
    Applied {
        /// Batch timestamp under which it was applied
        applied_at: DateTime<Utc>,
    },
}

/// Configuration for the migration orchestrator
///
/// Passed by value into [`crate::migrator::Migrator::new`]; there is no
/// ambient global configuration.
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Directory where migration files are scaffolded and listed
    pub migrations_dir: PathBuf,
    /// How long a single forward/backward invocation may run
    pub timeout: Duration,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            timeout: Duration::from_secs(30),
        }
    }
}
