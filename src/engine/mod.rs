//! Storage engine contract and reference implementations
//!
//! The orchestrator never owns the ledger: it loads a snapshot, issues
//! add/remove intents, and drives the lock marker through exactly the five
//! operations below. Everything else about persistence (format, location,
//! retries) belongs to the engine.

pub mod file;
pub mod memory;

pub use file::FileEngine;
pub use memory::MemoryEngine;

use async_trait::async_trait;

use crate::definitions::LedgerEntry;
use crate::error::MigrateResult;

/// Pluggable ledger backend
///
/// Implementations are injected into [`crate::migrator::Migrator`] at
/// construction. Every operation may fail with
/// [`crate::error::MigrateError::Storage`]; such failures propagate to the
/// caller unchanged — the core performs no retries.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Load the full ledger of applied migrations
    async fn load(&self) -> MigrateResult<Vec<LedgerEntry>>;

    /// Append applied migrations without dropping or reordering existing entries
    async fn add(&self, entries: &[LedgerEntry]) -> MigrateResult<()>;

    /// Remove reverted migrations, matching by name
    async fn remove(&self, entries: &[LedgerEntry]) -> MigrateResult<()>;

    /// Acquire the mutual-exclusion marker
    ///
    /// Returns `true` if the marker was newly created by this call, `false`
    /// if it already existed (another run is in progress — a signal, not an
    /// error). Any other failure to create or check the marker is a hard
    /// storage error.
    async fn acquire_lock(&self) -> MigrateResult<bool>;

    /// Remove the mutual-exclusion marker
    ///
    /// Must be safe to call even if acquisition only partially succeeded.
    async fn release_lock(&self) -> MigrateResult<()>;
}
