//! In-memory storage engine for development and testing

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::StorageEngine;
use crate::definitions::LedgerEntry;
use crate::error::MigrateResult;

/// In-memory ledger engine
///
/// The ledger lives in a mutex-guarded `Vec`, newest entries first; the
/// lock marker is an atomic flag. Nothing survives the process.
#[derive(Default)]
pub struct MemoryEngine {
    ledger: Mutex<Vec<LedgerEntry>>,
    locked: AtomicBool,
}

impl MemoryEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine seeded with ledger entries (newest first)
    pub fn with_entries(entries: Vec<LedgerEntry>) -> Self {
        Self {
            ledger: Mutex::new(entries),
            locked: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current ledger, for assertions in tests
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.ledger.lock().clone()
    }

    /// Whether the lock marker is currently held
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn load(&self) -> MigrateResult<Vec<LedgerEntry>> {
        Ok(self.ledger.lock().clone())
    }

    async fn add(&self, entries: &[LedgerEntry]) -> MigrateResult<()> {
        let mut ledger = self.ledger.lock();
        let existing = std::mem::take(&mut *ledger);
        ledger.extend(entries.iter().cloned());
        ledger.extend(existing);
        Ok(())
    }

    async fn remove(&self, entries: &[LedgerEntry]) -> MigrateResult<()> {
        let mut ledger = self.ledger.lock();
        ledger.retain(|existing| !entries.iter().any(|e| e.name == existing.name));
        Ok(())
    }

    async fn acquire_lock(&self) -> MigrateResult<bool> {
        Ok(self
            .locked
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok())
    }

    async fn release_lock(&self) -> MigrateResult<()> {
        self.locked.store(false, Ordering::SeqCst);
        Ok(())
    }
}
