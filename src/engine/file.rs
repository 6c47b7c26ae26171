//! JSON-file storage engine
//!
//! The ledger is a pretty-printed JSON array of entries, newest first; the
//! lock marker is an exclusive-create file next to it. Suitable for single
//! machine setups where the working directory is the lock scope.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::StorageEngine;
use crate::definitions::LedgerEntry;
use crate::error::{MigrateError, MigrateResult};

const DEFAULT_LEDGER_FILE: &str = "migrations.json";
const DEFAULT_LOCK_FILE: &str = "amig.lock";

/// File-backed ledger engine
pub struct FileEngine {
    ledger_path: PathBuf,
    lock_path: PathBuf,
}

impl FileEngine {
    /// Engine rooted in the given directory, using the default file names
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            ledger_path: dir.join(DEFAULT_LEDGER_FILE),
            lock_path: dir.join(DEFAULT_LOCK_FILE),
        }
    }

    /// Engine with explicit ledger and lock file paths
    pub fn with_paths(ledger_path: PathBuf, lock_path: PathBuf) -> Self {
        Self {
            ledger_path,
            lock_path,
        }
    }

    fn read_ledger(&self) -> MigrateResult<Vec<LedgerEntry>> {
        let raw = match std::fs::read_to_string(&self.ledger_path) {
            Ok(raw) => raw,
            // A ledger that does not exist yet is simply empty.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(MigrateError::Storage(format!(
                    "failed to read ledger file '{}': {}",
                    self.ledger_path.display(),
                    err
                )))
            }
        };

        serde_json::from_str(&raw).map_err(|err| {
            MigrateError::Storage(format!(
                "failed to parse ledger file '{}': {}",
                self.ledger_path.display(),
                err
            ))
        })
    }

    fn write_ledger(&self, entries: &[LedgerEntry]) -> MigrateResult<()> {
        let raw = serde_json::to_string_pretty(entries).map_err(|err| {
            MigrateError::Storage(format!("failed to serialize ledger: {}", err))
        })?;

        std::fs::write(&self.ledger_path, raw).map_err(|err| {
            MigrateError::Storage(format!(
                "failed to write ledger file '{}': {}",
                self.ledger_path.display(),
                err
            ))
        })
    }
}

#[async_trait]
impl StorageEngine for FileEngine {
    async fn load(&self) -> MigrateResult<Vec<LedgerEntry>> {
        self.read_ledger()
    }

    async fn add(&self, entries: &[LedgerEntry]) -> MigrateResult<()> {
        let existing = self.read_ledger()?;
        let mut ledger = Vec::with_capacity(entries.len() + existing.len());
        ledger.extend(entries.iter().cloned());
        ledger.extend(existing);
        self.write_ledger(&ledger)
    }

    async fn remove(&self, entries: &[LedgerEntry]) -> MigrateResult<()> {
        let ledger: Vec<LedgerEntry> = self
            .read_ledger()?
            .into_iter()
            .filter(|existing| !entries.iter().any(|e| e.name == existing.name))
            .collect();
        self.write_ledger(&ledger)
    }

    async fn acquire_lock(&self) -> MigrateResult<bool> {
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
        {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(MigrateError::Storage(format!(
                "failed to create lock file '{}': {}",
                self.lock_path.display(),
                err
            ))),
        }
    }

    async fn release_lock(&self) -> MigrateResult<()> {
        match std::fs::remove_file(&self.lock_path) {
            Ok(()) => Ok(()),
            // Releasing an unheld lock must stay harmless.
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(MigrateError::Storage(format!(
                "failed to remove lock file '{}': {}",
                self.lock_path.display(),
                err
            ))),
        }
    }
}
