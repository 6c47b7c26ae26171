//! Migration orchestrator
//!
//! Ties the selection engine, the execution runner, and the storage engine
//! together: compute the batch, take the lock, run serially, persist, and
//! always release the lock once it was acquired.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::definitions::{
    Direction, DownOptions, LedgerEntry, MigrationStatus, MigratorConfig, RollbackOptions,
    RunReport, UpOptions,
};
use crate::engine::StorageEngine;
use crate::error::MigrateResult;
use crate::ident::MigrationId;
use crate::runner::run_batch;
use crate::selection::{select_down, select_rollback, select_up};
use crate::source::MigrationSource;

/// Orchestrates migration runs against a pluggable storage engine
///
/// All collaborators are injected at construction; the orchestrator holds
/// no ambient state and performs all work on a single control path.
pub struct Migrator {
    config: MigratorConfig,
    engine: Arc<dyn StorageEngine>,
    source: Arc<dyn MigrationSource>,
}

impl Migrator {
    pub fn new(
        config: MigratorConfig,
        engine: Arc<dyn StorageEngine>,
        source: Arc<dyn MigrationSource>,
    ) -> Self {
        Self {
            config,
            engine,
            source,
        }
    }

    /// Apply pending migrations
    pub async fn up(&self, options: UpOptions) -> MigrateResult<RunReport> {
        info!("running migrations");
        let (ledger, files) = self.snapshot().await?;
        let names = select_up(&ledger, &files, &options)?;
        self.execute(names, Direction::Up, options.dry_run).await
    }

    /// Revert applied migrations back through a target name or count
    pub async fn down(&self, options: DownOptions) -> MigrateResult<RunReport> {
        info!("running down migrations");
        let (ledger, files) = self.snapshot().await?;
        let names = select_down(&ledger, &files, &options)?;
        self.execute(names, Direction::Down, options.dry_run).await
    }

    /// Revert the most recently applied batch
    pub async fn rollback(&self, options: RollbackOptions) -> MigrateResult<RunReport> {
        info!("rolling back the last batch");
        let (ledger, files) = self.snapshot().await?;
        let names = select_rollback(&ledger, &files)?;
        self.execute(names, Direction::Down, options.dry_run).await
    }

    /// Status of every available migration, in ascending order
    pub async fn status(&self) -> MigrateResult<Vec<(MigrationId, MigrationStatus)>> {
        let (ledger, files) = self.snapshot().await?;

        Ok(files
            .into_iter()
            .map(|name| {
                let status = ledger
                    .iter()
                    .find(|e| e.name == name)
                    .map(|e| MigrationStatus::Applied {
                        applied_at: e.applied_at,
                    })
                    .unwrap_or(MigrationStatus::Pending);
                (name, status)
            })
            .collect())
    }

    /// Ledger snapshot (newest-first by name) and available identifiers (ascending)
    async fn snapshot(&self) -> MigrateResult<(Vec<LedgerEntry>, Vec<MigrationId>)> {
        let mut ledger = self.engine.load().await?;
        ledger.sort_by(|a, b| b.name.cmp(&a.name));

        let files = self.source.list().await?;
        Ok((ledger, files))
    }

    async fn execute(
        &self,
        names: Vec<MigrationId>,
        direction: Direction,
        dry_run: bool,
    ) -> MigrateResult<RunReport> {
        if names.is_empty() {
            info!("there are no migrations to run");
            return Ok(RunReport::Noop);
        }

        debug!(count = names.len(), ?direction, "computed selection");

        if dry_run {
            for name in &names {
                info!(migration = %name, "would run");
            }
            return Ok(RunReport::DryRun(names));
        }

        if !self.engine.acquire_lock().await? {
            warn!("lock could not be acquired, another run is in progress");
            return Ok(RunReport::LockContended);
        }

        let start = Instant::now();
        let batch_at = Utc::now();
        let result = self.run_and_persist(&names, direction, batch_at).await;

        // The lock is released on every exit path once acquisition
        // succeeded, including execution and persistence failures.
        let released = self.engine.release_lock().await;

        let entries = result?;
        released?;

        Ok(RunReport::Completed {
            entries,
            execution_time_ms: start.elapsed().as_millis(),
        })
    }

    async fn run_and_persist(
        &self,
        names: &[MigrationId],
        direction: Direction,
        batch_at: DateTime<Utc>,
    ) -> MigrateResult<Vec<LedgerEntry>> {
        let entries = run_batch(
            self.source.as_ref(),
            names,
            direction,
            batch_at,
            self.config.timeout,
        )
        .await?;

        // Persistence is batch-level: a failed batch skips this step
        // entirely, so the ledger only ever reflects fully-successful runs.
        let persisted = match direction {
            Direction::Up => {
                // Reverse so the newest migration lands first in the ledger.
                let mut newest_first = entries.clone();
                newest_first.reverse();
                self.engine.add(&newest_first).await
            }
            Direction::Down => self.engine.remove(&entries).await,
        };

        if let Err(err) = persisted {
            let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
            error!(
                error = %err,
                migrations = ?names,
                "ledger update failed after a successful batch; these migrations ran but are unrecorded"
            );
            return Err(err);
        }

        Ok(entries)
    }
}
