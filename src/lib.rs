//! # amig
//!
//! Storage-agnostic schema/data migration orchestrator.
//!
//! `amig` discovers versioned migration units, decides which ones must be
//! applied or reverted relative to a persisted ledger, executes them
//! serially under a mutual-exclusion lock and a per-step timeout, and
//! records the outcome. Where the ledger lives is a pluggable concern: any
//! backend implementing [`engine::StorageEngine`] (load, add, remove,
//! acquire/release lock) can carry it. In-memory and JSON-file reference
//! engines ship with the crate.
//!
//! ```no_run
//! use std::sync::Arc;
//! use amig::{Migrator, MigratorConfig, UpOptions};
//! use amig::engine::FileEngine;
//! use amig::source::ScriptRegistry;
//!
//! # async fn example() -> amig::MigrateResult<()> {
//! let mut registry = ScriptRegistry::new();
//! registry.register_fns(
//!     "1713185920000-add-users".parse()?,
//!     || async { /* apply */ Ok(()) },
//!     || async { /* revert */ Ok(()) },
//! );
//!
//! let migrator = Migrator::new(
//!     MigratorConfig::default(),
//!     Arc::new(FileEngine::new(".")),
//!     Arc::new(registry),
//! );
//! migrator.up(UpOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod definitions;
pub mod engine;
pub mod error;
pub mod ident;
pub mod manager;
pub mod migrator;
pub mod runner;
pub mod selection;
pub mod source;

pub use definitions::{
    Direction, DownOptions, LedgerEntry, MigrationStatus, MigratorConfig, RollbackOptions,
    RunReport, UpOptions,
};
pub use error::{MigrateError, MigrateResult};
pub use ident::MigrationId;
pub use manager::MigrationManager;
pub use migrator::Migrator;
