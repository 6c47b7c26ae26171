//! Filesystem operations for migrations
//!
//! Scaffolds new migration files and lists the identifiers already on disk.
//! The orchestrator itself never reads migration content; it only consumes
//! the identifier list.

use std::collections::BTreeSet;
use std::fs;

use chrono::Utc;
use tracing::info;

use crate::definitions::MigratorConfig;
use crate::error::{MigrateError, MigrateResult};
use crate::ident::MigrationId;

/// Manager for creating and listing migration files
pub struct MigrationManager {
    config: MigratorConfig,
}

impl MigrationManager {
    /// Manager with default configuration
    pub fn new() -> Self {
        Self::with_config(MigratorConfig::default())
    }

    /// Manager with custom configuration
    pub fn with_config(config: MigratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Create a new migration file named `<unix_ms>-<slug>.sql`
    ///
    /// The given name is sanitized into a slug; returns the filename of the
    /// created file.
    pub fn create_migration(&self, name: &str) -> MigrateResult<String> {
        fs::create_dir_all(&self.config.migrations_dir)?;

        let slug = sanitize_name(name);
        if slug.is_empty() {
            return Err(MigrateError::Arguments(format!(
                "'{}' does not reduce to a usable migration name",
                name
            )));
        }

        let filename = format!("{}-{}.sql", Utc::now().timestamp_millis(), slug);
        let filepath = self.config.migrations_dir.join(&filename);

        fs::write(&filepath, migration_template(name))?;

        info!(file = %filepath.display(), "created new migration");
        Ok(filename)
    }

    /// List the migration identifiers present on disk, ascending
    ///
    /// Keeps files whose stem parses as `<timestamp>-<slug>` (any extension,
    /// extension stripped), deduplicated. A missing directory is an empty
    /// list.
    pub fn list_migration_files(&self) -> MigrateResult<Vec<MigrationId>> {
        if !self.config.migrations_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = BTreeSet::new();
        for dir_entry in fs::read_dir(&self.config.migrations_dir)? {
            let path = dir_entry?.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(id) = stem.parse::<MigrationId>() {
                ids.insert(id);
            }
        }

        Ok(ids.into_iter().collect())
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse anything outside `[A-Za-z0-9_-]` into single hyphens
fn sanitize_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_sep = true;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            slug.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('-');
            last_was_sep = true;
        }
    }

    slug.trim_matches('-').to_string()
}

fn migration_template(name: &str) -> String {
    format!(
        "-- Migration: {}\n\
         -- Created: {}\n\n\
         -- Up migration\n\n\n\
         -- Down migration\n\n",
        name,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}
