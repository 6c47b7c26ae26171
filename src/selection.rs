//! Selection engine
//!
//! Pure functions that decide which migrations must run for `up`, `down`,
//! and `rollback`. Each takes a ledger snapshot sorted newest-first by name
//! and the available identifiers sorted ascending, and produces the ordered
//! list to execute. Argument and file-existence validation happens here,
//! before any lock is taken or any migration runs.

use std::collections::HashSet;

use crate::definitions::{DownOptions, LedgerEntry, UpOptions};
use crate::error::{MigrateError, MigrateResult};
use crate::ident::MigrationId;

/// Compute the migrations to apply for an `up` operation, ascending
pub fn select_up(
    ledger: &[LedgerEntry],
    files: &[MigrationId],
    options: &UpOptions,
) -> MigrateResult<Vec<MigrationId>> {
    let candidates: Vec<MigrationId> = if ledger.is_empty() {
        // Nothing has ever run, so everything is pending.
        files.to_vec()
    } else if options.ignore_past {
        // Only migrations newer than the most recently applied one.
        let newest = &ledger[0].name;
        files.iter().filter(|f| *f > newest).cloned().collect()
    } else {
        let applied: HashSet<&MigrationId> = ledger.iter().map(|e| &e.name).collect();
        files.iter().filter(|f| !applied.contains(f)).cloned().collect()
    };

    if options.only {
        let until = options
            .until
            .as_ref()
            .ok_or_else(|| only_requires_target())?;
        if candidates.contains(until) {
            return Ok(vec![until.clone()]);
        }
        return Err(MigrateError::InvalidTarget(until.clone()));
    }

    if let Some(until) = &options.until {
        return Ok(candidates.into_iter().filter(|f| f <= until).collect());
    }

    if let Some(count) = options.count {
        return Ok(candidates.into_iter().take(count).collect());
    }

    Ok(candidates)
}

/// Compute the migrations to revert for a `down` operation, descending
///
/// Every selected identifier must have a backing file; the whole batch is
/// validated before anything is returned.
pub fn select_down(
    ledger: &[LedgerEntry],
    files: &[MigrationId],
    options: &DownOptions,
) -> MigrateResult<Vec<MigrationId>> {
    if options.only && options.until.is_none() {
        return Err(only_requires_target());
    }
    if options.until.is_none() && options.count.is_none() {
        return Err(MigrateError::Arguments(
            "a downward migration requires either a migration name or a count".to_string(),
        ));
    }

    if ledger.is_empty() {
        return Ok(Vec::new());
    }

    let mut selected: Vec<MigrationId> = if options.only {
        // Reverting a migration that was never applied is a no-op.
        ledger
            .iter()
            .filter(|e| Some(&e.name) == options.until.as_ref())
            .map(|e| e.name.clone())
            .collect()
    } else if let Some(count) = options.count {
        ledger.iter().take(count).map(|e| e.name.clone()).collect()
    } else if let Some(until) = &options.until {
        ledger
            .iter()
            .filter(|e| e.name >= *until)
            .map(|e| e.name.clone())
            .collect()
    } else {
        // Unreachable: the until/count argument check above already failed.
        Vec::new()
    };

    selected.sort_by(|a, b| b.cmp(a));
    ensure_backing_files(&selected, files)?;
    Ok(selected)
}

/// Compute the migrations to revert for a `rollback` operation, descending
///
/// Rollback reverts the most recent batch: every ledger entry sharing the
/// maximum `applied_at`. Batch identity, not name adjacency, is the unit of
/// rollback, so a single `up` that applied several migrations is undone in
/// one call.
pub fn select_rollback(
    ledger: &[LedgerEntry],
    files: &[MigrationId],
) -> MigrateResult<Vec<MigrationId>> {
    let Some(latest_batch) = ledger.iter().map(|e| e.applied_at).max() else {
        return Ok(Vec::new());
    };

    let mut selected: Vec<MigrationId> = ledger
        .iter()
        .filter(|e| e.applied_at == latest_batch)
        .map(|e| e.name.clone())
        .collect();

    selected.sort_by(|a, b| b.cmp(a));
    ensure_backing_files(&selected, files)?;
    Ok(selected)
}

fn only_requires_target() -> MigrateError {
    MigrateError::Arguments("'only' requires a target migration name".to_string())
}

/// Fail fast if any selected migration lacks a backing file
fn ensure_backing_files(selected: &[MigrationId], files: &[MigrationId]) -> MigrateResult<()> {
    let available: HashSet<&MigrationId> = files.iter().collect();
    for name in selected {
        if !available.contains(name) {
            return Err(MigrateError::MissingFile(name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn id(s: &str) -> MigrationId {
        s.parse().unwrap()
    }

    fn ids(names: &[&str]) -> Vec<MigrationId> {
        names.iter().map(|s| id(s)).collect()
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    /// Newest-first ledger from (name, batch millis) pairs
    fn ledger(entries: &[(&str, i64)]) -> Vec<LedgerEntry> {
        let mut out: Vec<LedgerEntry> = entries
            .iter()
            .map(|(name, ts)| LedgerEntry::new(id(name), at(*ts)))
            .collect();
        out.sort_by(|a, b| b.name.cmp(&a.name));
        out
    }

    #[test]
    fn up_with_empty_ledger_selects_everything() {
        let files = ids(&["1-a", "2-b", "3-c"]);
        let selected = select_up(&[], &files, &UpOptions::default()).unwrap();
        assert_eq!(selected, files);
    }

    #[test]
    fn up_skips_already_applied_migrations() {
        let files = ids(&["1-a", "2-b", "3-c", "4-d"]);
        let applied = ledger(&[("2-b", 100), ("1-a", 100)]);
        let selected = select_up(&applied, &files, &UpOptions::default()).unwrap();
        assert_eq!(selected, ids(&["3-c", "4-d"]));
    }

    #[test]
    fn up_ignore_past_only_selects_newer_than_most_recent() {
        // 2-b never ran, but it is older than the newest ledger entry.
        let files = ids(&["1-a", "2-b", "3-c", "4-d"]);
        let applied = ledger(&[("1-a", 100), ("3-c", 200)]);
        let options = UpOptions {
            ignore_past: true,
            ..Default::default()
        };
        let selected = select_up(&applied, &files, &options).unwrap();
        assert_eq!(selected, ids(&["4-d"]));
    }

    #[test]
    fn up_until_is_inclusive_and_ascending() {
        let files = ids(&["1-a", "2-b", "3-c", "4-d"]);
        let options = UpOptions {
            until: Some(id("3-c")),
            ..Default::default()
        };
        let selected = select_up(&[], &files, &options).unwrap();
        assert_eq!(selected, ids(&["1-a", "2-b", "3-c"]));
    }

    #[test]
    fn up_count_takes_the_first_n_candidates() {
        let files = ids(&["1-a", "2-b", "3-c"]);
        let options = UpOptions {
            count: Some(2),
            ..Default::default()
        };
        let selected = select_up(&[], &files, &options).unwrap();
        assert_eq!(selected, ids(&["1-a", "2-b"]));
    }

    #[test]
    fn up_only_requires_until() {
        let files = ids(&["1-a"]);
        let options = UpOptions {
            only: true,
            ..Default::default()
        };
        let err = select_up(&[], &files, &options).unwrap_err();
        assert!(matches!(err, MigrateError::Arguments(_)));
    }

    #[test]
    fn up_only_selects_exactly_the_target() {
        let files = ids(&["1-a", "2-b", "3-c"]);
        let options = UpOptions {
            only: true,
            until: Some(id("2-b")),
            ..Default::default()
        };
        let selected = select_up(&[], &files, &options).unwrap();
        assert_eq!(selected, ids(&["2-b"]));
    }

    #[test]
    fn up_only_rejects_an_already_applied_target() {
        let files = ids(&["1-a", "2-b"]);
        let applied = ledger(&[("2-b", 100)]);
        let options = UpOptions {
            only: true,
            until: Some(id("2-b")),
            ..Default::default()
        };
        let err = select_up(&applied, &files, &options).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidTarget(name) if name == id("2-b")));
    }

    #[test]
    fn up_is_idempotent_over_its_own_result() {
        // Applying select_up's output and selecting again yields the complement.
        let files = ids(&["1-a", "2-b", "3-c", "4-d"]);
        let options = UpOptions {
            count: Some(2),
            ..Default::default()
        };
        let first = select_up(&[], &files, &options).unwrap();
        let applied = ledger(&[("1-a", 100), ("2-b", 100)]);
        assert_eq!(first, ids(&["1-a", "2-b"]));

        let rest = select_up(&applied, &files, &UpOptions::default()).unwrap();
        assert_eq!(rest, ids(&["3-c", "4-d"]));
    }

    #[test]
    fn down_requires_a_target() {
        let files = ids(&["1-a"]);
        let applied = ledger(&[("1-a", 100)]);
        let err = select_down(&applied, &files, &DownOptions::default()).unwrap_err();
        assert!(matches!(err, MigrateError::Arguments(_)));
    }

    #[test]
    fn down_argument_errors_precede_the_empty_ledger_check() {
        let err = select_down(&[], &[], &DownOptions::default()).unwrap_err();
        assert!(matches!(err, MigrateError::Arguments(_)));
    }

    #[test]
    fn down_with_empty_ledger_selects_nothing() {
        let files = ids(&["1-a"]);
        let options = DownOptions {
            count: Some(1),
            ..Default::default()
        };
        assert!(select_down(&[], &files, &options).unwrap().is_empty());
    }

    #[test]
    fn down_count_reverts_the_most_recent_entries() {
        let files = ids(&["1-a", "2-b", "3-c"]);
        let applied = ledger(&[("1-a", 100), ("2-b", 200), ("3-c", 300)]);
        let options = DownOptions {
            count: Some(2),
            ..Default::default()
        };
        let selected = select_down(&applied, &files, &options).unwrap();
        assert_eq!(selected, ids(&["3-c", "2-b"]));
    }

    #[test]
    fn down_until_reverts_back_through_the_target_inclusive() {
        let files = ids(&["1-a", "2-b", "3-c"]);
        let applied = ledger(&[("1-a", 100), ("2-b", 200), ("3-c", 300)]);
        let options = DownOptions {
            until: Some(id("2-b")),
            ..Default::default()
        };
        let selected = select_down(&applied, &files, &options).unwrap();
        assert_eq!(selected, ids(&["3-c", "2-b"]));
    }

    #[test]
    fn down_fails_fast_when_a_file_is_missing() {
        // 2-b was applied but its file is gone; validation covers the whole
        // batch before anything is returned.
        let files = ids(&["1-a", "3-c"]);
        let applied = ledger(&[("1-a", 100), ("2-b", 200), ("3-c", 300)]);
        let options = DownOptions {
            until: Some(id("1-a")),
            ..Default::default()
        };
        let err = select_down(&applied, &files, &options).unwrap_err();
        assert!(matches!(err, MigrateError::MissingFile(name) if name == id("2-b")));
    }

    #[test]
    fn down_only_selects_the_target_when_applied() {
        let files = ids(&["1-a", "2-b", "3-c"]);
        let applied = ledger(&[("1-a", 100), ("2-b", 200), ("3-c", 300)]);
        let options = DownOptions {
            only: true,
            until: Some(id("2-b")),
            ..Default::default()
        };
        let selected = select_down(&applied, &files, &options).unwrap();
        assert_eq!(selected, ids(&["2-b"]));
    }

    #[test]
    fn down_only_is_a_noop_for_an_unapplied_target() {
        let files = ids(&["1-a", "2-b"]);
        let applied = ledger(&[("1-a", 100)]);
        let options = DownOptions {
            only: true,
            until: Some(id("2-b")),
            ..Default::default()
        };
        assert!(select_down(&applied, &files, &options).unwrap().is_empty());
    }

    #[test]
    fn rollback_selects_the_most_recent_batch_descending() {
        let files = ids(&["3-c", "4-d", "5-e"]);
        let applied = ledger(&[("5-e", 1000), ("4-d", 1000), ("3-c", 500)]);
        let selected = select_rollback(&applied, &files).unwrap();
        assert_eq!(selected, ids(&["5-e", "4-d"]));
    }

    #[test]
    fn rollback_with_empty_ledger_selects_nothing() {
        let files = ids(&["1-a"]);
        assert!(select_rollback(&[], &files).unwrap().is_empty());
    }

    #[test]
    fn rollback_fails_fast_when_a_batch_file_is_missing() {
        let files = ids(&["3-c", "5-e"]);
        let applied = ledger(&[("5-e", 1000), ("4-d", 1000), ("3-c", 500)]);
        let err = select_rollback(&applied, &files).unwrap_err();
        assert!(matches!(err, MigrateError::MissingFile(name) if name == id("4-d")));
    }
}
