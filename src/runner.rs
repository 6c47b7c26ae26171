//! Execution runner
//!
//! Runs a selected batch strictly in order, one migration at a time.
//! Schema-altering steps are frequently order-dependent, so there is no
//! parallelism anywhere in the execution path.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::definitions::{Direction, LedgerEntry};
use crate::error::{MigrateError, MigrateResult};
use crate::ident::MigrationId;
use crate::source::MigrationSource;

/// Execute `names` serially in the given direction
///
/// Each invocation is raced against `timeout`; expiry and raised errors are
/// both step failures. The first failure aborts the remaining batch and
/// surfaces the failing identifier. On full success, returns one
/// [`LedgerEntry`] per executed migration, all stamped with the shared
/// `batch_at` instant.
///
/// Timeout cancellation is advisory only: the pending future is dropped,
/// but any external side effect it already triggered is not guaranteed to
/// stop.
pub async fn run_batch(
    source: &dyn MigrationSource,
    names: &[MigrationId],
    direction: Direction,
    batch_at: DateTime<Utc>,
    timeout: Duration,
) -> MigrateResult<Vec<LedgerEntry>> {
    let mut completed = Vec::with_capacity(names.len());

    for name in names {
        let script = source.load(name).await?;

        let step = async {
            match direction {
                Direction::Up => script.forward().await,
                Direction::Down => script.backward().await,
            }
        };

        match tokio::time::timeout(timeout, step).await {
            Ok(Ok(())) => {
                info!(migration = %name, ?direction, "migration completed");
                completed.push(LedgerEntry::new(name.clone(), batch_at));
            }
            Ok(Err(err)) => {
                error!(migration = %name, ?direction, error = %err, "migration failed");
                return Err(MigrateError::Execution {
                    name: name.clone(),
                    source: err,
                });
            }
            Err(_) => {
                error!(migration = %name, ?direction, ?timeout, "migration timed out");
                return Err(MigrateError::Timeout {
                    name: name.clone(),
                    timeout,
                });
            }
        }
    }

    Ok(completed)
}
