//! Migration units and the source that resolves them
//!
//! A migration unit exposes a forward and a backward procedure. Both are
//! normalized to a single asynchronous result type before the runner ever
//! sees them, so execution never branches on calling convention.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{MigrateError, MigrateResult};
use crate::ident::MigrationId;

/// One unit of forward/backward work
///
/// Failures are foreign errors from the migration body and are carried as
/// `anyhow::Error` into [`crate::error::MigrateError::Execution`].
#[async_trait]
pub trait MigrationScript: Send + Sync {
    /// Apply the migration
    async fn forward(&self) -> anyhow::Result<()>;

    /// Revert the migration
    async fn backward(&self) -> anyhow::Result<()>;
}

/// Resolves migration identifiers to runnable units
#[async_trait]
pub trait MigrationSource: Send + Sync {
    /// All available identifiers, deduplicated and sorted ascending
    async fn list(&self) -> MigrateResult<Vec<MigrationId>>;

    /// Load the unit behind an identifier
    async fn load(&self, id: &MigrationId) -> MigrateResult<Arc<dyn MigrationScript>>;
}

type ScriptFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
type ScriptFn = Box<dyn Fn() -> ScriptFuture + Send + Sync>;

/// Migration unit built from two closures
///
/// Lets callers register ad-hoc procedures without defining a struct:
///
/// ```
/// use amig::source::FnScript;
///
/// let script = FnScript::new(
///     || async { Ok(()) },
///     || async { Ok(()) },
/// );
/// ```
pub struct FnScript {
    forward: ScriptFn,
    backward: ScriptFn,
}

impl FnScript {
    pub fn new<F, FFut, B, BFut>(forward: F, backward: B) -> Self
    where
        F: Fn() -> FFut + Send + Sync + 'static,
        FFut: Future<Output = anyhow::Result<()>> + Send + 'static,
        B: Fn() -> BFut + Send + Sync + 'static,
        BFut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            forward: Box::new(move || {
                let fut: ScriptFuture = Box::pin(forward());
                fut
            }),
            backward: Box::new(move || {
                let fut: ScriptFuture = Box::pin(backward());
                fut
            }),
        }
    }
}

#[async_trait]
impl MigrationScript for FnScript {
    async fn forward(&self) -> anyhow::Result<()> {
        (self.forward)().await
    }

    async fn backward(&self) -> anyhow::Result<()> {
        (self.backward)().await
    }
}

/// In-memory migration source
///
/// Scripts are registered under their identifier; `list` returns the
/// registered identifiers in ascending order.
#[derive(Default)]
pub struct ScriptRegistry {
    scripts: BTreeMap<MigrationId, Arc<dyn MigrationScript>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script under an identifier, replacing any previous one
    pub fn register(&mut self, id: MigrationId, script: Arc<dyn MigrationScript>) -> &mut Self {
        self.scripts.insert(id, script);
        self
    }

    /// Register a script built from two closures
    pub fn register_fns<F, FFut, B, BFut>(
        &mut self,
        id: MigrationId,
        forward: F,
        backward: B,
    ) -> &mut Self
    where
        F: Fn() -> FFut + Send + Sync + 'static,
        FFut: Future<Output = anyhow::Result<()>> + Send + 'static,
        B: Fn() -> BFut + Send + Sync + 'static,
        BFut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(id, Arc::new(FnScript::new(forward, backward)))
    }
}

#[async_trait]
impl MigrationSource for ScriptRegistry {
    async fn list(&self) -> MigrateResult<Vec<MigrationId>> {
        Ok(self.scripts.keys().cloned().collect())
    }

    async fn load(&self, id: &MigrationId) -> MigrateResult<Arc<dyn MigrationScript>> {
        self.scripts
            .get(id)
            .cloned()
            .ok_or_else(|| MigrateError::UnknownMigration(id.clone()))
    }
}
