//! The [`AppContext`]: everything an operation needs, with an explicit
//! lifecycle instead of process-wide globals.

use std::sync::Arc;

use tokio::sync::Mutex;

use huddle_auth::SessionManager;
use huddle_store::{EntityStore, SnapshotStore};

use crate::config::Config;
use crate::error::Result;
use crate::standup::StandupRegistry;

/// Shared state for the whole backend: the snapshot store (guarded by one
/// lock), the session manager, and the standup registry.  Constructed once
/// at startup and passed to every operation; [`AppContext::reset`] restores
/// a pristine state for test isolation.
pub struct AppContext {
    snapshots: Mutex<SnapshotStore>,
    pub sessions: SessionManager,
    pub standups: StandupRegistry,
    pub config: Config,
}

impl AppContext {
    /// Open (or create) the configured snapshot database and make sure it
    /// holds a graph.
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let snapshots = match &config.snapshot_path {
            Some(path) => SnapshotStore::open_at(path)?,
            None => SnapshotStore::new()?,
        };
        Self::with_snapshots(snapshots, config)
    }

    /// Build a context around a transient in-memory snapshot database.
    pub fn in_memory(config: Config) -> Result<Arc<Self>> {
        Self::with_snapshots(SnapshotStore::open_in_memory()?, config)
    }

    fn with_snapshots(snapshots: SnapshotStore, config: Config) -> Result<Arc<Self>> {
        snapshots.init_if_missing()?;
        Ok(Arc::new(AppContext {
            snapshots: Mutex::new(snapshots),
            sessions: SessionManager::new(config.token_ttl),
            standups: StandupRegistry::new(),
            config,
        }))
    }

    /// Run a read-only closure against the persisted graph.  The snapshot
    /// lock is held for the duration, so the view is never torn by a
    /// concurrent writer.
    pub async fn read<T>(&self, f: impl FnOnce(&EntityStore) -> Result<T>) -> Result<T> {
        let snapshots = self.snapshots.lock().await;
        let store = snapshots.load()?;
        f(&store)
    }

    /// Run a load-mutate-save cycle as one unit.  The graph is loaded, the
    /// closure mutates it in memory, and the result is persisted before the
    /// lock is released.  If the closure fails, nothing is saved.
    pub async fn mutate<T>(&self, f: impl FnOnce(&mut EntityStore) -> Result<T>) -> Result<T> {
        let snapshots = self.snapshots.lock().await;
        let mut store = snapshots.load()?;
        let value = f(&mut store)?;
        snapshots.save(&store)?;
        Ok(value)
    }

    /// Wipe everything: persisted graph, sessions, reset codes, standups.
    pub async fn reset(&self) -> Result<()> {
        {
            let snapshots = self.snapshots.lock().await;
            snapshots.save(&EntityStore::new())?;
        }
        self.sessions.reset().await;
        self.standups.clear().await;
        Ok(())
    }
}
