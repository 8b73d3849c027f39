//! Whole-graph snapshot persistence.
//!
//! The entire [`EntityStore`] is serialized as one opaque blob and stored in
//! a single-row SQLite table.  Load and save always move the full graph;
//! there is no incremental persistence.  The blob is prefixed with a format
//! version so a schema change is detected instead of misread.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::store::EntityStore;

/// Bumped whenever the serialized shape of the graph changes.
pub const SNAPSHOT_VERSION: u32 = 1;

impl EntityStore {
    /// Serialize the whole aggregate (all three maps, all three counters)
    /// into one version-tagged blob.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&(SNAPSHOT_VERSION, self))?)
    }

    /// Rebuild an aggregate from a snapshot blob.
    pub fn restore(bytes: &[u8]) -> Result<Self> {
        let (version, store): (u32, EntityStore) = bincode::deserialize(bytes)?;
        if version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }
        Ok(store)
    }
}

/// Handle to the snapshot database.  Owns a [`rusqlite::Connection`] holding
/// one table with at most one row: the latest serialized graph.
pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    /// Open (or create) the snapshot database in the platform data directory:
    /// - Linux:   `~/.local/share/huddle/huddle.db`
    /// - macOS:   `~/Library/Application Support/com.huddle.huddle/huddle.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\huddle\huddle\data\huddle.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "huddle", "huddle").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("huddle.db");

        tracing::info!(path = %db_path.display(), "opening snapshot database");

        Self::open_at(&db_path)
    }

    /// Open (or create) the snapshot database at an explicit path.  Useful
    /// for tests and custom directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open a transient in-memory snapshot database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshot (
                 id    INTEGER PRIMARY KEY CHECK (id = 0),
                 graph BLOB NOT NULL
             )",
            [],
        )?;
        Ok(())
    }

    /// Load the persisted graph.  Fails with [`StoreError::NoSnapshot`] if
    /// nothing has been saved yet.
    pub fn load(&self) -> Result<EntityStore> {
        let blob: Option<Vec<u8>> = self
            .conn
            .query_row("SELECT graph FROM snapshot WHERE id = 0", [], |row| {
                row.get(0)
            })
            .optional()?;

        match blob {
            Some(bytes) => EntityStore::restore(&bytes),
            None => Err(StoreError::NoSnapshot),
        }
    }

    /// Persist the graph, replacing any previous snapshot.
    pub fn save(&self, store: &EntityStore) -> Result<()> {
        let blob = store.snapshot()?;
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshot (id, graph) VALUES (0, ?1)",
            params![blob],
        )?;
        Ok(())
    }

    /// Write a fresh, empty graph unless a snapshot already exists.
    pub fn init_if_missing(&self) -> Result<()> {
        match self.load() {
            Ok(_) => Ok(()),
            Err(StoreError::NoSnapshot) => {
                tracing::info!("initialising empty snapshot");
                self.save(&EntityStore::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, User};
    use chrono::Utc;

    fn populated_store() -> EntityStore {
        let mut store = EntityStore::new();
        let u_id = store.new_user_id();
        store.register_user(
            u_id,
            User::new("ada@example.com", "hash".to_string(), "Ada", "Lovelace").unwrap(),
        );
        let channel_id = store.create_channel(u_id, "general", true).unwrap();
        let message_id = store.new_message_id();
        store.register_message(
            message_id,
            Message::new(u_id, channel_id, "hello", Utc::now()).unwrap(),
        );
        store.channel_mut(channel_id).unwrap().add_message(message_id);
        // A deleted message must not rewind the counter.
        let doomed = store.new_message_id();
        store.register_message(
            doomed,
            Message::new(u_id, channel_id, "bye", Utc::now()).unwrap(),
        );
        store.delete_message(doomed).unwrap();
        store
    }

    #[test]
    fn test_snapshot_round_trip() {
        let store = populated_store();
        let blob = store.snapshot().unwrap();
        let restored = EntityStore::restore(&blob).unwrap();
        assert_eq!(restored, store);
        // Counters survive the round trip.
        let mut restored = restored;
        assert_eq!(restored.new_message_id(), 3);
    }

    #[test]
    fn test_restore_rejects_unknown_version() {
        let store = EntityStore::new();
        let blob = bincode::serialize(&(SNAPSHOT_VERSION + 1, &store)).unwrap();
        assert!(matches!(
            EntityStore::restore(&blob),
            Err(StoreError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_save_load_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let store = populated_store();
        let snapshots = SnapshotStore::open_at(&path).unwrap();
        assert!(matches!(snapshots.load(), Err(StoreError::NoSnapshot)));

        snapshots.save(&store).unwrap();
        assert_eq!(snapshots.load().unwrap(), store);

        // Reopen and read back.
        drop(snapshots);
        let reopened = SnapshotStore::open_at(&path).unwrap();
        assert_eq!(reopened.load().unwrap(), store);
    }

    #[test]
    fn test_init_if_missing_is_idempotent() {
        let snapshots = SnapshotStore::open_in_memory().unwrap();
        snapshots.init_if_missing().unwrap();
        assert_eq!(snapshots.load().unwrap(), EntityStore::new());

        let store = populated_store();
        snapshots.save(&store).unwrap();
        snapshots.init_if_missing().unwrap();
        // An existing snapshot is left alone.
        assert_eq!(snapshots.load().unwrap(), store);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let snapshots = SnapshotStore::open_in_memory().unwrap();
        snapshots.save(&EntityStore::new()).unwrap();
        let store = populated_store();
        snapshots.save(&store).unwrap();
        assert_eq!(snapshots.load().unwrap(), store);
    }
}
