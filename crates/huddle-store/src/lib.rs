//! # huddle-store
//!
//! In-memory entity graph for the Huddle messaging backend, persisted as a
//! single opaque snapshot.
//!
//! The crate exposes the [`EntityStore`] aggregate (users, channels and
//! messages keyed by integer id, plus the id counters) and a [`SnapshotStore`]
//! handle that reads and writes the whole aggregate as one serialized blob.
//! There is no partial persistence: callers load the graph, mutate it in
//! memory, and save it back in full.

pub mod models;
pub mod snapshot;
pub mod store;

mod error;

pub use error::{Result, StoreError};
pub use models::*;
pub use snapshot::SnapshotStore;
pub use store::EntityStore;
