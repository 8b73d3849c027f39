//! # huddle-core
//!
//! Operations layer of the Huddle messaging backend.
//!
//! Every externally triggered operation follows the same shape: verify the
//! caller's token against the [`AppContext`]'s session manager, load the
//! persisted entity graph, mutate it in memory, and save it back as one
//! unit.  The load-mutate-save cycle runs under a single lock, so concurrent
//! operations (including firing timer callbacks) are strictly ordered and
//! never clobber each other's writes.
//!
//! Two operations additionally register a one-shot timer through
//! [`scheduler`]: deferred message delivery and standup flushing.  Their
//! callbacks take the same lock when they fire.

pub mod config;
pub mod context;
pub mod ops;
pub mod pagination;
pub mod scheduler;
pub mod standup;
pub mod views;

mod error;

pub use config::Config;
pub use context::AppContext;
pub use error::{CoreError, Result};
