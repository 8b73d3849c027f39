use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error from the snapshot backend.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An entity id that is not present in the aggregate.
    #[error("Invalid {0} id")]
    NotFound(&'static str),

    /// The database holds no snapshot row yet.
    #[error("No snapshot has been initialised")]
    NoSnapshot,

    /// Caller-supplied data that violates an entity constraint.
    #[error("{0}")]
    Invalid(String),

    /// Snapshot blob failed to encode or decode.
    #[error("Snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Snapshot blob was written by an unknown format version.
    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

impl StoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::Invalid(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
