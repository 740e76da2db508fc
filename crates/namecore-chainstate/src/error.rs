//! Error types for the chain state database.

/// Errors that can occur during chain state operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// RocksDB error.
    #[error("RocksDB error: {0}")]
    Rocksdb(#[from] rocksdb::Error),

    /// Bincode serialization/deserialization error.
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// The database uses an older layout and must be upgraded first.
    #[error("Chain state database needs to be upgraded")]
    NeedsUpgrade,

    /// A key or value in the database has an unexpected shape.
    #[error("Corrupted chain state entry: {0}")]
    Corrupted(String),

    /// A long-running scan was cancelled through its interruption point.
    #[error("Interrupted")]
    Interrupted,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
