use std::path::PathBuf;

/// Default progress granularity while staging a batch: 16 MiB.
pub const DEFAULT_BATCH_WRITE_BYTES: usize = 16 << 20;

/// Default total cache budget: 450 MiB.
const DEFAULT_CACHE_BYTES: usize = 450 << 20;

/// Where and how the database is opened.
#[derive(Debug, Clone)]
pub struct DbParams {
    /// Database directory. Ignored for in-memory instances.
    pub path: PathBuf,
    /// Total cache budget, split between block cache and write buffers.
    pub cache_bytes: usize,
    /// Keep everything in memory; nothing touches `path`.
    pub memory_only: bool,
    /// Destroy any existing database at `path` before opening.
    pub wipe_data: bool,
}

impl DbParams {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache_bytes: DEFAULT_CACHE_BYTES,
            memory_only: false,
            wipe_data: false,
        }
    }

    /// Parameters for a scratch in-memory database.
    ///
    /// RocksDB still creates the (empty) directory, so it points into the
    /// system temporary directory.
    pub fn in_memory() -> Self {
        Self {
            memory_only: true,
            ..Self::new(std::env::temp_dir().join("namecore-chainstate-memory"))
        }
    }

    pub(crate) fn block_cache_bytes(&self) -> usize {
        self.cache_bytes / 2
    }

    pub(crate) fn write_buffer_bytes(&self) -> usize {
        self.cache_bytes / 4
    }
}

/// Tunables of [`CoinsNameView`](crate::CoinsNameView).
#[derive(Debug, Clone)]
pub struct CoinsViewOptions {
    /// Bytes staged between progress reports while building a commit, and
    /// per write batch during an upgrade.
    pub batch_write_bytes: usize,
    /// Terminate the process with probability `1 / ratio` on every commit.
    /// `0` disables crash simulation.
    pub simulate_crash_ratio: u32,
    /// Keep the history of past records of every name.
    pub name_history: bool,
}

impl Default for CoinsViewOptions {
    fn default() -> Self {
        Self {
            batch_write_bytes: DEFAULT_BATCH_WRITE_BYTES,
            simulate_crash_ratio: 0,
            name_history: false,
        }
    }
}
