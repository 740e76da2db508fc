use clap::Parser;
use namecore_chainstate::{CoinsViewOptions, DEFAULT_BATCH_WRITE_BYTES, DbParams};
use std::path::PathBuf;

/// Chain state database parameters.
#[derive(Debug, Clone, Parser)]
pub struct ChainstateParams {
    /// Specify the chain state database directory.
    #[arg(long, value_name = "PATH", default_value = "chainstate")]
    pub datadir: PathBuf,

    /// Database cache size in MiB.
    #[arg(long, value_name = "MIB", default_value_t = 450)]
    pub dbcache: usize,

    /// Bytes staged between progress reports of a commit, and per write batch
    /// of an upgrade.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_BATCH_WRITE_BYTES)]
    pub dbbatchsize: usize,

    /// Simulate a crash with probability 1/<N> on every commit.
    ///
    /// Only meant for testing crash recovery; 0 disables it.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub dbcrashratio: u32,

    /// Keep the history of past records of every name.
    #[arg(long)]
    pub namehistory: bool,
}

impl ChainstateParams {
    pub fn db_params(&self) -> DbParams {
        DbParams {
            cache_bytes: self.dbcache << 20,
            ..DbParams::new(&self.datadir)
        }
    }

    pub fn coins_view_options(&self) -> CoinsViewOptions {
        CoinsViewOptions {
            batch_write_bytes: self.dbbatchsize,
            simulate_crash_ratio: self.dbcrashratio,
            name_history: self.namehistory,
        }
    }
}
