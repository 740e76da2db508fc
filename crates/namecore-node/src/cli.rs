pub mod params;

use crate::commands::chainstate::Chainstate;
use crate::commands::name::NameCmd;
use crate::{Error, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Name grammar and value checks.
    #[command(subcommand)]
    Name(NameCmd),

    /// Inspect and maintain a chain state database.
    Chainstate(Chainstate),
}

#[derive(Debug, Parser)]
#[clap(version)]
#[clap(about = "Tools for the namecore name registry")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Sets a custom logging filter (syntax: `<target>=<level>`).
    ///
    /// Log levels (least to most verbose) are `error`, `warn`, `info`, `debug`, and `trace`.
    ///
    /// By default, all targets log `info`, or whatever `RUST_LOG` specifies.
    ///
    /// *Example*: `--log warn,namecore_chainstate=debug`.
    #[arg(short = 'l', long, value_name = "LOG_PATTERN")]
    pub log: Vec<String>,
}

fn init_logging(log: &[String]) -> Result<()> {
    let filter = if log.is_empty() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_new(log.join(",")).map_err(|err| Error::Logging(err.to_string()))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| Error::Logging(err.to_string()))
}

/// Parse and run command line arguments
pub fn run() -> Result<()> {
    let Cli { command, log } = Cli::parse();

    init_logging(&log)?;

    match command {
        Command::Name(cmd) => cmd.run(),
        Command::Chainstate(cmd) => cmd.run(),
    }
}
