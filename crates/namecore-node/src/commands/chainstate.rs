use crate::cli::params::ChainstateParams;
use crate::{Error, Result};
use namecore_chainstate::{ChainState, CoinsNameView, Name, NameRecord};
use namecore_names::{NameEncoding, decode_name, encode_value};

/// Expiration depth of names on the main chain.
const DEFAULT_EXPIRATION_DEPTH: u32 = 36_000;

/// Chain state database inspection
#[derive(Debug, clap::Args)]
pub struct Chainstate {
    #[allow(missing_docs)]
    #[clap(flatten)]
    pub params: ChainstateParams,

    #[command(subcommand)]
    pub command: ChainstateCmd,
}

#[derive(Debug, clap::Subcommand)]
pub enum ChainstateCmd {
    /// Show the tip markers, size and layout state of the database.
    Info,

    /// Show the current record of a name.
    Show {
        #[arg(index = 1)]
        name: String,

        /// Encoding of the name argument (ascii, utf8 or hex).
        #[arg(long, default_value = "ascii")]
        encoding: NameEncoding,
    },

    /// Show the past records of a name.
    History {
        #[arg(index = 1)]
        name: String,

        /// Encoding of the name argument (ascii, utf8 or hex).
        #[arg(long, default_value = "ascii")]
        encoding: NameEncoding,
    },

    /// List the names anchored at a block height.
    Height {
        #[arg(index = 1)]
        height: u32,
    },

    /// Check the name database for consistency.
    ///
    /// Exits with an error when the database must not be trusted.
    Validate {
        /// Height of the active chain tip.
        #[arg(long)]
        tip: u32,

        /// Number of blocks after which names expire.
        #[arg(long, default_value_t = DEFAULT_EXPIRATION_DEPTH)]
        expiration_depth: u32,
    },

    /// Convert a database using the legacy coin layout.
    Upgrade,
}

/// Chain parameters supplied on the command line.
struct FixedChain {
    tip: u32,
    expiration_depth: u32,
}

impl ChainState for FixedChain {
    fn tip_height(&self) -> u32 {
        self.tip
    }

    fn expiration_depth(&self, _height: u32) -> u32 {
        self.expiration_depth
    }
}

fn no_interruption() -> namecore_chainstate::Result<()> {
    Ok(())
}

fn format_value(value: &[u8]) -> String {
    encode_value(value, NameEncoding::Utf8).unwrap_or_else(|_| format!("0x{}", hex::encode(value)))
}

fn format_record(record: &NameRecord) -> Vec<String> {
    let mut lines = vec![
        format!("  value: {}", format_value(&record.value)),
        format!("  outpoint: {}", record.outpoint),
        format!("  height: {}", record.height),
    ];
    if let Some(expiration_height) = record.expiration_height {
        lines.push(format!("  expires at: {expiration_height}"));
    }
    lines
}

pub(crate) fn info_report(view: &CoinsNameView) -> Result<Vec<String>> {
    let mut report = vec![
        format!(
            "Storage path: {}",
            view.storage_path()
                .map_or_else(|| "<memory>".to_string(), |path| path.display().to_string())
        ),
        format!("Estimated size: {} bytes", view.estimate_size()?),
        format!("Needs upgrade: {}", if view.needs_upgrade() { "yes" } else { "no" }),
    ];

    if !view.needs_upgrade() {
        report.push(format!("Best block: {}", view.get_best_block()?));
        match view.get_head_blocks()?.as_slice() {
            [new, old] => report.push(format!("Interrupted flush: {old} -> {new}")),
            _ => report.push("Interrupted flush: none".to_string()),
        }
        report.push(format!(
            "Name history: {}",
            if view.name_history_enabled() { "enabled" } else { "disabled" }
        ));
    }

    Ok(report)
}

pub(crate) fn show_report(view: &CoinsNameView, name: &Name) -> Result<Vec<String>> {
    let mut report = vec![format!("Name: {name}")];
    match view.get_name(name)? {
        Some(record) => report.extend(format_record(&record)),
        None => report.push("  not registered".to_string()),
    }
    Ok(report)
}

pub(crate) fn history_report(view: &CoinsNameView, name: &Name) -> Result<Vec<String>> {
    let mut report = vec![format!("Name: {name}")];
    if !view.name_history_enabled() {
        report.push("  name history is disabled".to_string());
        return Ok(report);
    }
    match view.get_name_history(name)? {
        Some(history) => {
            for (index, record) in history.entries().iter().enumerate() {
                report.push(format!(" #{index}"));
                report.extend(format_record(record));
            }
        }
        None => report.push("  no history".to_string()),
    }
    Ok(report)
}

pub(crate) fn height_report(view: &CoinsNameView, height: u32) -> Result<Vec<String>> {
    let names = view.get_names_for_height(height)?;
    let mut report = vec![format!("{} names at height {height}", names.len())];
    report.extend(names.iter().map(|name| format!("  {name}")));
    Ok(report)
}

impl Chainstate {
    pub fn run(self) -> Result<()> {
        let Self { params, command } = self;
        let mut view = CoinsNameView::open(&params.db_params(), params.coins_view_options())?;

        let report = match command {
            ChainstateCmd::Info => info_report(&view)?,
            ChainstateCmd::Show { name, encoding } => {
                show_report(&view, &Name::new(decode_name(&name, encoding)?))?
            }
            ChainstateCmd::History { name, encoding } => {
                history_report(&view, &Name::new(decode_name(&name, encoding)?))?
            }
            ChainstateCmd::Height { height } => height_report(&view, height)?,
            ChainstateCmd::Validate {
                tip,
                expiration_depth,
            } => {
                let chain = FixedChain {
                    tip,
                    expiration_depth,
                };
                if !view.validate_name_db(&chain, &no_interruption)? {
                    tracing::error!("Name database at {} must not be trusted", params.datadir.display());
                    return Err(Error::InconsistentNameDb);
                }
                vec!["Name database is consistent".to_string()]
            }
            ChainstateCmd::Upgrade => {
                if view.needs_upgrade() {
                    view.upgrade(&no_interruption)?;
                    vec!["Upgrade complete".to_string()]
                } else {
                    vec!["Database is up to date".to_string()]
                }
            }
        };

        for line in report {
            println!("{line}");
        }

        Ok(())
    }
}
