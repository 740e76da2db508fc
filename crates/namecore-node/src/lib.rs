//! Namecore command line tools.
//!
//! Offline helpers around the name rules (classification, value and
//! endpoint checks) and an inspector for a chain state database.

mod cli;
mod commands;
mod error;

pub use self::cli::run;
pub use self::error::{Error, Result};
