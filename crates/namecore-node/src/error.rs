use namecore_names::InvalidNameString;

/// Errors reported by the command line tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Chainstate(#[from] namecore_chainstate::Error),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] InvalidNameString),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Name database failed validation")]
    InconsistentNameDb,

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
