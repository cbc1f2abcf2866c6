// In crates/strategies/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid strategy settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Params(#[from] core_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
