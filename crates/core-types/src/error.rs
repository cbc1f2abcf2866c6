// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid strategy parameters: {0}")]
    InvalidParams(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
