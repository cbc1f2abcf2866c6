// In crates/execution/src/lib.rs

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::{Fill, Ledger};
