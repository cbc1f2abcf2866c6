// In crates/engine/src/lib.rs

//! The live, paper-trading side of the system.
//!
//! A [`LiveTrader`] drives the same [`backtester::Simulation`] the backtester
//! uses, one polled price at a time, and reports through an
//! [`events::EventSink`].

pub mod trader;

pub use trader::{LiveSummary, LiveTrader, DEFAULT_POLL_INTERVAL};
