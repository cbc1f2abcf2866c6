// In crates/events/src/lib.rs

//! Events emitted by a running trader and the sinks that receive them.
//!
//! The engine never talks to a presentation layer directly. Whoever starts
//! it injects an [`EventSink`] and decides what to do with the events.

use core_types::{Symbol, TradeRecord};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// The top-level event enum.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    Started { symbol: Symbol, cash: Decimal },
    PriceObserved { timestamp: i64, price: Decimal },
    TradeExecuted { trade: TradeRecord, cash: Decimal, asset_quantity: Decimal },
    PriceFetchFailed { error: String },
    StepFailed { price: Decimal, error: String },
    Stopped { ticks: u64, trades: usize, value: Option<Decimal> },
}

/// Receiver of engine events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Writes every event as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::Started { symbol, cash } => {
                tracing::info!(%symbol, %cash, "Trader started.");
            }
            EngineEvent::PriceObserved { price, .. } => {
                tracing::debug!(%price, "Price observed.");
            }
            EngineEvent::TradeExecuted { trade, cash, asset_quantity } => {
                tracing::info!(
                    action = %trade.action,
                    price = %trade.price,
                    quantity = %trade.quantity,
                    %cash,
                    %asset_quantity,
                    "Trade executed."
                );
            }
            EngineEvent::PriceFetchFailed { error } => {
                tracing::warn!(%error, "Price fetch failed; retrying next tick.");
            }
            EngineEvent::StepFailed { price, error } => {
                tracing::error!(%price, %error, "Strategy step failed.");
            }
            EngineEvent::Stopped { ticks, trades, value } => {
                tracing::info!(ticks, trades, value = ?value, "Trader stopped.");
            }
        }
    }
}

/// Fans events out to any number of subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<EngineEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything received so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: EngineEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Forwards to several sinks in order.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&self, event: EngineEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}
