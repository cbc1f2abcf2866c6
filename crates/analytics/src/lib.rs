// In crates/analytics/src/lib.rs

pub mod engine;
pub mod report;
pub mod types;

pub use engine::AnalyticsEngine;
pub use types::{ProfitDistribution, RunReport, WindowResult};
