//! Anomaly Aggregator
//!
//! - `aggregator`: generic per-parameter tables, summary, trend and composite checks
//! - `press`: injection press parameter set and extras
//! - `furnace`: furnace sensor screening, set-point, power, cooling and zone checks

pub mod aggregator;
pub mod furnace;
pub mod press;

pub use aggregator::{aggregate, summarize, trend_check, Aggregation, OrderCheck, ParameterSpec};
pub use furnace::FurnaceAnomalyReport;
pub use press::PressAnomalyReport;
