//! Performance scoring
//!
//! - `curves`: piecewise-linear score curves and band lookups
//! - `press`: Press Performance Scorer (cycle, anomaly rate, efficiency, quality)
//! - `furnace`: Furnace Performance Scorer (temperature control, energy, cooling)

pub mod curves;
pub mod furnace;
pub mod press;

pub use furnace::{FurnaceCompositeScore, FurnacePerformance};
pub use press::{DerivedMetrics, PressHealthScore, PressPerformance};
