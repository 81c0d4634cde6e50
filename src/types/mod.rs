//! Shared data structures for the plant health pipeline
//!
//! - Dataset / Column: the in-memory table passed between stages
//! - fields: language-neutral column identifiers
//! - AnomalyTable / AnomalySummary: Anomaly Aggregator output
//! - HealthBand and friends: qualitative score labels
//! - Recommendation / ReportIssue: advisor output and non-fatal failures

mod anomaly;
mod dataset;
pub mod fields;
mod recommendation;
mod score;

pub use anomaly::*;
pub use dataset::*;
pub use recommendation::*;
pub use score::*;
