//! Plant Health: anomaly detection and performance scoring
//!
//! Offline analysis of sensor logs exported from an injection press and a
//! multi-zone furnace.
//!
//! ## Architecture
//!
//! - **Outlier Detector**: IQR / Z-score bounds per column
//! - **Sensor Repair Engine**: physical-range fault repair by interpolation
//! - **Anomaly Aggregator**: per-parameter tables, daily ranking, trend and composite checks
//! - **Performance Scorer**: piecewise-linear sub-scores and weighted composites
//! - **Maintenance Advisor**: ordered rule set producing recommendations

pub mod advisor;
pub mod anomaly;
pub mod config;
pub mod detection;
pub mod ingest;
pub mod pipeline;
pub mod repair;
pub mod report;
pub mod scoring;
pub mod types;

// Re-export configuration
pub use config::{AnalysisConfig, ConfigError};

// Re-export commonly used types
pub use types::{
    AnomalySummary, AnomalyTable, Column, Dataset, DatasetError, Domain, HealthBand, OutlierMethod,
    Priority, Recommendation, ReportIssue,
};

// Re-export pipeline entry points
pub use pipeline::{analyze, analyze_furnace, analyze_press, DomainReport, PipelineError};

// Re-export loader
pub use ingest::{load_csv, parse_csv, IngestError};
