//! Outlier Detector
//!
//! - `stats`: quantiles, mean / sample std, per-column descriptive statistics
//! - `outliers`: IQR and Z-score bounds and row classification

pub mod outliers;
pub mod stats;

pub use outliers::{
    bounds, classify, detect, detect_with_bounds, iqr_bounds, zscore_bounds, Detection,
    DetectionError,
};
pub use stats::{describe, ColumnStats};
