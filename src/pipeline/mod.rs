//! Analysis Pipeline
//!
//! ## Per-domain flow
//!
//! ```text
//! STAGE 1: Required columns (fatal when missing)
//! STAGE 2: Sensor repair + cleaning report
//! STAGE 3: Anomaly aggregation
//! STAGE 4: Performance scoring (consumes the anomaly summary)
//! STAGE 5: Maintenance advice (consumes the performance report)
//! ```
//!
//! Each run builds fresh state from the dataset and config it is given, so
//! independent analyses can run side by side.

mod report;
mod runner;

pub use report::{DomainReport, FurnaceReport, PressReport};
pub use runner::{analyze, analyze_furnace, analyze_press, PipelineError};
