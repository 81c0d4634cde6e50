//! Sensor Repair Engine and dataset cleaning
//!
//! - `interpolate`: physical-range fault repair and gap filling for one column
//! - `cleaning`: per-machine cleaning with a `CleaningReport`

pub mod cleaning;
pub mod interpolate;

pub use cleaning::{clean_furnace, clean_press, CleaningReport, ColumnOutliers, ColumnRepair};
pub use interpolate::{fill_gaps, repair, RepairFailure, RepairOutcome};
