//! Maintenance Advisor
//!
//! Each rule looks at one aspect of a performance report and either emits a
//! single recommendation or stays silent. Rules never see each other's
//! output; the result keeps rule-evaluation order and an empty list means
//! no action is needed.
//!
//! ## Rule sets
//!
//! 1. **Press**: hydraulic pressure, cycle time, pressure-rise valves,
//!    production efficiency, quality
//! 2. **Furnace**: temperature control, zone balance, energy, cooling,
//!    critical zones

pub mod furnace;
pub mod press;

pub use furnace::furnace_rules;
pub use press::press_rules;

use tracing::debug;

use crate::types::Recommendation;

/// A single maintenance rule over a performance report of type `R`.
pub trait MaintenanceRule<R>: Send + Sync {
    /// Rule name used in logs (e.g. "HydraulicPressure")
    fn name(&self) -> &str;

    /// Evaluate the report, returning a recommendation when the rule fires
    fn evaluate(&self, report: &R) -> Option<Recommendation>;
}

/// Run every rule in order and collect what fires.
pub fn advise<R>(rules: &[Box<dyn MaintenanceRule<R>>], report: &R) -> Vec<Recommendation> {
    rules
        .iter()
        .filter_map(|rule| {
            let rec = rule.evaluate(report);
            if let Some(r) = &rec {
                debug!(rule = rule.name(), priority = %r.priority, "Rule fired");
            }
            rec
        })
        .collect()
}

/// Fixed effort estimates attached to recommendations.
pub mod durations {
    pub const HOURS_1_2: &str = "1-2 hours";
    pub const HOURS_2_3: &str = "2-3 hours";
    pub const HOURS_3_4: &str = "3-4 hours";
    pub const HOURS_4_6: &str = "4-6 hours";
    pub const HOURS_6_8: &str = "6-8 hours";
    pub const DAYS_1_2: &str = "1-2 days (analysis)";
    pub const HOURS_2_3_ANALYSIS: &str = "2-3 hours (analysis)";
}
