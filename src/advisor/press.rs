//! Press maintenance rules

use super::durations;
use super::MaintenanceRule;
use crate::config::PressAdvisorConfig;
use crate::scoring::PressPerformance;
use crate::types::{Priority, Recommendation};

/// Mean piston friction pressure above the hydraulic limit.
pub struct HydraulicPressure {
    pub max_bar: f64,
}

impl MaintenanceRule<PressPerformance> for HydraulicPressure {
    fn name(&self) -> &str {
        "HydraulicPressure"
    }

    fn evaluate(&self, report: &PressPerformance) -> Option<Recommendation> {
        let pressure = report.mean_piston_pressure_bar?;
        (pressure > self.max_bar).then(|| {
            Recommendation::new(
                Priority::High,
                "Hydraulic system",
                format!("Mean piston friction pressure {pressure:.2} bar above {:.1} bar", self.max_bar),
                "Inspect piston seals and hydraulic oil, check for internal leakage",
                durations::HOURS_4_6,
            )
        })
    }
}

/// Mean cycle time above the acceptable limit.
pub struct SlowCycle {
    pub max_mean_ms: f64,
}

impl MaintenanceRule<PressPerformance> for SlowCycle {
    fn name(&self) -> &str {
        "SlowCycle"
    }

    fn evaluate(&self, report: &PressPerformance) -> Option<Recommendation> {
        let mean = report.cycle.mean_ms;
        (report.cycle.count > 0 && mean > self.max_mean_ms).then(|| {
            Recommendation::new(
                Priority::Medium,
                "Performance",
                format!("Mean cycle time {mean:.0} ms above {:.0} ms", self.max_mean_ms),
                "Optimise fill parameters and mold temperature",
                durations::HOURS_2_3,
            )
        })
    }
}

/// Too many shots with a slow phase-three pressure rise.
pub struct PressureRiseValves {
    pub max_over_limit: usize,
}

impl MaintenanceRule<PressPerformance> for PressureRiseValves {
    fn name(&self) -> &str {
        "PressureRiseValves"
    }

    fn evaluate(&self, report: &PressPerformance) -> Option<Recommendation> {
        let count = report.pressure_rise_over_limit;
        (count > self.max_over_limit).then(|| {
            Recommendation::new(
                Priority::High,
                "Valve system",
                format!("{count} shots with pressure-rise time over the critical limit"),
                "Check proportional valves and accumulator pre-charge",
                durations::HOURS_3_4,
            )
        })
    }
}

pub struct LowEfficiency {
    pub min_pct: f64,
}

impl MaintenanceRule<PressPerformance> for LowEfficiency {
    fn name(&self) -> &str {
        "LowEfficiency"
    }

    fn evaluate(&self, report: &PressPerformance) -> Option<Recommendation> {
        let pct = report.efficiency.efficiency_pct;
        (pct < self.min_pct).then(|| {
            Recommendation::new(
                Priority::Medium,
                "Production planning",
                format!("Production efficiency {pct:.1}% below {:.0}%", self.min_pct),
                "Review idle periods and shift planning",
                durations::DAYS_1_2,
            )
        })
    }
}

pub struct LowQuality {
    pub min_pct: f64,
}

impl MaintenanceRule<PressPerformance> for LowQuality {
    fn name(&self) -> &str {
        "LowQuality"
    }

    fn evaluate(&self, report: &PressPerformance) -> Option<Recommendation> {
        let pct = report.quality.quality_pct;
        (report.quality.total_shots > 0 && pct < self.min_pct).then(|| {
            Recommendation::new(
                Priority::High,
                "Quality control",
                format!("Quality rate {pct:.1}% below {:.0}%", self.min_pct),
                "Calibrate process parameters and review the quality control procedure",
                durations::HOURS_4_6,
            )
        })
    }
}

/// The press rule set, in evaluation order.
pub fn press_rules(config: &PressAdvisorConfig) -> Vec<Box<dyn MaintenanceRule<PressPerformance>>> {
    vec![
        Box::new(HydraulicPressure {
            max_bar: config.max_piston_pressure_bar,
        }),
        Box::new(SlowCycle {
            max_mean_ms: config.max_mean_cycle_ms,
        }),
        Box::new(PressureRiseValves {
            max_over_limit: config.max_rise_over_limit,
        }),
        Box::new(LowEfficiency {
            min_pct: config.min_efficiency_pct,
        }),
        Box::new(LowQuality {
            min_pct: config.min_quality_pct,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::advise;
    use crate::scoring::press::{CycleTimeStats, EfficiencyMetrics, QualityMetrics};
    use crate::scoring::PressHealthScore;
    use crate::types::{EfficiencyLevel, HealthBand};

    fn report(pressure: f64, cycle: f64, rise_over: usize, efficiency: f64, quality: f64) -> PressPerformance {
        PressPerformance {
            cycle: CycleTimeStats {
                count: 100,
                mean_ms: cycle,
                ..CycleTimeStats::default()
            },
            efficiency: EfficiencyMetrics {
                period_days: 1,
                total_hours: 24.0,
                actual_shots: 100,
                theoretical_shots: 100.0,
                efficiency_pct: efficiency,
                level: EfficiencyLevel::Acceptable,
                daily_production: None,
            },
            quality: QualityMetrics {
                total_shots: 100,
                pressure_anomalies: 0,
                fill_time_anomalies: 0,
                quality_pct: quality,
                band: HealthBand::Excellent,
            },
            health: PressHealthScore {
                cycle_score: 25.0,
                anomaly_score: 25.0,
                efficiency_score: 25.0,
                quality_score: 25.0,
                total: 100.0,
                band: HealthBand::Excellent,
            },
            mean_piston_pressure_bar: Some(pressure),
            pressure_rise_over_limit: rise_over,
        }
    }

    #[test]
    fn test_healthy_press_no_recommendations() {
        let rules = press_rules(&PressAdvisorConfig::default());
        assert!(advise(&rules, &report(4.5, 1500.0, 0, 95.0, 99.0)).is_empty());
    }

    #[test]
    fn test_rules_fire_in_order() {
        let rules = press_rules(&PressAdvisorConfig::default());
        let recs = advise(&rules, &report(6.5, 1900.0, 51, 40.0, 80.0));
        let categories: Vec<&str> = recs.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(
            categories,
            vec!["Hydraulic system", "Performance", "Valve system", "Production planning", "Quality control"]
        );
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[1].priority, Priority::Medium);
        assert_eq!(recs[3].duration, "1-2 days (analysis)");
    }

    #[test]
    fn test_limits_are_exclusive() {
        let rules = press_rules(&PressAdvisorConfig::default());
        assert!(advise(&rules, &report(6.0, 1800.0, 50, 60.0, 90.0)).is_empty());
    }
}
