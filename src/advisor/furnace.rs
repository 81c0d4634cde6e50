//! Furnace maintenance rules

use super::durations;
use super::MaintenanceRule;
use crate::config::FurnaceAdvisorConfig;
use crate::scoring::FurnacePerformance;
use crate::types::{Priority, Recommendation};

/// Average set-point success rate below the floor.
pub struct TemperatureControl {
    pub min_success_pct: f64,
}

impl MaintenanceRule<FurnacePerformance> for TemperatureControl {
    fn name(&self) -> &str {
        "TemperatureControl"
    }

    fn evaluate(&self, report: &FurnacePerformance) -> Option<Recommendation> {
        let control = &report.temperature;
        let avg = control.average_success_pct;
        (!control.zones.is_empty() && avg < self.min_success_pct).then(|| {
            Recommendation::new(
                Priority::High,
                "Temperature control",
                format!("Set-point tracking success {avg:.1}% below {:.0}%", self.min_success_pct),
                "Recalibrate thermocouples and retune the PID loops",
                durations::HOURS_6_8,
            )
        })
    }
}

pub struct ZoneBalance {
    pub max_difference_c: f64,
}

impl MaintenanceRule<FurnacePerformance> for ZoneBalance {
    fn name(&self) -> &str {
        "ZoneBalance"
    }

    fn evaluate(&self, report: &FurnacePerformance) -> Option<Recommendation> {
        let diff = report.zone_balance.max_difference;
        (diff > self.max_difference_c).then(|| {
            Recommendation::new(
                Priority::High,
                "Zone balance",
                format!("Zone temperature difference {diff:.0} C above {:.0} C", self.max_difference_c),
                "Check heater elements and insulation in the hot zone",
                durations::HOURS_4_6,
            )
        })
    }
}

/// Low energy score, split on whether the heaters run hot or idle.
pub struct EnergyEfficiency {
    pub min_score: f64,
    pub high_power_pct: f64,
}

impl MaintenanceRule<FurnacePerformance> for EnergyEfficiency {
    fn name(&self) -> &str {
        "EnergyEfficiency"
    }

    fn evaluate(&self, report: &FurnacePerformance) -> Option<Recommendation> {
        let energy = report.energy.as_ref()?;
        if energy.score >= self.min_score {
            return None;
        }
        let power = energy.mean_power_pct;
        Some(if power > self.high_power_pct {
            Recommendation::new(
                Priority::Medium,
                "Energy efficiency",
                format!("Mean heater power {power:.1}% is high"),
                "Tune heating elements and review the power control strategy",
                durations::HOURS_3_4,
            )
        } else {
            Recommendation::new(
                Priority::Low,
                "Capacity utilisation",
                format!("Mean heater power {power:.1}% is low"),
                "Review capacity utilisation and load planning",
                durations::HOURS_2_3_ANALYSIS,
            )
        })
    }
}

/// Cooling drop outside the effective band.
pub struct CoolingDelta {
    pub low_c: f64,
    pub high_c: f64,
}

impl MaintenanceRule<FurnacePerformance> for CoolingDelta {
    fn name(&self) -> &str {
        "CoolingDelta"
    }

    fn evaluate(&self, report: &FurnacePerformance) -> Option<Recommendation> {
        let delta = report.cooling.as_ref()?.delta;
        if delta < self.low_c {
            Some(Recommendation::new(
                Priority::Medium,
                "Cooling system",
                format!("Cooling drop {delta:.0} C below {:.0} C", self.low_c),
                "Check coolant flow, fans and heat exchanger fouling",
                durations::HOURS_2_3,
            ))
        } else if delta > self.high_c {
            Some(Recommendation::new(
                Priority::Low,
                "Cooling optimisation",
                format!("Cooling drop {delta:.0} C above {:.0} C", self.high_c),
                "Reduce cooling intensity to save energy",
                durations::HOURS_1_2,
            ))
        } else {
            None
        }
    }
}

/// Names the worst zones below the critical success rate.
pub struct CriticalZones {
    pub min_success_pct: f64,
    pub max_named: usize,
}

impl MaintenanceRule<FurnacePerformance> for CriticalZones {
    fn name(&self) -> &str {
        "CriticalZones"
    }

    fn evaluate(&self, report: &FurnacePerformance) -> Option<Recommendation> {
        let critical = report.temperature.zones_below(self.min_success_pct);
        if critical.is_empty() {
            return None;
        }
        let named: Vec<String> = critical
            .iter()
            .take(self.max_named)
            .map(|z| format!("{} ({:.1}%)", z.zone, z.success_pct))
            .collect();
        Some(Recommendation::new(
            Priority::High,
            "Critical zones",
            format!(
                "{} zone(s) below {:.0}% success: {}",
                critical.len(),
                self.min_success_pct,
                named.join(", ")
            ),
            "Inspect thermocouples and heaters in the named zones first",
            durations::HOURS_4_6,
        ))
    }
}

/// The furnace rule set, in evaluation order.
pub fn furnace_rules(config: &FurnaceAdvisorConfig) -> Vec<Box<dyn MaintenanceRule<FurnacePerformance>>> {
    vec![
        Box::new(TemperatureControl {
            min_success_pct: config.min_control_success_pct,
        }),
        Box::new(ZoneBalance {
            max_difference_c: config.max_zone_imbalance_c,
        }),
        Box::new(EnergyEfficiency {
            min_score: config.min_energy_score,
            high_power_pct: config.high_power_pct,
        }),
        Box::new(CoolingDelta {
            low_c: config.cooling_delta_low_c,
            high_c: config.cooling_delta_high_c,
        }),
        Box::new(CriticalZones {
            min_success_pct: config.critical_zone_success_pct,
            max_named: config.max_critical_zones,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::advise;
    use crate::scoring::furnace::{
        CoolingEffectiveness, EnergyEfficiency as Energy, OperationalConsistency, TemperatureControl as Control,
        ZoneBalance as Balance, ZoneControl,
    };
    use crate::scoring::FurnaceCompositeScore;
    use crate::types::{EnergyStatus, HealthBand, PowerTrend};

    fn zone(name: &str, pct: f64) -> ZoneControl {
        ZoneControl {
            zone: name.to_string(),
            success_pct: pct,
            mean_deviation: 2.0,
            max_deviation: 8.0,
        }
    }

    fn report(zones: Vec<ZoneControl>, power: f64, energy_score: f64, delta: f64, diff: f64) -> FurnacePerformance {
        let rates: Vec<f64> = zones.iter().map(|z| z.success_pct).collect();
        FurnacePerformance {
            temperature: Control {
                tolerance_c: 10.0,
                average_success_pct: rates.iter().sum::<f64>() / rates.len() as f64,
                zones,
            },
            energy: Some(Energy {
                power_columns: 4,
                mean_power_pct: power,
                score: energy_score,
                status: EnergyStatus::Optimal,
                daily_change: 0.0,
                trend: PowerTrend::Stable,
            }),
            cooling: Some(CoolingEffectiveness {
                stage_means: [400.0, 300.0, 400.0 - delta],
                delta,
                delta_12: 100.0,
                delta_23: delta - 100.0,
                balanced: true,
                score: 100.0,
            }),
            zone_balance: Balance {
                zone_means: Vec::new(),
                max_difference: diff,
                score: 100.0,
            },
            consistency: OperationalConsistency::default(),
            composite: FurnaceCompositeScore {
                temperature_score: 50.0,
                energy_score: 30.0,
                cooling_score: 20.0,
                total: 100.0,
                band: HealthBand::Excellent,
            },
        }
    }

    #[test]
    fn test_healthy_furnace_no_recommendations() {
        let rules = furnace_rules(&FurnaceAdvisorConfig::default());
        let healthy = report(vec![zone("zone1_upper1", 100.0), zone("zone2_upper1", 100.0)], 60.0, 100.0, 200.0, 0.0);
        assert!(advise(&rules, &healthy).is_empty());
    }

    #[test]
    fn test_energy_branches_on_power() {
        let rules = furnace_rules(&FurnaceAdvisorConfig::default());
        let zones = || vec![zone("zone1_upper1", 100.0)];

        let hot = advise(&rules, &report(zones(), 85.0, 65.0, 200.0, 0.0));
        assert_eq!(hot.len(), 1);
        assert_eq!(hot[0].priority, Priority::Medium);
        assert_eq!(hot[0].category, "Energy efficiency");

        let idle = advise(&rules, &report(zones(), 20.0, 60.0, 200.0, 0.0));
        assert_eq!(idle[0].priority, Priority::Low);
        assert_eq!(idle[0].category, "Capacity utilisation");
    }

    #[test]
    fn test_cooling_outside_band() {
        let rules = furnace_rules(&FurnaceAdvisorConfig::default());
        let zones = || vec![zone("zone1_upper1", 100.0)];
        let low = advise(&rules, &report(zones(), 60.0, 100.0, 120.0, 0.0));
        assert_eq!(low[0].priority, Priority::Medium);
        let high = advise(&rules, &report(zones(), 60.0, 100.0, 300.0, 0.0));
        assert_eq!(high[0].priority, Priority::Low);
        assert_eq!(high[0].category, "Cooling optimisation");
    }

    #[test]
    fn test_critical_zones_names_worst_three() {
        let rules = furnace_rules(&FurnaceAdvisorConfig::default());
        let zones = vec![
            zone("preheat", 50.0),
            zone("zone1_upper1", 10.0),
            zone("zone1_upper2", 95.0),
            zone("zone2_upper1", 30.0),
            zone("zone3_lower2", 30.0),
        ];
        let recs = advise(&rules, &report(zones, 60.0, 100.0, 200.0, 120.0));
        let categories: Vec<&str> = recs.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["Temperature control", "Zone balance", "Critical zones"]);
        let critical = &recs[2].problem;
        assert!(critical.starts_with("4 zone(s)"));
        assert!(critical.contains("zone1_upper1 (10.0%), zone2_upper1 (30.0%), zone3_lower2 (30.0%)"));
        assert!(!critical.contains("preheat"));
    }
}
