//! Furnace Pipeline Integration Test
//!
//! Three days of furnace logging at 20 records/hour, written in the plant's
//! header layout and pushed through repair, anomaly aggregation, scoring and
//! the advisor.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use plant_health::ingest::display_label;
use plant_health::types::fields::{furnace, TIMESTAMP};
use plant_health::types::IssueKind;
use plant_health::{analyze_furnace, parse_csv, AnalysisConfig, Dataset, HealthBand, Priority};

/// 3 days * 24 h * 20 records/h
const ROWS: usize = 1440;
const SENSOR_FAULT: f64 = -3276.0;

#[derive(Clone)]
struct Scenario {
    /// Degrees zone 3 runs below its set-point.
    zone3_sag: f64,
    power_pct: f64,
    /// Rows of `zone1_upper1_temp` carrying the fault sentinel.
    spikes: Vec<usize>,
    /// Actual-temperature column whose probe is dead for the whole run.
    dead_column: Option<&'static str>,
    /// Blank every power cell on rows where `i % n == 1`.
    power_gap_every: Option<usize>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            zone3_sag: 0.0,
            power_pct: 60.0,
            spikes: Vec::new(),
            dead_column: None,
            power_gap_every: None,
        }
    }
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, 5)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

fn set_point(zone: u8) -> f64 {
    match zone {
        0 => 650.0,
        1 => 820.0,
        2 => 860.0,
        _ => 880.0,
    }
}

fn power_ids() -> Vec<String> {
    furnace::ZONE_PAIRS
        .iter()
        .map(|p| p.actual_id.replace("_temp", "_power_pct"))
        .collect()
}

fn furnace_csv(s: &Scenario) -> String {
    let mut ids: Vec<String> = vec![TIMESTAMP.to_string()];
    for pair in &furnace::ZONE_PAIRS {
        ids.push(pair.set_id.to_string());
        ids.push(pair.actual_id.to_string());
    }
    ids.extend(furnace::COOLING_STAGES.iter().map(|c| (*c).to_string()));
    ids.extend(power_ids());
    let header: Vec<String> = ids.iter().map(|id| display_label(id)).collect();

    let mut csv = header.join(",");
    csv.push('\n');
    for i in 0..ROWS {
        let ts = start() + Duration::minutes(3 * i as i64);
        let offset = (i % 5) as f64 - 2.0;
        let mut cells = vec![ts.format("%Y-%m-%d %H:%M:%S").to_string()];
        for pair in &furnace::ZONE_PAIRS {
            let set = set_point(pair.zone);
            let sag = if pair.zone == 3 { s.zone3_sag } else { 0.0 };
            let mut actual = set - sag + offset;
            if Some(pair.actual_id) == s.dead_column
                || (pair.actual_id == "zone1_upper1_temp" && s.spikes.contains(&i))
            {
                actual = SENSOR_FAULT;
            }
            cells.push(format!("{set:.0}"));
            cells.push(format!("{actual:.1}"));
        }
        cells.extend(["420", "330", "220"].map(String::from));
        let power_gap = s.power_gap_every.is_some_and(|n| i % n == 1);
        for _ in 0..furnace::ZONE_PAIRS.len() {
            cells.push(if power_gap { String::new() } else { format!("{:.1}", s.power_pct) });
        }
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    csv
}

fn load(s: &Scenario) -> Dataset {
    let (dataset, report) = parse_csv(&furnace_csv(s)).expect("furnace CSV should parse");
    assert_eq!(report.rows, ROWS);
    assert!(report.text_columns.is_empty());
    dataset
}

#[test]
fn furnace_healthy_run_scores_full_marks() {
    let report = analyze_furnace(&load(&Scenario::default()), &AnalysisConfig::default()).unwrap();
    let perf = &report.performance;

    assert!((perf.temperature.average_success_pct - 100.0).abs() < 1e-9);
    assert_eq!(perf.temperature.zones.len(), furnace::ZONE_PAIRS.len());
    assert!((perf.energy.as_ref().unwrap().score - 100.0).abs() < 1e-9);

    let cooling = perf.cooling.as_ref().unwrap();
    assert!((cooling.delta - 200.0).abs() < 1e-9);
    assert!(cooling.balanced);

    // Zone means 820 / 860 / 880 -> 60 C spread
    assert!((perf.zone_balance.max_difference - 60.0).abs() < 1e-9);
    assert!((perf.zone_balance.score - 80.0).abs() < 1e-9);

    assert_eq!(perf.consistency.period_days, 3);
    assert_eq!(perf.consistency.records, ROWS);
    assert!((perf.consistency.record_ratio_pct - 100.0).abs() < 1e-9);
    assert!((perf.consistency.score - 100.0).abs() < 1e-9);

    assert!((perf.composite.total - 100.0).abs() < 1e-9);
    assert_eq!(perf.composite.band, HealthBand::Excellent);
    assert!(report.recommendations.is_empty());
}

#[test]
fn furnace_sensor_spikes_are_repaired_not_counted() {
    let scenario = Scenario {
        spikes: vec![10, 500, 1000],
        ..Default::default()
    };
    let report = analyze_furnace(&load(&scenario), &AnalysisConfig::default()).unwrap();

    assert_eq!(report.cleaning.repaired_values, 3);
    assert_eq!(report.cleaning.per_column["zone1_upper1_temp"].repaired, 3);
    assert!(report.cleaning.failures.is_empty());
    // Interpolated readings sit between neighbours, inside tolerance
    assert!((report.performance.temperature.average_success_pct - 100.0).abs() < 1e-9);
    assert!(report.anomalies.sudden_changes.iter().all(|c| c.count == 0));
}

#[test]
fn furnace_dead_probe_is_excluded_and_reported() {
    let scenario = Scenario {
        dead_column: Some("zone2_lower2_temp"),
        ..Default::default()
    };
    let report = analyze_furnace(&load(&scenario), &AnalysisConfig::default()).unwrap();

    assert_eq!(report.cleaning.failed_columns(), vec!["zone2_lower2_temp"]);
    assert!(report
        .issues
        .iter()
        .any(|i| i.kind == IssueKind::RepairFailure && i.subject == "zone2_lower2_temp"));

    let zones: Vec<&str> = report.performance.temperature.zones.iter().map(|z| z.zone.as_str()).collect();
    assert_eq!(zones.len(), furnace::ZONE_PAIRS.len() - 1);
    assert!(!zones.contains(&"zone2_lower2"));
    // The sentinel readings are not reported as set-point deviations
    assert!(!report
        .issues
        .iter()
        .any(|i| i.kind == IssueKind::DataQuality && i.subject == "zone2_lower2"));
    assert!(report
        .cleaning
        .outlier_survey
        .iter()
        .all(|o| o.column != "zone2_lower2_temp"));
    // The remaining pairs still track perfectly
    assert!((report.performance.composite.total - 100.0).abs() < 1e-9);
}

#[test]
fn furnace_sagging_zone_and_hot_heaters_raise_recommendations() {
    let scenario = Scenario {
        zone3_sag: 40.0,
        power_pct: 85.0,
        ..Default::default()
    };
    let config = AnalysisConfig::from_toml_str(
        r#"
[advisor.furnace]
min_energy_score = 90.0
"#,
    )
    .unwrap();
    let report = analyze_furnace(&load(&scenario), &config).unwrap();
    let perf = &report.performance;

    // 8 of 12 pairs on target, the four zone 3 pairs never within 10 C
    assert!((perf.temperature.average_success_pct - 800.0 / 12.0).abs() < 1e-9);
    assert!((perf.energy.as_ref().unwrap().score - 85.0).abs() < 1e-9);
    assert!((perf.zone_balance.max_difference - 40.0).abs() < 1e-9);

    let expected_total = 800.0 / 12.0 / 100.0 * 50.0 + 85.0 * 0.3 + 20.0;
    assert!((perf.composite.total - expected_total).abs() < 1e-6);
    assert_eq!(perf.composite.band, HealthBand::Good);

    let categories: Vec<&str> = report.recommendations.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["Temperature control", "Energy efficiency", "Critical zones"]);
    assert_eq!(report.recommendations[0].priority, Priority::High);

    let critical = &report.recommendations[2];
    assert!(critical.problem.starts_with("4 zone(s)"));
    assert!(critical.problem.contains("zone3_upper1 (0.0%)"));
    assert!(!critical.problem.contains("zone3_lower2"));
}

#[test]
fn furnace_power_gaps_are_filled_before_scoring() {
    let scenario = Scenario {
        power_pct: 95.0,
        power_gap_every: Some(2),
        ..Default::default()
    };
    let report = analyze_furnace(&load(&scenario), &AnalysisConfig::default()).unwrap();

    // Half the rows lose every power reading
    let gaps = ROWS / 2;
    assert_eq!(report.cleaning.filled_missing, gaps * furnace::ZONE_PAIRS.len());
    assert_eq!(report.cleaning.per_column["zone1_upper1_power_pct"].filled_missing, gaps);
    assert_eq!(report.cleaning.repaired_values, 0);

    // Filled rows count as running hot, not as idle
    assert_eq!(report.anomalies.high_power.len(), furnace::ZONE_PAIRS.len());
    assert!(report.anomalies.high_power.iter().all(|h| h.rows_above == ROWS));
    assert!((report.performance.energy.as_ref().unwrap().score - 75.0).abs() < 1e-9);
}
