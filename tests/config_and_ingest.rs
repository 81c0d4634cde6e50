//! Config and Ingest Tests
//!
//! File-level behaviour of the two edges of the pipeline: TOML configs read
//! from disk, and CSV exports read from disk.

use std::io::Write;

use plant_health::config::validation::validate_unknown_keys;
use plant_health::types::fields::{furnace, press};
use plant_health::{load_csv, AnalysisConfig, ConfigError, IngestError, OutlierMethod};

fn write_temp(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn config_file_overrides_only_named_fields() {
    let file = write_temp(
        r#"
[site]
plant = "Manisa"
furnace_name = "F-2"

[press]
outlier_method = "zscore"
fill_time_k = 3.0

[furnace]
setpoint_tolerance_c = 5.0
"#,
        ".toml",
    );
    let config = AnalysisConfig::load_from_file(file.path()).unwrap();
    let defaults = AnalysisConfig::default();

    assert_eq!(config.site.plant, "Manisa");
    assert_eq!(config.site.furnace_name, "F-2");
    assert_eq!(config.press.outlier_method, OutlierMethod::ZScore);
    assert!((config.press.fill_time_k - 3.0).abs() < f64::EPSILON);
    assert!((config.furnace.setpoint_tolerance_c - 5.0).abs() < f64::EPSILON);
    // untouched sections keep their defaults
    assert_eq!(config.repair, defaults.repair);
    assert_eq!(config.advisor, defaults.advisor);
    assert!((config.press.pressure_rise_k - defaults.press.pressure_rise_k).abs() < f64::EPSILON);
}

#[test]
fn config_validation_errors_are_collected() {
    let file = write_temp(
        r#"
[repair]
temp_min_c = 500.0
temp_max_c = 100.0

[advisor.furnace]
max_critical_zones = 0
"#,
        ".toml",
    );
    let err = AnalysisConfig::load_from_file(file.path()).unwrap_err();
    let ConfigError::Validation(errors) = &err else {
        panic!("expected validation error, got {err}");
    };
    assert!(errors.iter().any(|e| e.contains("repair.temp")));
    assert!(errors.iter().any(|e| e.contains("max_critical_zones")));
}

#[test]
fn config_parse_error_names_the_file() {
    let file = write_temp("[press\nfill_time_k = ", ".toml");
    let err = AnalysisConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(..)));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn config_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AnalysisConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}

#[test]
fn config_typo_is_a_warning_not_an_error() {
    let toml_str = r#"
[furnace]
setpoint_tolerence_c = 8.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("furnace.setpoint_tolerance_c"));
    // The config still loads with the default tolerance
    let config = AnalysisConfig::from_toml_str(toml_str).unwrap();
    assert!((config.furnace.setpoint_tolerance_c - 10.0).abs() < f64::EPSILON);
}

#[test]
fn config_round_trips_through_toml() {
    let mut config = AnalysisConfig::default();
    config.site.press_name = "P-7".to_string();
    config.advisor.press.min_quality_pct = 92.5;
    let text = config.to_toml().unwrap();
    assert_eq!(AnalysisConfig::from_toml_str(&text).unwrap(), config);
}

// ============================================================================
// Ingest
// ============================================================================

#[test]
fn load_csv_maps_furnace_headers() {
    let file = write_temp(
        "\u{feff}TARİH,SAAT,CEH.1 ÜST1 SET ISI,CEH.1 ÜST1 ISI,SOĞUTMA1 ISI,CEH.1 ÜST1 GÜÇ %\n\
         05.02.2024,08:00:00,820,\"818,5\",421,61\n\
         05.02.2024,08:03:00,820,819,-3276,60\n",
        ".csv",
    );
    let (dataset, report) = load_csv(file.path()).unwrap();

    assert_eq!(report.rows, 2);
    assert_eq!(dataset.numeric("zone1_upper1_set_temp").unwrap(), &[Some(820.0), Some(820.0)]);
    assert_eq!(dataset.numeric("zone1_upper1_temp").unwrap(), &[Some(818.5), Some(819.0)]);
    // Fault sentinels are kept for the repair stage
    assert_eq!(dataset.numeric(furnace::COOLING1).unwrap()[1], Some(-3276.0));
    assert!(dataset.has_column("zone1_upper1_power_pct"));
    assert_eq!(dataset.timestamps().unwrap()[1].format("%H:%M").to_string(), "08:03");
}

#[test]
fn load_csv_keeps_text_columns_and_counts_header_repeats() {
    let file = write_temp(
        "TARİH,KALIP NO,KALIP DOLUM ZAMANI\n\
         tarih,kalip,dolum\n\
         2024-05-02 10:00:00,K-1,790\n\
         2024-05-02 10:01:00,K-2,\n",
        ".csv",
    );
    let (dataset, report) = load_csv(file.path()).unwrap();
    assert_eq!(report.header_rows_dropped, 1);
    assert_eq!(report.text_columns, vec![press::MOLD_NO.to_string()]);
    assert_eq!(dataset.numeric(press::FILL_TIME).unwrap(), &[Some(790.0), None]);
}

#[test]
fn load_csv_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_csv(dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
}
