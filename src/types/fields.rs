//! Language-neutral field identifiers
//!
//! Every stage addresses columns by these ids. Display labels (the
//! headers printed on the plant's spreadsheet exports) live in
//! `ingest::columns` and are only used at the edges.

/// Timestamp column shared by both machines.
pub const TIMESTAMP: &str = "timestamp";

/// Suffix of every temperature reading (set-points included).
pub const TEMP_SUFFIX: &str = "_temp";

/// Suffix of set-point temperature columns.
pub const SET_TEMP_SUFFIX: &str = "_set_temp";

/// Suffix of heater power percentage columns.
pub const POWER_SUFFIX: &str = "_power_pct";

// ============================================================================
// Injection press
// ============================================================================

pub mod press {
    /// Mold fill time (ms).
    pub const FILL_TIME: &str = "fill_time_ms";
    /// Piston friction pressure (bar).
    pub const PISTON_PRESSURE: &str = "piston_pressure_bar";
    pub const PHASE1_SPEED: &str = "phase1_speed";
    pub const PHASE2_SPEED: &str = "phase2_speed";
    /// Phase-three pressure rise time (ms).
    pub const PRESSURE_RISE: &str = "phase3_rise_ms";
    pub const SPECIFIC_PRESSURE: &str = "specific_pressure_bar";
    pub const MOLD_NO: &str = "mold_no";
    pub const SHOT_NO: &str = "shot_no";

    /// Columns a press dataset must carry before any analysis starts.
    pub const REQUIRED: [&str; 9] = [
        FILL_TIME,
        PISTON_PRESSURE,
        PHASE1_SPEED,
        PHASE2_SPEED,
        PRESSURE_RISE,
        SPECIFIC_PRESSURE,
        MOLD_NO,
        SHOT_NO,
        super::TIMESTAMP,
    ];
}

// ============================================================================
// Furnace
// ============================================================================

pub mod furnace {
    /// One set-point / actual temperature comparison.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ZonePair {
        /// Human-facing name used in reports (`zone2_lower1`).
        pub name: &'static str,
        /// Zone number (0 for the preheat section).
        pub zone: u8,
        pub set_id: &'static str,
        pub actual_id: &'static str,
    }

    const fn pair(name: &'static str, zone: u8, set_id: &'static str, actual_id: &'static str) -> ZonePair {
        ZonePair {
            name,
            zone,
            set_id,
            actual_id,
        }
    }

    /// The twelve controlled positions, in report order.
    pub const ZONE_PAIRS: [ZonePair; 12] = [
        pair("preheat", 0, "preheat_set_temp", "preheat_temp"),
        pair("zone1_upper1", 1, "zone1_upper1_set_temp", "zone1_upper1_temp"),
        pair("zone1_upper2", 1, "zone1_upper2_set_temp", "zone1_upper2_temp"),
        pair("zone1_lower1", 1, "zone1_lower1_set_temp", "zone1_lower1_temp"),
        pair("zone2_upper1", 2, "zone2_upper1_set_temp", "zone2_upper1_temp"),
        pair("zone2_upper2", 2, "zone2_upper2_set_temp", "zone2_upper2_temp"),
        pair("zone2_lower1", 2, "zone2_lower1_set_temp", "zone2_lower1_temp"),
        pair("zone2_lower2", 2, "zone2_lower2_set_temp", "zone2_lower2_temp"),
        pair("zone3_upper1", 3, "zone3_upper1_set_temp", "zone3_upper1_temp"),
        pair("zone3_upper2", 3, "zone3_upper2_set_temp", "zone3_upper2_temp"),
        pair("zone3_lower1", 3, "zone3_lower1_set_temp", "zone3_lower1_temp"),
        pair("zone3_lower2", 3, "zone3_lower2_set_temp", "zone3_lower2_temp"),
    ];

    pub const COOLING1: &str = "cooling1_temp";
    pub const COOLING2: &str = "cooling2_temp";
    pub const COOLING3: &str = "cooling3_temp";

    /// Cooling stages, hottest first.
    pub const COOLING_STAGES: [&str; 3] = [COOLING1, COOLING2, COOLING3];

    /// Sensors watched for row-to-row jumps.
    pub const SUDDEN_CHANGE_SENSORS: [&str; 6] = [
        "zone1_upper1_temp",
        "zone2_upper1_temp",
        "zone3_upper1_temp",
        COOLING1,
        COOLING2,
        COOLING3,
    ];

    /// Zones compared for thermal balance.
    pub const BALANCE_ZONES: [u8; 3] = [1, 2, 3];

    /// Stands for the power columns in missing-column errors; at least one
    /// column ending in `_power_pct` is required.
    pub const POWER_COLUMNS: &str = "*_power_pct";

    /// Named furnace schema. Power columns are discovered by suffix.
    pub fn required() -> Vec<&'static str> {
        let mut cols = vec![super::TIMESTAMP];
        for p in &ZONE_PAIRS {
            cols.push(p.set_id);
            cols.push(p.actual_id);
        }
        cols.extend(COOLING_STAGES);
        cols
    }
}

/// True for actual (non set-point) temperature columns.
pub fn is_actual_temp(name: &str) -> bool {
    name.ends_with(TEMP_SUFFIX) && !name.ends_with(SET_TEMP_SUFFIX)
}

/// True for any temperature column, set-points included.
pub fn is_temp(name: &str) -> bool {
    name.ends_with(TEMP_SUFFIX)
}

pub fn is_power(name: &str) -> bool {
    name.ends_with(POWER_SUFFIX)
}

/// Zone number encoded in a field id (`zone2_upper1_temp` -> 2).
pub fn zone_of(name: &str) -> Option<u8> {
    let rest = name.strip_prefix("zone")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_pairs_are_consistent() {
        for p in &furnace::ZONE_PAIRS {
            assert!(p.set_id.ends_with(SET_TEMP_SUFFIX));
            assert!(is_actual_temp(p.actual_id));
            assert_eq!(p.set_id.replace("_set_temp", "_temp"), p.actual_id);
            if p.zone > 0 {
                assert_eq!(zone_of(p.actual_id), Some(p.zone));
            }
        }
    }

    #[test]
    fn test_zone_of() {
        assert_eq!(zone_of("zone3_lower2_temp"), Some(3));
        assert_eq!(zone_of("zone1_upper1_power_pct"), Some(1));
        assert_eq!(zone_of("cooling1_temp"), None);
        assert_eq!(zone_of("zone_x"), None);
    }

    #[test]
    fn test_furnace_required_has_all_sensors() {
        let req = furnace::required();
        assert_eq!(req.len(), 1 + 24 + 3);
        assert!(req.contains(&TIMESTAMP));
    }
}
