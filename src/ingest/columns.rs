//! Spreadsheet header <-> neutral field id mapping
//!
//! Plant exports label columns in Turkish with inconsistent spacing and
//! diacritics (`CEH.1 ÜST2  ISI`, `SOGUTMA3 ISI`). Headers are folded to
//! upper-case ASCII with single spaces before matching, so both spellings
//! map to the same id.

use regex::Regex;

use crate::types::fields::{furnace, press, TIMESTAMP};

/// Separate time-of-day column merged into the timestamp at load time.
pub const TIME_OF_DAY: &str = "time_of_day";

/// Inlet temperature (furnace entry), analysed like any actual sensor.
pub const INLET_TEMP: &str = "inlet_temp";

/// (folded header, id, display label)
const FIXED: [(&str, &str, &str); 10] = [
    ("KALIP DOLUM ZAMANI", press::FILL_TIME, "KALIP DOLUM ZAMANI"),
    ("PISTON SURTUNME BASINCI", press::PISTON_PRESSURE, "PİSTON SÜRTÜNME BASINCI"),
    ("BIRINCI FAZ HIZI", press::PHASE1_SPEED, "BİRİNCİ FAZ HIZI"),
    ("IKINCI FAZ HIZI", press::PHASE2_SPEED, "İKİNCİ FAZ HIZI"),
    ("3. FAZ BASINC YUKSELME ZAMANI", press::PRESSURE_RISE, "3. FAZ BASINC YÜKSELME ZAMANI"),
    ("SPESIFIK BASINC BAR", press::SPECIFIC_PRESSURE, "SPESİFİK BASINÇ BAR"),
    ("KALIP NO", press::MOLD_NO, "KALIP NO"),
    ("BASKI NO", press::SHOT_NO, "BASKI NO"),
    ("TARIH", TIMESTAMP, "TARİH"),
    ("SAAT", TIME_OF_DAY, "SAAT"),
];

/// Upper-case, strip Turkish diacritics, collapse whitespace.
pub fn fold_header(header: &str) -> String {
    let upper: String = header
        .trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .flat_map(char::to_uppercase)
        .map(|c| match c {
            'İ' | 'I' => 'I',
            'Ş' => 'S',
            'Ğ' => 'G',
            'Ü' => 'U',
            'Ö' => 'O',
            'Ç' => 'C',
            other => other,
        })
        .collect();
    upper.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-case snake id for headers nobody has named.
pub fn slugify(header: &str) -> String {
    let folded = fold_header(header).to_lowercase();
    let mut slug = String::with_capacity(folded.len());
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

fn position(token: &str) -> &'static str {
    if token == "UST" {
        "upper"
    } else {
        "lower"
    }
}

/// Compiled header patterns.
pub struct HeaderMapper {
    zone_temp: Regex,
    zone_power: Regex,
    preheat_temp: Regex,
    preheat_power: Regex,
    cooling: Regex,
    inlet: Regex,
    neutral: Regex,
}

impl HeaderMapper {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            zone_temp: Regex::new(r"^CEH\.? ?(\d) (UST|ALT) ?(\d) (SET )?ISI$")?,
            zone_power: Regex::new(r"^CEH\.? ?(\d)(?: (UST|ALT) ?(\d))? GUC ?%$")?,
            preheat_temp: Regex::new(r"^ON ISITMA (SET )?ISI$")?,
            preheat_power: Regex::new(r"^ON ISITMA GUC ?%$")?,
            cooling: Regex::new(r"^SOGUTMA ?(\d) ISI$")?,
            inlet: Regex::new(r"^GIRIS ISI$")?,
            neutral: Regex::new(r"^[a-z][a-z0-9_]*$")?,
        })
    }

    /// Neutral id for a raw header.
    pub fn map(&self, header: &str) -> String {
        let trimmed = header.trim().trim_start_matches('\u{feff}');
        let folded = fold_header(trimmed);
        if let Some((_, id, _)) = FIXED.iter().find(|(label, _, _)| *label == folded) {
            return (*id).to_string();
        }
        if self.neutral.is_match(trimmed) {
            return trimmed.to_string();
        }
        if let Some(c) = self.zone_temp.captures(&folded) {
            let kind = if c.get(4).is_some() { "set_temp" } else { "temp" };
            return format!("zone{}_{}{}_{kind}", &c[1], position(&c[2]), &c[3]);
        }
        if let Some(c) = self.zone_power.captures(&folded) {
            return match (c.get(2), c.get(3)) {
                (Some(pos), Some(n)) => format!("zone{}_{}{}_power_pct", &c[1], position(pos.as_str()), n.as_str()),
                _ => format!("zone{}_power_pct", &c[1]),
            };
        }
        if let Some(c) = self.preheat_temp.captures(&folded) {
            return if c.get(1).is_some() { "preheat_set_temp" } else { "preheat_temp" }.to_string();
        }
        if self.preheat_power.is_match(&folded) {
            return "preheat_power_pct".to_string();
        }
        if let Some(c) = self.cooling.captures(&folded) {
            return format!("cooling{}_temp", &c[1]);
        }
        if self.inlet.is_match(&folded) {
            return INLET_TEMP.to_string();
        }
        slugify(trimmed)
    }
}

/// Header label printed for a neutral id; unknown ids print as themselves.
pub fn display_label(id: &str) -> String {
    if let Some((_, _, label)) = FIXED.iter().find(|(_, fid, _)| *fid == id) {
        return (*label).to_string();
    }
    if let Some(n) = id.strip_prefix("cooling").and_then(|r| r.strip_suffix("_temp")) {
        return format!("SOĞUTMA{n} ISI");
    }
    match id {
        "preheat_temp" => return "ÖN ISITMA ISI".to_string(),
        "preheat_set_temp" => return "ÖN ISITMA SET ISI".to_string(),
        "preheat_power_pct" => return "ÖN ISITMA GÜÇ %".to_string(),
        INLET_TEMP => return "GİRİŞ ISI".to_string(),
        _ => {}
    }
    if let Some(rest) = id.strip_prefix("zone") {
        let (kind, body) = if let Some(b) = rest.strip_suffix("_set_temp") {
            ("SET ISI", b)
        } else if let Some(b) = rest.strip_suffix("_power_pct") {
            ("GÜÇ %", b)
        } else if let Some(b) = rest.strip_suffix("_temp") {
            ("ISI", b)
        } else {
            return id.to_string();
        };
        let mut parts = body.splitn(2, '_');
        let zone = parts.next().unwrap_or_default();
        return match parts.next() {
            Some(pos) => {
                let label = pos.replace("upper", "ÜST").replace("lower", "ALT");
                format!("CEH.{zone} {label} {kind}")
            }
            None => format!("CEH.{zone} {kind}"),
        };
    }
    id.to_string()
}

/// Display label of a zone pair (`zone2_lower1` -> `CEH.2 ALT1`).
pub fn zone_label(pair: &furnace::ZonePair) -> String {
    display_label(pair.actual_id).trim_end_matches(" ISI").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_headers() {
        let m = HeaderMapper::new().unwrap();
        assert_eq!(m.map("KALIP DOLUM ZAMANI"), press::FILL_TIME);
        assert_eq!(m.map(" PİSTON SÜRTÜNME BASINCI "), press::PISTON_PRESSURE);
        assert_eq!(m.map("3. FAZ BASINC YÜKSELME ZAMANI"), press::PRESSURE_RISE);
        assert_eq!(m.map("tarih"), TIMESTAMP);
        assert_eq!(m.map("TARİH"), TIMESTAMP);
    }

    #[test]
    fn test_furnace_headers() {
        let m = HeaderMapper::new().unwrap();
        assert_eq!(m.map("CEH.2 ÜST1 SET ISI"), "zone2_upper1_set_temp");
        assert_eq!(m.map("CEH.1 ÜST2  ISI"), "zone1_upper2_temp");
        assert_eq!(m.map("CEH.3 ALT2 ISI"), "zone3_lower2_temp");
        assert_eq!(m.map("CEH.1 ÜST1 GÜÇ %"), "zone1_upper1_power_pct");
        assert_eq!(m.map("SOĞUTMA3 ISI"), furnace::COOLING3);
        assert_eq!(m.map("SOGUTMA1 ISI"), furnace::COOLING1);
        assert_eq!(m.map("ÖN ISITMA SET ISI"), "preheat_set_temp");
        assert_eq!(m.map("ÖN ISITMA GÜÇ %"), "preheat_power_pct");
        assert_eq!(m.map("GİRİŞ ISI"), INLET_TEMP);
    }

    #[test]
    fn test_neutral_and_unknown_headers() {
        let m = HeaderMapper::new().unwrap();
        assert_eq!(m.map("zone1_upper1_temp"), "zone1_upper1_temp");
        assert_eq!(m.map("Operatör Notu"), "operator_notu");
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(display_label("zone2_upper1_set_temp"), "CEH.2 ÜST1 SET ISI");
        assert_eq!(display_label("zone1_lower1_power_pct"), "CEH.1 ALT1 GÜÇ %");
        assert_eq!(display_label(furnace::COOLING2), "SOĞUTMA2 ISI");
        assert_eq!(display_label(press::PISTON_PRESSURE), "PİSTON SÜRTÜNME BASINCI");
        assert_eq!(display_label("mystery"), "mystery");
        assert_eq!(zone_label(&furnace::ZONE_PAIRS[6]), "CEH.2 ALT1");
    }

    #[test]
    fn test_labels_map_back_to_ids() {
        let m = HeaderMapper::new().unwrap();
        for id in furnace::required() {
            assert_eq!(m.map(&display_label(id)), id);
        }
        for id in press::REQUIRED {
            assert_eq!(m.map(&display_label(id)), id);
        }
    }
}
