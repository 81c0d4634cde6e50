//! Synthetic sensor log generator
//!
//! Writes a press or furnace CSV export with the plant's spreadsheet
//! headers, for exercising `plant-health` without production data.
//! Simulates:
//! - Normal operation around nominal set-points
//! - Sensor faults (the -3276 sentinel the loggers emit on a broken probe)
//! - Slow drift over the run (fill time creeping up, zone 3 sagging)
//! - Critical pressure-rise shots on the press
//!
//! # Usage
//! ```bash
//! ./simulation --domain press --rows 5000 --days 7 --seed 42 --out press.csv
//! ./simulation --domain furnace --fault-rate 0.02 > furnace.csv
//! ```

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use plant_health::ingest::display_label;
use plant_health::types::fields::{furnace, press, TIMESTAMP};
use plant_health::Domain;

// ============================================================================
// Process Constants
// ============================================================================

/// Nominal fill time (ms)
const BASE_FILL_MS: f64 = 950.0;
/// Nominal phase-three pressure rise (ms)
const BASE_RISE_MS: f64 = 120.0;
/// Nominal piston friction pressure (bar)
const BASE_PISTON_BAR: f64 = 4.5;
/// Nominal specific pressure (bar)
const BASE_SPECIFIC_BAR: f64 = 850.0;
/// Reading written by the loggers for a broken probe
const SENSOR_FAULT: f64 = -3276.0;
/// Set-points per zone (0 = preheat)
const ZONE_SET_C: [f64; 4] = [650.0, 820.0, 860.0, 880.0];
/// Cooling stage means, hottest first
const COOLING_C: [f64; 3] = [420.0, 330.0, 220.0];
const MOLDS: [&str; 4] = ["K-101", "K-102", "K-205", "K-310"];

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "simulation")]
#[command(about = "Synthetic press / furnace CSV generator for plant-health testing")]
#[command(version)]
struct Args {
    /// Machine family to simulate (press or furnace)
    #[arg(short, long)]
    domain: Domain,

    /// Number of rows to write
    #[arg(short, long, default_value = "2000", value_parser = clap::value_parser!(u32).range(1..=1_000_000))]
    rows: u32,

    /// Days covered by the run
    #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=366))]
    days: u32,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Share of rows carrying an injected fault (0-1)
    #[arg(long, default_value = "0.01")]
    fault_rate: f64,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

struct Simulator {
    rng: StdRng,
    start: NaiveDateTime,
    step_seconds: i64,
    rows: u32,
    fault_rate: f64,
}

impl Simulator {
    fn new(args: &Args) -> Self {
        let rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        let span_seconds = i64::from(args.days) * 86_400;
        Self {
            rng,
            start,
            step_seconds: (span_seconds / i64::from(args.rows)).max(1),
            rows: args.rows,
            fault_rate: args.fault_rate.clamp(0.0, 1.0),
        }
    }

    fn timestamp(&self, row: u32) -> NaiveDateTime {
        self.start + Duration::seconds(i64::from(row) * self.step_seconds)
    }

    fn progress(&self, row: u32) -> f64 {
        f64::from(row) / f64::from(self.rows)
    }

    fn noisy(&mut self, mean: f64, std: f64) -> f64 {
        Normal::new(mean, std).map_or(mean, |n| n.sample(&mut self.rng))
    }

    fn fault(&mut self) -> bool {
        self.rng.gen_bool(self.fault_rate)
    }

    fn write_press(&mut self, out: &mut impl Write) -> io::Result<()> {
        let columns = [
            TIMESTAMP,
            press::MOLD_NO,
            press::SHOT_NO,
            press::FILL_TIME,
            press::PISTON_PRESSURE,
            press::PHASE1_SPEED,
            press::PHASE2_SPEED,
            press::PRESSURE_RISE,
            press::SPECIFIC_PRESSURE,
        ];
        write_header(out, &columns)?;

        for row in 0..self.rows {
            let drift = self.progress(row) * 80.0;
            let mold = MOLDS[(row as usize / 250) % MOLDS.len()];
            let mut fill = self.noisy(BASE_FILL_MS + drift, 60.0);
            let mut rise = self.noisy(BASE_RISE_MS, 20.0);
            if self.fault() {
                if self.rng.gen_bool(0.5) {
                    rise = self.noisy(1250.0, 100.0);
                } else {
                    fill = self.noisy(2500.0, 80.0);
                }
            }
            let piston = self.noisy(BASE_PISTON_BAR, 0.4);
            let phase1 = self.noisy(0.35, 0.03);
            let phase2 = self.noisy(3.2, 0.2);
            let specific = self.noisy(BASE_SPECIFIC_BAR, 30.0);
            writeln!(
                out,
                "{},{mold},{},{fill:.1},{piston:.2},{phase1:.3},{phase2:.3},{rise:.1},{specific:.1}",
                self.timestamp(row).format("%Y-%m-%d %H:%M:%S"),
                100_000 + row,
            )?;
        }
        Ok(())
    }

    fn write_furnace(&mut self, out: &mut impl Write) -> io::Result<()> {
        let power_ids: Vec<String> = furnace::ZONE_PAIRS
            .iter()
            .map(|p| p.actual_id.replace("_temp", "_power_pct"))
            .collect();

        let mut columns: Vec<&str> = vec![TIMESTAMP];
        for pair in &furnace::ZONE_PAIRS {
            columns.push(pair.set_id);
            columns.push(pair.actual_id);
        }
        columns.extend(furnace::COOLING_STAGES);
        columns.extend(power_ids.iter().map(String::as_str));
        write_header(out, &columns)?;

        for row in 0..self.rows {
            let sag = self.progress(row) * 25.0;
            let mut cells = vec![self.timestamp(row).format("%Y-%m-%d %H:%M:%S").to_string()];
            for pair in &furnace::ZONE_PAIRS {
                let set = ZONE_SET_C[usize::from(pair.zone)];
                let offset = if pair.zone == 3 { sag } else { 0.0 };
                let mut actual = self.noisy(set - offset, 4.0);
                if self.fault() {
                    actual = SENSOR_FAULT;
                }
                cells.push(format!("{set:.0}"));
                cells.push(format!("{actual:.1}"));
            }
            for mean in COOLING_C {
                let value = self.noisy(mean, 8.0);
                cells.push(format!("{value:.1}"));
            }
            for _ in &power_ids {
                let power = self.noisy(60.0, 6.0).clamp(0.0, 100.0);
                cells.push(format!("{power:.1}"));
            }
            writeln!(out, "{}", cells.join(","))?;
        }
        Ok(())
    }
}

fn write_header(out: &mut impl Write, ids: &[&str]) -> io::Result<()> {
    let labels: Vec<String> = ids.iter().map(|id| display_label(id)).collect();
    writeln!(out, "{}", labels.join(","))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut sim = Simulator::new(&args);

    let mut out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    match args.domain {
        Domain::Press => sim.write_press(&mut out),
        Domain::Furnace => sim.write_furnace(&mut out),
    }
    .context("writing CSV")?;
    out.flush().context("flushing output")?;

    if let Some(path) = &args.out {
        eprintln!("Wrote {} {} rows to {}", args.rows, args.domain, path.display());
    }
    Ok(())
}
