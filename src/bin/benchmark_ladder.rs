//! Run the ladder simulator benchmark and optionally append one row to a log file for trend
//! tracking.
//!
//! Usage:
//!   cargo run --release --bin benchmark_ladder
//!   cargo run --release --bin benchmark_ladder -- --log
//!
//! --log  Append one row to benchmark_log.csv (date, trials_per_sec, draws_per_sec, trials_per_run).

use std::fs::OpenOptions;
use std::time::Instant;

use gacha_ev::data::tables::EventTables;
use gacha_ev::gacha::ladder;
use gacha_ev::gacha::rng::Rng;
use serde::Serialize;

const LOG_PATH: &str = "benchmark_log.csv";
const TRIALS_PER_RUN: u64 = 10_000;
const MIN_DURATION_MS: u128 = 2000;
const MIN_RUNS: u32 = 20;

#[derive(Serialize)]
struct LogRow {
    date: String,
    trials_per_sec: f64,
    draws_per_sec: f64,
    trials_per_run: u64,
}

fn main() {
    let log = std::env::args().any(|a| a == "--log");

    let tables = match EventTables::builtin() {
        Ok(tables) => tables,
        Err(err) => {
            eprintln!("failed to load built-in tables: {err}");
            std::process::exit(1);
        }
    };
    let graph = &tables.starlight.graph;
    let mut rng = Rng::new(7);

    let start = Instant::now();
    let mut runs: u32 = 0;
    let mut draws: u64 = 0;
    while start.elapsed().as_millis() < MIN_DURATION_MS || runs < MIN_RUNS {
        let result = ladder::simulate(TRIALS_PER_RUN, graph, &mut rng);
        // One draw per trial per stage entered.
        draws += result.survivors().iter().sum::<u64>();
        runs += 1;
    }
    let elapsed_secs = start.elapsed().as_secs_f64();

    let trials = runs as u64 * TRIALS_PER_RUN;
    let trials_per_sec = trials as f64 / elapsed_secs;
    let draws_per_sec = draws as f64 / elapsed_secs;

    println!("Ladder benchmark ({TRIALS_PER_RUN} trials/run):");
    println!("  Runs:       {runs}");
    println!("  Duration:   {elapsed_secs:.2} s");
    println!("  Trials/s:   {trials_per_sec:.2}");
    println!("  Draws/s:    {draws_per_sec:.2}");

    if log {
        let row = LogRow {
            date: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            trials_per_sec,
            draws_per_sec,
            trials_per_run: TRIALS_PER_RUN,
        };
        if let Err(err) = append_row(&row) {
            eprintln!("failed to append to {LOG_PATH}: {err}");
            std::process::exit(1);
        }
        println!("Appended to {LOG_PATH}");
    }
}

fn append_row(row: &LogRow) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new().create(true).append(true).open(LOG_PATH)?;
    let needs_header = file.metadata().map(|m| m.len() == 0).unwrap_or(true);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(row)?;
    writer.flush()?;
    Ok(())
}
