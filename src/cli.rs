use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::AppConfig;
use crate::data::tables::EventTables;
use crate::data::validate::validate_tables;
use crate::gacha::calculator::{
    calculate, calculate_ladder, CalculatorInput, LadderCalculatorInput,
};
use crate::gacha::draw::simulate_draws;
use crate::gacha::ladder;
use crate::gacha::purchase::PurchaseMethod;
use crate::gacha::rng::Rng;
use crate::server;

#[derive(Debug, Parser)]
#[command(name = "gacha-ev", version)]
#[command(about = "Expected value and Monte Carlo checks for gacha reward tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve,
    /// Breath event: expected tokens, boxes and ROI for an investment
    Calculate {
        #[arg(allow_negative_numbers = true)]
        investment: f64,
        #[arg(long, default_value = "original")]
        method: String,
        #[arg(long, default_value_t = 0.0)]
        discount: f64,
        /// Value of one composite box
        #[arg(long = "box", value_name = "NAME=VALUE", value_parser = parse_named_value)]
        boxes: Vec<(String, f64)>,
    },
    /// Starlight event: analytic expected rewards for an investment
    Starlight {
        #[arg(allow_negative_numbers = true)]
        investment: f64,
        #[arg(long, default_value = "original")]
        method: String,
        #[arg(long, default_value_t = 0.0)]
        discount: f64,
        /// Value of one unit of a reward
        #[arg(long = "price", value_name = "NAME=VALUE", value_parser = parse_named_value)]
        prices: Vec<(String, f64)>,
    },
    /// Draw from the starlight stage-1 pool
    Simulate {
        count: u64,
        #[arg(long)]
        seed: Option<u64>,
        /// Tab-separated output
        #[arg(long)]
        table: bool,
    },
    /// Run seed tickets through the starlight ladder
    Ladder {
        count: u64,
        #[arg(long)]
        seed: Option<u64>,
        /// Per-stage reward tallies as CSV
        #[arg(long)]
        csv: bool,
    },
    /// Check a reward-table file (built-in tables when omitted)
    Validate { path: Option<PathBuf> },
}

#[derive(Debug, Serialize)]
struct LadderRow<'a> {
    stage: usize,
    reward: &'a str,
    count: u64,
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };

    let config = AppConfig::from_env();
    match cli.command {
        Command::Validate { path } => handle_validate(path.or(config.tables_path)),
        command => {
            let tables = match EventTables::load_or_builtin(config.tables_path.as_deref()) {
                Ok(tables) => tables,
                Err(err) => {
                    eprintln!("failed to load reward tables: {err}");
                    return 1;
                }
            };
            dispatch(command, &config, tables)
        }
    }
}

fn dispatch(command: Command, config: &AppConfig, tables: EventTables) -> i32 {
    match command {
        Command::Serve => match server::run_server(config, tables) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("server error: {err}");
                1
            }
        },
        Command::Calculate {
            investment,
            method,
            discount,
            boxes,
        } => {
            let input = CalculatorInput {
                investment,
                method: PurchaseMethod::from_label(&method),
                discount,
                box_values: boxes.into_iter().collect(),
            };
            print_json(&calculate(&tables.breath, &input))
        }
        Command::Starlight {
            investment,
            method,
            discount,
            prices,
        } => {
            let input = LadderCalculatorInput {
                investment,
                method: PurchaseMethod::from_label(&method),
                discount,
                prices: prices.into_iter().collect::<BTreeMap<_, _>>(),
            };
            print_json(&calculate_ladder(&tables.starlight, &input))
        }
        Command::Simulate { count, seed, table } => handle_simulate(&tables, count, seed, table),
        Command::Ladder { count, seed, csv } => handle_ladder(&tables, count, seed, csv),
        Command::Validate { path } => handle_validate(path),
    }
}

fn handle_simulate(tables: &EventTables, count: u64, seed: Option<u64>, as_table: bool) -> i32 {
    let (mut rng, seed) = Rng::seeded_or_entropy(seed);
    let event = &tables.starlight;
    let result = simulate_draws(count, event.graph.entry(), event.cost_per_draw, &mut rng);

    if as_table {
        println!("draws\tseed\tseeds_drawn\tseeds_expected\ttotal_cost");
        println!(
            "{}\t{}\t{}\t{:.2}\t{:.0}",
            result.draw_count,
            seed,
            result.distinguished_outcome_count,
            result.theoretical_expected_count,
            result.total_cost
        );
        println!();
        println!("reward\tcount\tshare");
        for (name, count) in &result.outcome_tally {
            println!("{name}\t{count}\t{:.4}", result.share(name));
        }
        0
    } else {
        print_json(&serde_json::json!({ "seed": seed, "result": result }))
    }
}

fn handle_ladder(tables: &EventTables, count: u64, seed: Option<u64>, as_csv: bool) -> i32 {
    let (mut rng, seed) = Rng::seeded_or_entropy(seed);
    let graph = &tables.starlight.graph;
    let result = ladder::simulate(count, graph, &mut rng);

    if !as_csv {
        return print_json(&serde_json::json!({
            "seed": seed,
            "result": result,
            "survivors": result.survivors(),
            "survival_rate": result.survival_rate(),
            "theoretical_survival": ladder::theoretical_survival(graph),
        }));
    }

    let mut writer = csv::Writer::from_writer(io::stdout());
    for (offset, tally) in result.stage_rewards.iter().enumerate() {
        for (reward, count) in tally {
            let row = LadderRow {
                stage: offset + 2,
                reward,
                count: *count,
            };
            if let Err(err) = writer.serialize(row) {
                eprintln!("failed to write csv: {err}");
                return 1;
            }
        }
    }
    if let Err(err) = writer.flush() {
        eprintln!("failed to write csv: {err}");
        return 1;
    }
    0
}

fn handle_validate(path: Option<PathBuf>) -> i32 {
    let label = path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in tables".to_string());
    let parsed = match &path {
        Some(path) => EventTables::parse_file(path),
        None => EventTables::parse_builtin(),
    };
    let tables = match parsed {
        Ok(tables) => tables,
        Err(err) => {
            eprintln!("validation failed: {label}: {err}");
            return 1;
        }
    };

    let report = validate_tables(&tables);
    for diagnostic in &report.diagnostics {
        eprintln!("- {diagnostic}");
    }
    if report.has_errors() {
        eprintln!(
            "validation failed: {label}: {} error(s), {} warning(s)",
            report.error_count(),
            report.warning_count()
        );
        return 1;
    }
    println!("validation passed: {label}");
    0
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize result: {err}");
            1
        }
    }
}

fn parse_named_value(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{raw}'"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid value in '{raw}': {err}"))?;
    Ok((name.to_string(), value))
}
