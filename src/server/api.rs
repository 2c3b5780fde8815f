use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::data::tables::EventTables;
use crate::gacha::calculator::{
    calculate, calculate_ladder, CalculatorInput, LadderCalculatorInput,
};
use crate::gacha::draw::{simulate_draws, SimulationResult};
use crate::gacha::ladder::{self, LadderResult};
use crate::gacha::rng::Rng;

pub const MAX_SIMULATION_COUNT: u64 = 1_000_000;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<ValidationIssue>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Validation failed")]
    Validation(ValidationErrorResponse),
    #[error("failed to serialize response: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    /// Stage-1 draws only.
    Draws,
    /// Seed tickets through stages 2..=N.
    Ladder,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulateRequest {
    pub mode: SimulationMode,
    pub count: u64,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrawReport {
    #[serde(flatten)]
    pub result: SimulationResult,
    pub deviation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LadderReport {
    #[serde(flatten)]
    pub result: LadderResult,
    pub survivors: Vec<u64>,
    pub survival_rate: f64,
    pub theoretical_survival: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationReport {
    Draws(DrawReport),
    Ladder(LadderReport),
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulateResponse {
    pub status: &'static str,
    pub run_id: String,
    pub mode: SimulationMode,
    pub seed: u64,
    #[serde(flatten)]
    pub report: SimulationReport,
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "gacha-ev",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn tables_payload(tables: &EventTables) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tables)
}

pub fn calculate_payload(tables: &EventTables, body: &str) -> Result<String, ApiError> {
    let input: CalculatorInput = serde_json::from_str(body).map_err(ApiError::Parse)?;

    let mut errors = Vec::new();
    check_amounts(&mut errors, input.investment, input.discount);
    let unknown: Vec<String> = input
        .box_values
        .keys()
        .filter(|name| tables.breath.composite(name).is_none())
        .map(|name| format!("unknown composite '{name}'"))
        .collect();
    push_issue(&mut errors, "box_values", unknown);
    check_values(&mut errors, "box_values", &input.box_values);
    reject(errors)?;

    let output = calculate(&tables.breath, &input);
    serde_json::to_string_pretty(&output).map_err(ApiError::Serialize)
}

pub fn starlight_calculate_payload(tables: &EventTables, body: &str) -> Result<String, ApiError> {
    let input: LadderCalculatorInput = serde_json::from_str(body).map_err(ApiError::Parse)?;

    let mut errors = Vec::new();
    check_amounts(&mut errors, input.investment, input.discount);
    check_values(&mut errors, "prices", &input.prices);
    reject(errors)?;

    let output = calculate_ladder(&tables.starlight, &input);
    serde_json::to_string_pretty(&output).map_err(ApiError::Serialize)
}

/// Runs the simulation on the calling thread; async callers should move this off the
/// executor.
pub fn starlight_simulate_payload(tables: &EventTables, body: &str) -> Result<String, ApiError> {
    let request: SimulateRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;

    let mut errors = Vec::new();
    if !(1..=MAX_SIMULATION_COUNT).contains(&request.count) {
        push_issue(
            &mut errors,
            "count",
            vec![format!("must be between 1 and {MAX_SIMULATION_COUNT}")],
        );
    }
    reject(errors)?;

    let (mut rng, seed) = Rng::seeded_or_entropy(request.seed);
    let event = &tables.starlight;
    let report = match request.mode {
        SimulationMode::Draws => {
            let result =
                simulate_draws(request.count, event.graph.entry(), event.cost_per_draw, &mut rng);
            SimulationReport::Draws(DrawReport {
                deviation: result.deviation(),
                result,
            })
        }
        SimulationMode::Ladder => {
            let result = ladder::simulate(request.count, &event.graph, &mut rng);
            SimulationReport::Ladder(LadderReport {
                survivors: result.survivors(),
                survival_rate: result.survival_rate(),
                theoretical_survival: ladder::theoretical_survival(&event.graph),
                result,
            })
        }
    };

    let response = SimulateResponse {
        status: "ok",
        run_id: Uuid::new_v4().to_string(),
        mode: request.mode,
        seed,
        report,
    };
    log::info!(
        "simulation run {}: {:?} x{} (seed {seed})",
        response.run_id,
        request.mode,
        request.count
    );
    serde_json::to_string_pretty(&response).map_err(ApiError::Serialize)
}

fn check_amounts(errors: &mut Vec<ValidationIssue>, investment: f64, discount: f64) {
    if !investment.is_finite() {
        push_issue(errors, "investment", vec!["must be a finite number".to_string()]);
    }
    if !(discount.is_finite() && discount >= 0.0) {
        push_issue(errors, "discount", vec!["must be a non-negative number".to_string()]);
    }
}

fn check_values(errors: &mut Vec<ValidationIssue>, field: &str, values: &BTreeMap<String, f64>) {
    let messages = values
        .iter()
        .filter(|(_, value)| !(value.is_finite() && **value >= 0.0))
        .map(|(name, value)| format!("'{name}' must be a non-negative number, got {value}"))
        .collect();
    push_issue(errors, field, messages);
}

fn push_issue(errors: &mut Vec<ValidationIssue>, field: &str, messages: Vec<String>) {
    if messages.is_empty() {
        return;
    }
    errors.push(ValidationIssue {
        field: field.to_string(),
        messages,
    });
}

fn reject(errors: Vec<ValidationIssue>) -> Result<(), ApiError> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(ApiError::Validation(ValidationErrorResponse {
        status: "error",
        message: "Validation failed",
        errors,
    }))
}
