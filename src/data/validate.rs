use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::data::tables::{BreathEvent, EventTables, LadderEvent};
use crate::gacha::pool::RewardPool;

/// Allowed distance of a pool's probability sum from 100.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == ValidationSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == ValidationSeverity::Warning)
            .count()
    }
}

/// Error diagnostics joined with `; `.
impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut errors = self
            .diagnostics
            .iter()
            .filter(|diag| diag.severity == ValidationSeverity::Error);
        if let Some(first) = errors.next() {
            write!(f, "{}: {}", first.context, first.message)?;
        }
        for diag in errors {
            write!(f, "; {}: {}", diag.context, diag.message)?;
        }
        Ok(())
    }
}

/// Structural rules (non-empty pools, advance tagging, seed ratio) are already enforced when
/// the tables deserialize; this covers the numeric and cross-reference rules.
pub fn validate_tables(tables: &EventTables) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_breath(&mut report, &tables.breath);
    validate_ladder(&mut report, &tables.starlight);
    report
}

fn validate_breath(report: &mut ValidationReport, event: &BreathEvent) {
    validate_cost(report, "breath.cost_per_draw", event.cost_per_draw);

    let mut tokens = HashSet::new();
    let mut rate_sum = 0.0;
    for (index, token) in event.token_rates.iter().enumerate() {
        let context = format!("breath.token_rates[{index}]");
        if token.name.trim().is_empty() {
            report.push(ValidationSeverity::Error, &context, "missing non-empty 'name'");
        } else if !tokens.insert(token.name.as_str()) {
            report.push(
                ValidationSeverity::Error,
                &context,
                format!("duplicate token '{}'", token.name),
            );
        }
        if !(token.rate.is_finite() && token.rate >= 0.0) {
            report.push(
                ValidationSeverity::Error,
                &context,
                format!("rate must be a non-negative number, got {}", token.rate),
            );
        }
        rate_sum += token.rate;
    }
    if event.token_rates.is_empty() {
        report.push(ValidationSeverity::Error, "breath.token_rates", "no tokens defined");
    } else {
        check_sum(report, "breath.token_rates", rate_sum);
    }

    let mut composites = HashSet::new();
    for (index, composite) in event.composites.iter().enumerate() {
        let context = format!("breath.composites[{index}] name='{}'", composite.name);
        if !composites.insert(composite.name.as_str()) {
            report.push(ValidationSeverity::Error, &context, "duplicate composite");
        }
        if composite.requires.is_empty() {
            report.push(ValidationSeverity::Error, &context, "requires no tokens");
        }
        let mut seen = HashSet::new();
        for token in &composite.requires {
            if !tokens.contains(token.as_str()) {
                report.push(
                    ValidationSeverity::Error,
                    &context,
                    format!("requires undefined token '{token}'"),
                );
            }
            if !seen.insert(token.as_str()) {
                report.push(
                    ValidationSeverity::Error,
                    &context,
                    format!("requires token '{token}' more than once"),
                );
            }
        }
    }

    let mut prioritised = HashSet::new();
    for name in &event.priority {
        if !composites.contains(name.as_str()) {
            report.push(
                ValidationSeverity::Error,
                "breath.priority",
                format!("undefined composite '{name}'"),
            );
        }
        if !prioritised.insert(name.as_str()) {
            report.push(
                ValidationSeverity::Error,
                "breath.priority",
                format!("composite '{name}' listed more than once"),
            );
        }
    }
    for composite in &event.composites {
        if !prioritised.contains(composite.name.as_str()) {
            report.push(
                ValidationSeverity::Error,
                "breath.priority",
                format!("composite '{}' missing from priority order", composite.name),
            );
        }
    }

    check_nested_priority(report, event);
}

/// Greedy allocation is value-optimal only when each composite's requirement set contains
/// the next lower-priority one.
fn check_nested_priority(report: &mut ValidationReport, event: &BreathEvent) {
    for pair in event.priority.windows(2) {
        let (Some(higher), Some(lower)) = (event.composite(&pair[0]), event.composite(&pair[1]))
        else {
            continue;
        };
        let higher_tokens: HashSet<&str> = higher.requires.iter().map(String::as_str).collect();
        if !lower.requires.iter().all(|token| higher_tokens.contains(token.as_str())) {
            report.push(
                ValidationSeverity::Warning,
                "breath.priority",
                format!(
                    "'{}' does not contain every token of lower-priority '{}'; greedy allocation may not maximise value",
                    higher.name, lower.name
                ),
            );
        }
    }
}

fn validate_ladder(report: &mut ValidationReport, event: &LadderEvent) {
    validate_cost(report, "starlight.cost_per_draw", event.cost_per_draw);
    validate_pool(report, "starlight.graph.entry", event.graph.entry());
    for (offset, stage) in event.graph.chained_stages().iter().enumerate() {
        let context = format!("starlight.graph.stages[{offset}] (stage {})", offset + 2);
        validate_pool(report, &context, &stage.pool);
    }
}

fn validate_pool(report: &mut ValidationReport, context: &str, pool: &RewardPool) {
    for (index, entry) in pool.entries().iter().enumerate() {
        let entry_context = format!("{context}[{index}]");
        if entry.name.trim().is_empty() {
            report.push(ValidationSeverity::Error, &entry_context, "missing non-empty 'name'");
        }
        if !(entry.probability.is_finite() && entry.probability >= 0.0) {
            report.push(
                ValidationSeverity::Error,
                &entry_context,
                format!("probability must be a non-negative number, got {}", entry.probability),
            );
        }
        if !(entry.unit_value.is_finite() && entry.unit_value >= 0.0) {
            report.push(
                ValidationSeverity::Error,
                &entry_context,
                format!("unit_value must be a non-negative number, got {}", entry.unit_value),
            );
        }
    }
    check_sum(report, context, pool.probability_sum());
}

fn check_sum(report: &mut ValidationReport, context: &str, sum: f64) {
    if !sum.is_finite() || (sum - 100.0).abs() > PROBABILITY_SUM_TOLERANCE {
        report.push(
            ValidationSeverity::Error,
            context,
            format!("probabilities sum to {sum:.4}, expected 100"),
        );
    }
}

fn validate_cost(report: &mut ValidationReport, context: &str, cost: f64) {
    if !(cost.is_finite() && cost > 0.0) {
        report.push(
            ValidationSeverity::Error,
            context,
            format!("must be a positive number, got {cost}"),
        );
    }
}
