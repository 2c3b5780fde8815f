//! Investment to expected-value pipelines.
//!
//! `calculate` covers the breath event: currency, then points, then draws, then expected
//! tokens, then composites via the greedy allocator. `calculate_ladder` runs the same
//! front half for the starlight ladder and values the analytic expansion instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::tables::{BreathEvent, LadderEvent};
use crate::gacha::allocator::{allocate, TokenInventory};
use crate::gacha::expected::{expand, unit_prices, value_of, ExpectedCounts};
use crate::gacha::purchase::{points_for, PurchaseMethod};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatorInput {
    #[serde(default)]
    pub investment: f64,
    #[serde(default)]
    pub method: PurchaseMethod,
    #[serde(default)]
    pub discount: f64,
    /// Value of one unit of each composite. Unlisted composites are worth 0.
    #[serde(default)]
    pub box_values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorOutput {
    pub points: f64,
    pub draw_count: f64,
    pub cost_per_breath: f64,
    pub expected_breaths: TokenInventory,
    pub expected_boxes: BTreeMap<String, f64>,
    pub expected_value: f64,
    pub roi: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LadderCalculatorInput {
    #[serde(default)]
    pub investment: f64,
    #[serde(default)]
    pub method: PurchaseMethod,
    #[serde(default)]
    pub discount: f64,
    /// Value of one unit of each terminal reward, overriding the table's `unit_value`.
    /// Rewards priced by neither are worth 0.
    #[serde(default)]
    pub prices: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderCalculation {
    pub points: f64,
    pub draw_count: f64,
    pub cost_per_draw: f64,
    pub expected_items: ExpectedCounts,
    pub expected_value: f64,
    pub roi: f64,
}

pub fn calculate(event: &BreathEvent, input: &CalculatorInput) -> CalculatorOutput {
    let points = points_for(input.investment, input.method, input.discount);
    let draw_count = draws_for(points, event.cost_per_draw);
    let cost_per_breath = if draw_count > 0.0 {
        input.investment / draw_count
    } else {
        0.0
    };

    let expected_breaths = event.expected_tokens(draw_count);
    let expected_boxes = allocate(&expected_breaths, &event.requirements(), &event.priority);
    let expected_value = expected_boxes
        .iter()
        .map(|(name, count)| count * input.box_values.get(name).copied().unwrap_or(0.0))
        .sum();
    let roi = roi(expected_value, input.investment);

    log::debug!(
        "breath calculation: investment {} via {} -> {points} points, {draw_count:.2} draws, value {expected_value:.2}",
        input.investment,
        input.method
    );

    CalculatorOutput {
        points,
        draw_count,
        cost_per_breath,
        expected_breaths,
        expected_boxes,
        expected_value,
        roi,
    }
}

pub fn calculate_ladder(event: &LadderEvent, input: &LadderCalculatorInput) -> LadderCalculation {
    let points = points_for(input.investment, input.method, input.discount);
    let draw_count = draws_for(points, event.cost_per_draw);
    let expected_items = expand(draw_count, &event.graph);
    let mut prices = unit_prices(&event.graph);
    prices.extend(input.prices.iter().map(|(name, price)| (name.clone(), *price)));
    let expected_value = value_of(&expected_items, &prices);
    let roi = roi(expected_value, input.investment);

    log::debug!(
        "ladder calculation: investment {} -> {draw_count:.2} draws, value {expected_value:.2}",
        input.investment
    );

    LadderCalculation {
        points,
        draw_count,
        cost_per_draw: event.cost_per_draw,
        expected_items,
        expected_value,
        roi,
    }
}

fn draws_for(points: f64, cost_per_draw: f64) -> f64 {
    if cost_per_draw > 0.0 && points > 0.0 {
        points / cost_per_draw
    } else {
        0.0
    }
}

/// Percentage return; 0 when nothing was invested.
fn roi(expected_value: f64, investment: f64) -> f64 {
    if investment > 0.0 {
        (expected_value - investment) / investment * 100.0
    } else {
        0.0
    }
}
