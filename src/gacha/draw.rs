//! Weighted draw primitive and single-pool draw simulation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::gacha::pool::{RewardEntry, RewardPool};
use crate::gacha::rng::UniformSource;

/// Index of the entry selected by one draw. Consumes exactly one sample.
///
/// `roll = uniform * 100` is matched against running cumulative probabilities in pool
/// order; the first bucket with `roll < cumulative` wins. When the probabilities sum short
/// of 100 and the roll lands past the end, the last entry is returned.
pub fn draw_index<R: UniformSource + ?Sized>(pool: &RewardPool, rng: &mut R) -> usize {
    let roll = rng.next_f64() * 100.0;
    let mut cumulative = 0.0;
    for (index, entry) in pool.entries().iter().enumerate() {
        cumulative += entry.probability;
        if roll < cumulative {
            return index;
        }
    }
    pool.len() - 1
}

pub fn draw<'a, R: UniformSource + ?Sized>(pool: &'a RewardPool, rng: &mut R) -> &'a RewardEntry {
    &pool.entries()[draw_index(pool, rng)]
}

/// Outcome of drawing `draw_count` times from one pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub draw_count: u64,
    pub outcome_tally: BTreeMap<String, u64>,
    /// Draws that produced the pool's advance (seed) entry.
    pub distinguished_outcome_count: u64,
    pub theoretical_expected_count: f64,
    pub total_cost: f64,
}

impl SimulationResult {
    /// Observed minus theoretical seed count.
    pub fn deviation(&self) -> f64 {
        self.distinguished_outcome_count as f64 - self.theoretical_expected_count
    }

    /// Share of draws that produced `name`, in percent.
    pub fn share(&self, name: &str) -> f64 {
        if self.draw_count == 0 {
            return 0.0;
        }
        let count = self.outcome_tally.get(name).copied().unwrap_or(0);
        count as f64 / self.draw_count as f64 * 100.0
    }
}

pub fn simulate_draws<R: UniformSource + ?Sized>(
    draw_count: u64,
    pool: &RewardPool,
    cost_per_draw: f64,
    rng: &mut R,
) -> SimulationResult {
    let mut counts = vec![0_u64; pool.len()];
    for _ in 0..draw_count {
        counts[draw_index(pool, rng)] += 1;
    }

    let distinguished_outcome_count = pool
        .entries()
        .iter()
        .zip(&counts)
        .filter(|(entry, _)| entry.advance)
        .map(|(_, count)| *count)
        .sum();
    let theoretical_expected_count = pool
        .advance_entry()
        .map(|seed| draw_count as f64 * seed.probability / 100.0)
        .unwrap_or(0.0);

    let result = SimulationResult {
        draw_count,
        outcome_tally: tally_by_name(pool, &counts),
        distinguished_outcome_count,
        theoretical_expected_count,
        total_cost: draw_count as f64 * cost_per_draw,
    };
    log::debug!(
        "simulated {draw_count} draws: {} seeds (expected {:.2})",
        result.distinguished_outcome_count,
        result.theoretical_expected_count
    );
    result
}

/// Fold per-entry counts into a name-keyed tally, dropping zero counts and merging entries
/// that share a display name.
pub(crate) fn tally_by_name(pool: &RewardPool, counts: &[u64]) -> BTreeMap<String, u64> {
    let mut tally = BTreeMap::new();
    for (entry, count) in pool.entries().iter().zip(counts) {
        if *count > 0 {
            *tally.entry(entry.name.clone()).or_insert(0) += *count;
        }
    }
    tally
}
