//! Analytic expected counts across a chained stage graph. Pure arithmetic, no randomness.

use std::collections::BTreeMap;

use crate::gacha::pool::StageGraph;

/// Expected count per terminal reward name.
pub type ExpectedCounts = BTreeMap<String, f64>;

/// Expected number of every terminal reward obtained from `draw_count` stage-1 draws.
///
/// Each stage receives an incoming expected count `C_k` (stage 1 receives `draw_count`).
/// Non-advance entries contribute `C_k * p / 100` under their own name; the advance entry's
/// mass becomes `C_{k+1}` and is never recorded as a reward. Between stage 1 and stage 2 the
/// seed mass is divided by the graph's `seed_per_entry`. Names that appear at several stages
/// accumulate. Every terminal name is present in the result, so a zero draw count yields
/// all-zero counts.
///
/// Linear in `draw_count`. Negative counts are not meaningful; callers clamp.
pub fn expand(draw_count: f64, graph: &StageGraph) -> ExpectedCounts {
    let mut counts = ExpectedCounts::new();
    let mut incoming = draw_count;

    for (offset, pool) in graph.pools().enumerate() {
        let mut advancing = 0.0;
        for entry in pool.entries() {
            let expected = incoming * entry.probability / 100.0;
            if entry.advance {
                advancing += expected;
            } else {
                *counts.entry(entry.name.clone()).or_insert(0.0) += expected;
            }
        }
        incoming = if offset == 0 {
            advancing / graph.seed_per_entry()
        } else {
            advancing
        };
    }

    counts
}

/// Default price of each terminal reward, taken from the entries' `unit_value`. Unvalued
/// entries are left out; when a name carries a value at several stages the earliest wins.
pub fn unit_prices(graph: &StageGraph) -> BTreeMap<String, f64> {
    let mut prices = BTreeMap::new();
    for entry in graph.pools().flat_map(|pool| pool.entries()) {
        if !entry.advance && entry.unit_value > 0.0 {
            prices.entry(entry.name.clone()).or_insert(entry.unit_value);
        }
    }
    prices
}

/// Total value of `counts`. Names without a price are worth 0.
pub fn value_of(counts: &ExpectedCounts, prices: &BTreeMap<String, f64>) -> f64 {
    counts
        .iter()
        .filter_map(|(name, expected)| prices.get(name).map(|price| expected * price))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gacha::pool::{RewardEntry, RewardPool, Stage};

    fn pool(entries: Vec<RewardEntry>) -> RewardPool {
        RewardPool::new(entries).expect("pool")
    }

    fn graph(seed_per_entry: f64) -> StageGraph {
        StageGraph::with_seed_ratio(
            pool(vec![RewardEntry::new("dust", 80.0), RewardEntry::advancing("seed", 20.0)]),
            vec![
                Stage::new(
                    "middle",
                    pool(vec![RewardEntry::new("shard", 50.0), RewardEntry::advancing("up", 50.0)]),
                ),
                Stage::new(
                    "top",
                    pool(vec![RewardEntry::new("gem", 25.0), RewardEntry::new("shard", 75.0)]),
                ),
            ],
            seed_per_entry,
        )
        .expect("graph")
    }

    #[test]
    fn multiplies_probabilities_down_the_chain() {
        let counts = expand(100.0, &graph(1.0));
        assert!((counts["dust"] - 80.0).abs() < 1e-9);
        // 20 seeds -> 10 shards at stage 2, 10 advance -> 7.5 shards + 2.5 gems.
        assert!((counts["shard"] - 17.5).abs() < 1e-9);
        assert!((counts["gem"] - 2.5).abs() < 1e-9);
        assert!(!counts.contains_key("seed"));
        assert!(!counts.contains_key("up"));
    }

    #[test]
    fn seed_ratio_divides_stage_two_input() {
        let counts = expand(100.0, &graph(4.0));
        assert!((counts["dust"] - 80.0).abs() < 1e-9);
        assert!((counts["shard"] - 17.5 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn zero_draws_give_zero_for_every_name() {
        let counts = expand(0.0, &graph(1.0));
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|value| *value == 0.0));
    }

    #[test]
    fn unit_prices_skip_advance_and_unvalued_entries() {
        let graph = StageGraph::new(
            pool(vec![
                RewardEntry::new("dust", 80.0),
                RewardEntry::advancing("seed", 20.0).with_value(99.0),
            ]),
            vec![Stage::new(
                "top",
                pool(vec![
                    RewardEntry::new("gem", 25.0).with_value(100.0),
                    RewardEntry::new("shard", 75.0).with_value(2.0),
                ]),
            )],
        )
        .expect("graph");

        let prices = unit_prices(&graph);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices["gem"], 100.0);
        assert_eq!(prices["shard"], 2.0);
        assert!(!prices.contains_key("seed"));
        assert!(!prices.contains_key("dust"));
    }

    #[test]
    fn value_of_ignores_unpriced_names() {
        let mut prices = BTreeMap::new();
        prices.insert("gem".to_string(), 100.0);
        prices.insert("unknown".to_string(), 5.0);
        let counts = expand(100.0, &graph(1.0));
        assert!((value_of(&counts, &prices) - 250.0).abs() < 1e-9);
    }
}
