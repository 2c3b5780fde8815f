//! Monte Carlo run of seed tickets through chained stages 2..=N.
//!
//! Every trial starts alive at stage 2. At each transitional stage it draws once: the
//! advance entry moves it to the next stage (and is consumed, never tallied); anything else
//! ends the trial with that reward and counts as a failure at that stage. Trials that reach
//! the final stage draw once more from its all-terminal pool. Nothing is retried.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::gacha::draw::{draw_index, tally_by_name};
use crate::gacha::pool::StageGraph;
use crate::gacha::rng::UniformSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LadderResult {
    pub initial_count: u64,
    /// One entry per transitional stage (2..N-1).
    pub per_stage_failures: Vec<u64>,
    /// Trials that reached the final stage.
    pub stage_final_success: u64,
    /// Every reward collected, all stages merged.
    pub reward_tally: BTreeMap<String, u64>,
    /// Rewards collected at each stage 2..=N, in stage order.
    pub stage_rewards: Vec<BTreeMap<String, u64>>,
}

impl LadderResult {
    /// Trials alive on entering each stage 2..=N.
    pub fn survivors(&self) -> Vec<u64> {
        let mut alive = self.initial_count;
        let mut survivors = Vec::with_capacity(self.per_stage_failures.len() + 1);
        survivors.push(alive);
        for failures in &self.per_stage_failures {
            alive -= failures;
            survivors.push(alive);
        }
        survivors
    }

    /// Percentage of trials that reached the final stage.
    pub fn survival_rate(&self) -> f64 {
        if self.initial_count == 0 {
            return 0.0;
        }
        self.stage_final_success as f64 / self.initial_count as f64 * 100.0
    }

    /// Number of rewards recorded. Equals `initial_count`: each trial ends exactly once.
    pub fn outcomes_recorded(&self) -> u64 {
        self.reward_tally.values().sum()
    }
}

pub fn simulate<R: UniformSource + ?Sized>(
    initial_seed_count: u64,
    graph: &StageGraph,
    rng: &mut R,
) -> LadderResult {
    let stages = graph.chained_stages();
    let mut per_stage_failures = Vec::with_capacity(stages.len().saturating_sub(1));
    let mut stage_rewards = Vec::with_capacity(stages.len());
    let mut alive = initial_seed_count;

    let Some((terminal, transitional)) = stages.split_last() else {
        return LadderResult {
            initial_count: initial_seed_count,
            per_stage_failures,
            stage_final_success: 0,
            reward_tally: BTreeMap::new(),
            stage_rewards,
        };
    };

    for stage in transitional {
        let pool = &stage.pool;
        let mut counts = vec![0_u64; pool.len()];
        let mut advanced = 0_u64;
        for _ in 0..alive {
            let index = draw_index(pool, rng);
            if pool.entries()[index].advance {
                advanced += 1;
            } else {
                counts[index] += 1;
            }
        }
        per_stage_failures.push(alive - advanced);
        stage_rewards.push(tally_by_name(pool, &counts));
        alive = advanced;
    }

    let stage_final_success = alive;
    let mut counts = vec![0_u64; terminal.pool.len()];
    for _ in 0..alive {
        counts[draw_index(&terminal.pool, rng)] += 1;
    }
    stage_rewards.push(tally_by_name(&terminal.pool, &counts));

    let mut reward_tally = BTreeMap::new();
    for tally in &stage_rewards {
        for (name, count) in tally {
            *reward_tally.entry(name.clone()).or_insert(0) += count;
        }
    }

    log::debug!(
        "ladder run: {initial_seed_count} seeds, {stage_final_success} reached stage {}",
        graph.final_stage()
    );

    LadderResult {
        initial_count: initial_seed_count,
        per_stage_failures,
        stage_final_success,
        reward_tally,
        stage_rewards,
    }
}

/// Analytic probability, in percent, that one seed survives every transitional stage.
pub fn theoretical_survival(graph: &StageGraph) -> f64 {
    let stages = graph.chained_stages();
    let transitional = &stages[..stages.len().saturating_sub(1)];
    transitional
        .iter()
        .map(|stage| {
            stage
                .pool
                .advance_entry()
                .map(|entry| entry.probability / 100.0)
                .unwrap_or(0.0)
        })
        .product::<f64>()
        * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gacha::pool::{RewardEntry, RewardPool, Stage};
    use crate::gacha::rng::{Rng, ScriptedSource};

    fn pool(entries: Vec<RewardEntry>) -> RewardPool {
        RewardPool::new(entries).expect("pool")
    }

    fn coin_flip_graph() -> StageGraph {
        StageGraph::new(
            pool(vec![RewardEntry::new("dust", 90.0), RewardEntry::advancing("seed", 10.0)]),
            vec![
                Stage::new(
                    "a",
                    pool(vec![RewardEntry::new("a-loss", 50.0), RewardEntry::advancing("a-up", 50.0)]),
                ),
                Stage::new(
                    "b",
                    pool(vec![RewardEntry::new("b-loss", 50.0), RewardEntry::advancing("b-up", 50.0)]),
                ),
                Stage::new("top", pool(vec![RewardEntry::new("prize", 100.0)])),
            ],
        )
        .expect("graph")
    }

    #[test]
    fn scripted_rolls_follow_state_machine() {
        let graph = coin_flip_graph();
        // Stage 2: trial 1 fails (0.1), trial 2 advances (0.7).
        // Stage 3: trial 2 advances (0.9). Final: one terminal draw.
        let mut source = ScriptedSource::new(vec![0.1, 0.7, 0.9, 0.3]);
        let result = simulate(2, &graph, &mut source);
        assert_eq!(result.per_stage_failures, vec![1, 0]);
        assert_eq!(result.stage_final_success, 1);
        assert_eq!(result.reward_tally.get("a-loss"), Some(&1));
        assert_eq!(result.reward_tally.get("prize"), Some(&1));
        assert!(!result.reward_tally.contains_key("a-up"));
        assert_eq!(result.survivors(), vec![2, 1, 1]);
        assert_eq!(result.stage_rewards.len(), 3);
    }

    #[test]
    fn every_trial_is_accounted_for_once() {
        let graph = coin_flip_graph();
        let mut rng = Rng::new(11);
        let result = simulate(5_000, &graph, &mut rng);
        assert_eq!(result.outcomes_recorded(), 5_000);
        let survivors = result.survivors();
        for (k, failures) in result.per_stage_failures.iter().enumerate() {
            assert_eq!(failures + survivors[k + 1], survivors[k]);
            assert_eq!(result.stage_rewards[k].values().sum::<u64>(), *failures);
        }
        assert_eq!(*survivors.last().expect("final"), result.stage_final_success);
        let final_tally = result.stage_rewards.last().expect("final tally");
        assert_eq!(final_tally.values().sum::<u64>(), result.stage_final_success);
        assert!(result.stage_final_success > 0);
    }

    #[test]
    fn zero_seeds_yield_empty_tallies() {
        let mut rng = Rng::new(3);
        let result = simulate(0, &coin_flip_graph(), &mut rng);
        assert_eq!(result.per_stage_failures, vec![0, 0]);
        assert_eq!(result.stage_final_success, 0);
        assert!(result.reward_tally.is_empty());
        assert_eq!(result.survival_rate(), 0.0);
    }

    #[test]
    fn theoretical_survival_multiplies_advance_rates() {
        assert!((theoretical_survival(&coin_flip_graph()) - 25.0).abs() < 1e-9);
    }
}
