//! Reward pools and the chained stage graph.
//!
//! A pool is an ordered list of weighted entries; order fixes the cumulative-probability
//! buckets the drawer walks. Chaining is explicit: the entry that advances a trial to the
//! next stage carries `advance: true`. Names are display-only and never drive control flow.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub name: String,
    /// Percentage, 0-100.
    pub probability: f64,
    #[serde(default)]
    pub unit_value: f64,
    /// Drawing this entry advances the trial to the next stage instead of paying a reward.
    #[serde(default, skip_serializing_if = "is_false")]
    pub advance: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl RewardEntry {
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            unit_value: 0.0,
            advance: false,
        }
    }

    pub fn advancing(name: impl Into<String>, probability: f64) -> Self {
        Self {
            advance: true,
            ..Self::new(name, probability)
        }
    }

    pub fn with_value(self, unit_value: f64) -> Self {
        Self { unit_value, ..self }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    #[error("reward pool has no entries")]
    EmptyPool,
    #[error("stage {stage} has {count} advance entries; exactly one is required")]
    MultipleAdvance { stage: usize, count: usize },
    #[error("stage {stage} feeds a later stage but has no advance entry")]
    MissingAdvance { stage: usize },
    #[error("stage {stage} is terminal but has an advance entry")]
    TerminalAdvance { stage: usize },
    #[error("stage graph has no chained stages after the entry pool")]
    NoChainedStages,
    #[error("seed_per_entry must be a positive finite number, got {0}")]
    InvalidSeedRatio(f64),
}

/// Non-empty, immutable ordered list of weighted entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RewardEntry>", into = "Vec<RewardEntry>")]
pub struct RewardPool {
    entries: Vec<RewardEntry>,
}

impl RewardPool {
    pub fn new(entries: Vec<RewardEntry>) -> Result<Self, PoolError> {
        if entries.is_empty() {
            return Err(PoolError::EmptyPool);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RewardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn advance_entry(&self) -> Option<&RewardEntry> {
        self.entries.iter().find(|entry| entry.advance)
    }

    pub fn advance_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.advance).count()
    }

    pub fn probability_sum(&self) -> f64 {
        self.entries.iter().map(|entry| entry.probability).sum()
    }
}

impl TryFrom<Vec<RewardEntry>> for RewardPool {
    type Error = PoolError;

    fn try_from(entries: Vec<RewardEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<RewardPool> for Vec<RewardEntry> {
    fn from(pool: RewardPool) -> Self {
        pool.entries
    }
}

/// One chained stage (2..=N) of the ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub label: String,
    pub pool: RewardPool,
}

impl Stage {
    pub fn new(label: impl Into<String>, pool: RewardPool) -> Self {
        Self {
            label: label.into(),
            pool,
        }
    }
}

/// Stage 1 (the entry pool) plus chained stages 2..=N.
///
/// Invariants, checked on construction and deserialization:
/// - the entry pool has exactly one advance entry (the seed);
/// - every chained stage except the last has exactly one advance entry;
/// - the last stage has none;
/// - `seed_per_entry` is positive and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStageGraph")]
pub struct StageGraph {
    entry: RewardPool,
    seed_per_entry: f64,
    stages: Vec<Stage>,
}

#[derive(Deserialize)]
struct RawStageGraph {
    entry: RewardPool,
    #[serde(default = "default_seed_per_entry")]
    seed_per_entry: f64,
    stages: Vec<Stage>,
}

fn default_seed_per_entry() -> f64 {
    1.0
}

impl TryFrom<RawStageGraph> for StageGraph {
    type Error = PoolError;

    fn try_from(raw: RawStageGraph) -> Result<Self, Self::Error> {
        Self::with_seed_ratio(raw.entry, raw.stages, raw.seed_per_entry)
    }
}

impl StageGraph {
    /// Graph where one seed unit buys one stage-2 entry.
    pub fn new(entry: RewardPool, stages: Vec<Stage>) -> Result<Self, PoolError> {
        Self::with_seed_ratio(entry, stages, default_seed_per_entry())
    }

    pub fn with_seed_ratio(
        entry: RewardPool,
        stages: Vec<Stage>,
        seed_per_entry: f64,
    ) -> Result<Self, PoolError> {
        if !(seed_per_entry.is_finite() && seed_per_entry > 0.0) {
            return Err(PoolError::InvalidSeedRatio(seed_per_entry));
        }
        if stages.is_empty() {
            return Err(PoolError::NoChainedStages);
        }
        check_transitional(1, &entry)?;
        let last = stages.len() - 1;
        for (offset, stage) in stages.iter().enumerate() {
            let stage_number = offset + 2;
            if offset == last {
                if stage.pool.advance_count() > 0 {
                    return Err(PoolError::TerminalAdvance {
                        stage: stage_number,
                    });
                }
            } else {
                check_transitional(stage_number, &stage.pool)?;
            }
        }
        Ok(Self {
            entry,
            seed_per_entry,
            stages,
        })
    }

    pub fn entry(&self) -> &RewardPool {
        &self.entry
    }

    pub fn seed_per_entry(&self) -> f64 {
        self.seed_per_entry
    }

    /// Stages 2..=N in order.
    pub fn chained_stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Index of the final stage (stage 1 is the entry pool).
    pub fn final_stage(&self) -> usize {
        self.stages.len() + 1
    }

    /// Every pool in stage order, entry pool first.
    pub fn pools(&self) -> impl Iterator<Item = &RewardPool> {
        std::iter::once(&self.entry).chain(self.stages.iter().map(|stage| &stage.pool))
    }
}

fn check_transitional(stage: usize, pool: &RewardPool) -> Result<(), PoolError> {
    match pool.advance_count() {
        1 => Ok(()),
        0 => Err(PoolError::MissingAdvance { stage }),
        count => Err(PoolError::MultipleAdvance { stage, count }),
    }
}
