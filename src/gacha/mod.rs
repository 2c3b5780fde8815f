//! Expected-value engine for weighted gacha pools and chained ladders.

pub mod allocator;
pub mod calculator;
pub mod draw;
pub mod expected;
pub mod ladder;
pub mod pool;
pub mod purchase;
pub mod rng;

pub use allocator::{allocate, CompositeRequirements, TokenInventory};
pub use calculator::{
    calculate, calculate_ladder, CalculatorInput, CalculatorOutput, LadderCalculation,
    LadderCalculatorInput,
};
pub use draw::{draw, simulate_draws, SimulationResult};
pub use expected::{expand, ExpectedCounts};
pub use ladder::{theoretical_survival, LadderResult};
pub use pool::{PoolError, RewardEntry, RewardPool, Stage, StageGraph};
pub use purchase::{points_for, PurchaseMethod};
pub use rng::{Rng, UniformSource};
