use gacha_ev::data::tables::EventTables;
use gacha_ev::gacha::allocator::{allocate, CompositeRequirements, TokenInventory};
use gacha_ev::gacha::calculator::{calculate, CalculatorInput};
use gacha_ev::gacha::draw::{draw, simulate_draws};
use gacha_ev::gacha::expected::expand;
use gacha_ev::gacha::ladder;
use gacha_ev::gacha::pool::{RewardEntry, RewardPool, Stage, StageGraph};
use gacha_ev::gacha::rng::Rng;

fn pool(entries: Vec<RewardEntry>) -> RewardPool {
    RewardPool::new(entries).expect("non-empty pool")
}

/// Entry pool with a 10% seed, three 50% transitional stages and a terminal stage.
fn three_coin_graph() -> StageGraph {
    let entry = pool(vec![
        RewardEntry::new("Common", 90.0),
        RewardEntry::advancing("Ticket", 10.0),
    ]);
    let coin = |label: &str, reward: &str| {
        Stage::new(
            label,
            pool(vec![
                RewardEntry::new(reward, 50.0),
                RewardEntry::advancing("Ticket", 50.0),
            ]),
        )
    };
    let stages = vec![
        coin("two", "Bronze"),
        coin("three", "Silver"),
        coin("four", "Gold"),
        Stage::new("five", pool(vec![RewardEntry::new("Ticket", 100.0)])),
    ];
    StageGraph::new(entry, stages).expect("valid graph")
}

#[test]
fn draws_are_reproducible_for_a_seed() {
    let tables = EventTables::builtin().expect("built-in tables");
    let entry = tables.starlight.graph.entry();
    let mut a = Rng::new(42);
    let mut b = Rng::new(42);
    for _ in 0..1_000 {
        assert_eq!(draw(entry, &mut a).name, draw(entry, &mut b).name);
    }
}

#[test]
fn draw_frequency_converges_to_probability() {
    let tables = EventTables::builtin().expect("built-in tables");
    let mut rng = Rng::new(20_240_601);
    let result = simulate_draws(100_000, tables.starlight.graph.entry(), 45.0, &mut rng);

    // p = 10%: sigma is about 95 draws, so 400 is beyond 4 sigma.
    assert_eq!(result.theoretical_expected_count, 10_000.0);
    assert!(
        result.deviation().abs() < 400.0,
        "seed count {} too far from 10000",
        result.distinguished_outcome_count
    );
    assert_eq!(result.total_cost, 4_500_000.0);
    assert_eq!(result.outcome_tally.values().sum::<u64>(), 100_000);
}

#[test]
fn expansion_of_zero_draws_is_all_zero() {
    let tables = EventTables::builtin().expect("built-in tables");
    let counts = expand(0.0, &tables.starlight.graph);
    assert!(!counts.is_empty());
    assert!(counts.values().all(|count| *count == 0.0));
}

#[test]
fn expansion_is_linear_in_draw_count() {
    let tables = EventTables::builtin().expect("built-in tables");
    let graph = &tables.starlight.graph;
    let draws = 10_000.0 / 27.0;
    let single = expand(draws, graph);
    let double = expand(2.0 * draws, graph);

    assert_eq!(single.len(), double.len());
    for (name, count) in &single {
        assert_eq!(double[name], 2.0 * count, "{name}");
    }
}

#[test]
fn expansion_reaches_terminal_stage_through_seed_ratio() {
    let tables = EventTables::builtin().expect("built-in tables");
    let counts = expand(1_000.0, &tables.starlight.graph);
    // 1000 draws -> 100 Radiant Starlight -> 25 crystals -> 12.5 -> 6.25 -> 3.125 at stage 5.
    let stage_five_share = 0.29;
    let expected = 3.125 * stage_five_share;
    let observed = counts["Breakthrough Voucher 30% (24 Star)"];
    // Stage 3 and 4 also pay this reward.
    let upstream = 12.5 * 0.07 + 6.25 * 0.08;
    assert!((observed - (expected + upstream)).abs() < 1e-9);
    assert!(!counts.contains_key("Radiant Starlight"));
    assert!(!counts.contains_key("Brilliant Starlight"));
}

#[test]
fn ladder_accounts_for_every_trial() {
    let graph = three_coin_graph();
    let mut rng = Rng::new(99);
    let result = ladder::simulate(5_000, &graph, &mut rng);

    let survivors = result.survivors();
    assert_eq!(survivors.len(), 4);
    assert_eq!(result.stage_rewards.len(), survivors.len());
    for (stage, failures) in result.per_stage_failures.iter().enumerate() {
        assert_eq!(failures + survivors[stage + 1], survivors[stage]);
        assert_eq!(result.stage_rewards[stage].values().sum::<u64>(), *failures);
    }
    assert_eq!(*survivors.last().expect("final stage"), result.stage_final_success);
    let final_tally = result.stage_rewards.last().expect("final stage tally");
    assert_eq!(final_tally.values().sum::<u64>(), result.stage_final_success);
    assert_eq!(result.outcomes_recorded(), 5_000);
}

#[test]
fn reward_named_like_an_advance_entry_is_still_a_reward() {
    let graph = three_coin_graph();
    let counts = expand(1_000.0, &graph);
    // Stage 5 pays "Ticket", the same display name the advance entries carry.
    assert!((counts["Ticket"] - 12.5).abs() < 1e-9);

    let mut rng = Rng::new(5);
    let result = ladder::simulate(2_000, &graph, &mut rng);
    assert_eq!(
        result.reward_tally.get("Ticket").copied().unwrap_or(0),
        result.stage_final_success
    );
}

#[test]
fn ladder_survival_matches_theory() {
    let graph = three_coin_graph();
    assert!((ladder::theoretical_survival(&graph) - 12.5).abs() < 1e-12);

    let mut rng = Rng::new(12_345);
    let result = ladder::simulate(100_000, &graph, &mut rng);
    // sigma of the rate is about 0.105 percentage points.
    assert!(
        (result.survival_rate() - 12.5).abs() < 0.45,
        "survival rate {}",
        result.survival_rate()
    );
}

#[test]
fn builtin_ladder_theory_is_one_eighth() {
    let tables = EventTables::builtin().expect("built-in tables");
    assert!((ladder::theoretical_survival(&tables.starlight.graph) - 12.5).abs() < 1e-12);
}

#[test]
fn allocator_fills_a_single_composite() {
    let inventory: TokenInventory = [("A", 3.0), ("B", 3.0), ("C", 3.0)]
        .into_iter()
        .map(|(name, quantity)| (name.to_string(), quantity))
        .collect();
    let requirements: CompositeRequirements = std::iter::once((
        "box".to_string(),
        vec!["A".to_string(), "B".to_string(), "C".to_string()],
    ))
    .collect();

    let allocation = allocate(&inventory, &requirements, &["box".to_string()]);

    assert_eq!(allocation.len(), 1);
    assert_eq!(allocation["box"], 3.0);
    assert_eq!(inventory.get("A"), 3.0);
    assert_eq!(inventory.get("B"), 3.0);
    assert_eq!(inventory.get("C"), 3.0);
}

#[test]
fn calculator_end_to_end_pass_through() {
    let tables = EventTables::builtin().expect("built-in tables");
    let output = calculate(
        &tables.breath,
        &CalculatorInput {
            investment: 10_000.0,
            ..CalculatorInput::default()
        },
    );
    let draws = 10_000.0 / 27.0;
    assert_eq!(output.points, 10_000.0);
    assert!((output.draw_count - draws).abs() < 1e-9);
    for token in &tables.breath.token_rates {
        let expected = draws * token.rate / 100.0;
        assert!((output.expected_breaths.get(&token.name) - expected).abs() < 1e-9);
    }
}

#[test]
fn calculator_with_zero_investment_is_zero() {
    let tables = EventTables::builtin().expect("built-in tables");
    let output = calculate(&tables.breath, &CalculatorInput::default());
    assert_eq!(output.roi, 0.0);
    assert_eq!(output.expected_value, 0.0);
    assert_eq!(output.draw_count, 0.0);
}
