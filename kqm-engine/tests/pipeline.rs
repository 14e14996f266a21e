use kqm_engine::{
    AllocatorKind, ArtifactSlot, CombinationOutcome, Objective, OptimizeError, OptimizerConfig,
    RollConstraints, Scenario, Stat, StatView, optimal_main_stats, optimal_substats,
    optimize_artifacts, plan_energy, preset_names,
};

fn run_preset(name: &str) -> (Scenario, kqm_engine::SearchReport) {
    let mut scenario = Scenario::preset(name).unwrap();
    let requirement = scenario.energy_recharge_requirement;
    let config = scenario.optimizer;
    let report = optimize_artifacts(
        &mut scenario.character,
        &scenario.rotation,
        requirement,
        &config,
    )
    .unwrap_or_else(|err| panic!("{name} failed: {err}"));
    (scenario, report)
}

#[test]
fn every_preset_produces_a_feasible_build() {
    for name in preset_names() {
        let (scenario, report) = run_preset(name);
        let character = &scenario.character;
        assert!(
            character.get(Stat::EnergyRecharge) >= scenario.energy_recharge_requirement,
            "{name} missed its energy requirement"
        );
        for slot in ArtifactSlot::ALL {
            assert!(character.artifacts.get(slot).is_some(), "{name} left {slot:?} empty");
        }
        let rescored = scenario.rotation.evaluate(&character.stats());
        assert!(
            (rescored - report.best.score).abs() <= 1e-6 * report.best.score.max(1.0),
            "{name}: equipped build scores {rescored}, report says {}",
            report.best.score
        );
        assert_eq!(
            report.best.builder.budget().committed(),
            scenario.optimizer.constraints.total_rolls
        );
    }
}

#[test]
fn winner_beats_every_other_feasible_combination() {
    let (_, report) = run_preset("raiden-burst");
    let mut scored = 0;
    for entry in &report.combinations {
        if let CombinationOutcome::Scored { score, .. } = entry.outcome {
            scored += 1;
            assert!(report.best.score >= score, "{} outscored the winner", entry.combination);
        }
    }
    assert_eq!(scored, report.feasible());
    let first_best = report
        .combinations
        .iter()
        .find(|entry| {
            matches!(entry.outcome, CombinationOutcome::Scored { score, .. } if score == report.best.score)
        })
        .unwrap();
    assert_eq!(first_best.combination, report.winner);
}

#[test]
fn hp_scaler_picks_hp_main_stats() {
    let (scenario, report) = run_preset("yelan-hp");
    let goblet = report
        .candidates
        .iter()
        .find(|c| c.slot == ArtifactSlot::Goblet)
        .unwrap();
    assert!(goblet.pruned.contains(&Stat::AtkPercent));
    assert_eq!(report.winner.goblet, Stat::HydroDmgBonus);
    assert_eq!(report.best.builder.rolls_for(Stat::AtkPercent), 0);
    assert_eq!(report.best.builder.rolls_for(Stat::FlatAtk), 0);
    assert!(scenario.character.get(Stat::HpPercent) > 0.0);
}

#[test]
fn single_roll_and_fill_both_satisfy_the_requirement() {
    for allocator in [AllocatorKind::Fill, AllocatorKind::SingleRoll] {
        let mut scenario = Scenario::preset("raiden-burst").unwrap();
        let config = OptimizerConfig {
            allocator,
            ..scenario.optimizer
        };
        let report = optimize_artifacts(&mut scenario.character, &scenario.rotation, 2.5, &config)
            .unwrap();
        assert!(report.best.energy_recharge >= 2.5);
        if allocator == AllocatorKind::SingleRoll {
            assert!(report.best.trace.steps.iter().all(|s| s.rolls == 1));
        }
    }
}

#[test]
fn requirement_above_ceiling_fails_without_touching_character() {
    let mut scenario = Scenario::preset("raiden-burst").unwrap();
    let before = scenario.character.clone();
    let err = optimize_artifacts(
        &mut scenario.character,
        &scenario.rotation,
        4.0,
        &OptimizerConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, OptimizeError::ConstraintInfeasible { best, .. } if best < 4.0));
    assert_eq!(scenario.character, before);
}

#[test]
fn tight_budget_can_leave_no_feasible_combination() {
    let mut scenario = Scenario::preset("raiden-burst").unwrap();
    let config = OptimizerConfig {
        constraints: RollConstraints {
            total_rolls: 4,
            ..RollConstraints::kqmc()
        },
        ..OptimizerConfig::default()
    };
    // The ceiling assumes a full per-stat cap, which four fluid rolls cannot reach.
    let err = optimize_artifacts(&mut scenario.character, &scenario.rotation, 2.7, &config)
        .unwrap_err();
    assert!(matches!(err, OptimizeError::ConstraintInfeasible { .. }));
}

#[test]
fn quick_main_stat_pass_agrees_on_element() {
    let scenario = Scenario::preset("raiden-burst").unwrap();
    // Main stats alone top out at 2.297 energy recharge.
    let quick = optimal_main_stats(
        &scenario.character,
        &scenario.rotation,
        2.2,
        &scenario.optimizer,
    )
    .unwrap();
    assert!(quick.forced_energy_sands);
    assert_eq!(quick.combination.goblet, Stat::ElectroDmgBonus);
    assert_eq!(quick.artifacts.iter().count(), 5);
    assert!(matches!(
        optimal_main_stats(
            &scenario.character,
            &scenario.rotation,
            scenario.energy_recharge_requirement,
            &scenario.optimizer,
        ),
        Err(OptimizeError::ConstraintInfeasible { .. })
    ));
}

#[test]
fn substats_then_energy_plan_on_existing_gear() {
    let (mut scenario, report) = run_preset("raiden-burst");
    let plan = plan_energy(&scenario.character, 2.5, &scenario.optimizer).unwrap();
    assert_eq!(plan.rolls, report.best.trace.gate_rolls);
    assert!(plan.reached >= 2.5);
    let again = optimal_substats(
        &mut scenario.character,
        &scenario.rotation,
        2.5,
        &scenario.optimizer,
    )
    .unwrap();
    assert_eq!(again.builder.substats(), report.best.builder.substats());
}
