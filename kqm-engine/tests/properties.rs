use kqm_engine::{
    AllocatorKind, Artifact, ArtifactBuilder, ArtifactSet, ArtifactSlot, BudgetError, EnergyGate,
    OptimizeError, RollConstraints, RollQuality, Stat, StatTable, StatView, allocate,
    possible_sub_stats,
};

const QUALITIES: [RollQuality; 5] = [
    RollQuality::Low,
    RollQuality::Medium,
    RollQuality::High,
    RollQuality::Max,
    RollQuality::Avg,
];

fn build(sands: Stat, goblet: Stat, circlet: Stat) -> ArtifactSet {
    let mut set = ArtifactSet::new();
    set.equip(Artifact::flower(5, 20).unwrap());
    set.equip(Artifact::feather(5, 20).unwrap());
    set.equip(Artifact::new(ArtifactSlot::Sands, 5, 20, sands).unwrap());
    set.equip(Artifact::new(ArtifactSlot::Goblet, 5, 20, goblet).unwrap());
    set.equip(Artifact::new(ArtifactSlot::Circlet, 5, 20, circlet).unwrap());
    set
}

fn crit_set() -> ArtifactSet {
    build(Stat::AtkPercent, Stat::PyroDmgBonus, Stat::CritDmg)
}

fn anchor() -> StatTable {
    StatTable::from([
        (Stat::BaseAtk, 800.0),
        (Stat::EnergyRecharge, 1.1),
        (Stat::CritRate, 0.2),
        (Stat::CritDmg, 0.5),
        (Stat::ElementalMastery, 80.0),
    ])
}

/// Crit-scaled ATK with a small EM term so most substats matter a little.
fn objective(stats: &StatTable) -> f64 {
    let crit = 1.0 + stats.get(Stat::CritRate).clamp(0.0, 1.0) * stats.get(Stat::CritDmg);
    (stats.total_atk() + 0.5 * stats.get(Stat::ElementalMastery)) * crit
}

#[test]
fn roll_then_unroll_restores_state_for_every_substat_and_quality() {
    let mut builder = ArtifactBuilder::kqmc(crit_set());
    builder.roll(Stat::CritRate, RollQuality::High, 3).unwrap();
    builder.roll(Stat::AtkPercent, RollQuality::Low, 2).unwrap();
    for stat in possible_sub_stats() {
        for quality in QUALITIES {
            if builder.rolls_remaining_for(stat) == 0 {
                continue;
            }
            let before = builder.clone();
            builder.roll(stat, quality, 1).unwrap();
            assert_eq!(builder.unroll(stat), Ok(quality));
            assert_eq!(builder, before, "{stat} at {quality:?} drifted");
        }
    }
}

#[test]
fn capacity_is_conserved_across_a_roll_sequence() {
    let mut builder = ArtifactBuilder::kqmc(crit_set());
    let total = builder.budget().total();
    // Deterministic walk over substats, wrapping until the budget refuses.
    let order: Vec<Stat> = possible_sub_stats().collect();
    let mut committed = 0;
    for step in 0..200 {
        let stat = order[(step * 7) % order.len()];
        let count = 1 + u32::try_from(step % 3).unwrap();
        match builder.roll(stat, RollQuality::Avg, count) {
            Ok(()) => committed += count,
            Err(
                BudgetError::TotalExhausted { .. } | BudgetError::StatCapReached { .. },
            ) => {}
            Err(other) => panic!("unexpected {other}"),
        }
        let per_stat: u32 = order.iter().map(|&s| builder.rolls_for(s)).sum();
        assert_eq!(per_stat, committed);
        assert_eq!(builder.budget().committed(), committed);
        assert!(committed <= total);
        for &s in &order {
            assert!(builder.rolls_for(s) <= builder.budget().cap(s));
        }
    }
    assert_eq!(builder.rolls_remaining(), 0);
}

#[test]
fn allocators_terminate_within_their_bounds() {
    for (sands, goblet, circlet) in [
        (Stat::AtkPercent, Stat::PyroDmgBonus, Stat::CritDmg),
        (Stat::EnergyRecharge, Stat::AtkPercent, Stat::CritRate),
        (Stat::ElementalMastery, Stat::ElementalMastery, Stat::ElementalMastery),
    ] {
        let set = build(sands, goblet, circlet);
        let pool = ArtifactBuilder::kqmc(set.clone()).possible_sub_stats().count();

        let mut single = ArtifactBuilder::kqmc(set.clone());
        let trace = allocate(
            AllocatorKind::SingleRoll,
            &anchor(),
            &mut single,
            &objective,
            1.2,
            RollQuality::Avg,
        )
        .unwrap();
        assert!(trace.steps.len() <= usize::try_from(single.budget().total()).unwrap());

        let mut fill = ArtifactBuilder::kqmc(set);
        let trace = allocate(
            AllocatorKind::Fill,
            &anchor(),
            &mut fill,
            &objective,
            1.2,
            RollQuality::Avg,
        )
        .unwrap();
        assert!(trace.steps.len() <= pool);
    }
}

#[test]
fn fill_greedy_never_lowers_the_score() {
    for requirement in [1.0, 1.3, 1.6] {
        let mut builder = ArtifactBuilder::kqmc(crit_set());
        let trace = allocate(
            AllocatorKind::Fill,
            &anchor(),
            &mut builder,
            &objective,
            requirement,
            RollQuality::Avg,
        )
        .unwrap();
        let mut last = trace.gate_score;
        for step in &trace.steps {
            assert!(step.score >= last, "{} lowered the score", step.stat);
            last = step.score;
        }
    }
}

#[test]
fn gate_and_allocators_agree_on_infeasibility() {
    let base = 1.0;
    let anchor = StatTable::of(Stat::EnergyRecharge, base);
    let constraints = RollConstraints::uniform(8, 8);
    let per_roll = 0.0648;
    let ceiling = base + 8.0 * per_roll;
    for threshold in [1.2, 1.5, ceiling + 1e-6, 2.0] {
        let fresh = || ArtifactBuilder::with_constraints(crit_set(), 5, constraints);
        let mut builder = fresh();
        assert!((EnergyGate::ceiling(&anchor, &builder) - ceiling).abs() < 1e-9);
        let gate = EnergyGate::new(threshold, RollQuality::Max).prefill(&anchor, &mut builder);
        let mut alloc_builder = fresh();
        let alloc = allocate(
            AllocatorKind::Fill,
            &anchor,
            &mut alloc_builder,
            &objective,
            threshold,
            RollQuality::Max,
        );
        if threshold > ceiling {
            assert!(matches!(gate, Err(OptimizeError::ConstraintInfeasible { .. })));
            assert!(matches!(alloc, Err(OptimizeError::ConstraintInfeasible { .. })));
            assert_eq!(builder.budget().committed(), 0);
            assert_eq!(alloc_builder.budget().committed(), 0);
        } else {
            let rolls = gate.unwrap();
            assert_eq!(alloc.unwrap().gate_rolls, rolls);
            assert!(EnergyGate::current(&anchor, &builder) >= threshold);
        }
    }
}

#[test]
fn zero_gain_stats_stay_pruned() {
    let mut builder = ArtifactBuilder::kqmc(crit_set());
    let trace = allocate(
        AllocatorKind::SingleRoll,
        &anchor(),
        &mut builder,
        &objective,
        1.0,
        RollQuality::Avg,
    )
    .unwrap();
    for stat in &trace.pruned {
        assert_eq!(builder.rolls_for(*stat), 0, "{stat} was rolled after pruning");
    }
    assert!(trace.pruned.contains(&Stat::FlatHp));
    assert!(!trace.pruned.contains(&Stat::ElementalMastery));
}
