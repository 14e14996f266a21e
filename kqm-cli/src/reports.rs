use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use kqm_engine::{
    Allocation, ArtifactBuilder, ArtifactSet, CombinationOutcome, GatePlan, MainStatReport,
    SearchReport, Stat, StatTable, StatView,
};

/// What a run produced, per mode.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunResult {
    Search(Box<SearchReport>),
    MainStats(MainStatReport),
    Substats(Allocation),
    Gate(GatePlan),
}

impl RunResult {
    fn builder(&self) -> Option<&ArtifactBuilder> {
        match self {
            Self::Search(report) => Some(&report.best.builder),
            Self::Substats(allocation) => Some(&allocation.builder),
            Self::MainStats(_) | Self::Gate(_) => None,
        }
    }
}

/// Everything a report renderer needs about one run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub character: String,
    pub mode: &'static str,
    pub requirement: f64,
    pub artifacts: ArtifactSet,
    pub final_stats: StatTable,
    pub breakdown: Vec<(String, f64)>,
    pub total_damage: f64,
    pub result: RunResult,
}

const HEADLINE_STATS: [Stat; 5] = [
    Stat::ElementalMastery,
    Stat::EnergyRecharge,
    Stat::CritRate,
    Stat::CritDmg,
    Stat::DmgBonus,
];

fn headline(stats: &StatTable) -> Vec<(String, String)> {
    let mut rows = vec![
        ("ATK".to_string(), format!("{:.0}", stats.total_atk())),
        ("HP".to_string(), format!("{:.0}", stats.total_hp())),
        ("DEF".to_string(), format!("{:.0}", stats.total_def())),
    ];
    rows.extend(
        HEADLINE_STATS
            .iter()
            .map(|&stat| (stat.key().to_string(), stat.format_value(stats.get(stat)))),
    );
    rows.extend(
        stats
            .iter()
            .filter(|(stat, value)| {
                stat.key().ends_with("_dmg_bonus") && *stat != Stat::DmgBonus && *value > 0.0
            })
            .map(|(stat, value)| (stat.key().to_string(), stat.format_value(value))),
    );
    rows
}

fn roll_rows(builder: &ArtifactBuilder) -> Vec<(Stat, u32, String)> {
    let substats = builder.substats();
    kqm_engine::possible_sub_stats()
        .map(|stat| {
            (
                stat,
                builder.rolls_for(stat),
                stat.format_value(substats.get(stat)),
            )
        })
        .collect()
}

pub fn generate_console_report(out: &mut dyn Write, report: &RunReport) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Optimization Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=======================".cyan())?;
    writeln!(
        out,
        "Scenario: {} ({})",
        report.scenario.bold(),
        report.character
    )?;
    writeln!(out, "Mode: {}", report.mode)?;
    writeln!(
        out,
        "Energy recharge requirement: {}",
        Stat::EnergyRecharge.format_value(report.requirement)
    )?;
    writeln!(out)?;

    match &report.result {
        RunResult::Search(search) => {
            writeln!(
                out,
                "Combinations: {} evaluated, {} feasible",
                search.combinations.len(),
                search.feasible().to_string().green()
            )?;
            for slot in &search.candidates {
                let kept: Vec<&str> = slot.kept.iter().map(|s| s.key()).collect();
                let note = if slot.fallback {
                    " (nothing helped, trying all)".yellow()
                } else {
                    "".normal()
                };
                writeln!(out, "   {:8} {}{note}", slot.slot.label(), kept.join(", "))?;
            }
            writeln!(out, "Best score: {:.1}", search.best.score)?;
        }
        RunResult::MainStats(main) => {
            writeln!(
                out,
                "Combinations: {} evaluated (main stats only)",
                main.evaluated
            )?;
            if main.forced_energy_sands {
                writeln!(out, "{}", "Sands pinned to energy recharge".yellow())?;
            }
            writeln!(out, "Best score: {:.1}", main.score)?;
        }
        RunResult::Substats(allocation) => {
            writeln!(out, "Best score: {:.1}", allocation.score)?;
        }
        RunResult::Gate(plan) => {
            writeln!(
                out,
                "Energy recharge: {} -> {} ({} rolls, ceiling {})",
                Stat::EnergyRecharge.format_value(plan.starting),
                Stat::EnergyRecharge.format_value(plan.reached),
                plan.rolls.to_string().green(),
                Stat::EnergyRecharge.format_value(plan.ceiling)
            )?;
            writeln!(out, "Rolls left for damage: {}", plan.rolls_left)?;
        }
    }
    writeln!(out)?;

    writeln!(out, "{}", "🎯 Main Stats".bright_yellow().bold())?;
    for piece in report.artifacts.iter() {
        writeln!(
            out,
            "   {:8} {} {}",
            piece.slot.label(),
            piece.main_stat,
            piece.main_stat.format_value(piece.main_stat_value())
        )?;
    }

    if let Some(builder) = report.result.builder() {
        writeln!(out)?;
        writeln!(out, "{}", "🎲 Substat Rolls".bright_yellow().bold())?;
        for (stat, rolls, value) in roll_rows(builder) {
            let rolls = if rolls > 0 {
                rolls.to_string().green()
            } else {
                rolls.to_string().dimmed()
            };
            writeln!(out, "   {:18} {rolls:>3}  {value}", stat.key())?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "📈 Final Stats".bright_yellow().bold())?;
    for (label, value) in headline(&report.final_stats) {
        writeln!(out, "   {label:18} {value}")?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "⚔️  Damage per Rotation".bright_yellow().bold())?;
    for (name, damage) in &report.breakdown {
        writeln!(out, "   {name:28} {damage:>12.1}")?;
    }
    writeln!(out, "   {:28} {:>12.1}", "Total".bold(), report.total_damage)?;
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, report: &RunReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &RunReport) -> Result<()> {
    writeln!(out, "# KQM Optimization: {}\n", report.scenario)?;
    writeln!(out, "- **Character**: {}", report.character)?;
    writeln!(out, "- **Mode**: {}", report.mode)?;
    writeln!(
        out,
        "- **Energy recharge requirement**: {}",
        Stat::EnergyRecharge.format_value(report.requirement)
    )?;
    writeln!(out, "- **Damage per rotation**: {:.1}\n", report.total_damage)?;

    match &report.result {
        RunResult::Search(search) => {
            writeln!(out, "## Combinations\n")?;
            writeln!(out, "| Sands | Goblet | Circlet | Outcome |")?;
            writeln!(out, "| --- | --- | --- | --- |")?;
            for entry in &search.combinations {
                let outcome = match &entry.outcome {
                    CombinationOutcome::Scored { score, .. } => format!("{score:.1}"),
                    CombinationOutcome::BelowRequirement { energy_recharge } => format!(
                        "below requirement ({})",
                        Stat::EnergyRecharge.format_value(*energy_recharge)
                    ),
                    CombinationOutcome::Skipped { reason } => format!("skipped: {reason}"),
                };
                let marker = if entry.combination == search.winner {
                    " **best**"
                } else {
                    ""
                };
                writeln!(
                    out,
                    "| {} | {} | {} | {outcome}{marker} |",
                    entry.combination.sands, entry.combination.goblet, entry.combination.circlet
                )?;
            }
            writeln!(out)?;
        }
        RunResult::MainStats(main) => {
            writeln!(
                out,
                "Main stats only, {} combinations evaluated.\n",
                main.evaluated
            )?;
        }
        RunResult::Substats(_) => {}
        RunResult::Gate(plan) => {
            writeln!(out, "## Energy Plan\n")?;
            writeln!(out, "- **Rolls needed**: {}", plan.rolls)?;
            writeln!(
                out,
                "- **Reached**: {}",
                Stat::EnergyRecharge.format_value(plan.reached)
            )?;
            writeln!(out, "- **Rolls left**: {}\n", plan.rolls_left)?;
        }
    }

    writeln!(out, "## Main Stats\n")?;
    for piece in report.artifacts.iter() {
        writeln!(
            out,
            "- **{}**: {} {}",
            piece.slot.label(),
            piece.main_stat,
            piece.main_stat.format_value(piece.main_stat_value())
        )?;
    }
    writeln!(out)?;

    if let Some(builder) = report.result.builder() {
        writeln!(out, "## Substat Rolls\n")?;
        writeln!(out, "| Stat | Rolls | Value |")?;
        writeln!(out, "| --- | ---: | ---: |")?;
        for (stat, rolls, value) in roll_rows(builder) {
            writeln!(out, "| {stat} | {rolls} | {value} |")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Damage\n")?;
    for (name, damage) in &report.breakdown {
        writeln!(out, "- {name}: {damage:.1}")?;
    }
    Ok(())
}
