mod reports;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use kqm_engine::{
    AllocatorKind, Objective, OptimizerConfig, Scenario, optimal_main_stats, optimal_substats,
    optimize_artifacts, plan_energy, preset_names,
};
use reports::{RunReport, RunResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Full main-stat and substat search
    Search,
    /// Main stats only, no substats (fast)
    MainStats,
    /// Keep the scenario's main stats and allocate substats
    Substats,
    /// Count the energy recharge rolls the current gear needs
    Gate,
}

impl Mode {
    const fn label(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::MainStats => "main-stats",
            Self::Substats => "substats",
            Self::Gate => "gate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AllocatorArg {
    /// Commit each winner up to its cap
    Fill,
    /// Commit one roll per iteration
    Single,
}

impl From<AllocatorArg> for AllocatorKind {
    fn from(value: AllocatorArg) -> Self {
        match value {
            AllocatorArg::Fill => Self::Fill,
            AllocatorArg::Single => Self::SingleRoll,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "kqm", version = "0.1.0")]
#[command(about = "Artifact main-stat and substat optimizer for damage rotations")]
struct Args {
    /// Built-in preset name or path to a scenario JSON file
    #[arg(long, default_value = "raiden-burst")]
    scenario: String,

    /// List built-in presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Which optimizer entry point to run
    #[arg(long, value_enum, default_value_t = Mode::Search)]
    mode: Mode,

    /// Override the scenario's energy recharge requirement (1.8 = 180%)
    #[arg(long)]
    er: Option<f64>,

    /// Override the scenario's allocator
    #[arg(long, value_enum)]
    allocator: Option<AllocatorArg>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if maybe_list_presets(&args)? {
        return Ok(());
    }

    let scenario = load_scenario(&args.scenario)?;
    let (requirement, config) = resolve_settings(&args, &scenario)?;
    if args.report == "console" {
        announce_banner();
    }

    let start_time = Instant::now();
    let report = run_mode(args.mode, scenario, requirement, &config)?;
    log::info!("{} finished in {:?}", args.mode.label(), start_time.elapsed());

    write_report(&args, &report)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn maybe_list_presets(args: &Args) -> Result<bool> {
    if !args.list_presets {
        return Ok(false);
    }
    let mut out = open_output(args.output.as_deref())?;
    writeln!(out, "Available presets:")?;
    for name in preset_names() {
        let description = Scenario::preset(name)
            .map(|scenario| scenario.description)
            .unwrap_or_default();
        writeln!(out, "  {name:20} - {description}")?;
    }
    out.flush()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "⚔️  KQM Artifact Optimizer".bright_cyan().bold());
    println!("{}", "==========================".cyan());
}

/// Presets win over files when a name matches both.
fn load_scenario(source: &str) -> Result<Scenario> {
    if preset_names().any(|name| name == source) {
        return Scenario::preset(source).with_context(|| format!("failed to load preset {source}"));
    }
    let path = PathBuf::from(source);
    if !path.exists() {
        let known: Vec<&str> = preset_names().collect();
        bail!(
            "'{source}' is neither a preset ({}) nor an existing file",
            known.join(", ")
        );
    }
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Scenario::from_json(&json).with_context(|| format!("failed to parse {}", path.display()))
}

fn resolve_settings(args: &Args, scenario: &Scenario) -> Result<(f64, OptimizerConfig)> {
    let requirement = args.er.unwrap_or(scenario.energy_recharge_requirement);
    if !requirement.is_finite() || requirement < 0.0 {
        bail!("--er must be a finite, non-negative number (got {requirement})");
    }
    let mut config = scenario.optimizer;
    if let Some(allocator) = args.allocator {
        config.allocator = allocator.into();
    }
    config.validate().context("invalid optimizer configuration")?;
    Ok((requirement, config))
}

fn run_mode(
    mode: Mode,
    mut scenario: Scenario,
    requirement: f64,
    config: &OptimizerConfig,
) -> Result<RunReport> {
    let character = &mut scenario.character;
    let rotation = &scenario.rotation;
    let (result, artifacts, stats) = match mode {
        Mode::Search => {
            let search = optimize_artifacts(character, rotation, requirement, config)
                .context("artifact search failed")?;
            (
                RunResult::Search(Box::new(search)),
                character.artifacts.clone(),
                character.stats(),
            )
        }
        Mode::MainStats => {
            let main = optimal_main_stats(character, rotation, requirement, config)
                .context("main-stat search failed")?;
            let mut preview = character.clone();
            preview.unequip_all_artifacts();
            preview.clear_substats();
            for piece in main.artifacts.iter() {
                preview.equip(*piece);
            }
            let stats = preview.stats();
            (RunResult::MainStats(main), preview.artifacts, stats)
        }
        Mode::Substats => {
            let allocation = optimal_substats(character, rotation, requirement, config)
                .context("substat allocation failed")?;
            (
                RunResult::Substats(allocation),
                character.artifacts.clone(),
                character.stats(),
            )
        }
        Mode::Gate => {
            let plan = plan_energy(character, requirement, config)
                .context("energy recharge planning failed")?;
            (
                RunResult::Gate(plan),
                character.artifacts.clone(),
                character.stats(),
            )
        }
    };
    Ok(RunReport {
        scenario: scenario.name.clone(),
        character: character.name.clone(),
        mode: mode.label(),
        requirement,
        artifacts,
        breakdown: rotation.breakdown(&stats),
        total_damage: rotation.evaluate(&stats),
        final_stats: stats,
        result,
    })
}

fn write_report(args: &Args, report: &RunReport) -> Result<()> {
    let mut out = open_output(args.output.as_deref())?;
    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut out, report)?,
        "markdown" => reports::generate_markdown_report(&mut out, report)?,
        _ => reports::generate_console_report(&mut out, report)?,
    }
    out.flush()?;
    Ok(())
}

/// Report sink: stdout unless `--output` names a file.
fn open_output(path: Option<&Path>) -> Result<BufWriter<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(stdout()),
    };
    Ok(BufWriter::new(sink))
}
