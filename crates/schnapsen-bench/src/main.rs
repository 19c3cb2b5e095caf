use std::path::PathBuf;

use clap::Parser;

use schnapsen_bench::config::{MatchConfig, ResolvedOutputs};
use schnapsen_bench::logging::init_logging;
use schnapsen_bench::runner::MatchRunner;

/// Head-to-head match harness for Schnapsen agents.
#[derive(Debug, Parser)]
#[command(
    name = "schnapsen-bench",
    author,
    version,
    about = "Deterministic two-agent Schnapsen match harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/match.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for game generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = MatchConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let lineup = config
        .agents
        .iter()
        .map(|agent| agent.name.as_str())
        .collect::<Vec<_>>()
        .join(" vs ");

    println!("Loaded configuration '{run_id}': {lineup} over {games} games");

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = MatchRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: match execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Match complete for '{run_id}': {} games → {} rows at {}",
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    for agent in &summary.report.agents {
        println!(
            "  {}: {} wins ({:.1}%, 95% CI [{:.3}, {:.3}]), {:+.3} points/game",
            agent.name,
            agent.wins,
            agent.win_rate * 100.0,
            agent.ci95.0,
            agent.ci95.1,
            agent.points_per_game()
        );
    }
    println!("  win-rate difference p = {:.4}", summary.report.p_value);
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
