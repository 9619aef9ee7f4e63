//! Headless Battalion runner.
//!
//! Plays computer-vs-computer matches from the command line. Reports go to
//! stdout, as text or JSON; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # One match, greedy against minimax
//! cargo run -p battalion_headless -- play --scenario skirmish --player greedy --player minimax
//!
//! # Batch balance run
//! cargo run -p battalion_headless -- batch --scenario duel --count 100 --output results/
//!
//! # Determinism check, or check a saved replay
//! cargo run -p battalion_headless -- verify --scenario duel --runs 5
//! cargo run -p battalion_headless -- verify --replay match.bin
//!
//! # Board after ten turns, as Red sees it
//! cargo run -p battalion_headless -- show --scenario skirmish --turns 10 --viewer red
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use battalion_ai::prelude::*;
use battalion_core::prelude::*;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use battalion_headless::{
    ascii_visualizer::{render_board, AsciiConfig},
    batch::{run_batch, BatchConfig, BatchResults},
    game_runner::{run_match, verify_determinism, MatchConfig, PlayerKind},
    metrics::MatchReport,
    scenario::Scenario,
};

type CliResult = std::result::Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "battalion_headless")]
#[command(about = "Headless Battalion runner for AI matches and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that plays matches.
#[derive(Args)]
struct MatchArgs {
    /// Builtin scenario name or path to a RON scenario file
    #[arg(short, long, default_value = "duel")]
    scenario: String,

    /// Players in seat order; repeats to cover every team
    #[arg(long = "player", value_enum, default_values_t = [PlayerKind::Greedy])]
    players: Vec<PlayerKind>,

    /// Minimax search depth in plies
    #[arg(long, default_value = "2")]
    depth: u32,

    /// Turns before the match is called a draw
    #[arg(long, default_value = "100")]
    max_turns: u32,

    /// RON file with heuristic weights
    #[arg(long)]
    evaluator: Option<PathBuf>,
}

impl MatchArgs {
    fn load(&self) -> std::result::Result<(Scenario, Level, MatchConfig), Box<dyn Error>> {
        let scenario = Scenario::resolve(&self.scenario)?;
        let level = scenario.to_level()?;
        let evaluator = match &self.evaluator {
            Some(path) => EvaluatorConfig::from_ron_str(&std::fs::read_to_string(path)?)?,
            None => EvaluatorConfig::default(),
        };
        let config = MatchConfig {
            players: self.players.clone(),
            evaluator,
            search: SearchConfig {
                depth: self.depth,
                ..SearchConfig::default()
            },
            max_turns: self.max_turns,
        };
        Ok((scenario, level, config))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match
    Play {
        #[command(flatten)]
        args: MatchArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Save the replay to this file
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Print the final board
        #[arg(long)]
        board: bool,
    },

    /// Run a batch of matches in parallel
    Batch {
        #[command(flatten)]
        args: MatchArgs,

        /// Number of matches to run
        #[arg(short, long, default_value = "10")]
        count: u32,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Keep every player in its first seat
        #[arg(long)]
        no_rotate: bool,
    },

    /// Verify determinism by playing the same match several times
    Verify {
        #[command(flatten)]
        args: MatchArgs,

        /// Number of verification runs
        #[arg(short, long, default_value = "3")]
        runs: u32,

        /// Check a saved replay instead of playing
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Print the board of a scenario
    Show {
        #[command(flatten)]
        args: MatchArgs,

        /// Turns to play before printing
        #[arg(short, long, default_value = "0")]
        turns: u32,

        /// Apply this team's fog of war
        #[arg(long, value_parser = parse_team)]
        viewer: Option<Team>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn parse_team(name: &str) -> std::result::Result<Team, String> {
    Team::REAL
        .into_iter()
        .find(|team| team.to_string().eq_ignore_ascii_case(name))
        .ok_or_else(|| format!("unknown team '{name}', expected red, blue, green or yellow"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries reports.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Play {
            args,
            json,
            replay,
            board,
        } => cmd_play(&args, json, replay, board),
        Commands::Batch {
            args,
            count,
            parallel,
            output,
            no_rotate,
        } => cmd_batch(&args, count, parallel, output, no_rotate),
        Commands::Verify { args, runs, replay } => cmd_verify(&args, runs, replay),
        Commands::Show {
            args,
            turns,
            viewer,
            no_color,
        } => cmd_show(&args, turns, viewer, no_color),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Play one match and report it.
fn cmd_play(args: &MatchArgs, json: bool, replay: Option<PathBuf>, board: bool) -> CliResult {
    let (scenario, level, config) = args.load()?;
    let result = run_match(&level, &scenario.name, &config)?;

    if let Some(path) = replay {
        result.replay.save(&path)?;
        tracing::info!(path = %path.display(), actions = result.replay.action_count(), "replay saved");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result.report)?);
    } else {
        print_report(&result.report);
    }

    if board {
        let game = result.replay.play()?;
        print!("{}", render_board(&game, &AsciiConfig::default()));
    }
    Ok(())
}

fn print_report(report: &MatchReport) {
    match report.winner {
        Some(team) => println!("{}: {team} wins after {} turns", report.scenario, report.turns),
        None => println!("{}: draw after {} turns", report.scenario, report.turns),
    }
    println!("actions: {}, hash: {:016x}, {} ms", report.actions, report.final_hash, report.elapsed_ms);
    for (team, stats) in &report.teams {
        let player = report.lineup.get(team).map_or("?".to_string(), ToString::to_string);
        println!(
            "  {team:<6} {player:<8} built {:>3}  kills {:>3}  lost {:>3}  captured {:>3}  income {:>6}  spent {:>6}",
            stats.units_built,
            stats.enemies_terminated,
            stats.units_casualties,
            stats.buildings_conquered,
            stats.money_gained,
            stats.money_spent,
        );
    }
}

/// Run a batch of matches and save the results.
fn cmd_batch(args: &MatchArgs, count: u32, parallel: usize, output: PathBuf, no_rotate: bool) -> CliResult {
    let (scenario, level, match_config) = args.load()?;
    std::fs::create_dir_all(&output)?;

    let mut config = BatchConfig::new(&scenario.name, count)
        .with_match_config(match_config)
        .with_parallelism(parallel);
    config.rotate_seats = !no_rotate;

    let results = run_batch(&level, config)?;
    let path = BatchResults::default_path(&output);
    results.save(&path)?;

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Draws: {}", results.summary.draws);
    eprintln!("Average turns: {:.1}", results.summary.avg_turns);
    eprintln!("\nWin Rates:");
    for (team, rate) in &results.summary.win_rates {
        eprintln!("  {team}: {:.1}%", rate * 100.0);
    }
    for (player, wins) in &results.summary.wins_by_player {
        eprintln!("  {player}: {wins} wins");
    }
    for error in results.errors.iter().take(10) {
        eprintln!("  Game {}: {}", error.game_index, error.message);
    }
    eprintln!("\nResults saved to: {}", path.display());

    if !results.deterministic {
        return Err("matches with the same lineup diverged".into());
    }
    Ok(())
}

/// Check determinism of live matches or of a saved replay.
fn cmd_verify(args: &MatchArgs, runs: u32, replay: Option<PathBuf>) -> CliResult {
    let ok = match replay {
        Some(path) => {
            let replay = Replay::load(&path)?;
            tracing::info!(path = %path.display(), actions = replay.action_count(), "verifying replay");
            replay.verify()?
        }
        None => {
            let (scenario, level, config) = args.load()?;
            verify_determinism(&level, &scenario.name, &config, runs)?
        }
    };

    if ok {
        println!("deterministic: ok");
        Ok(())
    } else {
        Err("determinism check failed".into())
    }
}

/// Print the board, optionally after playing some turns.
fn cmd_show(args: &MatchArgs, turns: u32, viewer: Option<Team>, no_color: bool) -> CliResult {
    let (scenario, level, config) = args.load()?;
    let game = if turns == 0 {
        Game::new(&level)?
    } else {
        let result = run_match(&level, &scenario.name, &config.with_max_turns(turns))?;
        result.replay.play()?
    };

    if !scenario.description.is_empty() {
        println!("{}: {}", scenario.name, scenario.description);
    }
    let ascii = AsciiConfig {
        use_color: !no_color,
        viewer,
        ..AsciiConfig::default()
    };
    print!("{}", render_board(&game, &ascii));
    Ok(())
}
