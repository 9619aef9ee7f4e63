//! Batch match runner for balance testing.
//!
//! Runs many independent matches in parallel using rayon. Matches are
//! deterministic, so variety comes from rotating the lineup: game `i`
//! seats the players shifted by `i`, letting each player take every team.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use battalion_core::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::game_runner::{run_match, MatchConfig};
use crate::metrics::{BatchSummary, MatchReport};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario name, for reports.
    pub scenario: String,
    /// Number of matches to run.
    pub game_count: u32,
    /// Worker threads (0 = rayon default).
    pub parallel_games: usize,
    /// Rotate the lineup between matches.
    pub rotate_seats: bool,
    /// Settings shared by every match.
    pub match_config: MatchConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "skirmish".to_string(),
            game_count: 10,
            parallel_games: 0,
            rotate_seats: true,
            match_config: MatchConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Config for `game_count` matches of a scenario.
    pub fn new(scenario: &str, game_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set the match settings.
    pub fn with_match_config(mut self, match_config: MatchConfig) -> Self {
        self.match_config = match_config;
        self
    }

    /// Set the worker count.
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallel_games = threads;
        self
    }

    fn config_for(&self, index: u32) -> MatchConfig {
        if self.rotate_seats {
            self.match_config.rotated(index as usize)
        } else {
            self.match_config.clone()
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual match reports, in game order.
    pub games: Vec<MatchReport>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Matches with the same lineup all ended in the same state.
    pub deterministic: bool,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Matches that failed to run.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Default file name inside an output directory.
    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join("batch_results.json")
    }
}

/// A match that could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index.
    pub game_index: u32,
    /// Error message.
    pub message: String,
}

/// Run a batch of matches on `level`.
///
/// # Errors
/// Returns an error only if the worker pool cannot be created; failed
/// matches are collected in [`BatchResults::errors`].
pub fn run_batch(level: &Level, config: BatchConfig) -> std::result::Result<BatchResults, rayon::ThreadPoolBuildError> {
    let start = Instant::now();
    let completed = AtomicU32::new(0);
    info!(
        scenario = %config.scenario,
        games = config.game_count,
        threads = config.parallel_games,
        "starting batch run"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallel_games)
        .build()?;

    let results: Vec<std::result::Result<MatchReport, BatchError>> = pool.install(|| {
        (0..config.game_count)
            .into_par_iter()
            .map(|index| {
                let match_config = config.config_for(index);
                match run_match(level, &config.scenario, &match_config) {
                    Ok(result) => {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        debug!(done, total = config.game_count, "match complete");
                        Ok(result.report)
                    }
                    Err(e) => {
                        warn!(game = index, error = %e, "match failed");
                        Err(BatchError {
                            game_index: index,
                            message: e.to_string(),
                        })
                    }
                }
            })
            .collect()
    });

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(std::result::Result::is_ok);
    let games: Vec<MatchReport> = games.into_iter().filter_map(std::result::Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(std::result::Result::err).collect();

    let summary = BatchSummary::from_reports(&games);
    let deterministic = lineups_agree(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        failed = errors.len(),
        deterministic,
        duration_seconds,
        "batch complete"
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        deterministic,
        duration_seconds,
        errors,
    })
}

/// Whether every pair of reports with the same lineup shares a final hash.
fn lineups_agree(games: &[MatchReport]) -> bool {
    games.iter().enumerate().all(|(i, a)| {
        games[i + 1..]
            .iter()
            .filter(|b| b.lineup == a.lineup)
            .all(|b| b.final_hash == a.final_hash && b.winner == a.winner)
    })
}
