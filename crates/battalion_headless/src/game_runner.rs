//! AI-vs-AI match execution.
//!
//! Every participant gets its own computer player. Turns are played until
//! the game is decided or the turn limit is reached; the match is recorded
//! as a [`Replay`] and summarized in a [`MatchReport`].

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use battalion_ai::prelude::*;
use battalion_core::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::MatchReport;

/// Built-in computer players.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    /// One-ply lookahead.
    Greedy,
    /// Alpha-beta search.
    Minimax,
}

impl PlayerKind {
    /// Instantiate the player.
    pub fn build(self, evaluator: &EvaluatorConfig, search: SearchConfig) -> Box<dyn Player> {
        match self {
            Self::Greedy => Box::new(GreedyPlayer::new(evaluator.clone())),
            Self::Minimax => Box::new(MiniMaxPlayer::new(evaluator.clone(), search)),
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Greedy => "greedy",
            Self::Minimax => "minimax",
        })
    }
}

/// Configuration for a single match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Players assigned to participants in turn order, cycling when there
    /// are more participants than entries.
    pub players: Vec<PlayerKind>,
    /// Heuristic weights shared by every player.
    pub evaluator: EvaluatorConfig,
    /// Search depth and per-turn action cap.
    pub search: SearchConfig,
    /// Turns played before the match is called a draw.
    pub max_turns: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            players: vec![PlayerKind::Greedy],
            evaluator: EvaluatorConfig::default(),
            search: SearchConfig::default(),
            max_turns: 100,
        }
    }
}

impl MatchConfig {
    /// Same configuration with the given lineup.
    #[must_use]
    pub fn with_players(mut self, players: Vec<PlayerKind>) -> Self {
        self.players = players;
        self
    }

    /// Same configuration with a different turn limit.
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Lineup shifted by `seats`, so every player gets to sit at every team.
    #[must_use]
    pub fn rotated(&self, seats: usize) -> Self {
        let mut rotated = self.clone();
        if !rotated.players.is_empty() {
            let shift = seats % rotated.players.len();
            rotated.players.rotate_left(shift);
        }
        rotated
    }

    /// Player kind for the participant at `seat`.
    pub fn player_for(&self, seat: usize) -> PlayerKind {
        if self.players.is_empty() {
            PlayerKind::Greedy
        } else {
            self.players[seat % self.players.len()]
        }
    }
}

/// A finished match with its recording.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Summary of the match.
    pub report: MatchReport,
    /// Every action performed, replayable on a fresh game.
    pub replay: Replay,
}

/// Play one match on `level`.
///
/// # Errors
/// Returns an error if the level is invalid or a player proposes an action
/// the game rejects.
pub fn run_match(level: &Level, scenario: &str, config: &MatchConfig) -> Result<MatchResult> {
    let start = Instant::now();
    let mut game = Game::new(level)?;
    let stats = GameStats::attach(&mut game);
    let mut replay = Replay::new(level.clone());

    let lineup: BTreeMap<Team, PlayerKind> = game
        .participants()
        .iter()
        .enumerate()
        .map(|(seat, &team)| (team, config.player_for(seat)))
        .collect();
    let mut players: BTreeMap<Team, Box<dyn Player>> = lineup
        .iter()
        .map(|(&team, kind)| (team, kind.build(&config.evaluator, config.search)))
        .collect();
    info!(scenario, lineup = ?lineup, max_turns = config.max_turns, "match starting");

    let mut turns = 0;
    while !game.is_finished() && turns < config.max_turns {
        let team = game.turn();
        let player = players
            .get_mut(&team)
            .ok_or_else(|| GameError::InvalidState(format!("no player seated for {team}")))?;

        let summary = play_turn(&mut game, player, config.search.max_actions_per_turn)?;
        if summary.capped {
            warn!(%team, turn = turns + 1, "turn ended by the action cap");
        }
        debug!(%team, turn = turns + 1, actions = summary.actions.len(), "turn complete");
        for action in summary.actions {
            replay.record(action);
        }
        turns += 1;
    }
    replay.finalize(&game);

    let stats = stats.lock().map(|s| s.clone()).unwrap_or_default();
    let report = MatchReport {
        scenario: scenario.to_string(),
        winner: game.winner(),
        turns,
        actions: replay.action_count(),
        final_hash: game.state_hash(),
        teams: lineup.keys().map(|&team| (team, *stats.team(team))).collect(),
        lineup,
        elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    info!(
        scenario,
        winner = ?report.winner,
        turns,
        actions = report.actions,
        hash = format_args!("{:016x}", report.final_hash),
        "match finished"
    );
    Ok(MatchResult { report, replay })
}

/// Run the same match `runs` times and check every run ends in the same
/// state and that each recording replays to it.
///
/// # Errors
/// Returns an error if a match or a replay fails to run.
pub fn verify_determinism(level: &Level, scenario: &str, config: &MatchConfig, runs: u32) -> Result<bool> {
    let mut expected = None;
    for run in 0..runs.max(1) {
        let result = run_match(level, scenario, config)?;
        if !result.replay.verify()? {
            warn!(run, "replay diverged from its recording");
            return Ok(false);
        }
        let hash = result.report.final_hash;
        match expected {
            None => expected = Some(hash),
            Some(first) if first != hash => {
                warn!(run, expected = first, actual = hash, "match diverged");
                return Ok(false);
            }
            Some(_) => {}
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use battalion_test_utils::fixtures::adjacent_soldiers;

    #[test]
    fn test_player_for_cycles() {
        let config = MatchConfig::default().with_players(vec![PlayerKind::Minimax, PlayerKind::Greedy]);
        assert_eq!(config.player_for(0), PlayerKind::Minimax);
        assert_eq!(config.player_for(1), PlayerKind::Greedy);
        assert_eq!(config.player_for(2), PlayerKind::Minimax);
        assert_eq!(config.rotated(1).player_for(0), PlayerKind::Greedy);
        assert_eq!(config.rotated(2), config);
    }

    #[test]
    fn test_empty_lineup_defaults_to_greedy() {
        let config = MatchConfig::default().with_players(vec![]);
        assert_eq!(config.player_for(3), PlayerKind::Greedy);
        assert!(config.rotated(1).players.is_empty());
    }

    #[test]
    fn test_adjacent_soldiers_match_replays() {
        let config = MatchConfig::default().with_max_turns(6);
        let result = run_match(&adjacent_soldiers(), "adjacent", &config).unwrap();
        let report = &result.report;

        assert!(report.turns <= 6);
        assert!(report.turns > 0);
        assert_eq!(report.actions, result.replay.action_count());
        assert_eq!(result.replay.actions.first(), Some(&Action::Start));
        assert!(result.replay.verify().unwrap());
        assert_eq!(report.lineup.len(), 2);
        assert!(report.teams[&Team::Red].turns_played >= 1);
    }

    #[test]
    fn test_turn_limit_without_winner_is_a_draw() {
        let config = MatchConfig::default().with_max_turns(0);
        let result = run_match(&adjacent_soldiers(), "adjacent", &config).unwrap();
        assert!(result.report.is_draw());
        assert_eq!(result.report.turns, 0);
        assert_eq!(result.report.actions, 0);
    }

    #[test]
    fn test_player_kind_names() {
        assert_eq!(PlayerKind::Greedy.to_string(), "greedy");
        let player = PlayerKind::Minimax.build(&EvaluatorConfig::default(), SearchConfig::default());
        assert_eq!(player.name(), "minimax");
    }
}
