//! Match reports and batch aggregates.
//!
//! A [`MatchReport`] is what one AI-vs-AI match leaves behind: the result,
//! the final state hash and the per-team counters gathered by
//! [`GameStats`](battalion_core::stats::GameStats). [`BatchSummary`] folds
//! many reports into win rates and averages.

use std::collections::BTreeMap;

use battalion_core::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game_runner::PlayerKind;

/// Outcome of a single match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Scenario name.
    pub scenario: String,
    /// Which player drove each team.
    pub lineup: BTreeMap<Team, PlayerKind>,
    /// Last team standing; `None` when the turn limit ended the match.
    pub winner: Option<Team>,
    /// Turns played to completion or until the game ended.
    pub turns: u32,
    /// Actions performed, `Start` and every `TurnEnd` included.
    pub actions: usize,
    /// Final simulation state hash (for determinism validation).
    pub final_hash: u64,
    /// Counters per participant.
    pub teams: BTreeMap<Team, TeamStats>,
    /// Wall-clock time spent, in milliseconds.
    pub elapsed_ms: u64,
}

impl MatchReport {
    /// Whether the match ended without a winner.
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    /// Player kind of the winner.
    pub fn winning_player(&self) -> Option<PlayerKind> {
        self.winner.and_then(|team| self.lineup.get(&team).copied())
    }
}

/// Aggregate statistics across a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Games won by each team.
    pub wins_by_team: BTreeMap<Team, u32>,
    /// Games won by each player kind.
    pub wins_by_player: BTreeMap<PlayerKind, u32>,
    /// Win rates by team.
    pub win_rates: BTreeMap<Team, f64>,
    /// Games stopped by the turn limit.
    pub draws: u32,
    /// Average turns per game.
    pub avg_turns: f64,
    /// Shortest game in turns.
    pub min_turns: u32,
    /// Longest game in turns.
    pub max_turns: u32,
    /// Average units built per game by team.
    pub avg_units_built: BTreeMap<Team, f64>,
    /// Average enemy kills per game by team.
    pub avg_enemies_terminated: BTreeMap<Team, f64>,
}

impl BatchSummary {
    /// Calculate summary from a list of match reports.
    #[must_use]
    pub fn from_reports(reports: &[MatchReport]) -> Self {
        if reports.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: u32::try_from(reports.len()).unwrap_or(u32::MAX),
            min_turns: u32::MAX,
            ..Self::default()
        };
        let mut turn_sum = 0u64;
        let mut built: BTreeMap<Team, u64> = BTreeMap::new();
        let mut kills: BTreeMap<Team, u64> = BTreeMap::new();

        for report in reports {
            turn_sum += u64::from(report.turns);
            summary.min_turns = summary.min_turns.min(report.turns);
            summary.max_turns = summary.max_turns.max(report.turns);

            match report.winner {
                Some(team) => *summary.wins_by_team.entry(team).or_default() += 1,
                None => summary.draws += 1,
            }
            if let Some(player) = report.winning_player() {
                *summary.wins_by_player.entry(player).or_default() += 1;
            }

            for (&team, stats) in &report.teams {
                *built.entry(team).or_default() += u64::from(stats.units_built);
                *kills.entry(team).or_default() += u64::from(stats.enemies_terminated);
            }
        }

        let games = reports.len() as f64;
        summary.avg_turns = turn_sum as f64 / games;
        summary.win_rates = summary
            .wins_by_team
            .iter()
            .map(|(&team, &wins)| (team, f64::from(wins) / games))
            .collect();
        summary.avg_units_built = built.into_iter().map(|(t, n)| (t, n as f64 / games)).collect();
        summary.avg_enemies_terminated = kills.into_iter().map(|(t, n)| (t, n as f64 / games)).collect();
        summary
    }
}
