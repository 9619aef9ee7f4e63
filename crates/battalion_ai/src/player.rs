//! Computer players and the turn driver.
//!
//! A [`Player`] looks at a game and proposes one action at a time.
//! [`play_turn`] feeds its choices into the authoritative game until the
//! player passes, and [`spawn_search`] runs a decision on a worker thread
//! over a private copy.

use std::thread::{self, JoinHandle};

use battalion_core::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::eval::{EvaluatorConfig, HeuristicEvaluator};
use crate::greedy::Greedy;
use crate::minimax::{MiniMax, Pruning};
use crate::node::{BattalionNode, BattalionTree};

/// Something that picks actions for the team to move.
pub trait Player: Send {
    /// Short label for logs and reports.
    fn name(&self) -> &str;

    /// Next action for `game.turn()`, or `None` to end the turn.
    fn choose_action(&mut self, game: &Game) -> Option<Action>;
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn choose_action(&mut self, game: &Game) -> Option<Action> {
        (**self).choose_action(game)
    }
}

/// Search limits shared by the players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies searched by [`MiniMaxPlayer`].
    pub depth: u32,
    /// Actions performed in one turn before it is ended by force.
    pub max_actions_per_turn: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            max_actions_per_turn: 64,
        }
    }
}

/// One-ply lookahead with the heuristic evaluator.
#[derive(Debug, Clone)]
pub struct GreedyPlayer {
    search: Greedy<BattalionTree, HeuristicEvaluator>,
}

impl GreedyPlayer {
    /// Greedy player with the given weights.
    pub fn new(config: EvaluatorConfig) -> Self {
        Self {
            search: Greedy::new(BattalionTree, HeuristicEvaluator::new(config)),
        }
    }
}

impl Default for GreedyPlayer {
    fn default() -> Self {
        Self::new(EvaluatorConfig::default())
    }
}

impl Player for GreedyPlayer {
    fn name(&self) -> &str {
        "greedy"
    }

    fn choose_action(&mut self, game: &Game) -> Option<Action> {
        self.search.choose_action(&BattalionNode::snapshot(game))
    }
}

/// Alpha-beta search with the heuristic evaluator.
#[derive(Debug, Clone)]
pub struct MiniMaxPlayer {
    search: MiniMax<BattalionTree, HeuristicEvaluator>,
}

impl MiniMaxPlayer {
    /// Minimax player searching `search.depth` plies.
    pub fn new(config: EvaluatorConfig, search: SearchConfig) -> Self {
        Self {
            search: MiniMax::new(BattalionTree, HeuristicEvaluator::new(config), search.depth),
        }
    }

    /// Switch the pruning mode.
    #[must_use]
    pub fn with_pruning(mut self, pruning: Pruning) -> Self {
        self.search = self.search.with_pruning(pruning);
        self
    }
}

impl Default for MiniMaxPlayer {
    fn default() -> Self {
        Self::new(EvaluatorConfig::default(), SearchConfig::default())
    }
}

impl Player for MiniMaxPlayer {
    fn name(&self) -> &str {
        "minimax"
    }

    fn choose_action(&mut self, game: &Game) -> Option<Action> {
        self.search.choose_action(&BattalionNode::snapshot(game))
    }
}

/// What happened during one call to [`play_turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    /// Team that acted.
    pub team: Team,
    /// Actions performed, the closing `TurnEnd` included.
    pub actions: Vec<Action>,
    /// The action cap ended the turn.
    pub capped: bool,
    /// The game ended during the turn.
    pub game_over: bool,
}

/// Let `player` act for the team to move until it passes, then end the turn.
///
/// Starts the game first if needed. Stops early when the game ends; a
/// finished game is left untouched.
pub fn play_turn<P: Player + ?Sized>(
    game: &mut Game,
    player: &mut P,
    max_actions: usize,
) -> std::result::Result<TurnSummary, ActionError> {
    let mut actions = Vec::new();
    if !game.is_started() {
        game.perform(&Action::Start)?;
        actions.push(Action::Start);
    }

    let team = game.turn();
    let mut summary = TurnSummary {
        team,
        actions,
        capped: false,
        game_over: game.is_finished(),
    };
    if summary.game_over {
        return Ok(summary);
    }

    let mut performed = 0;
    loop {
        if performed >= max_actions {
            warn!(%team, player = player.name(), max_actions, "action cap reached, ending turn");
            summary.capped = true;
            break;
        }
        let Some(action) = player.choose_action(game) else {
            break;
        };
        if action.is_turn_end() {
            break;
        }

        debug!(%team, %action, "ai action");
        game.perform(&action)?;
        summary.actions.push(action);
        performed += 1;

        if game.is_finished() {
            summary.game_over = true;
            info!(%team, winner = ?game.winner(), "game decided");
            return Ok(summary);
        }
    }

    game.perform(&Action::TurnEnd)?;
    summary.actions.push(Action::TurnEnd);
    info!(%team, player = player.name(), actions = performed, "turn played");
    Ok(summary)
}

/// Choose an action for `game.turn()` on a worker thread.
///
/// The worker searches a copy taken now, so `game` may keep changing; the
/// player is handed back with its answer.
pub fn spawn_search<P: Player + 'static>(game: &Game, mut player: P) -> JoinHandle<(P, Option<Action>)> {
    let snapshot = game.clone();
    thread::spawn(move || {
        let action = player.choose_action(&snapshot);
        (player, action)
    })
}
