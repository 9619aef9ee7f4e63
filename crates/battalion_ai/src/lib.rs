//! # Battalion AI
//!
//! Action selection for computer-controlled teams.
//!
//! The search algorithms are generic over a small set of traits in [`tree`]
//! and never touch a live game: every candidate action is tried on a deep
//! copy. The Battalion-specific pieces are the adapter in [`node`], the
//! heuristic in [`eval`] and the players in [`player`].
//!
//! ## Crate Structure
//!
//! - [`tree`] - Position, game-tree and value-function traits
//! - [`greedy`] - One-ply greedy search
//! - [`minimax`] - Depth-limited minimax, with or without alpha-beta pruning
//! - [`node`] - Battalion positions and action enumeration
//! - [`eval`] - Heuristic value function and its configuration
//! - [`player`] - Players and the turn driver

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod eval;
pub mod greedy;
pub mod minimax;
pub mod node;
pub mod player;
pub mod tree;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::AiError;
    pub use crate::eval::{EvaluatorConfig, HeuristicEvaluator};
    pub use crate::greedy::Greedy;
    pub use crate::minimax::{MiniMax, Pruning, SearchOutcome};
    pub use crate::node::{BattalionNode, BattalionTree};
    pub use crate::player::{
        play_turn, spawn_search, GreedyPlayer, MiniMaxPlayer, Player, SearchConfig, TurnSummary,
    };
    pub use crate::tree::{GameTree, Position, ValueFunction};
}
