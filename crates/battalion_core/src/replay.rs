//! Replay system for recording and re-running games.
//!
//! A replay stores the level and the stream of actions performed on it.
//! Games are deterministic, so re-performing the stream on a fresh game
//! reproduces the final state, which [`Replay::verify`] checks against the
//! recorded hash.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::action::Action;
use crate::error::{GameError, Result};
use crate::game::Game;
use crate::level::Level;

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Level the game was built from.
    pub level: Level,
    /// Accepted actions, in order.
    pub actions: Vec<Action>,
    /// State hash after the last action.
    pub final_hash: u64,
}

impl Replay {
    /// Start an empty recording for `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            version: REPLAY_VERSION,
            level,
            actions: Vec::new(),
            final_hash: 0,
        }
    }

    /// Record an accepted action.
    pub fn record(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Finalize the replay with the end state.
    pub fn finalize(&mut self, game: &Game) {
        self.final_hash = game.state_hash();
    }

    /// Re-run every recorded action on a fresh game.
    ///
    /// # Errors
    /// Returns an error if the level is invalid or a recorded action is
    /// rejected.
    pub fn play(&self) -> Result<Game> {
        let mut game = Game::new(&self.level)?;
        for action in &self.actions {
            game.perform(action)?;
        }
        Ok(game)
    }

    /// Whether re-running reproduces the recorded final hash.
    pub fn verify(&self) -> Result<bool> {
        let game = self.play()?;
        let matches = game.state_hash() == self.final_hash;
        if !matches {
            tracing::warn!(
                expected = self.final_hash,
                actual = game.state_hash(),
                actions = self.actions.len(),
                "replay diverged"
            );
        }
        Ok(matches)
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or deserialization fails, or the
    /// file was written by an incompatible version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }
        Ok(replay)
    }

    /// Number of recorded actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}
