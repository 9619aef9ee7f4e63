//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the turn engine produces identical
//! results given identical action streams.
//!
//! # Testing Strategy
//!
//! Search clones the game thousands of times per decision and replays rely on
//! re-performing the same actions, so the engine must be fully deterministic.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: damage is computed in fixed point via
//!   [`battalion_core::combat::Fixed`].
//!
//! - **HashMap iteration order**: the state uses slabs and per-cell arrays
//!   only, and units are always visited in row-major board order.
//!
//! - **Derived caches**: movement solutions and fog bitmaps are memoized and
//!   must never leak into the state hash.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: solver, fog and rules in isolation
//! 2. **Property tests**: random action streams still replay identically
//! 3. **Integration tests**: full scenarios are reproducible
//! 4. **Parallel tests**: running N games on separate threads all match

use battalion_core::prelude::*;
use std::thread;

use crate::fixtures::play_choices;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps performed per run.
    pub steps: usize,
}

impl DeterminismResult {
    /// All unique hashes (1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of independent runs
/// * `steps` - Number of steps per run
/// * `setup` - Creates the initial state
/// * `step` - Advances the state by one step
/// * `hash` - Computes the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: usize,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, usize),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for i in 0..steps {
            step(&mut state, i);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Play the same choice stream on `level` twice and compare final hashes.
///
/// # Panics
///
/// Panics if the level is invalid.
#[must_use]
pub fn verify_game_determinism(level: &Level, choices: &[usize]) -> DeterminismResult {
    verify_determinism(
        2,
        choices.len(),
        || Game::new(level).expect("level is valid"),
        |game, i| {
            play_choices(game, &choices[i..=i]);
        },
        Game::state_hash,
    )
}

/// Result of parallel game runs.
#[derive(Debug, Clone)]
pub struct ParallelGameResult {
    /// Final state hash from each game.
    pub hashes: Vec<u64>,
    /// Number of actions performed in each game.
    pub actions: usize,
}

impl ParallelGameResult {
    /// Whether every game ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all games matched.
    ///
    /// # Panics
    ///
    /// Panics if the games produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            panic!(
                "Parallel games diverged!\n\
                 Games: {}\n\
                 Actions: {}\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.actions,
                self.hashes
            );
        }
    }
}

/// Perform `actions` on `num_games` copies of `level`, one thread each.
///
/// # Panics
///
/// Panics if the level is invalid, an action is rejected or a thread panics.
#[must_use]
pub fn run_parallel_games(level: &Level, actions: &[Action], num_games: usize) -> ParallelGameResult {
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_games)
            .map(|_| {
                s.spawn(|| {
                    let mut game = Game::new(level).expect("level is valid");
                    for action in actions {
                        game.perform(action).expect("action replays");
                    }
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("game thread panicked"))
            .collect()
    });

    ParallelGameResult {
        hashes,
        actions: actions.len(),
    }
}

/// Perform `actions` on a fresh game and on a game cloned after every step,
/// returning the index of the first action after which the two differ.
///
/// Catches state that survives in one copy but not the other, such as a
/// stale cache consulted by the rules.
///
/// # Panics
///
/// Panics if the level is invalid or an action is rejected.
#[must_use]
pub fn find_first_divergence(level: &Level, actions: &[Action]) -> Option<usize> {
    let mut straight = Game::new(level).expect("level is valid");
    let mut cloned = straight.clone();

    for (index, action) in actions.iter().enumerate() {
        straight.perform(action).expect("action replays");
        let mut next = cloned.clone();
        next.perform(action).expect("action replays");
        cloned = next;

        if straight.state_hash() != cloned.state_hash() {
            tracing::warn!(index, %action, "games diverged");
            return Some(index);
        }
    }

    None
}

/// Verify that a serialization round trip preserves the state exactly, and
/// that the restored game keeps accepting the same actions.
#[must_use]
pub fn verify_serialization_determinism(game: &Game, continuation: &[Action]) -> bool {
    let Ok(bytes) = game.serialize() else {
        return false;
    };
    let Ok(mut restored) = Game::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != game.state_hash() {
        return false;
    }

    let mut original = game.clone();
    for action in continuation {
        let a = original.perform(action).map(|o| o.events);
        let b = restored.perform(action).map(|o| o.events);
        if a != b {
            return false;
        }
    }
    original.state_hash() == restored.state_hash()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible levels and choice
/// streams for property-based testing.
pub mod strategies {
    use battalion_core::prelude::*;
    use proptest::prelude::*;

    /// Unit types that can stand on flat land and carry a weapon.
    pub const LAND_COMBATANTS: [UnitType; 9] = [
        UnitType::Soldier,
        UnitType::Bazooka,
        UnitType::Tank,
        UnitType::TankBig,
        UnitType::TankAntiAir,
        UnitType::Artillery,
        UnitType::Mortar,
        UnitType::Airplane,
        UnitType::Zeppelin,
    ];

    /// A cell inside a `width` x `height` board.
    pub fn arb_cell(width: u16, height: u16) -> impl Strategy<Value = Cell> {
        (0..width, 0..height).prop_map(|(x, y)| Cell::new(x, y))
    }

    /// Any unit type.
    pub fn arb_unit_type() -> impl Strategy<Value = UnitType> {
        proptest::sample::select(UnitType::ALL.to_vec())
    }

    /// Any terrain.
    pub fn arb_terrain() -> impl Strategy<Value = Terrain> {
        proptest::sample::select(Terrain::ALL.to_vec())
    }

    /// Any unit type that fights on flat land.
    pub fn arb_combatant() -> impl Strategy<Value = UnitType> {
        proptest::sample::select(LAND_COMBATANTS.to_vec())
    }

    /// A flat `size` x `size` board with 2 to 8 units split between Red and
    /// Blue, both sides present.
    pub fn arb_battle_level(size: u16) -> impl Strategy<Value = Level> {
        let cells: Vec<Cell> = Bounds::new(size, size).cells().collect();
        (
            proptest::sample::subsequence(cells, 2..=8),
            proptest::collection::vec(arb_combatant(), 8),
        )
            .prop_map(move |(cells, types)| {
                let mut builder = LevelBuilder::new(size, size);
                for (i, (cell, ty)) in cells.into_iter().zip(types).enumerate() {
                    let team = if i % 2 == 0 { Team::Red } else { Team::Blue };
                    builder.unit(UnitDesc::new(cell, ty, team));
                }
                builder.build().expect("generated level is valid")
            })
    }

    /// A stream of action choices, each later reduced modulo the number of
    /// legal actions.
    pub fn arb_choices(max_len: usize) -> impl Strategy<Value = Vec<usize>> {
        proptest::collection::vec(any::<usize>(), 0..max_len)
    }
}
