//! Headless Battalion runner for AI testing and CI verification.
//!
//! This crate plays computer-vs-computer matches without a user
//! interface. It enables:
//!
//! - **AI testing**: greedy and minimax players on any scenario
//! - **Balance runs**: many matches in parallel with aggregate win rates
//! - **Determinism checks**: repeated matches and replays must agree on
//!   the final state hash
//!
//! Scenarios are RON files (see [`scenario`]); two are built in.
//!
//! # Example
//!
//! ```bash
//! # Play one match and print the report as JSON
//! cargo run -p battalion_headless -- play --scenario duel --json
//!
//! # Run a batch of 20 matches
//! cargo run -p battalion_headless -- batch --scenario skirmish --count 20 --output results/
//!
//! # Verify determinism
//! cargo run -p battalion_headless -- verify --scenario duel --runs 3
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ascii_visualizer;
pub mod batch;
pub mod game_runner;
pub mod metrics;
pub mod scenario;

pub use ascii_visualizer::{render_board, AsciiConfig};
pub use batch::{run_batch, BatchConfig, BatchResults};
pub use game_runner::{run_match, verify_determinism, MatchConfig, MatchResult, PlayerKind};
pub use metrics::{BatchSummary, MatchReport};
pub use scenario::{Scenario, ScenarioError};
