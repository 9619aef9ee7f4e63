//! # Battalion Core
//!
//! Deterministic simulation core for Battalion, a turn-based tactical
//! wargame on a square grid.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (except the explicit replay save/load helpers)
//! - No randomness
//! - No floating-point math in the rules (damage uses fixed point)
//!
//! This separation enables:
//! - Adversarial search over cheap game clones
//! - Headless batch runs
//! - Replays and determinism testing
//!
//! ## Crate Structure
//!
//! - [`grid`] - Cells, directions, bitmaps and per-cell arrays
//! - [`unit`], [`building`], [`terrain`], [`team`] - Entity model and stat tables
//! - [`movement`] - BFS movement and attack solver
//! - [`visibility`] - Fog of war
//! - [`game`] - The authoritative game state and its turn engine
//! - [`level`] - Level descriptors
//! - [`event`] - Change notifications
//! - [`replay`], [`stats`] - Recording and match statistics

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod building;
mod cache;
pub mod combat;
pub mod economy;
pub mod error;
pub mod event;
pub mod game;
pub mod grid;
pub mod level;
pub mod movement;
pub mod replay;
mod rules;
pub mod stats;
pub mod team;
pub mod terrain;
pub mod unit;
pub mod visibility;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::building::{BuildPermissions, Building, BuildingId, BuildingType};
    pub use crate::combat::Fixed;
    pub use crate::error::{ActionError, GameError, LevelError, Result};
    pub use crate::event::{ActionOutcome, GameEvent, GameListener};
    pub use crate::game::Game;
    pub use crate::grid::{Bitmap, Bounds, Cell, CellArray, Direction};
    pub use crate::level::{BuildingDesc, CargoDesc, Level, LevelBuilder, UnitDesc};
    pub use crate::movement::{MovementMap, Solution, Vision};
    pub use crate::replay::Replay;
    pub use crate::stats::{GameStats, TeamStats};
    pub use crate::team::Team;
    pub use crate::terrain::Terrain;
    pub use crate::unit::{Category, Unit, UnitId, UnitType, Weapon};
}
