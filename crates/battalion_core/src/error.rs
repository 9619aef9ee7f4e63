//! Error types for level construction and action validation.

use thiserror::Error;

use crate::building::BuildingType;
use crate::grid::Cell;
use crate::team::Team;
use crate::terrain::Terrain;
use crate::unit::UnitType;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// A level failed validation.
    #[error(transparent)]
    Level(#[from] LevelError),

    /// An action was rejected.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Invalid game state, typically a failed (de)serialization.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

/// A malformed level descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    /// Width or height is zero.
    #[error("Level dimensions must be positive, got {width}x{height}")]
    EmptyLevel {
        /// Declared width.
        width: u16,
        /// Declared height.
        height: u16,
    },

    /// A per-cell table does not match the level dimensions.
    #[error("Level has {expected} cells but {table} table has {actual} entries")]
    SizeMismatch {
        /// Name of the offending table.
        table: &'static str,
        /// Cell count implied by the dimensions.
        expected: usize,
        /// Entries actually supplied.
        actual: usize,
    },

    /// An entity is placed outside the map.
    #[error("Entity at {0} is outside the map")]
    OutOfBounds(Cell),

    /// Two entities of the same kind share a cell.
    #[error("More than one {kind} at {cell}")]
    Duplicate {
        /// Shared cell.
        cell: Cell,
        /// `"unit"` or `"building"`.
        kind: &'static str,
    },

    /// A unit sits on terrain it cannot stand on.
    #[error("{unit} cannot stand on {terrain:?} at {cell}")]
    UnitTerrain {
        /// Cell of the unit.
        cell: Cell,
        /// Type of the unit.
        unit: UnitType,
        /// Terrain of the cell.
        terrain: Terrain,
    },

    /// A building sits on terrain it cannot be built on.
    #[error("{building} cannot be built on {terrain:?} at {cell}")]
    BuildingTerrain {
        /// Cell of the building.
        cell: Cell,
        /// Type of the building.
        building: BuildingType,
        /// Terrain of the cell.
        terrain: Terrain,
    },

    /// Bridge orientation cannot be determined from its surroundings.
    #[error("Illegal bridge at {0}, can't determine orientation")]
    AmbiguousBridge(Cell),

    /// A unit belongs to the neutral team.
    #[error("Unit at {0} has no team")]
    NeutralUnit(Cell),

    /// Transporter/cargo pairing is invalid.
    #[error("Invalid transport at {cell}: {reason}")]
    InvalidTransport {
        /// Cell of the transporter (or of the cargo-carrying unit).
        cell: Cell,
        /// What is wrong.
        reason: &'static str,
    },

    /// A unit's declared health is outside `1..=max`.
    #[error("Unit at {cell} has health {health}, expected 1..={max}")]
    InvalidHealth {
        /// Cell of the unit.
        cell: Cell,
        /// Declared health.
        health: u32,
        /// Maximum for the type.
        max: u32,
    },

    /// Starting money is negative.
    #[error("Starting money for {team} is negative: {amount}")]
    NegativeMoney {
        /// Team with the bad balance.
        team: Team,
        /// Declared amount.
        amount: i64,
    },
}

/// Why an action was rejected. The game is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The game has a winner.
    #[error("Game is already finished")]
    GameFinished,

    /// Only `Start` is accepted before the game starts.
    #[error("Game has not started")]
    NotStarted,

    /// `Start` was issued twice.
    #[error("Game already started")]
    AlreadyStarted,

    /// The cell is outside the map.
    #[error("Cell {0} is outside the map")]
    OutOfBounds(Cell),

    /// No unit at the addressed cell.
    #[error("No unit at {0}")]
    NoUnit(Cell),

    /// No building at the addressed cell.
    #[error("No building at {0}")]
    NoBuilding(Cell),

    /// The entity belongs to a team other than the acting one.
    #[error("It is {turn}'s turn, entity belongs to {team}")]
    WrongTurn {
        /// Owner of the entity.
        team: Team,
        /// Team whose turn it is.
        turn: Team,
    },

    /// The entity already acted this turn.
    #[error("Entity at {0} is not active")]
    Inactive(Cell),

    /// The path is not a legal move.
    #[error("Illegal path: {0}")]
    IllegalPath(&'static str),

    /// The target cannot be attacked by this unit.
    #[error("Illegal target at {0}")]
    IllegalTarget(Cell),

    /// The unit's weapon does not fit the requested attack.
    #[error("{unit} has the wrong weapon for this attack")]
    WrongWeapon {
        /// Type of the attacker.
        unit: UnitType,
    },

    /// The team cannot pay.
    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Price of the action.
        required: u32,
        /// Current balance.
        available: u32,
    },

    /// The factory cannot train this type.
    #[error("Factory at {cell} cannot build {unit}")]
    CannotBuild {
        /// Factory cell.
        cell: Cell,
        /// Requested type.
        unit: UnitType,
    },

    /// A unit stands on the factory.
    #[error("Factory at {0} is blocked")]
    FactoryBlocked(Cell),

    /// The unit cannot board the requested transporter.
    #[error("{unit} at {cell} cannot board {transporter}")]
    CannotTransport {
        /// Cell of the unit.
        cell: Cell,
        /// Type of the unit.
        unit: UnitType,
        /// Requested transporter.
        transporter: UnitType,
    },

    /// The transporter cannot unload here.
    #[error("Cannot unload at {0}")]
    CannotUnload(Cell),

    /// The unit cannot be repaired now.
    #[error("Unit at {0} cannot be repaired")]
    CannotRepair(Cell),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ActionError::WrongTurn {
            team: Team::Blue,
            turn: Team::Red,
        };
        assert_eq!(err.to_string(), "It is Red's turn, entity belongs to Blue");

        let err: GameError = LevelError::AmbiguousBridge(Cell::new(2, 3)).into();
        assert_eq!(err.to_string(), "Illegal bridge at (2, 3), can't determine orientation");
    }
}
