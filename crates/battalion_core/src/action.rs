//! The closed set of actions a team can submit.
//!
//! Actions address units and factories by the cell they occupy, so the same
//! action value is meaningful on any copy of a game.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grid::Cell;
use crate::unit::UnitType;

/// One state transition request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Begin the first turn.
    Start,
    /// End the acting team's turn.
    TurnEnd,
    /// Walk a unit along `path` (source excluded, destination last).
    UnitMove {
        /// Cell of the unit.
        unit: Cell,
        /// Cells to walk.
        path: Vec<Cell>,
    },
    /// Walk a close-range unit along `path`, then strike `target`.
    UnitMoveAndAttack {
        /// Cell of the unit.
        unit: Cell,
        /// Cells to walk; may be empty when already adjacent.
        path: Vec<Cell>,
        /// Cell of the target.
        target: Cell,
    },
    /// Strike `target` from place with a long-range weapon.
    UnitAttackLongRange {
        /// Cell of the unit.
        unit: Cell,
        /// Cell of the target.
        target: Cell,
    },
    /// Train a unit at a factory.
    UnitBuild {
        /// Cell of the factory.
        factory: Cell,
        /// Type to train.
        unit_type: UnitType,
    },
    /// Board a land unit onto a new transporter.
    UnitTransport {
        /// Cell of the unit.
        unit: Cell,
        /// Transporter type.
        transporter: UnitType,
    },
    /// Unload a transporter's cargo in place.
    UnitTransportFinish {
        /// Cell of the transporter.
        unit: Cell,
    },
    /// Start repairing a unit.
    UnitRepair {
        /// Cell of the unit.
        unit: Cell,
    },
}

impl Action {
    /// Whether this action hands the turn over.
    #[must_use]
    pub const fn is_turn_end(&self) -> bool {
        matches!(self, Self::TurnEnd)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::TurnEnd => write!(f, "TurnEnd"),
            Self::UnitMove { unit, path } => match path.last() {
                Some(dest) => write!(f, "UnitMove({unit} -> {dest})"),
                None => write!(f, "UnitMove({unit})"),
            },
            Self::UnitMoveAndAttack { unit, path, target } => {
                let from = path.last().unwrap_or(unit);
                write!(f, "UnitMoveAndAttack({unit} -> {from} x {target})")
            }
            Self::UnitAttackLongRange { unit, target } => {
                write!(f, "UnitAttackLongRange({unit} x {target})")
            }
            Self::UnitBuild { factory, unit_type } => write!(f, "UnitBuild({factory}, {unit_type})"),
            Self::UnitTransport { unit, transporter } => {
                write!(f, "UnitTransport({unit}, {transporter})")
            }
            Self::UnitTransportFinish { unit } => write!(f, "UnitTransportFinish({unit})"),
            Self::UnitRepair { unit } => write!(f, "UnitRepair({unit})"),
        }
    }
}
