//! Change notifications emitted by the turn engine.
//!
//! Every sub-step of an action emits its event right after the state
//! mutation it describes. Events are delivered synchronously to the
//! subscribed [`GameListener`]s and collected into the action's
//! [`ActionOutcome`]. Listeners only see the event; they cannot reach back
//! into the game.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::building::BuildingType;
use crate::grid::Cell;
use crate::team::Team;
use crate::unit::{UnitId, UnitType};

/// A discrete change to the game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A unit appeared on the board.
    UnitAdded {
        /// Handle of the unit.
        unit: UnitId,
        /// Its type.
        ty: UnitType,
        /// Its owner.
        team: Team,
        /// Cell it occupies.
        pos: Cell,
    },
    /// A unit left the board (death, boarding a transporter, elimination).
    UnitRemoved {
        /// Handle of the unit.
        unit: UnitId,
        /// Its owner.
        team: Team,
        /// Cell it occupied.
        pos: Cell,
    },
    /// A unit moved along a path.
    UnitMoved {
        /// Handle of the unit.
        unit: UnitId,
        /// Starting cell.
        from: Cell,
        /// Cells walked, ending at the destination.
        path: Vec<Cell>,
    },
    /// A move stopped short on a hidden enemy.
    UnitAmbushed {
        /// Handle of the unit.
        unit: UnitId,
        /// Where it stopped.
        pos: Cell,
    },
    /// A unit lost health to an attack.
    UnitDamaged {
        /// Handle of the damaged unit.
        unit: UnitId,
        /// Handle of the attacker.
        attacker: UnitId,
        /// Health removed.
        amount: u32,
        /// Health left.
        health: u32,
        /// Whether the hit was a counter-attack.
        counter: bool,
    },
    /// A unit was destroyed in combat.
    UnitDied {
        /// Handle of the unit.
        unit: UnitId,
        /// Its type.
        ty: UnitType,
        /// Its owner.
        team: Team,
        /// Team of the unit that struck the final blow.
        killer: Team,
    },
    /// A factory trained a unit.
    UnitBuilt {
        /// Handle of the new unit.
        unit: UnitId,
        /// Its type.
        ty: UnitType,
        /// Its owner.
        team: Team,
    },
    /// A unit boarded a transporter.
    UnitTransported {
        /// Handle of the new transporter.
        transporter: UnitId,
        /// Handle of the carried unit.
        cargo: UnitId,
    },
    /// A transporter unloaded its cargo.
    UnitUnloaded {
        /// Handle of the dismissed transporter.
        transporter: UnitId,
        /// Handle of the freed unit.
        cargo: UnitId,
    },
    /// A unit started repairing.
    UnitRepairing {
        /// Handle of the unit.
        unit: UnitId,
    },
    /// A repairing unit was healed.
    UnitHealed {
        /// Handle of the unit.
        unit: UnitId,
        /// Health restored.
        amount: u32,
    },
    /// A team's balance changed.
    MoneyChanged {
        /// Team whose balance changed.
        team: Team,
        /// Signed change.
        delta: i64,
        /// New balance.
        balance: u32,
    },
    /// A conquering unit advanced its capture.
    ConquerProgressed {
        /// Building cell.
        pos: Cell,
        /// Contesting team.
        team: Team,
        /// Steps completed.
        progress: u32,
    },
    /// A capture was abandoned.
    ConquerReset {
        /// Building cell.
        pos: Cell,
    },
    /// A building changed hands.
    BuildingConquered {
        /// Building cell.
        pos: Cell,
        /// Building type.
        ty: BuildingType,
        /// Previous owner.
        from: Team,
        /// New owner.
        to: Team,
    },
    /// A team began its turn.
    TurnBegan {
        /// Acting team.
        team: Team,
        /// One-based turn counter.
        turn: u32,
    },
    /// A team ended its turn.
    TurnEnded {
        /// Team that finished.
        team: Team,
        /// Team to move next.
        next: Team,
    },
    /// A team lost its last unit.
    TeamEliminated {
        /// Eliminated team.
        team: Team,
    },
    /// The game is over.
    GameEnded {
        /// The surviving team, if any.
        winner: Option<Team>,
    },
}

/// Receives events as they happen.
pub trait GameListener: Send {
    /// Handle one event.
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent) + Send> GameListener for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event);
    }
}

/// Subscribed listeners. Cloning a game yields an empty list.
#[derive(Default)]
pub(crate) struct Listeners(Vec<Box<dyn GameListener>>);

impl Listeners {
    pub(crate) fn push(&mut self, listener: Box<dyn GameListener>) {
        self.0.push(listener);
    }

    pub(crate) fn dispatch(&mut self, event: &GameEvent) {
        for listener in &mut self.0 {
            listener.on_event(event);
        }
    }
}

impl Clone for Listeners {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listeners({})", self.0.len())
    }
}

/// Events produced by one successful action, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Emitted events.
    pub events: Vec<GameEvent>,
}

impl ActionOutcome {
    /// The winner, if this action ended the game.
    #[must_use]
    pub fn game_over(&self) -> Option<Option<Team>> {
        self.events.iter().find_map(|e| match e {
            GameEvent::GameEnded { winner } => Some(*winner),
            _ => None,
        })
    }

    /// Units destroyed by this action.
    pub fn deaths(&self) -> impl Iterator<Item = (UnitId, Team)> + '_ {
        self.events.iter().filter_map(|e| match e {
            GameEvent::UnitDied { unit, team, .. } => Some((*unit, *team)),
            _ => None,
        })
    }
}
