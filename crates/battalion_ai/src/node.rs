//! Battalion games as search positions.
//!
//! A [`BattalionNode`] owns a private copy of a [`Game`]; [`BattalionTree`]
//! produces children by cloning that copy and performing the action on the
//! clone. The authoritative game is never touched.

use battalion_core::prelude::*;
use tracing::trace;

use crate::tree::{GameTree, Position};

/// A game snapshot being searched.
#[derive(Debug, Clone)]
pub struct BattalionNode {
    game: Game,
}

impl BattalionNode {
    /// Wrap an owned game.
    pub const fn new(game: Game) -> Self {
        Self { game }
    }

    /// Snapshot of `game`. Listeners are not carried over.
    pub fn snapshot(game: &Game) -> Self {
        Self::new(game.clone())
    }

    /// The wrapped game.
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Unwrap the game.
    pub fn into_game(self) -> Game {
        self.game
    }
}

impl Position for BattalionNode {
    type Action = Action;
    type Side = Team;

    fn is_terminal(&self) -> bool {
        self.game.is_finished()
    }

    fn turn(&self) -> Team {
        self.game.turn()
    }

    fn available_actions(&self) -> impl Iterator<Item = Action> + '_ {
        available_actions(&self.game).into_iter()
    }
}

/// Successor function for Battalion: clone, then perform.
#[derive(Debug, Clone, Copy, Default)]
pub struct BattalionTree;

impl GameTree for BattalionTree {
    type Position = BattalionNode;

    fn child(&self, position: &BattalionNode, action: &Action) -> Option<BattalionNode> {
        let mut game = position.game.clone();
        match game.perform(action) {
            Ok(_) => Some(BattalionNode::new(game)),
            Err(error) => {
                trace!(%action, %error, "speculative action rejected");
                None
            }
        }
    }
}

/// Every action the acting team may take besides ending its turn.
///
/// Units come first, in row-major order, each contributing its attacks,
/// moves, boarding, unloading and repair. Factory builds follow. Nothing is
/// offered before `Start` or after the game has ended.
pub fn available_actions(game: &Game) -> Vec<Action> {
    if !game.is_started() || game.is_finished() {
        return Vec::new();
    }
    let team = game.turn();
    let mut actions = Vec::new();

    for (id, unit) in game.team_units(team) {
        if !unit.active {
            continue;
        }
        let Some(solution) = game.solution(id, Vision::Fog) else {
            continue;
        };

        match unit.stats().weapon {
            Weapon::CloseRange => {
                for target in solution.attackable().cells() {
                    for from in target.neighbors() {
                        if !solution.reachable().contains(from) {
                            continue;
                        }
                        if let Some(path) = solution.path_to(from) {
                            actions.push(Action::UnitMoveAndAttack {
                                unit: unit.pos,
                                path,
                                target,
                            });
                        }
                    }
                }
            }
            Weapon::LongRange { .. } => {
                actions.extend(solution.attackable().cells().map(|target| {
                    Action::UnitAttackLongRange {
                        unit: unit.pos,
                        target,
                    }
                }));
            }
            Weapon::None => {}
        }

        for destination in solution.reachable().cells().filter(|&c| c != unit.pos) {
            if let Some(path) = solution.path_to(destination) {
                actions.push(Action::UnitMove {
                    unit: unit.pos,
                    path,
                });
            }
        }

        for transporter in UnitType::TRANSPORTERS {
            if game.can_transport(unit.pos, transporter) {
                actions.push(Action::UnitTransport {
                    unit: unit.pos,
                    transporter,
                });
            }
        }
        if game.can_finish_transport(unit.pos) {
            actions.push(Action::UnitTransportFinish { unit: unit.pos });
        }
        if game.can_repair(unit.pos) {
            actions.push(Action::UnitRepair { unit: unit.pos });
        }
    }

    let factories = game
        .buildings()
        .filter(|b| b.team == team && b.active && b.ty.can_build_units());
    for factory in factories {
        for unit_type in UnitType::ALL {
            if game.can_build(factory.pos, unit_type) {
                actions.push(Action::UnitBuild {
                    factory: factory.pos,
                    unit_type,
                });
            }
        }
    }

    actions
}
