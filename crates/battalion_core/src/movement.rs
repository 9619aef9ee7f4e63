//! Movement and attack solver.
//!
//! A unit's options are derived from one breadth-first flood fill over the
//! 4-connected grid, starting at the unit's cell. The fill records, per
//! cell, the BFS distance and the direction pointing back toward the
//! source, packed into a single `u16`:
//!
//! ```text
//!  15 14 13                                     0
//! +-----+---------------------------------------+
//! | dir |            distance (14 bits)         |
//! +-----+---------------------------------------+
//! ```
//!
//! From that table the solver derives four bitmaps:
//!
//! - **passable**: cells within the unit's move limit
//! - **reachable**: passable cells the unit may end its move on
//! - **potentially attackable**: cells the weapon could strike from any reachable cell
//!   (close range) or from the current cell (long range)
//! - **attackable**: potentially attackable cells holding a visible enemy the weapon can hit
//!
//! # Vision
//!
//! Under [`Vision::Fog`] only units visible to the mover's team block it or
//! count as targets, so a hidden enemy does not block planning. That hidden
//! enemy is what stops the unit when the move is executed. [`Vision::Omniscient`] sees
//! every unit and is used to execute moves and by the search layer.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::grid::{Bitmap, Bounds, Cell, Direction};
use crate::terrain::Terrain;
use crate::unit::{Unit, Weapon};

/// Whether fog of war applies to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vision {
    /// Only units visible to the querying team are considered.
    Fog,
    /// Every unit is considered.
    Omniscient,
}

const DISTANCE_BITS: u16 = 14;
const DISTANCE_MASK: u16 = (1 << DISTANCE_BITS) - 1;

/// Distance/back-direction table produced by the flood fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementMap {
    bounds: Bounds,
    source: Cell,
    packed: Vec<u16>,
}

impl MovementMap {
    /// Sentinel distance for cells the fill never reached.
    pub const UNREACHABLE: u16 = DISTANCE_MASK;

    /// Largest representable distance.
    pub const MAX_DISTANCE: u32 = (DISTANCE_MASK - 1) as u32;

    /// Flood-fill from `source`, expanding into cells `expandable` accepts.
    #[must_use]
    pub fn flood(bounds: Bounds, source: Cell, expandable: impl Fn(Cell) -> bool) -> Self {
        let mut map = Self {
            bounds,
            source,
            packed: vec![Self::UNREACHABLE; bounds.area()],
        };
        map.packed[bounds.index_of(source)] = 0;

        let mut queue = VecDeque::from([source]);
        while let Some(cell) = queue.pop_front() {
            let distance = map.packed[bounds.index_of(cell)] & DISTANCE_MASK;
            if u32::from(distance) >= Self::MAX_DISTANCE {
                continue;
            }
            for dir in Direction::ALL {
                let Some(next) = cell.neighbor(dir).filter(|&n| bounds.contains(n)) else {
                    continue;
                };
                let index = bounds.index_of(next);
                if map.packed[index] != Self::UNREACHABLE || !expandable(next) {
                    continue;
                }
                map.packed[index] = (dir.opposite().index() << DISTANCE_BITS) | (distance + 1);
                queue.push_back(next);
            }
        }
        map
    }

    /// Cell the fill started from.
    #[must_use]
    pub const fn source(&self) -> Cell {
        self.source
    }

    /// BFS distance to `cell`, `None` if unreachable or out of bounds.
    #[must_use]
    pub fn distance(&self, cell: Cell) -> Option<u32> {
        if !self.bounds.contains(cell) {
            return None;
        }
        let distance = self.packed[self.bounds.index_of(cell)] & DISTANCE_MASK;
        (distance != Self::UNREACHABLE).then_some(u32::from(distance))
    }

    /// Direction from `cell` one step back toward the source. `None` at the
    /// source itself and at unreachable cells.
    #[must_use]
    pub fn back_direction(&self, cell: Cell) -> Option<Direction> {
        match self.distance(cell)? {
            0 => None,
            _ => Some(Direction::from_index(
                self.packed[self.bounds.index_of(cell)] >> DISTANCE_BITS,
            )),
        }
    }

    /// Shortest path from the source to `destination`, excluding the source
    /// and including the destination.
    #[must_use]
    pub fn path_to(&self, destination: Cell) -> Option<Vec<Cell>> {
        let distance = self.distance(destination)?;
        let mut path = Vec::with_capacity(distance as usize);
        let mut cell = destination;
        while cell != self.source {
            path.push(cell);
            cell = cell.neighbor(self.back_direction(cell)?)?;
        }
        path.reverse();
        debug_assert_eq!(path.len(), distance as usize);
        Some(path)
    }
}

/// The per-unit result of a solver run.
#[derive(Debug, Clone)]
pub struct Solution {
    map: MovementMap,
    passable: Bitmap,
    reachable: Bitmap,
    potentially_attackable: Bitmap,
    attackable: Bitmap,
}

impl Solution {
    /// Distance/back-direction table.
    #[must_use]
    pub const fn movement_map(&self) -> &MovementMap {
        &self.map
    }

    /// Cells within the move limit.
    #[must_use]
    pub const fn passable(&self) -> &Bitmap {
        &self.passable
    }

    /// Cells the unit may end its move on, including its own cell.
    #[must_use]
    pub const fn reachable(&self) -> &Bitmap {
        &self.reachable
    }

    /// Cells the weapon could strike, occupied or not.
    #[must_use]
    pub const fn potentially_attackable(&self) -> &Bitmap {
        &self.potentially_attackable
    }

    /// Cells holding an enemy the unit can strike this turn.
    #[must_use]
    pub const fn attackable(&self) -> &Bitmap {
        &self.attackable
    }

    /// Path to a passable destination.
    #[must_use]
    pub fn path_to(&self, destination: Cell) -> Option<Vec<Cell>> {
        if !self.passable.contains(destination) {
            return None;
        }
        self.map.path_to(destination)
    }

    /// Shortest path to a free cell next to `target`. The unit's own cell
    /// counts as a zero-length candidate, so an adjacent unit strikes in
    /// place. Ties go to the first neighbor in [`Direction::ALL`] order.
    #[must_use]
    pub fn path_for_attack(&self, target: Cell) -> Option<Vec<Cell>> {
        target
            .neighbors()
            .filter(|&n| self.reachable.contains(n))
            .filter_map(|n| Some((self.map.distance(n)?, n)))
            .min_by_key(|&(distance, _)| distance)
            .and_then(|(_, n)| self.map.path_to(n))
    }
}

/// What the solver needs to know about the board.
pub(crate) struct Board<'a> {
    pub bounds: Bounds,
    pub terrain: &'a dyn Fn(Cell) -> Terrain,
    pub occupant: &'a dyn Fn(Cell) -> Option<&'a Unit>,
    /// Whether the mover's team sees the unit in a cell.
    pub sees: &'a dyn Fn(Cell) -> bool,
}

/// Run the flood fill for `unit` and derive its bitmaps.
pub(crate) fn solve(board: &Board<'_>, unit: &Unit) -> Solution {
    let stats = unit.stats();
    let source = unit.pos;
    let visible_enemy = |c: Cell| {
        (board.occupant)(c).is_some_and(|o| o.team != unit.team) && (board.sees)(c)
    };

    let map = MovementMap::flood(board.bounds, source, |c| {
        unit.ty.can_stand_on((board.terrain)(c)) && !visible_enemy(c)
    });
    let passable = Bitmap::from_fn(board.bounds, |c| {
        map.distance(c).is_some_and(|d| d <= stats.move_limit)
    });
    let reachable = passable.and(|c| {
        c == source || (board.occupant)(c).is_none() || !(board.sees)(c)
    });
    let potentially_attackable = match stats.weapon {
        Weapon::CloseRange => {
            let mut map = Bitmap::empty(board.bounds);
            for cell in reachable.cells() {
                for neighbor in board.bounds.neighbors(cell) {
                    map.set(neighbor, true);
                }
            }
            map
        }
        Weapon::LongRange { min, max } => Bitmap::from_fn(board.bounds, |c| {
            (min..=max).contains(&source.manhattan(c))
        }),
        Weapon::None => Bitmap::empty(board.bounds),
    };
    let attackable = potentially_attackable.and(|c| {
        (board.sees)(c) && (board.occupant)(c).is_some_and(|target| unit.can_attack(target))
    });

    tracing::trace!(
        unit = %unit,
        passable = passable.count(),
        attackable = attackable.count(),
        "solved movement"
    );
    Solution {
        map,
        passable,
        reachable,
        potentially_attackable,
        attackable,
    }
}
