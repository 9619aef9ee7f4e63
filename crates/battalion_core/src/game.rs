//! The authoritative game state.
//!
//! [`Game`] owns the terrain, the unit and building arenas, the per-team
//! treasuries and the turn pointer. Units live in a slab indexed by
//! [`UnitId`]; the unit grid holds the id of the unit on each cell. A unit
//! carried by a transporter stays in the slab but off the grid, with its
//! position kept equal to its transporter's.
//!
//! Derived state (solver output, fog of war, build permissions) is memoized
//! behind generation counters. Every unit placement change bumps the unit
//! generation and every ownership change bumps the building generation, so
//! stale entries are recomputed on their next read.
//!
//! # Determinism
//!
//! - Iteration is row-major over cells or in slab order, never over hash maps
//! - Combat math uses fixed point
//! - [`Game::state_hash`] folds a canonical walk of the state with FNV-1a
//!
//! # Example
//!
//! ```
//! use battalion_core::prelude::*;
//!
//! let mut builder = LevelBuilder::new(6, 6);
//! builder
//!     .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Soldier, Team::Red))
//!     .unit(UnitDesc::new(Cell::new(5, 5), UnitType::Soldier, Team::Blue));
//! let mut game = Game::new(&builder.build().unwrap()).unwrap();
//!
//! game.perform(&Action::Start).unwrap();
//! let path = vec![Cell::new(1, 0), Cell::new(2, 0)];
//! game.perform(&Action::UnitMove { unit: Cell::new(0, 0), path }).unwrap();
//! assert!(game.unit_at(Cell::new(2, 0)).is_some());
//! ```

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::building::{BuildPermissions, Building, BuildingId, ConquestStep};
use crate::cache::{Generation, MemoMap};
use crate::economy::TeamEconomy;
use crate::error::{GameError, Result};
use crate::event::{GameEvent, GameListener, Listeners};
use crate::grid::{Bitmap, Bounds, Cell, CellArray};
use crate::level::Level;
use crate::movement::{solve, Board, Solution, Vision};
use crate::team::{Team, TeamMap};
use crate::terrain::Terrain;
use crate::unit::{Category, Unit, UnitId};
use crate::visibility::visibility_map;

/// One game instance.
///
/// Cloning deep-copies the arenas; the clone starts with no listeners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    terrain: CellArray<Terrain>,
    unit_grid: CellArray<Option<UnitId>>,
    building_grid: CellArray<Option<BuildingId>>,
    units: Vec<Option<Unit>>,
    buildings: Vec<Building>,
    money: TeamMap<TeamEconomy>,
    participants: Vec<Team>,
    turn: Team,
    turn_count: u32,
    started: bool,
    finished: bool,
    winner: Option<Team>,

    #[serde(skip)]
    unit_generation: Generation,
    #[serde(skip)]
    building_generation: Generation,
    #[serde(skip)]
    solutions: MemoMap<(UnitId, Vision), Solution>,
    #[serde(skip)]
    visibility: MemoMap<Team, Bitmap>,
    #[serde(skip)]
    permissions: MemoMap<Team, BuildPermissions>,
    #[serde(skip)]
    listeners: Listeners,
    #[serde(skip)]
    pending: Vec<GameEvent>,
}

impl Game {
    /// Build a game from a level, rejecting malformed levels.
    pub fn new(level: &Level) -> Result<Self> {
        level.validate()?;
        let bounds = level.bounds();
        let participants = level.participants();
        let mut game = Self {
            terrain: level.terrain_array(),
            unit_grid: CellArray::filled(bounds, None),
            building_grid: CellArray::filled(bounds, None),
            units: Vec::with_capacity(level.units.len()),
            buildings: Vec::with_capacity(level.buildings.len()),
            money: TeamMap::from_fn(|team| {
                TeamEconomy::new(u32::try_from(level.money(team)).unwrap_or(u32::MAX))
            }),
            turn: participants.first().copied().unwrap_or_default(),
            participants,
            turn_count: 0,
            started: false,
            finished: false,
            winner: None,
            unit_generation: Generation::default(),
            building_generation: Generation::default(),
            solutions: MemoMap::default(),
            visibility: MemoMap::default(),
            permissions: MemoMap::default(),
            listeners: Listeners::default(),
            pending: Vec::new(),
        };

        for desc in &level.buildings {
            let id = BuildingId(index_to_id(game.buildings.len()));
            game.buildings.push(Building::new(desc.ty, desc.team, desc.cell()));
            game.building_grid[desc.cell()] = Some(id);
        }
        for desc in &level.units {
            let mut unit = Unit::new(desc.ty, desc.team, desc.cell());
            if let Some(health) = desc.health {
                unit.health = health;
            }
            if let Some(cargo) = &desc.cargo {
                let mut inner = Unit::new(cargo.ty, desc.team, desc.cell());
                if let Some(health) = cargo.health {
                    inner.health = health;
                }
                unit.transported = Some(game.push_unit(inner));
            }
            let id = game.push_unit(unit);
            game.unit_grid[desc.cell()] = Some(id);
        }

        tracing::debug!(
            width = bounds.width(),
            height = bounds.height(),
            units = level.units.len(),
            buildings = level.buildings.len(),
            participants = ?game.participants,
            "game created"
        );
        Ok(game)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Grid bounds.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.terrain.bounds()
    }

    /// Terrain at `cell`, `None` outside the map.
    #[must_use]
    pub fn terrain(&self, cell: Cell) -> Option<Terrain> {
        self.terrain.get(cell).copied()
    }

    /// Id of the unit on `cell`.
    #[must_use]
    pub fn unit_id_at(&self, cell: Cell) -> Option<UnitId> {
        self.unit_grid.get(cell).copied().flatten()
    }

    /// Unit on `cell`.
    #[must_use]
    pub fn unit_at(&self, cell: Cell) -> Option<&Unit> {
        self.unit(self.unit_id_at(cell)?)
    }

    /// Live unit by id, including carried units.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.0 as usize)?.as_ref()
    }

    /// Unit carried by the transporter on `cell`.
    #[must_use]
    pub fn cargo_at(&self, cell: Cell) -> Option<&Unit> {
        self.unit(self.unit_at(cell)?.transported?)
    }

    /// Building on `cell`.
    #[must_use]
    pub fn building_at(&self, cell: Cell) -> Option<&Building> {
        let id = self.building_grid.get(cell).copied().flatten()?;
        self.buildings.get(id.0 as usize)
    }

    /// Every unit on the board, in row-major cell order.
    pub fn units(&self) -> impl Iterator<Item = (UnitId, &Unit)> + '_ {
        self.unit_grid
            .iter()
            .filter_map(|(_, slot)| slot.and_then(|id| Some((id, self.unit(id)?))))
    }

    /// Units of `team` on the board, in row-major cell order.
    pub fn team_units(&self, team: Team) -> impl Iterator<Item = (UnitId, &Unit)> + '_ {
        self.units().filter(move |(_, unit)| unit.team == team)
    }

    /// Every building, in row-major cell order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> + '_ {
        self.building_grid
            .iter()
            .filter_map(|(_, slot)| slot.and_then(|id| self.buildings.get(id.0 as usize)))
    }

    /// Team whose turn it is.
    #[must_use]
    pub const fn turn(&self) -> Team {
        self.turn
    }

    /// Number of turns begun so far.
    #[must_use]
    pub const fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Balance of `team`.
    #[must_use]
    pub fn money(&self, team: Team) -> u32 {
        self.money[team].money()
    }

    /// Teams that owned units when the level was loaded, in turn order.
    #[must_use]
    pub fn participants(&self) -> &[Team] {
        &self.participants
    }

    /// Whether `Start` has been performed.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the game has ended.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// The last team standing, once the game has ended.
    #[must_use]
    pub const fn winner(&self) -> Option<Team> {
        self.winner
    }

    /// Whether `team` still has a unit on the board.
    #[must_use]
    pub fn is_alive(&self, team: Team) -> bool {
        self.team_units(team).next().is_some()
    }

    /// Participants that are still alive, in turn order.
    #[must_use]
    pub fn alive_teams(&self) -> Vec<Team> {
        self.participants
            .iter()
            .copied()
            .filter(|&team| self.is_alive(team))
            .collect()
    }

    /// Cells holding a unit `team` can see.
    #[must_use]
    pub fn visibility(&self, team: Team) -> Arc<Bitmap> {
        self.visibility.get_or_compute(team, self.unit_generation, || {
            visibility_map(self.bounds(), team, |c| self.unit_at(c))
        })
    }

    /// Whether `team` sees the unit on `cell`. Empty cells are never visible.
    #[must_use]
    pub fn is_visible(&self, team: Team, cell: Cell) -> bool {
        self.visibility(team).contains(cell)
    }

    /// Solver output for unit `id`.
    #[must_use]
    pub fn solution(&self, id: UnitId, vision: Vision) -> Option<Arc<Solution>> {
        let unit = self.unit(id)?;
        Some(self.solutions.get_or_compute((id, vision), self.unit_generation, || {
            let seen = match vision {
                Vision::Fog => Some(self.visibility(unit.team)),
                Vision::Omniscient => None,
            };
            let terrain = |c: Cell| self.terrain[c];
            let occupant = |c: Cell| self.unit_at(c);
            let sees = |c: Cell| seen.as_ref().map_or(true, |map| map.contains(c));
            let board = Board {
                bounds: self.bounds(),
                terrain: &terrain,
                occupant: &occupant,
                sees: &sees,
            };
            solve(&board, unit)
        }))
    }

    /// Solver output for the unit on `cell`.
    #[must_use]
    pub fn solution_at(&self, cell: Cell, vision: Vision) -> Option<Arc<Solution>> {
        self.solution(self.unit_id_at(cell)?, vision)
    }

    /// Unit categories `team`'s controllers unlock.
    #[must_use]
    pub fn build_permissions(&self, team: Team) -> BuildPermissions {
        *self.permissions.get_or_compute(team, self.building_generation, || {
            let mut permissions = BuildPermissions::default();
            for building in self.buildings.iter().filter(|b| b.team == team) {
                match building.ty.unlocks() {
                    Some(Category::Land) => permissions.land = true,
                    Some(Category::Water | Category::DeepWater) => permissions.water = true,
                    Some(Category::Air) => permissions.air = true,
                    None => {}
                }
            }
            permissions
        })
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&mut self, listener: impl GameListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Fingerprint of the full game state, stable across runs and clones.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = Fnv1a::default();
        self.terrain.hash(&mut hasher);
        self.unit_grid.hash(&mut hasher);
        self.building_grid.hash(&mut hasher);
        self.units.hash(&mut hasher);
        self.buildings.hash(&mut hasher);
        self.money.hash(&mut hasher);
        self.participants.hash(&mut hasher);
        self.turn.hash(&mut hasher);
        self.turn_count.hash(&mut hasher);
        self.started.hash(&mut hasher);
        self.finished.hash(&mut hasher);
        self.winner.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the game state. Caches and listeners are not included.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize game: {e}")))
    }

    /// Restore a game serialized with [`Game::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize game: {e}")))
    }

    /// Check the arena invariants.
    ///
    /// # Panics
    ///
    /// Panics when the grid and the unit slab disagree, or when a
    /// transporter's cargo is malformed.
    pub fn assert_invariants(&self) {
        for (cell, slot) in self.unit_grid.iter() {
            let Some(id) = *slot else { continue };
            let unit = self.unit(id);
            assert!(
                unit.is_some_and(|u| u.pos == cell),
                "grid slot {cell} points at {id} which is not there"
            );
            let Some(unit) = unit else { continue };
            assert_eq!(
                unit.stats().transporter,
                unit.transported.is_some(),
                "{unit} has inconsistent cargo"
            );
            if let Some(cargo) = unit.transported.and_then(|c| self.unit(c)) {
                assert_eq!(cargo.pos, cell, "cargo of {unit} is elsewhere");
                assert_eq!(cargo.stats().category, Category::Land);
                assert!(!cargo.stats().transporter, "{unit} carries a transporter");
            }
        }
        for (cell, slot) in self.building_grid.iter() {
            if let Some(id) = *slot {
                assert_eq!(self.buildings[id.0 as usize].pos, cell);
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutation primitives, used by the rules
    // ------------------------------------------------------------------

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.listeners.dispatch(&event);
        self.pending.push(event);
    }

    pub(crate) fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id.0 as usize)?.as_mut()
    }

    pub(crate) fn building_id_at(&self, cell: Cell) -> Option<BuildingId> {
        self.building_grid.get(cell).copied().flatten()
    }

    pub(crate) fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id.0 as usize)
    }

    pub(crate) fn building_mut(&mut self, id: BuildingId) -> &mut Building {
        &mut self.buildings[id.0 as usize]
    }

    pub(crate) fn building_ids(&self) -> Vec<BuildingId> {
        self.building_grid.iter().filter_map(|(_, slot)| *slot).collect()
    }

    pub(crate) fn economy_mut(&mut self, team: Team) -> &mut TeamEconomy {
        &mut self.money[team]
    }

    pub(crate) fn participants_cycle(&self) -> impl Iterator<Item = Team> + '_ {
        let start = self
            .participants
            .iter()
            .position(|&t| t == self.turn)
            .map_or(0, |i| i + 1);
        let n = self.participants.len();
        (0..n).map(move |k| self.participants[(start + k) % n])
    }

    pub(crate) fn set_turn(&mut self, team: Team) {
        self.turn = team;
        self.turn_count += 1;
    }

    pub(crate) fn mark_started(&mut self) {
        self.started = true;
    }

    pub(crate) fn finish(&mut self, winner: Option<Team>) {
        self.finished = true;
        self.winner = winner;
    }

    pub(crate) fn all_units_mut(&mut self) -> impl Iterator<Item = &mut Unit> + '_ {
        self.units.iter_mut().flatten()
    }

    pub(crate) fn all_buildings_mut(&mut self) -> impl Iterator<Item = &mut Building> + '_ {
        self.buildings.iter_mut()
    }

    fn push_unit(&mut self, unit: Unit) -> UnitId {
        let id = UnitId(index_to_id(self.units.len()));
        self.units.push(Some(unit));
        id
    }

    /// Put a new unit on the board.
    pub(crate) fn add_unit(&mut self, unit: Unit) -> UnitId {
        let (ty, team, pos) = (unit.ty, unit.team, unit.pos);
        assert!(self.unit_grid[pos].is_none(), "two units on {pos}");
        let id = self.push_unit(unit);
        self.unit_grid[pos] = Some(id);
        self.unit_generation.bump();
        self.emit(GameEvent::UnitAdded { unit: id, ty, team, pos });
        id
    }

    /// Put an existing slab unit (freed cargo) back on the board.
    pub(crate) fn place_unit(&mut self, id: UnitId, pos: Cell) {
        assert!(self.unit_grid[pos].is_none(), "two units on {pos}");
        let Some(unit) = self.unit_mut(id) else { return };
        unit.pos = pos;
        let (ty, team) = (unit.ty, unit.team);
        self.unit_grid[pos] = Some(id);
        self.unit_generation.bump();
        self.emit(GameEvent::UnitAdded { unit: id, ty, team, pos });
    }

    /// Take a unit off the board, keeping it in the slab.
    pub(crate) fn lift_unit(&mut self, id: UnitId) {
        let Some(unit) = self.unit(id) else { return };
        let (team, pos) = (unit.team, unit.pos);
        if self.unit_grid[pos] == Some(id) {
            self.unit_grid[pos] = None;
        }
        self.solutions.evict(|&(unit, _)| unit == id);
        self.unit_generation.bump();
        self.emit(GameEvent::UnitRemoved { unit: id, team, pos });
    }

    /// Remove a unit and its cargo for good.
    pub(crate) fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        self.unit(id)?;
        self.lift_unit(id);
        let unit = self.units[id.0 as usize].take()?;
        if let Some(cargo) = unit.transported {
            self.units[cargo.0 as usize] = None;
        }
        Some(unit)
    }

    /// Move a unit on the board.
    pub(crate) fn relocate(&mut self, id: UnitId, to: Cell) {
        let Some(unit) = self.unit_mut(id) else { return };
        let from = unit.pos;
        unit.pos = to;
        let cargo = unit.transported;
        if let Some(cargo) = cargo.and_then(|c| self.unit_mut(c)) {
            cargo.pos = to;
        }
        assert!(self.unit_grid[to].is_none(), "two units on {to}");
        self.unit_grid[from] = None;
        self.unit_grid[to] = Some(id);
        self.unit_generation.bump();
    }

    /// Advance or reset the conquest of building `id`, emitting what happened.
    pub(crate) fn conquer(&mut self, id: BuildingId, conquerer: Option<Team>) {
        let building = self.building_mut(id);
        let (pos, ty) = (building.pos, building.ty);
        match building.try_conquer(conquerer) {
            ConquestStep::Unchanged => {}
            ConquestStep::Reset => self.emit(GameEvent::ConquerReset { pos }),
            ConquestStep::Progressed { team, progress } => {
                self.emit(GameEvent::ConquerProgressed { pos, team, progress });
            }
            ConquestStep::Conquered { from, to } => {
                self.building_generation.bump();
                tracing::debug!(building = %ty, %pos, %from, %to, "building conquered");
                self.emit(GameEvent::BuildingConquered { pos, ty, from, to });
            }
        }
    }

    /// Hand every building of `team` to the neutral team.
    pub(crate) fn release_buildings(&mut self, team: Team) {
        let mut changed = false;
        for building in self.buildings.iter_mut().filter(|b| b.team == team) {
            building.team = Team::None;
            building.active = false;
            changed = true;
        }
        if changed {
            self.building_generation.bump();
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn index_to_id(index: usize) -> u32 {
    index as u32
}

/// 64-bit FNV-1a.
struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Self(0xcbf2_9ce4_8422_2325)
    }
}

impl Hasher for Fnv1a {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
        }
    }

    fn write_usize(&mut self, i: usize) {
        self.write(&(i as u64).to_le_bytes());
    }
}
