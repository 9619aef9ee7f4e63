//! Level descriptors and their validation.
//!
//! A [`Level`] is plain data: row-major terrain, sparse building and unit
//! placements, and starting money. It derives serde so hosts can keep
//! levels in RON files. [`Level::validate`] rejects everything a live game
//! could not represent; [`crate::game::Game::new`] calls it again, so a
//! hand-edited descriptor can never produce a broken game.
//!
//! ```
//! use battalion_core::prelude::*;
//!
//! let mut builder = LevelBuilder::new(4, 3);
//! builder
//!     .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Soldier, Team::Red))
//!     .unit(UnitDesc::new(Cell::new(3, 2), UnitType::Tank, Team::Blue))
//!     .money(Team::Red, 500);
//! let level = builder.build().unwrap();
//! assert_eq!(level.participants(), vec![Team::Red, Team::Blue]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::building::BuildingType;
use crate::error::{GameError, LevelError, Result};
use crate::grid::{Bounds, Cell, CellArray};
use crate::team::Team;
use crate::terrain::{bridge_axis, Terrain};
use crate::unit::{Category, UnitType};

/// A unit carried inside a transporter descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoDesc {
    /// Carried unit type.
    pub ty: UnitType,
    /// Health, full if omitted.
    #[serde(default)]
    pub health: Option<u32>,
}

/// A unit placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDesc {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
    /// Unit type.
    pub ty: UnitType,
    /// Owner.
    pub team: Team,
    /// Health, full if omitted.
    #[serde(default)]
    pub health: Option<u32>,
    /// Cargo, required exactly for transporters.
    #[serde(default)]
    pub cargo: Option<CargoDesc>,
}

impl UnitDesc {
    /// A full-health unit without cargo.
    #[must_use]
    pub const fn new(cell: Cell, ty: UnitType, team: Team) -> Self {
        Self {
            x: cell.x(),
            y: cell.y(),
            ty,
            team,
            health: None,
            cargo: None,
        }
    }

    /// Override the starting health.
    #[must_use]
    pub const fn with_health(mut self, health: u32) -> Self {
        self.health = Some(health);
        self
    }

    /// Load a full-health cargo unit.
    #[must_use]
    pub const fn carrying(mut self, ty: UnitType) -> Self {
        self.cargo = Some(CargoDesc { ty, health: None });
        self
    }

    /// Cell of the unit.
    #[must_use]
    pub const fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// A building placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingDesc {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
    /// Building type.
    pub ty: BuildingType,
    /// Owner, neutral if omitted.
    #[serde(default)]
    pub team: Team,
}

impl BuildingDesc {
    /// A building owned by `team`.
    #[must_use]
    pub const fn new(cell: Cell, ty: BuildingType, team: Team) -> Self {
        Self {
            x: cell.x(),
            y: cell.y(),
            ty,
            team,
        }
    }

    /// Cell of the building.
    #[must_use]
    pub const fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// A complete map description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
    /// Row-major terrain, `width * height` entries.
    pub terrain: Vec<Terrain>,
    /// Building placements.
    #[serde(default)]
    pub buildings: Vec<BuildingDesc>,
    /// Unit placements.
    #[serde(default)]
    pub units: Vec<UnitDesc>,
    /// Starting balances; missing teams start at zero.
    #[serde(default)]
    pub starting_money: BTreeMap<Team, i64>,
}

impl Level {
    /// Grid bounds.
    ///
    /// # Panics
    ///
    /// Panics if a dimension is zero; validated levels never have one.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    /// Terrain as a per-cell array.
    #[must_use]
    pub fn terrain_array(&self) -> CellArray<Terrain> {
        let bounds = self.bounds();
        CellArray::from_fn(bounds, |c| self.terrain[bounds.index_of(c)])
    }

    /// Teams that own at least one unit, in turn order.
    #[must_use]
    pub fn participants(&self) -> Vec<Team> {
        Team::REAL
            .into_iter()
            .filter(|&team| self.units.iter().any(|u| u.team == team))
            .collect()
    }

    /// Starting balance for `team`.
    #[must_use]
    pub fn money(&self, team: Team) -> i64 {
        self.starting_money.get(&team).copied().unwrap_or(0)
    }

    /// Check every construction rule.
    #[allow(clippy::too_many_lines)]
    pub fn validate(&self) -> std::result::Result<(), LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::EmptyLevel {
                width: self.width,
                height: self.height,
            });
        }
        let bounds = self.bounds();
        if self.terrain.len() != bounds.area() {
            return Err(LevelError::SizeMismatch {
                table: "terrain",
                expected: bounds.area(),
                actual: self.terrain.len(),
            });
        }
        let terrain = self.terrain_array();

        for (cell, t) in terrain.iter() {
            if t.is_bridge() && bridge_axis(&terrain, cell).is_none() {
                return Err(LevelError::AmbiguousBridge(cell));
            }
        }

        let mut seen = HashSet::new();
        for building in &self.buildings {
            let cell = building.cell();
            if !bounds.contains(cell) {
                return Err(LevelError::OutOfBounds(cell));
            }
            if !seen.insert(cell) {
                return Err(LevelError::Duplicate { cell, kind: "building" });
            }
            if !building.ty.can_build_on(terrain[cell]) {
                return Err(LevelError::BuildingTerrain {
                    cell,
                    building: building.ty,
                    terrain: terrain[cell],
                });
            }
        }

        seen.clear();
        for unit in &self.units {
            let cell = unit.cell();
            if !bounds.contains(cell) {
                return Err(LevelError::OutOfBounds(cell));
            }
            if !seen.insert(cell) {
                return Err(LevelError::Duplicate { cell, kind: "unit" });
            }
            if !unit.team.is_real() {
                return Err(LevelError::NeutralUnit(cell));
            }
            if !unit.ty.can_stand_on(terrain[cell]) {
                return Err(LevelError::UnitTerrain {
                    cell,
                    unit: unit.ty,
                    terrain: terrain[cell],
                });
            }
            check_health(cell, unit.ty, unit.health)?;
            match (&unit.cargo, unit.ty.stats().transporter) {
                (None, false) => {}
                (Some(_), false) => {
                    return Err(LevelError::InvalidTransport {
                        cell,
                        reason: "only transporters carry units",
                    })
                }
                (None, true) => {
                    return Err(LevelError::InvalidTransport {
                        cell,
                        reason: "transporter without cargo",
                    })
                }
                (Some(cargo), true) => {
                    let stats = cargo.ty.stats();
                    if stats.category != Category::Land || stats.transporter {
                        return Err(LevelError::InvalidTransport {
                            cell,
                            reason: "cargo must be a land unit",
                        });
                    }
                    check_health(cell, cargo.ty, cargo.health)?;
                }
            }
        }

        for (&team, &amount) in &self.starting_money {
            if amount < 0 {
                return Err(LevelError::NegativeMoney { team, amount });
            }
        }
        Ok(())
    }

    /// Parse and validate a RON level.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let level: Self = ron::from_str(source)
            .map_err(|e| GameError::InvalidState(format!("Failed to parse level: {e}")))?;
        level.validate()?;
        Ok(level)
    }

    /// Pretty-printed RON.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize level: {e}")))
    }
}

fn check_health(cell: Cell, ty: UnitType, health: Option<u32>) -> std::result::Result<(), LevelError> {
    let max = ty.stats().max_health;
    match health {
        Some(health) if health == 0 || health > max => {
            Err(LevelError::InvalidHealth { cell, health, max })
        }
        _ => Ok(()),
    }
}

/// Incremental level construction.
#[derive(Debug, Clone)]
pub struct LevelBuilder {
    level: Level,
}

impl LevelBuilder {
    /// A flat-land map with no entities.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            level: Level {
                width,
                height,
                terrain: vec![Terrain::FlatLand; usize::from(width) * usize::from(height)],
                buildings: Vec::new(),
                units: Vec::new(),
                starting_money: BTreeMap::new(),
            },
        }
    }

    /// Set one cell's terrain.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is outside the map.
    pub fn terrain(&mut self, cell: Cell, terrain: Terrain) -> &mut Self {
        let index = self.level.bounds().index_of(cell);
        self.level.terrain[index] = terrain;
        self
    }

    /// Set every cell of the `width x height` rectangle at `origin`.
    pub fn terrain_rect(&mut self, origin: Cell, width: u16, height: u16, terrain: Terrain) -> &mut Self {
        for y in origin.y()..origin.y().saturating_add(height) {
            for x in origin.x()..origin.x().saturating_add(width) {
                if self.level.bounds().contains(Cell::new(x, y)) {
                    self.terrain(Cell::new(x, y), terrain);
                }
            }
        }
        self
    }

    /// Place a unit.
    pub fn unit(&mut self, unit: UnitDesc) -> &mut Self {
        self.level.units.push(unit);
        self
    }

    /// Place a building.
    pub fn building(&mut self, building: BuildingDesc) -> &mut Self {
        self.level.buildings.push(building);
        self
    }

    /// Set a starting balance.
    pub fn money(&mut self, team: Team, amount: i64) -> &mut Self {
        self.level.starting_money.insert(team, amount);
        self
    }

    /// Validate and return the level.
    pub fn build(&self) -> std::result::Result<Level, LevelError> {
        self.level.validate()?;
        Ok(self.level.clone())
    }
}
