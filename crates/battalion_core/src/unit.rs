//! Unit types and per-instance unit state.
//!
//! [`UnitType`] is the immutable stat table; [`Unit`] is the mutable record
//! the game arena owns. Units refer to one another only through [`UnitId`]
//! handles into that arena.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grid::Cell;
use crate::team::Team;
use crate::terrain::{Terrain, TerrainSet};

/// Stable handle of a unit inside one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Movement domain of a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Ground forces.
    Land,
    /// Surface ships.
    Water,
    /// Submerged ships.
    DeepWater,
    /// Aircraft.
    Air,
}

/// Shape of a unit's weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weapon {
    /// Strikes an adjacent cell, possibly after moving.
    CloseRange,
    /// Strikes from place at a Manhattan distance within `[min, max]`.
    LongRange {
        /// Minimum range.
        min: u32,
        /// Maximum range.
        max: u32,
    },
    /// Cannot attack.
    None,
}

/// Categories a weapon can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Targets {
    /// Hits land units.
    pub land: bool,
    /// Hits surface ships.
    pub water: bool,
    /// Hits submerged ships.
    pub deep_water: bool,
    /// Hits aircraft.
    pub air: bool,
}

impl Targets {
    const NOTHING: Self = Self {
        land: false,
        water: false,
        deep_water: false,
        air: false,
    };
    const SURFACE: Self = Self {
        land: true,
        water: true,
        deep_water: false,
        air: false,
    };
    const SUBMERGED: Self = Self {
        land: false,
        water: true,
        deep_water: true,
        air: false,
    };
    const ANY: Self = Self {
        land: true,
        water: true,
        deep_water: true,
        air: true,
    };

    /// Whether `category` is a valid target.
    #[must_use]
    pub const fn contains(&self, category: Category) -> bool {
        match category {
            Category::Land => self.land,
            Category::Water => self.water,
            Category::DeepWater => self.deep_water,
            Category::Air => self.air,
        }
    }
}

/// Static stats of a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Movement domain.
    pub category: Category,
    /// Weapon shape.
    pub weapon: Weapon,
    /// Categories the weapon hits.
    pub targets: Targets,
    /// Maximum health.
    pub max_health: u32,
    /// Damage at full health.
    pub damage: u32,
    /// Cells of movement per turn.
    pub move_limit: u32,
    /// Terrain the unit may stand on or cross.
    pub terrain: TerrainSet,
    /// Can capture buildings.
    pub can_conquer: bool,
    /// Hidden from enemies unless one of their units is adjacent.
    pub invisible: bool,
    /// Carries a single land unit.
    pub transporter: bool,
    /// Purchase price, `None` if the type is never sold.
    pub price: Option<u32>,
}

/// Every kind of unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// Infantry; captures buildings.
    Soldier,
    /// Anti-armor infantry; captures buildings.
    Bazooka,
    /// Medium tank.
    Tank,
    /// Heavy tank.
    TankBig,
    /// Mobile flak.
    TankAntiAir,
    /// Long-range gun.
    Artillery,
    /// Short-range indirect fire.
    Mortar,
    /// Immobile emplacement.
    Turret,
    /// Fast boat; captures buildings.
    SpeedBoat,
    /// Gunship.
    Ship,
    /// Naval flak.
    ShipAntiAir,
    /// Naval long-range gun.
    ShipArtillery,
    /// Invisible hunter.
    Submarine,
    /// Landing craft.
    ShipTransporter,
    /// Fighter-bomber.
    Airplane,
    /// Heavy airship.
    Zeppelin,
    /// Transport plane.
    AirTransporter,
}

impl UnitType {
    /// Every unit type, in catalogue order.
    pub const ALL: [Self; 17] = [
        Self::Soldier,
        Self::Bazooka,
        Self::Tank,
        Self::TankBig,
        Self::TankAntiAir,
        Self::Artillery,
        Self::Mortar,
        Self::Turret,
        Self::SpeedBoat,
        Self::Ship,
        Self::ShipAntiAir,
        Self::ShipArtillery,
        Self::Submarine,
        Self::ShipTransporter,
        Self::Airplane,
        Self::Zeppelin,
        Self::AirTransporter,
    ];

    /// Transporter types a land unit can board.
    pub const TRANSPORTERS: [Self; 2] = [Self::ShipTransporter, Self::AirTransporter];

    /// Look up the stat table entry.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub const fn stats(self) -> UnitStats {
        use Category::{Air, DeepWater, Land, Water};
        const fn unit(
            category: Category,
            weapon: Weapon,
            targets: Targets,
            max_health: u32,
            damage: u32,
            move_limit: u32,
            terrain: TerrainSet,
            price: Option<u32>,
        ) -> UnitStats {
            UnitStats {
                category,
                weapon,
                targets,
                max_health,
                damage,
                move_limit,
                terrain,
                can_conquer: false,
                invisible: false,
                transporter: false,
                price,
            }
        }
        const fn long(min: u32, max: u32) -> Weapon {
            Weapon::LongRange { min, max }
        }
        const CLOSE: Weapon = Weapon::CloseRange;
        const SURFACE: Targets = Targets::SURFACE;
        const ANY: Targets = Targets::ANY;

        match self {
            Self::Soldier => UnitStats {
                can_conquer: true,
                ..unit(Land, CLOSE, SURFACE, 50, 22, 3, TerrainSet::LandExtreme, Some(75))
            },
            Self::Bazooka => UnitStats {
                can_conquer: true,
                ..unit(Land, CLOSE, SURFACE, 50, 30, 3, TerrainSet::LandExtreme, Some(100))
            },
            Self::Tank => unit(Land, CLOSE, SURFACE, 70, 35, 6, TerrainSet::LandRough, Some(270)),
            Self::TankBig => unit(Land, CLOSE, SURFACE, 140, 70, 4, TerrainSet::LandRough, Some(470)),
            Self::TankAntiAir => unit(Land, CLOSE, ANY, 70, 17, 5, TerrainSet::LandRough, Some(230)),
            Self::Artillery => unit(Land, long(3, 5), ANY, 40, 40, 4, TerrainSet::LandFlat, Some(470)),
            Self::Mortar => unit(Land, long(2, 3), ANY, 50, 40, 5, TerrainSet::LandFlat, Some(300)),
            Self::Turret => unit(Land, long(2, 5), ANY, 100, 40, 0, TerrainSet::LandFlat, None),
            Self::SpeedBoat => UnitStats {
                can_conquer: true,
                ..unit(Water, CLOSE, Targets::NOTHING, 50, 15, 5, TerrainSet::Water, Some(200))
            },
            Self::Ship => unit(Water, CLOSE, SURFACE, 90, 45, 5, TerrainSet::Water, Some(500)),
            Self::ShipAntiAir => unit(Water, CLOSE, ANY, 90, 17, 5, TerrainSet::Water, Some(450)),
            Self::ShipArtillery => {
                unit(Water, long(3, 6), SURFACE, 140, 50, 4, TerrainSet::Water, Some(800))
            }
            Self::Submarine => UnitStats {
                invisible: true,
                ..unit(DeepWater, CLOSE, Targets::SUBMERGED, 25, 35, 4, TerrainSet::WaterDeep, Some(475))
            },
            Self::ShipTransporter => UnitStats {
                transporter: true,
                ..unit(Water, Weapon::None, Targets::NOTHING, 90, 0, 5, TerrainSet::Water, Some(100))
            },
            Self::Airplane => unit(Air, CLOSE, ANY, 50, 30, 7, TerrainSet::Any, Some(340)),
            Self::Zeppelin => unit(Air, CLOSE, ANY, 110, 80, 4, TerrainSet::Any, Some(650)),
            Self::AirTransporter => UnitStats {
                transporter: true,
                ..unit(Air, Weapon::None, Targets::NOTHING, 50, 0, 6, TerrainSet::Any, Some(150))
            },
        }
    }

    /// Whether this type may occupy `terrain`.
    #[must_use]
    pub const fn can_stand_on(self, terrain: Terrain) -> bool {
        self.stats().terrain.contains(terrain)
    }

    /// Whether this type's weapon can hit units of `target`.
    #[must_use]
    pub const fn can_target(self, target: Category) -> bool {
        self.stats().targets.contains(target)
    }

    /// Health restored by one repair.
    #[must_use]
    pub const fn repair_amount(self) -> u32 {
        let quarter = self.stats().max_health / 4;
        if quarter == 0 {
            1
        } else {
            quarter
        }
    }

    /// Money charged for one repair.
    #[must_use]
    pub const fn repair_cost(self) -> u32 {
        match self.stats().price {
            Some(price) if price / 4 > REPAIR_COST_FLOOR => price / 4,
            _ => REPAIR_COST_FLOOR,
        }
    }
}

/// Minimum charge for a repair.
pub const REPAIR_COST_FLOOR: u32 = 10;

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Mutable state of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Type of this unit.
    pub ty: UnitType,
    /// Owner; fixed for the unit's lifetime.
    pub team: Team,
    /// Current cell. A carried unit shares its transporter's cell.
    pub pos: Cell,
    /// Remaining health, `0..=max_health`.
    pub health: u32,
    /// May still act this turn.
    pub active: bool,
    /// Waiting to be healed at the start of its team's next turn.
    pub repairing: bool,
    /// Carried unit, present exactly when `ty` is a transporter.
    pub transported: Option<UnitId>,
}

impl Unit {
    /// A fresh, full-health, inactive unit.
    #[must_use]
    pub fn new(ty: UnitType, team: Team, pos: Cell) -> Self {
        Self {
            ty,
            team,
            pos,
            health: ty.stats().max_health,
            active: false,
            repairing: false,
            transported: None,
        }
    }

    /// Shortcut for `self.ty.stats()`.
    #[must_use]
    pub const fn stats(&self) -> UnitStats {
        self.ty.stats()
    }

    /// Whether this unit's weapon can hit `other`.
    #[must_use]
    pub fn can_attack(&self, other: &Self) -> bool {
        self.team != other.team && self.ty.can_target(other.stats().category)
    }

    /// Whether the unit is below full health.
    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.health < self.stats().max_health
    }

    /// Remove `amount` health and report whether the unit died.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(amount);
        self.repairing = false;
        self.health == 0
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} at {}", self.team, self.ty, self.pos)
    }
}
