//! Building types, per-instance building state and conquest.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grid::Cell;
use crate::team::Team;
use crate::terrain::Terrain;
use crate::unit::{Category, UnitType};

/// Conquest steps needed to take a neutral building.
pub const CONQUER_DURATION_FROM_NEUTRAL: u32 = 3;
/// Conquest steps needed to take an enemy building.
pub const CONQUER_DURATION_FROM_ENEMY: u32 = 2;

/// Stable handle of a building inside one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

/// Every kind of building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    /// Small oil income.
    OilRefinery,
    /// Large oil income.
    OilRefineryBig,
    /// Offshore oil income.
    OilRig,
    /// Trains units.
    Factory,
    /// Headquarters.
    Capital,
    /// Unlocks land units at factories.
    ControllerLand,
    /// Unlocks water units at factories.
    ControllerWater,
    /// Unlocks air units at factories.
    ControllerAir,
}

impl BuildingType {
    /// Every building type.
    pub const ALL: [Self; 8] = [
        Self::OilRefinery,
        Self::OilRefineryBig,
        Self::OilRig,
        Self::Factory,
        Self::Capital,
        Self::ControllerLand,
        Self::ControllerWater,
        Self::ControllerAir,
    ];

    /// Money credited to the owner at every turn end.
    #[must_use]
    pub const fn money_gain(self) -> u32 {
        match self {
            Self::OilRefinery => 20,
            Self::OilRefineryBig => 35,
            Self::OilRig => 50,
            _ => 0,
        }
    }

    /// Whether the building trains units.
    #[must_use]
    pub const fn can_build_units(self) -> bool {
        matches!(self, Self::Factory)
    }

    /// Unit category whose construction this building unlocks.
    #[must_use]
    pub const fn unlocks(self) -> Option<Category> {
        match self {
            Self::ControllerLand => Some(Category::Land),
            Self::ControllerWater => Some(Category::Water),
            Self::ControllerAir => Some(Category::Air),
            _ => None,
        }
    }

    /// Whether the building may be placed on `terrain`.
    #[must_use]
    pub const fn can_build_on(self, terrain: Terrain) -> bool {
        match self {
            Self::OilRig => matches!(terrain, Terrain::Water),
            Self::Factory => matches!(terrain, Terrain::FlatLand | Terrain::Shore),
            _ => matches!(terrain, Terrain::FlatLand),
        }
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Unit categories a team's controllers unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct BuildPermissions {
    /// Land units may be trained.
    pub land: bool,
    /// Water and deep-water units may be trained.
    pub water: bool,
    /// Aircraft may be trained.
    pub air: bool,
}

impl BuildPermissions {
    /// Whether units of `category` are unlocked.
    #[must_use]
    pub const fn allows(&self, category: Category) -> bool {
        match category {
            Category::Land => self.land,
            Category::Water | Category::DeepWater => self.water,
            Category::Air => self.air,
        }
    }
}

/// Result of one conquest step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConquestStep {
    /// Nothing changed.
    Unchanged,
    /// A contest was abandoned.
    Reset,
    /// Progress was made but the building has not changed hands.
    Progressed {
        /// Contesting team.
        team: Team,
        /// Steps completed so far.
        progress: u32,
    },
    /// Ownership transferred.
    Conquered {
        /// Previous owner.
        from: Team,
        /// New owner.
        to: Team,
    },
}

/// Mutable state of one building.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    /// Type of this building.
    pub ty: BuildingType,
    /// Current owner.
    pub team: Team,
    /// Cell the building occupies.
    pub pos: Cell,
    /// May still act this turn (factories only).
    pub active: bool,
    /// Team currently contesting the building.
    pub conquer_team: Option<Team>,
    /// Completed conquest steps of `conquer_team`.
    pub conquer_progress: u32,
}

impl Building {
    /// A fresh, inactive building.
    #[must_use]
    pub fn new(ty: BuildingType, team: Team, pos: Cell) -> Self {
        Self {
            ty,
            team,
            pos,
            active: false,
            conquer_team: None,
            conquer_progress: 0,
        }
    }

    /// Advance or reset the conquest.
    ///
    /// Passing a team different from the current contester (including
    /// `None`) discards the progress made so far. A contesting team that
    /// already owns the building makes no progress.
    pub fn try_conquer(&mut self, conquerer: Option<Team>) -> ConquestStep {
        let mut step = ConquestStep::Unchanged;
        if conquerer != self.conquer_team {
            if self.conquer_team.is_some() {
                step = ConquestStep::Reset;
            }
            self.conquer_team = None;
            self.conquer_progress = 0;
        }
        let Some(team) = conquerer.filter(|&t| t != self.team) else {
            return step;
        };

        self.conquer_team = Some(team);
        self.conquer_progress += 1;
        let duration = if self.team.is_real() {
            CONQUER_DURATION_FROM_ENEMY
        } else {
            CONQUER_DURATION_FROM_NEUTRAL
        };
        if self.conquer_progress < duration {
            return ConquestStep::Progressed {
                team,
                progress: self.conquer_progress,
            };
        }

        let from = self.team;
        self.team = team;
        self.conquer_team = None;
        self.conquer_progress = 0;
        ConquestStep::Conquered { from, to: team }
    }

    /// Whether factory `self` could offer `ty` under `permissions`, ignoring
    /// money, activity and occupancy.
    #[must_use]
    pub fn offers(&self, ty: UnitType, permissions: BuildPermissions, terrain: Terrain) -> bool {
        let stats = ty.stats();
        if !self.ty.can_build_units() || stats.price.is_none() || !permissions.allows(stats.category) {
            return false;
        }
        match stats.category {
            Category::Water | Category::DeepWater => {
                matches!(terrain, Terrain::Water | Terrain::Shore)
            }
            Category::Land | Category::Air => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refinery(team: Team) -> Building {
        Building::new(BuildingType::OilRefinery, team, Cell::new(0, 0))
    }

    #[test]
    fn test_neutral_conquest_takes_three_steps() {
        let mut building = refinery(Team::None);
        assert_eq!(
            building.try_conquer(Some(Team::Red)),
            ConquestStep::Progressed { team: Team::Red, progress: 1 }
        );
        building.try_conquer(Some(Team::Red));
        assert_eq!(
            building.try_conquer(Some(Team::Red)),
            ConquestStep::Conquered { from: Team::None, to: Team::Red }
        );
        assert_eq!(building.team, Team::Red);
        assert_eq!(building.conquer_progress, 0);
        assert_eq!(building.conquer_team, None);

        // Owner standing on its own building makes no progress.
        assert_eq!(building.try_conquer(Some(Team::Red)), ConquestStep::Unchanged);
        assert_eq!(building.team, Team::Red);
    }

    #[test]
    fn test_enemy_conquest_takes_two_steps() {
        let mut building = refinery(Team::Blue);
        building.try_conquer(Some(Team::Red));
        assert_eq!(
            building.try_conquer(Some(Team::Red)),
            ConquestStep::Conquered { from: Team::Blue, to: Team::Red }
        );
    }

    #[test]
    fn test_contester_change_resets_progress() {
        let mut building = refinery(Team::None);
        building.try_conquer(Some(Team::Red));
        building.try_conquer(Some(Team::Red));
        building.try_conquer(Some(Team::Blue));
        assert_eq!(building.conquer_team, Some(Team::Blue));
        assert_eq!(building.conquer_progress, 1);
        assert_eq!(building.team, Team::None);

        assert_eq!(building.try_conquer(None), ConquestStep::Reset);
        assert_eq!(building.conquer_progress, 0);
        assert_eq!(building.try_conquer(None), ConquestStep::Unchanged);
    }

    #[test]
    fn test_factory_offers() {
        let factory = Building::new(BuildingType::Factory, Team::Red, Cell::new(0, 0));
        let all = BuildPermissions { land: true, water: true, air: true };
        assert!(factory.offers(UnitType::Tank, all, Terrain::FlatLand));
        assert!(!factory.offers(UnitType::Ship, all, Terrain::FlatLand));
        assert!(factory.offers(UnitType::Ship, all, Terrain::Shore));
        assert!(!factory.offers(UnitType::Turret, all, Terrain::FlatLand));
        assert!(!factory.offers(UnitType::Tank, BuildPermissions::default(), Terrain::FlatLand));
    }
}
