//! Static terrain categories and the terrain sets units stand on.

use serde::{Deserialize, Serialize};

use crate::grid::{Bounds, Cell, CellArray, Direction};

/// Per-cell terrain category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    /// Open plains.
    #[default]
    FlatLand,
    /// Forest and hills.
    RoughLand,
    /// Mountains.
    ExtremeLand,
    /// Paved road.
    Road,
    /// Bridge too low for ships to pass under.
    BridgeLow,
    /// Bridge ships can pass under.
    BridgeHigh,
    /// Beach between land and water.
    Shore,
    /// Open water.
    Water,
}

impl Terrain {
    /// Every terrain category.
    pub const ALL: [Self; 8] = [
        Self::FlatLand,
        Self::RoughLand,
        Self::ExtremeLand,
        Self::Road,
        Self::BridgeLow,
        Self::BridgeHigh,
        Self::Shore,
        Self::Water,
    ];

    /// Whether this is one of the bridge categories.
    #[must_use]
    pub const fn is_bridge(self) -> bool {
        matches!(self, Self::BridgeLow | Self::BridgeHigh)
    }

    /// Roads and bridges connect to a bridge along its axis.
    #[must_use]
    pub const fn is_road(self) -> bool {
        matches!(self, Self::Road | Self::BridgeLow | Self::BridgeHigh)
    }

    /// Open water.
    #[must_use]
    pub const fn is_water(self) -> bool {
        matches!(self, Self::Water)
    }
}

/// Named sets of terrain a unit type can stand on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainSet {
    /// Flat land, roads and bridges.
    LandFlat,
    /// [`TerrainSet::LandFlat`] plus rough land and shore.
    LandRough,
    /// [`TerrainSet::LandRough`] plus mountains.
    LandExtreme,
    /// Water, shore and high bridges.
    Water,
    /// Water and both bridge heights.
    WaterDeep,
    /// Everything.
    Any,
}

impl TerrainSet {
    /// Check membership.
    #[must_use]
    pub const fn contains(self, terrain: Terrain) -> bool {
        use Terrain as T;
        match self {
            Self::LandFlat => matches!(terrain, T::FlatLand | T::Road | T::BridgeLow | T::BridgeHigh),
            Self::LandRough => {
                Self::LandFlat.contains(terrain) || matches!(terrain, T::RoughLand | T::Shore)
            }
            Self::LandExtreme => {
                Self::LandRough.contains(terrain) || matches!(terrain, T::ExtremeLand)
            }
            Self::Water => matches!(terrain, T::Water | T::BridgeHigh | T::Shore),
            Self::WaterDeep => matches!(terrain, T::Water | T::BridgeLow | T::BridgeHigh),
            Self::Any => true,
        }
    }
}

/// Orientation of a bridge span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeAxis {
    /// Spans along the x axis.
    Horizontal,
    /// Spans along the y axis.
    Vertical,
}

/// Work out which way the bridge at `cell` runs.
///
/// Adjacent roads connect along their direction; adjacent water implies the
/// bridge crosses it, connecting along the orthogonal axis. Returns `None`
/// when the connections do not settle on a single axis.
#[must_use]
pub fn bridge_axis(terrain: &CellArray<Terrain>, cell: Cell) -> Option<BridgeAxis> {
    let bounds: Bounds = terrain.bounds();
    let mut along_x = false;
    let mut along_y = false;
    for dir in Direction::ALL {
        let Some(neighbor) = cell.neighbor(dir).filter(|&n| bounds.contains(n)) else {
            continue;
        };
        let t = terrain[neighbor];
        let x_dir = matches!(dir, Direction::XPos | Direction::XNeg);
        if t.is_road() {
            if x_dir {
                along_x = true;
            } else {
                along_y = true;
            }
        } else if t.is_water() {
            if x_dir {
                along_y = true;
            } else {
                along_x = true;
            }
        }
    }
    match (along_x, along_y) {
        (true, true) => None,
        (false, true) => Some(BridgeAxis::Vertical),
        _ => Some(BridgeAxis::Horizontal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(row: &[Terrain]) -> CellArray<Terrain> {
        let bounds = Bounds::new(u16::try_from(row.len()).unwrap(), 1);
        CellArray::from_fn(bounds, |c| row[c.x() as usize])
    }

    #[test]
    fn test_terrain_sets_nest() {
        for terrain in Terrain::ALL {
            if TerrainSet::LandFlat.contains(terrain) {
                assert!(TerrainSet::LandRough.contains(terrain));
            }
            if TerrainSet::LandRough.contains(terrain) {
                assert!(TerrainSet::LandExtreme.contains(terrain));
            }
            assert!(TerrainSet::Any.contains(terrain));
        }
        assert!(!TerrainSet::LandExtreme.contains(Terrain::Water));
        assert!(TerrainSet::WaterDeep.contains(Terrain::BridgeLow));
        assert!(!TerrainSet::Water.contains(Terrain::BridgeLow));
    }

    #[test]
    fn test_bridge_between_roads_is_horizontal() {
        let terrain = strip(&[Terrain::Road, Terrain::BridgeHigh, Terrain::Road]);
        assert_eq!(bridge_axis(&terrain, Cell::new(1, 0)), Some(BridgeAxis::Horizontal));
    }

    #[test]
    fn test_bridge_over_water_runs_across() {
        let terrain = strip(&[Terrain::Water, Terrain::BridgeLow, Terrain::Water]);
        assert_eq!(bridge_axis(&terrain, Cell::new(1, 0)), Some(BridgeAxis::Vertical));
    }

    #[test]
    fn test_bridge_with_mixed_connections_is_ambiguous() {
        let terrain = strip(&[Terrain::Road, Terrain::BridgeLow, Terrain::Water]);
        assert_eq!(bridge_axis(&terrain, Cell::new(1, 0)), None);
    }
}
