//! Scenario files.
//!
//! A scenario is a named level kept in RON. Terrain is drawn as rows of
//! glyphs so maps stay readable in a text editor; buildings, units and
//! starting money use the core descriptors directly.
//!
//! ```text
//! (
//!     name: "tiny",
//!     map: [
//!         "..~",
//!         "..~",
//!     ],
//!     units: [
//!         (x: 0, y: 0, ty: Soldier, team: Red),
//!         (x: 1, y: 1, ty: Soldier, team: Blue),
//!     ],
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use battalion_core::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The map has no rows or an empty first row.
    #[error("Scenario map is empty")]
    EmptyMap,
    /// A map row differs in length from the first one.
    #[error("Map row {row} has {actual} cells, expected {expected}")]
    RaggedMap {
        /// Offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        actual: usize,
    },
    /// A map character names no terrain.
    #[error("Unknown terrain glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph {
        /// The character.
        glyph: char,
        /// Column.
        x: usize,
        /// Row.
        y: usize,
    },
    /// The map does not fit the grid's coordinate range.
    #[error("Map of {width}x{height} cells is too large")]
    Oversized {
        /// Columns.
        width: usize,
        /// Rows.
        height: usize,
    },
    /// The assembled level breaks a construction rule.
    #[error("Invalid level: {0}")]
    Invalid(#[from] LevelError),
}

/// Scenarios compiled into the binary, by name.
pub const BUILTIN_SCENARIOS: [(&str, &str); 2] = [
    ("skirmish", include_str!("../levels/skirmish.ron")),
    ("duel", include_str!("../levels/duel.ron")),
];

/// A named level as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Terrain rows, top row first. See [`terrain_glyph`] for the alphabet.
    pub map: Vec<String>,
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

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a scenario from a RON string.
    pub fn from_ron_str(ron: &str) -> std::result::Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// A scenario shipped with the runner.
    pub fn builtin(name: &str) -> Option<std::result::Result<Self, ScenarioError>> {
        BUILTIN_SCENARIOS
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, source)| Self::from_ron_str(source))
    }

    /// A builtin scenario by name, otherwise a file path.
    pub fn resolve(name_or_path: &str) -> std::result::Result<Self, ScenarioError> {
        Self::builtin(name_or_path).unwrap_or_else(|| Self::load(name_or_path))
    }

    /// Assemble and validate the level.
    pub fn to_level(&self) -> std::result::Result<Level, ScenarioError> {
        let expected = self
            .map
            .first()
            .map(|row| row.chars().count())
            .filter(|&width| width > 0)
            .ok_or(ScenarioError::EmptyMap)?;

        let mut terrain = Vec::with_capacity(expected * self.map.len());
        for (y, row) in self.map.iter().enumerate() {
            let actual = row.chars().count();
            if actual != expected {
                return Err(ScenarioError::RaggedMap { row: y, expected, actual });
            }
            for (x, glyph) in row.chars().enumerate() {
                terrain.push(parse_glyph(glyph).ok_or(ScenarioError::UnknownGlyph { glyph, x, y })?);
            }
        }

        let oversized = || ScenarioError::Oversized {
            width: expected,
            height: self.map.len(),
        };
        let level = Level {
            width: u16::try_from(expected).map_err(|_| oversized())?,
            height: u16::try_from(self.map.len()).map_err(|_| oversized())?,
            terrain,
            buildings: self.buildings.clone(),
            units: self.units.clone(),
            starting_money: self.starting_money.clone(),
        };
        level.validate()?;
        Ok(level)
    }
}

/// Map character for a terrain type.
pub const fn terrain_glyph(terrain: Terrain) -> char {
    match terrain {
        Terrain::FlatLand => '.',
        Terrain::RoughLand => ',',
        Terrain::ExtremeLand => '^',
        Terrain::Road => '=',
        Terrain::BridgeLow => 'b',
        Terrain::BridgeHigh => 'B',
        Terrain::Shore => ':',
        Terrain::Water => '~',
    }
}

/// Terrain type for a map character.
pub const fn parse_glyph(glyph: char) -> Option<Terrain> {
    Some(match glyph {
        '.' => Terrain::FlatLand,
        ',' => Terrain::RoughLand,
        '^' => Terrain::ExtremeLand,
        '=' => Terrain::Road,
        'b' => Terrain::BridgeLow,
        'B' => Terrain::BridgeHigh,
        ':' => Terrain::Shore,
        '~' => Terrain::Water,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = r#"(
        name: "tiny",
        map: ["..~", ",=~"],
        units: [
            (x: 0, y: 0, ty: Soldier, team: Red),
            (x: 1, y: 1, ty: Tank, team: Blue, health: Some(30)),
        ],
        starting_money: {Red: 100},
    )"#;

    #[test]
    fn test_parse_tiny_scenario() {
        let scenario = Scenario::from_ron_str(TINY).unwrap();
        assert_eq!(scenario.name, "tiny");
        assert!(scenario.description.is_empty());

        let level = scenario.to_level().unwrap();
        assert_eq!((level.width, level.height), (3, 2));
        assert_eq!(level.terrain[2], Terrain::Water);
        assert_eq!(level.terrain[3], Terrain::RoughLand);
        assert_eq!(level.terrain[4], Terrain::Road);
        assert_eq!(level.money(Team::Red), 100);
        assert_eq!(level.participants(), vec![Team::Red, Team::Blue]);
    }

    #[test]
    fn test_glyphs_cover_every_terrain() {
        for terrain in [
            Terrain::FlatLand,
            Terrain::RoughLand,
            Terrain::ExtremeLand,
            Terrain::Road,
            Terrain::BridgeLow,
            Terrain::BridgeHigh,
            Terrain::Shore,
            Terrain::Water,
        ] {
            assert_eq!(parse_glyph(terrain_glyph(terrain)), Some(terrain));
        }
        assert_eq!(parse_glyph('x'), None);
    }

    #[test]
    fn test_ragged_map_rejected() {
        let scenario = Scenario {
            name: "ragged".into(),
            description: String::new(),
            map: vec!["...".into(), "..".into()],
            buildings: vec![],
            units: vec![],
            starting_money: BTreeMap::new(),
        };
        assert!(matches!(
            scenario.to_level(),
            Err(ScenarioError::RaggedMap {
                row: 1,
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_unknown_glyph_reported_with_position() {
        let mut scenario = Scenario::from_ron_str(TINY).unwrap();
        scenario.map[1] = ",?~".into();
        assert!(matches!(
            scenario.to_level(),
            Err(ScenarioError::UnknownGlyph { glyph: '?', x: 1, y: 1 })
        ));
    }

    #[test]
    fn test_level_rules_still_apply() {
        let mut scenario = Scenario::from_ron_str(TINY).unwrap();
        scenario.units[0].x = 2;
        assert!(matches!(
            scenario.to_level(),
            Err(ScenarioError::Invalid(LevelError::UnitTerrain { .. }))
        ));
    }

    #[test]
    fn test_empty_map_rejected() {
        let mut scenario = Scenario::from_ron_str(TINY).unwrap();
        scenario.map.clear();
        assert!(matches!(scenario.to_level(), Err(ScenarioError::EmptyMap)));
    }

    #[test]
    fn test_builtins_are_valid() {
        for (name, _) in BUILTIN_SCENARIOS {
            let scenario = Scenario::builtin(name).unwrap().unwrap();
            assert_eq!(scenario.name, name);
            scenario.to_level().unwrap();
        }
        assert!(Scenario::builtin("nowhere").is_none());
    }

    #[test]
    fn test_missing_file() {
        let err = Scenario::resolve("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }
}
