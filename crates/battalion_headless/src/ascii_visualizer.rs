//! ASCII board renderer for terminal review.
//!
//! Every cell takes two characters: a symbol and the owning team's short
//! name. Units are capital letters, buildings are punctuation, and empty
//! cells show their terrain glyph. Rendering for a viewer applies that
//! team's fog of war.

use std::fmt::Write as _;

use battalion_core::prelude::*;

use crate::scenario::terrain_glyph;

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show the symbol legend.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
    /// Render what this team sees; `None` shows everything.
    pub viewer: Option<Team>,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            use_color: true,
            viewer: None,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const BLUE: &str = "\x1b[34m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const WHITE: &str = "\x1b[37m";
}

fn team_color(team: Team) -> &'static str {
    match team {
        Team::Red => colors::RED,
        Team::Blue => colors::BLUE,
        Team::Green => colors::GREEN,
        Team::Yellow => colors::YELLOW,
        Team::None => colors::WHITE,
    }
}

/// Symbol for a unit type.
pub const fn unit_char(ty: UnitType) -> char {
    match ty {
        UnitType::Soldier => 'S',
        UnitType::Bazooka => 'Z',
        UnitType::Tank => 'T',
        UnitType::TankBig => 'H',
        UnitType::TankAntiAir => 'F',
        UnitType::Artillery => 'A',
        UnitType::Mortar => 'M',
        UnitType::Turret => 'X',
        UnitType::SpeedBoat => 'P',
        UnitType::Ship => 'C',
        UnitType::ShipAntiAir => 'K',
        UnitType::ShipArtillery => 'G',
        UnitType::Submarine => 'U',
        UnitType::ShipTransporter => 'L',
        UnitType::Airplane => 'J',
        UnitType::Zeppelin => 'E',
        UnitType::AirTransporter => 'V',
    }
}

/// Symbol for a building type.
pub const fn building_char(ty: BuildingType) -> char {
    match ty {
        BuildingType::OilRefinery => '$',
        BuildingType::OilRefineryBig => '%',
        BuildingType::OilRig => '@',
        BuildingType::Factory => '&',
        BuildingType::Capital => '*',
        BuildingType::ControllerLand => '+',
        BuildingType::ControllerWater => '#',
        BuildingType::ControllerAir => '!',
    }
}

/// What to draw on one cell.
struct Glyph {
    symbol: char,
    team: Option<Team>,
}

fn cell_glyph(game: &Game, cell: Cell, viewer: Option<Team>) -> Glyph {
    if let Some(unit) = game.unit_at(cell) {
        let seen = viewer.map_or(true, |v| unit.team == v || game.is_visible(v, cell));
        if seen {
            return Glyph {
                symbol: unit_char(unit.ty),
                team: Some(unit.team),
            };
        }
    }
    if let Some(building) = game.building_at(cell) {
        return Glyph {
            symbol: building_char(building.ty),
            team: Some(building.team),
        };
    }
    Glyph {
        symbol: game.terrain(cell).map_or(' ', terrain_glyph),
        team: None,
    }
}

/// Render the board with a status header.
pub fn render_board(game: &Game, config: &AsciiConfig) -> String {
    let (bold, dim, reset) = if config.use_color {
        (colors::BOLD, colors::DIM, colors::RESET)
    } else {
        ("", "", "")
    };
    let mut output = String::new();

    let status = if game.is_finished() {
        match game.winner() {
            Some(team) => format!("finished, {team} wins"),
            None => "finished".to_string(),
        }
    } else if game.is_started() {
        format!("turn {}, {} to move", game.turn_count(), game.turn())
    } else {
        "not started".to_string()
    };
    let _ = writeln!(output, "{bold}Battalion: {status}{reset}");

    let money: Vec<String> = game
        .participants()
        .iter()
        .map(|&team| format!("{team} {}", game.money(team)))
        .collect();
    let _ = writeln!(output, "money: {}", money.join(", "));
    if let Some(viewer) = config.viewer {
        let _ = writeln!(output, "{dim}view: {viewer}{reset}");
    }

    let bounds = game.bounds();
    output.push_str("    ");
    for x in 0..bounds.width() {
        let _ = write!(output, "{:<2}", x % 100);
    }
    output.push('\n');

    for y in 0..bounds.height() {
        let _ = write!(output, "{y:>3} ");
        for x in 0..bounds.width() {
            let glyph = cell_glyph(game, Cell::new(x, y), config.viewer);
            match glyph.team {
                Some(team) if config.use_color => {
                    let _ = write!(
                        output,
                        "{}{}{}{reset}",
                        team_color(team),
                        glyph.symbol,
                        team.short_name()
                    );
                }
                Some(team) => {
                    output.push(glyph.symbol);
                    output.push(team.short_name());
                }
                None => {
                    output.push(glyph.symbol);
                    output.push(' ');
                }
            }
        }
        output.push('\n');
    }

    if config.show_legend {
        output.push_str(&legend(game, config.viewer));
    }
    output
}

/// One line per symbol type on the board.
fn legend(game: &Game, viewer: Option<Team>) -> String {
    let mut units: Vec<UnitType> = game
        .units()
        .filter(|(_, u)| viewer.map_or(true, |v| u.team == v || game.is_visible(v, u.pos)))
        .map(|(_, u)| u.ty)
        .collect();
    units.sort_by_key(|ty| unit_char(*ty));
    units.dedup();
    let mut buildings: Vec<BuildingType> = game.buildings().map(|b| b.ty).collect();
    buildings.sort_by_key(|ty| building_char(*ty));
    buildings.dedup();

    let mut output = String::from("legend:");
    for ty in units {
        let _ = write!(output, " {}={ty}", unit_char(ty));
    }
    for ty in buildings {
        let _ = write!(output, " {}={ty}", building_char(ty));
    }
    output.push('\n');
    output
}
