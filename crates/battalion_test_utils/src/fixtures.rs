//! Test fixtures and helpers.
//!
//! Canned levels and game states for consistent testing, plus a small
//! legal-action enumerator for driving games without the search crate.

use battalion_core::prelude::*;

/// A flat, empty map builder.
#[must_use]
pub fn open_level(width: u16, height: u16) -> LevelBuilder {
    LevelBuilder::new(width, height)
}

/// Build a game from `level` and perform `Start`.
///
/// # Panics
///
/// Panics if the level is invalid.
#[must_use]
pub fn started(level: &Level) -> Game {
    let mut game = Game::new(level).expect("fixture level is valid");
    game.perform(&Action::Start).expect("fresh game starts");
    game
}

/// The unit on `cell`.
///
/// # Panics
///
/// Panics if the cell is empty.
#[must_use]
pub fn unit_on(game: &Game, cell: Cell) -> &Unit {
    game.unit_at(cell)
        .unwrap_or_else(|| panic!("expected a unit on {cell}"))
}

/// A lone soldier on a 10x10 flat map.
#[must_use]
pub fn lone_soldier(at: Cell) -> Level {
    let mut builder = open_level(10, 10);
    builder.unit(UnitDesc::new(at, UnitType::Soldier, Team::Red));
    builder.build().expect("fixture level is valid")
}

/// Two soldiers side by side, Red on (2, 2) and Blue on (3, 2).
#[must_use]
pub fn adjacent_soldiers() -> Level {
    let mut builder = open_level(6, 6);
    builder
        .unit(UnitDesc::new(Cell::new(2, 2), UnitType::Soldier, Team::Red))
        .unit(UnitDesc::new(Cell::new(3, 2), UnitType::Soldier, Team::Blue));
    builder.build().expect("fixture level is valid")
}

/// A small two-team map with factories, controllers, income and a river.
///
/// ```text
///   x: 0 1 2 3 4 5 6 7 8 9 10 11
/// y=0  F L . . . ~ ~ . . . .  .
/// y=1  . . . . . ~ S . . ^ .  .
/// y=2  . s . . . ~ ~ . . . .  .
/// y=3  . . T . . = = . . . .  .
/// y=4  A . . . . ~ ~ . . T .  .
/// y=5  . . # # . ~ u . . . s  .
/// y=6  . . . . . ~ ~ . . . .  .
/// y=7  . . R . . ~ O . . . L  F
/// ```
#[must_use]
pub fn skirmish_level() -> Level {
    let mut builder = open_level(12, 8);
    builder
        .terrain_rect(Cell::new(5, 0), 2, 8, Terrain::Water)
        .terrain(Cell::new(5, 3), Terrain::BridgeHigh)
        .terrain(Cell::new(6, 3), Terrain::BridgeHigh)
        .terrain_rect(Cell::new(2, 5), 2, 1, Terrain::RoughLand)
        .terrain(Cell::new(9, 1), Terrain::ExtremeLand)
        .building(BuildingDesc::new(Cell::new(0, 0), BuildingType::Factory, Team::Red))
        .building(BuildingDesc::new(Cell::new(1, 0), BuildingType::ControllerLand, Team::Red))
        .building(BuildingDesc::new(Cell::new(2, 7), BuildingType::OilRefinery, Team::None))
        .building(BuildingDesc::new(Cell::new(6, 7), BuildingType::OilRig, Team::None))
        .building(BuildingDesc::new(Cell::new(10, 7), BuildingType::ControllerLand, Team::Blue))
        .building(BuildingDesc::new(Cell::new(11, 7), BuildingType::Factory, Team::Blue))
        .unit(UnitDesc::new(Cell::new(1, 2), UnitType::Soldier, Team::Red))
        .unit(UnitDesc::new(Cell::new(2, 3), UnitType::Tank, Team::Red))
        .unit(UnitDesc::new(Cell::new(0, 4), UnitType::Artillery, Team::Red))
        .unit(UnitDesc::new(Cell::new(6, 1), UnitType::Ship, Team::Red))
        .unit(UnitDesc::new(Cell::new(10, 5), UnitType::Soldier, Team::Blue))
        .unit(UnitDesc::new(Cell::new(9, 4), UnitType::Tank, Team::Blue))
        .unit(UnitDesc::new(Cell::new(6, 5), UnitType::Submarine, Team::Blue))
        .money(Team::Red, 600)
        .money(Team::Blue, 600);
    builder.build().expect("fixture level is valid")
}

/// Every action the acting team could take, in a stable order.
///
/// Covers turn end, moves, attacks, repairs and builds; enough to drive
/// randomized games.
#[must_use]
pub fn legal_actions(game: &Game) -> Vec<Action> {
    if !game.is_started() {
        return vec![Action::Start];
    }
    if game.is_finished() {
        return Vec::new();
    }
    let mut actions = vec![Action::TurnEnd];
    let team = game.turn();
    for (id, unit) in game.team_units(team) {
        if !unit.active {
            continue;
        }
        let Some(solution) = game.solution(id, Vision::Fog) else {
            continue;
        };
        for target in solution.attackable().cells() {
            match unit.stats().weapon {
                Weapon::CloseRange => {
                    if let Some(path) = solution.path_for_attack(target) {
                        actions.push(Action::UnitMoveAndAttack {
                            unit: unit.pos,
                            path,
                            target,
                        });
                    }
                }
                Weapon::LongRange { .. } => actions.push(Action::UnitAttackLongRange {
                    unit: unit.pos,
                    target,
                }),
                Weapon::None => {}
            }
        }
        for dest in solution.reachable().cells().filter(|&c| c != unit.pos) {
            if let Some(path) = solution.path_to(dest) {
                actions.push(Action::UnitMove { unit: unit.pos, path });
            }
        }
        if game.can_repair(unit.pos) {
            actions.push(Action::UnitRepair { unit: unit.pos });
        }
    }
    for building in game.buildings().filter(|b| b.team == team) {
        for ty in UnitType::ALL {
            if game.can_build(building.pos, ty) {
                actions.push(Action::UnitBuild {
                    factory: building.pos,
                    unit_type: ty,
                });
            }
        }
    }
    actions
}

/// Perform one legal action per choice, picking `choice % count`.
///
/// Returns the actions performed. Stops early when the game ends.
///
/// # Panics
///
/// Panics if an enumerated action is rejected.
pub fn play_choices(game: &mut Game, choices: &[usize]) -> Vec<Action> {
    let mut played = Vec::with_capacity(choices.len());
    for &choice in choices {
        let actions = legal_actions(game);
        if actions.is_empty() {
            break;
        }
        let action = actions[choice % actions.len()].clone();
        game.perform(&action)
            .unwrap_or_else(|e| panic!("enumerated action {action} rejected: {e}"));
        played.push(action);
    }
    played
}
