//! Movement solver and fog-of-war tests against full games.

use battalion_core::prelude::*;
use battalion_test_utils::determinism::strategies::arb_cell;
use battalion_test_utils::fixtures::{lone_soldier, started};
use proptest::prelude::*;

fn manhattan_ball(bounds: Bounds, center: Cell, radius: u32) -> Vec<Cell> {
    bounds
        .cells()
        .filter(|c| c.manhattan(center) <= radius)
        .collect()
}

#[test]
fn soldier_in_corner_passes_manhattan_ball() {
    let game = started(&lone_soldier(Cell::new(0, 0)));
    let solution = game.solution_at(Cell::new(0, 0), Vision::Fog).unwrap();

    let passable: Vec<Cell> = solution.passable().cells().collect();
    let expected = manhattan_ball(game.bounds(), Cell::new(0, 0), 3);
    assert_eq!(passable, expected);
    assert_eq!(passable.len(), 10);
}

#[test]
fn soldier_in_center_passes_full_ball() {
    let game = started(&lone_soldier(Cell::new(5, 5)));
    let solution = game.solution_at(Cell::new(5, 5), Vision::Fog).unwrap();

    assert_eq!(solution.passable().count(), 25);
    assert_eq!(
        solution.passable().cells().collect::<Vec<_>>(),
        manhattan_ball(game.bounds(), Cell::new(5, 5), 3)
    );
    // Nothing else on the board: every passable cell is a legal stop.
    assert_eq!(solution.reachable(), solution.passable());
    assert!(solution.attackable().is_empty());
}

#[test]
fn own_units_are_passable_but_not_reachable() {
    let mut builder = LevelBuilder::new(6, 1);
    builder
        .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Tank, Team::Red))
        .unit(UnitDesc::new(Cell::new(1, 0), UnitType::Soldier, Team::Red))
        .unit(UnitDesc::new(Cell::new(5, 0), UnitType::Soldier, Team::Blue));
    let game = started(&builder.build().unwrap());
    let solution = game.solution_at(Cell::new(0, 0), Vision::Fog).unwrap();

    assert!(solution.passable().contains(Cell::new(1, 0)));
    assert!(!solution.reachable().contains(Cell::new(1, 0)));
    assert!(solution.reachable().contains(Cell::new(4, 0)));
    // The enemy blocks: nothing behind it, and it is the only target.
    assert!(!solution.passable().contains(Cell::new(5, 0)));
    assert_eq!(
        solution.attackable().cells().collect::<Vec<_>>(),
        vec![Cell::new(5, 0)]
    );
    assert_eq!(
        solution.path_for_attack(Cell::new(5, 0)),
        Some(vec![
            Cell::new(1, 0),
            Cell::new(2, 0),
            Cell::new(3, 0),
            Cell::new(4, 0)
        ])
    );
}

/// Flat land with a water channel along y = 1, a Red ship at (0, 1) and a
/// Blue submarine at (2, 1).
fn channel_level() -> Level {
    let mut builder = LevelBuilder::new(8, 3);
    builder
        .terrain_rect(Cell::new(0, 1), 8, 1, Terrain::Water)
        .unit(UnitDesc::new(Cell::new(0, 1), UnitType::Ship, Team::Red))
        .unit(UnitDesc::new(Cell::new(2, 1), UnitType::Submarine, Team::Blue))
        .unit(UnitDesc::new(Cell::new(7, 0), UnitType::Soldier, Team::Blue));
    builder.build().unwrap()
}

#[test]
fn hidden_enemy_does_not_block_planning() {
    let game = started(&channel_level());
    let ship = Cell::new(0, 1);
    let sub = Cell::new(2, 1);

    assert!(!game.is_visible(Team::Red, sub));
    assert!(game.is_visible(Team::Blue, sub));

    let planned = game.solution_at(ship, Vision::Fog).unwrap();
    assert!(planned.passable().contains(sub));
    assert!(planned.reachable().contains(sub));
    assert!(planned.passable().contains(Cell::new(5, 1)));

    let actual = game.solution_at(ship, Vision::Omniscient).unwrap();
    assert!(!actual.passable().contains(sub));
    assert!(!actual.passable().contains(Cell::new(3, 1)));
}

#[test]
fn moving_next_to_submarine_reveals_it() {
    let mut game = started(&channel_level());
    game.perform(&Action::UnitMove {
        unit: Cell::new(0, 1),
        path: vec![Cell::new(1, 1)],
    })
    .unwrap();

    assert!(game.is_visible(Team::Red, Cell::new(2, 1)));
    // The visibility bitmap only holds occupied cells.
    assert!(!game.is_visible(Team::Red, Cell::new(0, 1)));
}

#[test]
fn long_range_ignores_movement() {
    let mut builder = LevelBuilder::new(8, 8);
    builder
        .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Artillery, Team::Red))
        .unit(UnitDesc::new(Cell::new(2, 0), UnitType::Soldier, Team::Blue))
        .unit(UnitDesc::new(Cell::new(3, 0), UnitType::Soldier, Team::Blue))
        .unit(UnitDesc::new(Cell::new(6, 0), UnitType::Soldier, Team::Blue));
    let game = started(&builder.build().unwrap());
    let solution = game.solution_at(Cell::new(0, 0), Vision::Fog).unwrap();

    let ring = solution.potentially_attackable();
    assert!(ring.cells().all(|c| (3..=5).contains(&c.manhattan(Cell::new(0, 0)))));
    assert_eq!(
        solution.attackable().cells().collect::<Vec<_>>(),
        vec![Cell::new(3, 0)]
    );
}

fn arb_rough_board() -> impl Strategy<Value = (Level, Cell)> {
    const TERRAIN: [Terrain; 6] = [
        Terrain::FlatLand,
        Terrain::RoughLand,
        Terrain::ExtremeLand,
        Terrain::Road,
        Terrain::Shore,
        Terrain::Water,
    ];
    (
        proptest::collection::vec(proptest::sample::select(TERRAIN.to_vec()), 64),
        arb_cell(8, 8),
    )
        .prop_map(|(terrain, start)| {
            let mut builder = LevelBuilder::new(8, 8);
            for (cell, t) in Bounds::new(8, 8).cells().zip(terrain) {
                builder.terrain(cell, t);
            }
            builder
                .terrain(start, Terrain::FlatLand)
                .unit(UnitDesc::new(start, UnitType::Tank, Team::Red));
            (builder.build().unwrap(), start)
        })
}

proptest! {
    #[test]
    fn paths_match_bfs_distances((level, start) in arb_rough_board()) {
        let game = started(&level);
        let solution = game.solution_at(start, Vision::Fog).unwrap();
        let map = solution.movement_map();

        for cell in solution.passable().cells() {
            let distance = map.distance(cell).unwrap();
            prop_assert!(distance <= UnitType::Tank.stats().move_limit);
            if cell == start {
                prop_assert_eq!(distance, 0);
                continue;
            }

            let back = cell.neighbor(map.back_direction(cell).unwrap()).unwrap();
            prop_assert_eq!(map.distance(back), Some(distance - 1));

            let path = solution.path_to(cell).unwrap();
            prop_assert_eq!(path.len() as u32, distance);
            prop_assert_eq!(path.last().copied(), Some(cell));
            let mut previous = start;
            for &step in &path {
                prop_assert!(previous.is_adjacent(step));
                prop_assert!(UnitType::Tank.can_stand_on(game.terrain(step).unwrap()));
                previous = step;
            }
        }
    }
}
