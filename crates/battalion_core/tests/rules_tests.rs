//! Turn engine rule tests: validation, economy, conquest, transport and
//! repair.

use std::sync::{Arc, Mutex};

use battalion_core::prelude::*;
use battalion_test_utils::fixtures::{adjacent_soldiers, lone_soldier, skirmish_level, started, unit_on};

fn duel() -> Level {
    let mut builder = LevelBuilder::new(8, 8);
    builder
        .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Soldier, Team::Red))
        .unit(UnitDesc::new(Cell::new(7, 7), UnitType::Soldier, Team::Blue))
        .building(BuildingDesc::new(Cell::new(2, 0), BuildingType::OilRefinery, Team::None));
    builder.build().unwrap()
}

/// Assert `action` is rejected with `expected` and leaves the game untouched.
fn assert_rejected(game: &mut Game, action: Action, expected: &ActionError) {
    let before = game.state_hash();
    assert!(!game.is_legal(&action), "{action} should be illegal");
    let err = game.perform(&action).unwrap_err();
    assert_eq!(&err, expected, "{action}");
    assert_eq!(game.state_hash(), before, "{action} changed the state");
}

#[test]
fn start_happens_once() {
    let mut game = Game::new(&duel()).unwrap();
    assert_eq!(game.perform(&Action::TurnEnd), Err(ActionError::NotStarted));

    let outcome = game.perform(&Action::Start).unwrap();
    assert_eq!(
        outcome.events,
        vec![GameEvent::TurnBegan {
            team: Team::Red,
            turn: 1
        }]
    );
    assert!(unit_on(&game, Cell::new(0, 0)).active);
    assert!(!unit_on(&game, Cell::new(7, 7)).active);
    assert_eq!(game.perform(&Action::Start), Err(ActionError::AlreadyStarted));
}

#[test]
fn turns_rotate_between_participants() {
    let mut game = started(&duel());
    assert_eq!(game.turn(), Team::Red);
    game.perform(&Action::TurnEnd).unwrap();
    assert_eq!(game.turn(), Team::Blue);
    assert!(unit_on(&game, Cell::new(7, 7)).active);
    assert!(!unit_on(&game, Cell::new(0, 0)).active);
    game.perform(&Action::TurnEnd).unwrap();
    assert_eq!(game.turn(), Team::Red);
    assert_eq!(game.turn_count(), 3);
}

#[test]
fn move_validation_rejects_atomically() {
    let mut game = started(&adjacent_soldiers());
    let red = Cell::new(2, 2);

    assert_rejected(
        &mut game,
        Action::UnitMove {
            unit: Cell::new(3, 2),
            path: vec![Cell::new(4, 2)],
        },
        &ActionError::WrongTurn {
            team: Team::Blue,
            turn: Team::Red,
        },
    );
    assert_rejected(
        &mut game,
        Action::UnitMove { unit: red, path: vec![] },
        &ActionError::IllegalPath("empty path"),
    );
    assert_rejected(
        &mut game,
        Action::UnitMove {
            unit: red,
            path: vec![Cell::new(2, 4)],
        },
        &ActionError::IllegalPath("path is not contiguous"),
    );
    assert_rejected(
        &mut game,
        Action::UnitMove {
            unit: red,
            path: vec![Cell::new(2, 3), Cell::new(2, 4), Cell::new(2, 5), Cell::new(1, 5)],
        },
        &ActionError::IllegalPath("path exceeds move limit"),
    );
    assert_rejected(
        &mut game,
        Action::UnitMove {
            unit: red,
            path: vec![Cell::new(3, 2)],
        },
        &ActionError::IllegalPath("path leaves the passable area"),
    );
    assert_rejected(
        &mut game,
        Action::UnitMove {
            unit: red,
            path: vec![Cell::new(2, 3), Cell::new(2, 2)],
        },
        &ActionError::IllegalPath("path returns to its start"),
    );
    assert_rejected(
        &mut game,
        Action::UnitMove {
            unit: Cell::new(0, 0),
            path: vec![Cell::new(1, 0)],
        },
        &ActionError::NoUnit(Cell::new(0, 0)),
    );
    assert_rejected(
        &mut game,
        Action::UnitMove {
            unit: Cell::new(9, 9),
            path: vec![Cell::new(8, 9)],
        },
        &ActionError::OutOfBounds(Cell::new(9, 9)),
    );
}

#[test]
fn moved_unit_is_spent() {
    let mut game = started(&duel());
    let outcome = game
        .perform(&Action::UnitMove {
            unit: Cell::new(0, 0),
            path: vec![Cell::new(0, 1), Cell::new(1, 1)],
        })
        .unwrap();
    assert_eq!(outcome.events.len(), 1);
    assert!(game.unit_at(Cell::new(0, 0)).is_none());
    game.assert_invariants();

    assert_rejected(
        &mut game,
        Action::UnitMove {
            unit: Cell::new(1, 1),
            path: vec![Cell::new(1, 2)],
        },
        &ActionError::Inactive(Cell::new(1, 1)),
    );
}

#[test]
fn conquest_takes_three_turns_from_neutral() {
    let mut game = started(&duel());
    let refinery = Cell::new(2, 0);

    let outcome = game
        .perform(&Action::UnitMove {
            unit: Cell::new(0, 0),
            path: vec![Cell::new(1, 0), refinery],
        })
        .unwrap();
    assert!(outcome.events.contains(&GameEvent::ConquerProgressed {
        pos: refinery,
        team: Team::Red,
        progress: 1,
    }));

    // Red's end of turn hands over to Blue: no progress for Red.
    let outcome = game.perform(&Action::TurnEnd).unwrap();
    assert!(!outcome
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::ConquerProgressed { .. })));

    let outcome = game.perform(&Action::TurnEnd).unwrap();
    assert!(outcome.events.contains(&GameEvent::ConquerProgressed {
        pos: refinery,
        team: Team::Red,
        progress: 2,
    }));

    game.perform(&Action::TurnEnd).unwrap();
    let outcome = game.perform(&Action::TurnEnd).unwrap();
    assert!(outcome.events.contains(&GameEvent::BuildingConquered {
        pos: refinery,
        ty: BuildingType::OilRefinery,
        from: Team::None,
        to: Team::Red,
    }));
    let building = game.building_at(refinery).unwrap();
    assert_eq!(building.team, Team::Red);
    assert_eq!(building.conquer_progress, 0);

    // The refinery now yields at every turn end.
    let outcome = game.perform(&Action::TurnEnd).unwrap();
    assert!(outcome.events.contains(&GameEvent::MoneyChanged {
        team: Team::Red,
        delta: 20,
        balance: 20,
    }));
    assert_eq!(game.money(Team::Red), 20);
}

#[test]
fn leaving_a_building_resets_conquest() {
    let mut game = started(&duel());
    let refinery = Cell::new(2, 0);
    game.perform(&Action::UnitMove {
        unit: Cell::new(0, 0),
        path: vec![Cell::new(1, 0), refinery],
    })
    .unwrap();
    game.perform(&Action::TurnEnd).unwrap();
    game.perform(&Action::TurnEnd).unwrap();
    assert_eq!(game.building_at(refinery).unwrap().conquer_progress, 2);

    let outcome = game
        .perform(&Action::UnitMove {
            unit: refinery,
            path: vec![Cell::new(3, 0)],
        })
        .unwrap();
    assert!(outcome
        .events
        .contains(&GameEvent::ConquerReset { pos: refinery }));
    let building = game.building_at(refinery).unwrap();
    assert_eq!(building.conquer_progress, 0);
    assert_eq!(building.conquer_team, None);
    assert_eq!(building.team, Team::None);
}

#[test]
fn factory_builds_with_controller() {
    let mut game = started(&skirmish_level());
    let factory = Cell::new(0, 0);

    assert!(game.can_build(factory, UnitType::Soldier));
    assert!(!game.can_build(factory, UnitType::Airplane));
    assert!(!game.can_build(factory, UnitType::Ship));
    assert!(!game.can_build(factory, UnitType::Turret));

    let outcome = game
        .perform(&Action::UnitBuild {
            factory,
            unit_type: UnitType::Soldier,
        })
        .unwrap();
    assert!(matches!(
        outcome.events[0],
        GameEvent::MoneyChanged {
            team: Team::Red,
            delta: -75,
            balance: 525
        }
    ));
    assert!(matches!(outcome.events[1], GameEvent::UnitAdded { .. }));
    assert!(matches!(outcome.events[2], GameEvent::UnitBuilt { .. }));

    let soldier = unit_on(&game, factory);
    assert_eq!(soldier.team, Team::Red);
    assert!(!soldier.active);
    assert_eq!(game.money(Team::Red), 525);

    assert_rejected(
        &mut game,
        Action::UnitBuild {
            factory,
            unit_type: UnitType::Tank,
        },
        &ActionError::FactoryBlocked(factory),
    );
    assert_rejected(
        &mut game,
        Action::UnitBuild {
            factory: Cell::new(11, 7),
            unit_type: UnitType::Soldier,
        },
        &ActionError::WrongTurn {
            team: Team::Blue,
            turn: Team::Red,
        },
    );
    assert_rejected(
        &mut game,
        Action::UnitBuild {
            factory: Cell::new(2, 7),
            unit_type: UnitType::Soldier,
        },
        &ActionError::WrongTurn {
            team: Team::None,
            turn: Team::Red,
        },
    );
    assert_rejected(
        &mut game,
        Action::UnitBuild {
            factory: Cell::new(3, 3),
            unit_type: UnitType::Soldier,
        },
        &ActionError::NoBuilding(Cell::new(3, 3)),
    );
}

#[test]
fn build_requires_funds() {
    let mut builder = LevelBuilder::new(4, 4);
    builder
        .unit(UnitDesc::new(Cell::new(3, 3), UnitType::Soldier, Team::Red))
        .unit(UnitDesc::new(Cell::new(3, 0), UnitType::Soldier, Team::Blue))
        .building(BuildingDesc::new(Cell::new(0, 0), BuildingType::Factory, Team::Red))
        .building(BuildingDesc::new(Cell::new(1, 0), BuildingType::ControllerLand, Team::Red))
        .money(Team::Red, 50);
    let mut game = started(&builder.build().unwrap());

    assert_rejected(
        &mut game,
        Action::UnitBuild {
            factory: Cell::new(0, 0),
            unit_type: UnitType::Soldier,
        },
        &ActionError::InsufficientFunds {
            required: 75,
            available: 50,
        },
    );
}

#[test]
fn transport_round_trip() {
    let mut builder = LevelBuilder::new(8, 8);
    builder
        .unit(UnitDesc::new(Cell::new(1, 1), UnitType::Soldier, Team::Red))
        .unit(UnitDesc::new(Cell::new(7, 7), UnitType::Soldier, Team::Blue))
        .money(Team::Red, 200);
    let mut game = started(&builder.build().unwrap());
    let start = Cell::new(1, 1);

    assert!(!game.can_transport(start, UnitType::ShipTransporter));
    assert!(!game.can_transport(start, UnitType::Tank));
    let outcome = game
        .perform(&Action::UnitTransport {
            unit: start,
            transporter: UnitType::AirTransporter,
        })
        .unwrap();
    assert!(outcome
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::UnitTransported { .. })));
    assert_eq!(game.money(Team::Red), 50);

    let carrier = unit_on(&game, start);
    assert_eq!(carrier.ty, UnitType::AirTransporter);
    assert_eq!(carrier.health, 50);
    assert!(!carrier.active);
    assert_eq!(game.cargo_at(start).unwrap().ty, UnitType::Soldier);
    game.assert_invariants();

    game.perform(&Action::TurnEnd).unwrap();
    game.perform(&Action::TurnEnd).unwrap();
    assert_rejected(
        &mut game,
        Action::UnitTransport {
            unit: start,
            transporter: UnitType::AirTransporter,
        },
        &ActionError::CannotTransport {
            cell: start,
            unit: UnitType::AirTransporter,
            transporter: UnitType::AirTransporter,
        },
    );

    let target = Cell::new(4, 1);
    game.perform(&Action::UnitMove {
        unit: start,
        path: vec![Cell::new(2, 1), Cell::new(3, 1), target],
    })
    .unwrap();
    assert_eq!(game.cargo_at(target).unwrap().pos, target);

    game.perform(&Action::TurnEnd).unwrap();
    game.perform(&Action::TurnEnd).unwrap();
    assert!(game.can_finish_transport(target));
    game.perform(&Action::UnitTransportFinish { unit: target })
        .unwrap();

    let soldier = unit_on(&game, target);
    assert_eq!(soldier.ty, UnitType::Soldier);
    assert!(soldier.active);
    assert!(game.cargo_at(target).is_none());
    game.assert_invariants();
}

#[test]
fn transport_requires_funds() {
    let mut builder = LevelBuilder::new(4, 4);
    builder
        .unit(UnitDesc::new(Cell::new(1, 1), UnitType::Soldier, Team::Red))
        .unit(UnitDesc::new(Cell::new(3, 3), UnitType::Soldier, Team::Blue))
        .money(Team::Red, 100);
    let mut game = started(&builder.build().unwrap());
    assert_rejected(
        &mut game,
        Action::UnitTransport {
            unit: Cell::new(1, 1),
            transporter: UnitType::AirTransporter,
        },
        &ActionError::InsufficientFunds {
            required: 150,
            available: 100,
        },
    );
}

#[test]
fn cannot_unload_onto_water() {
    let mut builder = LevelBuilder::new(4, 4);
    builder
        .terrain(Cell::new(0, 0), Terrain::Water)
        .unit(UnitDesc::new(Cell::new(0, 0), UnitType::AirTransporter, Team::Red).carrying(UnitType::Tank))
        .unit(UnitDesc::new(Cell::new(3, 3), UnitType::Soldier, Team::Blue));
    let mut game = started(&builder.build().unwrap());
    assert_rejected(
        &mut game,
        Action::UnitTransportFinish {
            unit: Cell::new(0, 0),
        },
        &ActionError::CannotUnload(Cell::new(0, 0)),
    );
}

#[test]
fn repair_heals_at_next_own_turn() {
    let mut builder = LevelBuilder::new(6, 6);
    builder
        .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Soldier, Team::Red).with_health(20))
        .unit(UnitDesc::new(Cell::new(5, 5), UnitType::Soldier, Team::Blue))
        .money(Team::Red, 100);
    let mut game = started(&builder.build().unwrap());
    let cell = Cell::new(0, 0);

    assert!(!game.can_repair(Cell::new(5, 5)));
    game.perform(&Action::UnitRepair { unit: cell }).unwrap();
    assert_eq!(game.money(Team::Red), 82);
    assert!(unit_on(&game, cell).repairing);
    assert!(!unit_on(&game, cell).active);

    game.perform(&Action::TurnEnd).unwrap();
    assert_eq!(unit_on(&game, cell).health, 20);
    let outcome = game.perform(&Action::TurnEnd).unwrap();
    assert!(outcome.events.iter().any(|e| matches!(
        e,
        GameEvent::UnitHealed { amount: 12, .. }
    )));
    let soldier = unit_on(&game, cell);
    assert_eq!(soldier.health, 32);
    assert!(!soldier.repairing);
    assert!(soldier.active);
}

#[test]
fn full_health_unit_cannot_repair() {
    let mut builder = LevelBuilder::new(4, 4);
    builder
        .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Soldier, Team::Red))
        .unit(UnitDesc::new(Cell::new(3, 3), UnitType::Soldier, Team::Blue))
        .money(Team::Red, 100);
    let mut game = started(&builder.build().unwrap());
    assert_rejected(
        &mut game,
        Action::UnitRepair {
            unit: Cell::new(0, 0),
        },
        &ActionError::CannotRepair(Cell::new(0, 0)),
    );
}

#[test]
fn single_team_game_never_ends_by_turns() {
    let mut game = started(&lone_soldier(Cell::new(4, 4)));
    for _ in 0..5 {
        game.perform(&Action::TurnEnd).unwrap();
        assert_eq!(game.turn(), Team::Red);
    }
    assert!(!game.is_finished());
}

#[test]
fn listeners_see_every_event_in_order() {
    let mut game = started(&adjacent_soldiers());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    game.subscribe(move |event: &GameEvent| sink.lock().unwrap().push(event.clone()));

    let mut expected = Vec::new();
    for action in [
        Action::UnitMoveAndAttack {
            unit: Cell::new(2, 2),
            path: vec![],
            target: Cell::new(3, 2),
        },
        Action::TurnEnd,
    ] {
        expected.extend(game.perform(&action).unwrap().events);
    }
    assert_eq!(*seen.lock().unwrap(), expected);
}

#[test]
fn clones_are_isolated() {
    let mut game = started(&duel());
    let counter = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&counter);
    game.subscribe(move |_: &GameEvent| *sink.lock().unwrap() += 1);

    let original = game.state_hash();
    let mut copy = game.clone();
    assert_eq!(copy.state_hash(), original);

    copy.perform(&Action::UnitMove {
        unit: Cell::new(0, 0),
        path: vec![Cell::new(1, 0)],
    })
    .unwrap();
    copy.perform(&Action::TurnEnd).unwrap();

    assert_ne!(copy.state_hash(), original);
    assert_eq!(game.state_hash(), original);
    assert!(game.unit_at(Cell::new(0, 0)).is_some());
    assert_eq!(*counter.lock().unwrap(), 0, "clones do not inherit listeners");
}

/// A water channel with a Red ship, a hidden Blue submarine and a Blue ship.
fn submarine_channel() -> Level {
    let mut builder = LevelBuilder::new(8, 3);
    builder
        .terrain_rect(Cell::new(0, 1), 8, 1, Terrain::Water)
        .unit(UnitDesc::new(Cell::new(0, 1), UnitType::Ship, Team::Red))
        .unit(UnitDesc::new(Cell::new(3, 1), UnitType::Submarine, Team::Blue))
        .unit(UnitDesc::new(Cell::new(5, 1), UnitType::Ship, Team::Blue));
    builder.build().unwrap()
}

fn through_the_submarine() -> Vec<Cell> {
    vec![Cell::new(1, 1), Cell::new(2, 1), Cell::new(3, 1), Cell::new(4, 1)]
}

#[test]
fn move_stops_before_hidden_submarine() {
    let mut game = started(&submarine_channel());
    let ship = game.unit_id_at(Cell::new(0, 1)).unwrap();
    assert!(!game.is_visible(Team::Red, Cell::new(3, 1)));

    let outcome = game
        .perform(&Action::UnitMove {
            unit: Cell::new(0, 1),
            path: through_the_submarine(),
        })
        .unwrap();

    assert_eq!(
        outcome.events,
        vec![GameEvent::UnitMoved {
            unit: ship,
            from: Cell::new(0, 1),
            path: vec![Cell::new(1, 1), Cell::new(2, 1)],
        }]
    );
    let moved = unit_on(&game, Cell::new(2, 1));
    assert_eq!(moved.ty, UnitType::Ship);
    assert!(!moved.active);
    assert_eq!(unit_on(&game, Cell::new(3, 1)).health, 25);
    assert!(game.is_visible(Team::Red, Cell::new(3, 1)));
}

#[test]
fn ambushed_attack_never_strikes() {
    let mut game = started(&submarine_channel());
    let outcome = game
        .perform(&Action::UnitMoveAndAttack {
            unit: Cell::new(0, 1),
            path: through_the_submarine(),
            target: Cell::new(5, 1),
        })
        .unwrap();

    assert!(outcome
        .events
        .iter()
        .all(|e| !matches!(e, GameEvent::UnitDamaged { .. })));
    assert!(matches!(outcome.events[0], GameEvent::UnitMoved { .. }));
    assert!(!unit_on(&game, Cell::new(2, 1)).active);
    assert_eq!(unit_on(&game, Cell::new(5, 1)).health, 90);
}

#[test]
fn own_unit_beside_submarine_exposes_it() {
    let mut builder = LevelBuilder::new(8, 3);
    builder
        .terrain_rect(Cell::new(0, 1), 8, 1, Terrain::Water)
        .unit(UnitDesc::new(Cell::new(0, 1), UnitType::Ship, Team::Red))
        .unit(UnitDesc::new(Cell::new(2, 1), UnitType::Ship, Team::Red))
        .unit(UnitDesc::new(Cell::new(3, 1), UnitType::Submarine, Team::Blue));
    let mut game = started(&builder.build().unwrap());

    // A path can never end its real part on a friendly cell next to a
    // hidden enemy: that friendly unit already reveals it.
    assert!(game.is_visible(Team::Red, Cell::new(3, 1)));
    assert_rejected(
        &mut game,
        Action::UnitMove {
            unit: Cell::new(0, 1),
            path: through_the_submarine(),
        },
        &ActionError::IllegalPath("path leaves the passable area"),
    );
}
