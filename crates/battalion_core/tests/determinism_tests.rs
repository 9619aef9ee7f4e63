//! Determinism, replay and serialization tests over random legal play.

use battalion_core::prelude::*;
use battalion_test_utils::determinism::strategies::{arb_battle_level, arb_choices};
use battalion_test_utils::determinism::{
    find_first_divergence, run_parallel_games, verify_game_determinism,
    verify_serialization_determinism,
};
use battalion_test_utils::fixtures::{legal_actions, play_choices, skirmish_level};
use proptest::prelude::*;

fn recorded_skirmish(choices: &[usize]) -> (Game, Replay) {
    let level = skirmish_level();
    let mut game = Game::new(&level).unwrap();
    let mut replay = Replay::new(level);
    for action in play_choices(&mut game, choices) {
        replay.record(action);
    }
    replay.finalize(&game);
    (game, replay)
}

#[test]
fn replay_reproduces_skirmish() {
    let choices: Vec<usize> = (0..80).map(|i| (i * 13) % 17).collect();
    let (game, replay) = recorded_skirmish(&choices);
    assert!(replay.action_count() > 0);
    assert!(replay.verify().unwrap());
    assert_eq!(replay.play().unwrap().state_hash(), game.state_hash());
}

#[test]
fn replay_file_round_trip() {
    let (_, replay) = recorded_skirmish(&[0, 3, 1, 4, 0, 2, 7]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skirmish.replay");

    replay.save(&path).unwrap();
    let loaded = Replay::load(&path).unwrap();
    assert_eq!(loaded, replay);
    assert!(loaded.verify().unwrap());
}

#[test]
fn replay_rejects_foreign_version() {
    let (_, mut replay) = recorded_skirmish(&[0]);
    replay.version += 1;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.replay");
    replay.save(&path).unwrap();
    assert!(matches!(Replay::load(&path), Err(GameError::InvalidState(_))));
}

#[test]
fn parallel_skirmishes_agree() {
    let level = skirmish_level();
    let mut game = Game::new(&level).unwrap();
    let actions = play_choices(&mut game, &[0, 8, 3, 0, 5, 5, 1, 0, 9, 2, 0]);
    let result = run_parallel_games(&level, &actions, 8);
    result.assert_deterministic();
    assert_eq!(result.hashes[0], game.state_hash());
}

#[test]
fn finished_game_offers_no_actions() {
    let mut builder = LevelBuilder::new(4, 4);
    builder
        .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Tank, Team::Red))
        .unit(UnitDesc::new(Cell::new(1, 0), UnitType::Soldier, Team::Blue).with_health(1));
    let mut game = Game::new(&builder.build().unwrap()).unwrap();
    game.perform(&Action::Start).unwrap();
    game.perform(&Action::UnitMoveAndAttack {
        unit: Cell::new(0, 0),
        path: vec![],
        target: Cell::new(1, 0),
    })
    .unwrap();
    assert!(game.is_finished());
    assert!(legal_actions(&game).is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn random_play_is_deterministic(level in arb_battle_level(6), choices in arb_choices(60)) {
        let result = verify_game_determinism(&level, &choices);
        prop_assert!(result.is_deterministic, "hashes: {:?}", result.hashes);
    }

    #[test]
    fn clone_per_step_matches_straight_play(level in arb_battle_level(6), choices in arb_choices(40)) {
        let mut game = Game::new(&level).unwrap();
        let actions = play_choices(&mut game, &choices);
        prop_assert_eq!(find_first_divergence(&level, &actions), None);
        game.assert_invariants();
    }

    #[test]
    fn rejected_actions_leave_state_untouched(level in arb_battle_level(6), choices in arb_choices(30)) {
        let mut game = Game::new(&level).unwrap();
        play_choices(&mut game, &choices);
        let before = game.state_hash();
        for action in [
            Action::Start,
            Action::UnitRepair { unit: Cell::new(0, 0) },
            Action::UnitTransportFinish { unit: Cell::new(1, 1) },
        ] {
            if game.is_started() && !game.is_legal(&action) {
                prop_assert!(game.perform(&action).is_err());
                prop_assert_eq!(game.state_hash(), before);
            }
        }
    }

    #[test]
    fn serialization_survives_random_play(choices in arb_choices(30), more in arb_choices(10)) {
        let mut game = Game::new(&skirmish_level()).unwrap();
        play_choices(&mut game, &choices);
        let mut probe = game.clone();
        let continuation = play_choices(&mut probe, &more);
        prop_assert!(verify_serialization_determinism(&game, &continuation));
    }
}
