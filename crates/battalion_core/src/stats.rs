//! Per-team match statistics gathered from the event stream.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::event::GameEvent;
use crate::game::Game;
use crate::team::{Team, TeamMap};

/// Counters for one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TeamStats {
    /// Turns begun.
    pub turns_played: u32,
    /// Units trained at factories.
    pub units_built: u32,
    /// Enemy units destroyed.
    pub enemies_terminated: u32,
    /// Own units lost.
    pub units_casualties: u32,
    /// Buildings captured.
    pub buildings_conquered: u32,
    /// Income received.
    pub money_gained: u64,
    /// Money paid for units, transports and repairs.
    pub money_spent: u64,
}

/// Counters for every team.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameStats {
    teams: TeamMap<TeamStats>,
}

impl GameStats {
    /// Counters of `team`.
    #[must_use]
    pub fn team(&self, team: Team) -> &TeamStats {
        &self.teams[team]
    }

    /// Fold one event into the counters.
    pub fn record(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::TurnBegan { team, .. } => self.teams[team].turns_played += 1,
            GameEvent::UnitBuilt { team, .. } => self.teams[team].units_built += 1,
            GameEvent::UnitDied { team, killer, .. } => {
                self.teams[team].units_casualties += 1;
                if killer != team {
                    self.teams[killer].enemies_terminated += 1;
                }
            }
            GameEvent::BuildingConquered { to, .. } => self.teams[to].buildings_conquered += 1,
            GameEvent::MoneyChanged { team, delta, .. } => {
                let stats = &mut self.teams[team];
                if delta >= 0 {
                    stats.money_gained += delta.unsigned_abs();
                } else {
                    stats.money_spent += delta.unsigned_abs();
                }
            }
            _ => {}
        }
    }

    /// Subscribe a fresh recorder to `game` and return a handle to it.
    pub fn attach(game: &mut Game) -> Arc<Mutex<Self>> {
        let stats = Arc::new(Mutex::new(Self::default()));
        let sink = Arc::clone(&stats);
        game.subscribe(move |event: &GameEvent| {
            if let Ok(mut stats) = sink.lock() {
                stats.record(event);
            }
        });
        stats
    }
}
