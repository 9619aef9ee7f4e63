//! Team identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A faction. [`Team::None`] owns unclaimed buildings and never takes a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Team {
    /// Neutral owner of unclaimed buildings.
    #[default]
    None,
    /// Red army.
    Red,
    /// Blue army.
    Blue,
    /// Green army.
    Green,
    /// Yellow army.
    Yellow,
}

impl Team {
    /// Number of team slots, neutral included.
    pub const COUNT: usize = 5;

    /// Teams that can take turns, in turn order.
    pub const REAL: [Self; 4] = [Self::Red, Self::Blue, Self::Green, Self::Yellow];

    /// Dense index for per-team arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::None => 0,
            Self::Red => 1,
            Self::Blue => 2,
            Self::Green => 3,
            Self::Yellow => 4,
        }
    }

    /// Whether this is a playing team.
    #[must_use]
    pub const fn is_real(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::None => "Neutral",
            Self::Red => "Red",
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::Yellow => "Yellow",
        }
    }

    /// Single-letter tag for compact board dumps.
    #[must_use]
    pub const fn short_name(&self) -> char {
        match self {
            Self::None => 'n',
            Self::Red => 'r',
            Self::Blue => 'b',
            Self::Green => 'g',
            Self::Yellow => 'y',
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Fixed-size per-team table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TeamMap<T>([T; Team::COUNT]);

impl<T> TeamMap<T> {
    /// Build from a per-team constructor.
    pub fn from_fn(mut f: impl FnMut(Team) -> T) -> Self {
        Self([
            f(Team::None),
            f(Team::Red),
            f(Team::Blue),
            f(Team::Green),
            f(Team::Yellow),
        ])
    }

    /// `(team, value)` pairs, neutral first.
    pub fn iter(&self) -> impl Iterator<Item = (Team, &T)> + '_ {
        [Team::None, Team::Red, Team::Blue, Team::Green, Team::Yellow]
            .into_iter()
            .zip(self.0.iter())
    }
}

impl<T> std::ops::Index<Team> for TeamMap<T> {
    type Output = T;

    fn index(&self, team: Team) -> &T {
        &self.0[team.index()]
    }
}

impl<T> std::ops::IndexMut<Team> for TeamMap<T> {
    fn index_mut(&mut self, team: Team) -> &mut T {
        &mut self.0[team.index()]
    }
}
