//! Heuristic position evaluation.
//!
//! Each team's material is summed from three sources:
//!
//! - **Units**: health, plus a bonus for being able to strike soon
//! - **Buildings**: income, factories and unlocked categories, with
//!   partial credit for a building under conquest
//! - **Money**: concave in the balance, so hoarding pays less and less
//!
//! The score weighs our material against the strongest opponent's.

use battalion_core::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::node::BattalionNode;
use crate::tree::ValueFunction;

/// Weights of the heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Weight of the strongest opponent against our own material, `0.0..=1.0`.
    pub aggression: f64,
    /// Bonus for a unit with an enemy in reach, scaled by readiness.
    pub readiness_bonus: f64,
    /// Readiness ceiling for a unit that cannot strike this turn.
    pub readiness_cap: f64,
    /// Bonus for a building that trains units.
    pub factory_bonus: f64,
    /// Deducted from the factory bonus while the factory cell is occupied.
    pub blocked_factory_penalty: f64,
    /// Bonus for a building that unlocks a unit category.
    pub unlock_bonus: f64,
    /// Money term coefficient.
    pub money_weight: f64,
    /// Money term exponent.
    pub money_exponent: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            aggression: 0.95,
            readiness_bonus: 20.0,
            readiness_cap: 0.9,
            factory_bonus: 50.0,
            blocked_factory_penalty: 25.0,
            unlock_bonus: 20.0,
            money_weight: 0.2,
            money_exponent: 0.8,
        }
    }
}

impl EvaluatorConfig {
    /// Parse and validate a RON configuration. Missing fields keep their
    /// defaults.
    pub fn from_ron_str(ron: &str) -> std::result::Result<Self, AiError> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Cares mostly about keeping its own material.
    #[must_use]
    pub fn defensive() -> Self {
        Self {
            aggression: 0.5,
            ..Self::default()
        }
    }

    /// Ignores its own material entirely.
    #[must_use]
    pub fn ruthless() -> Self {
        Self {
            aggression: 1.0,
            ..Self::default()
        }
    }

    /// Check that every weight is usable.
    pub fn validate(&self) -> std::result::Result<(), AiError> {
        if !(0.0..=1.0).contains(&self.aggression) {
            return Err(AiError::InvalidConfig(format!(
                "aggression must be within 0..=1, got {}",
                self.aggression
            )));
        }
        let weights = [
            ("readiness_bonus", self.readiness_bonus),
            ("readiness_cap", self.readiness_cap),
            ("factory_bonus", self.factory_bonus),
            ("blocked_factory_penalty", self.blocked_factory_penalty),
            ("unlock_bonus", self.unlock_bonus),
            ("money_weight", self.money_weight),
            ("money_exponent", self.money_exponent),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AiError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

/// Material-based value function for Battalion positions.
#[derive(Debug, Clone, Default)]
pub struct HeuristicEvaluator {
    config: EvaluatorConfig,
}

impl HeuristicEvaluator {
    /// Evaluator with the given weights.
    pub const fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    /// Weights in use.
    pub const fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Material of every team, indexed by [`Team::index`].
    pub fn material(&self, game: &Game) -> [f64; Team::COUNT] {
        let mut totals = [0.0; Team::COUNT];

        for (id, unit) in game.units() {
            totals[unit.team.index()] += self.unit_value(game, id, unit);
        }

        for building in game.buildings() {
            let value = self.building_value(game, building);
            if building.team.is_real() {
                totals[building.team.index()] += value;
            }
            if let Some(conqueror) = building.conquer_team {
                totals[conqueror.index()] += value * f64::from(building.conquer_progress);
            }
        }

        for &team in game.participants() {
            let money = f64::from(game.money(team));
            totals[team.index()] += self.config.money_weight * money.powf(self.config.money_exponent);
        }

        totals
    }

    fn unit_value(&self, game: &Game, id: UnitId, unit: &Unit) -> f64 {
        f64::from(unit.health) + self.config.readiness_bonus * self.readiness(game, id, unit)
    }

    /// 1 with an enemy in reach, otherwise how close the nearest visible
    /// enemy is in turns of movement, capped below 1.
    fn readiness(&self, game: &Game, id: UnitId, unit: &Unit) -> f64 {
        let Some(solution) = game.solution(id, Vision::Fog) else {
            return 0.0;
        };
        if !solution.attackable().is_empty() {
            return 1.0;
        }

        let map = solution.movement_map();
        let nearest = game
            .units()
            .filter(|(_, enemy)| unit.can_attack(enemy) && game.is_visible(unit.team, enemy.pos))
            .flat_map(|(_, enemy)| game.bounds().neighbors(enemy.pos))
            .filter(|&cell| cell == unit.pos || game.unit_at(cell).is_none())
            .filter_map(|cell| map.distance(cell))
            .min();

        match nearest {
            Some(distance) => {
                let turns = f64::from(unit.stats().move_limit) / f64::from(distance);
                turns.min(self.config.readiness_cap)
            }
            None => 0.0,
        }
    }

    fn building_value(&self, game: &Game, building: &Building) -> f64 {
        let mut value = f64::from(building.ty.money_gain());
        if building.ty.can_build_units() {
            value += self.config.factory_bonus;
            if game.unit_at(building.pos).is_some() {
                value -= self.config.blocked_factory_penalty;
            }
        }
        if building.ty.unlocks().is_some() {
            value += self.config.unlock_bonus;
        }
        value
    }
}

impl ValueFunction<BattalionNode> for HeuristicEvaluator {
    fn evaluate(&self, position: &BattalionNode, us: Team) -> f64 {
        let game = position.game();
        if game.is_finished() {
            return if game.winner() == Some(us) {
                f64::MAX
            } else {
                -f64::MAX
            };
        }

        let totals = self.material(game);
        let own = totals[us.index()];
        let strongest_enemy = Team::REAL
            .into_iter()
            .filter(|&team| team != us)
            .map(|team| totals[team.index()])
            .fold(0.0, f64::max);

        let aggression = self.config.aggression;
        (1.0 - aggression) * own - aggression * strongest_enemy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battalion_test_utils::fixtures::{open_level, skirmish_level, started};

    fn score(game: &Game, us: Team) -> f64 {
        HeuristicEvaluator::default().evaluate(&BattalionNode::snapshot(game), us)
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config = EvaluatorConfig::from_ron_str("(aggression: 0.5)").unwrap();
        assert_eq!(config.aggression, 0.5);
        assert_eq!(config.money_exponent, 0.8);
        assert_eq!(config, EvaluatorConfig::defensive());
    }

    #[test]
    fn test_config_rejects_bad_aggression() {
        let err = EvaluatorConfig::from_ron_str("(aggression: 1.5)").unwrap_err();
        assert!(matches!(err, AiError::InvalidConfig(_)));
        assert!(matches!(
            EvaluatorConfig::from_ron_str("(aggression: "),
            Err(AiError::Parse(_))
        ));
    }

    #[test]
    fn test_unit_in_reach_is_fully_ready() {
        let mut builder = open_level(6, 6);
        builder
            .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Tank, Team::Red))
            .unit(UnitDesc::new(Cell::new(2, 0), UnitType::Soldier, Team::Blue));
        let game = started(&builder.build().unwrap());
        let totals = HeuristicEvaluator::default().material(&game);
        // Tank: 70 health + 20. Soldier: 50 health + 20; its own map reaches the tank too.
        assert_eq!(totals[Team::Red.index()], 90.0);
        assert_eq!(totals[Team::Blue.index()], 70.0);
    }

    #[test]
    fn test_distant_enemy_gives_partial_readiness() {
        let mut builder = open_level(12, 1);
        builder
            .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Soldier, Team::Red))
            .unit(UnitDesc::new(Cell::new(11, 0), UnitType::Soldier, Team::Blue));
        let game = started(&builder.build().unwrap());
        let totals = HeuristicEvaluator::default().material(&game);
        // Nearest free neighbor of the enemy is 10 steps away: 3 / 10.
        let expected = 50.0 + 20.0 * 0.3;
        assert!((totals[Team::Red.index()] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_buildings_and_money_count() {
        let game = started(&skirmish_level());
        let totals = HeuristicEvaluator::default().material(&game);
        let neutral = totals[Team::None.index()];
        assert_eq!(neutral, 0.0);
        assert!(totals[Team::Red.index()] > 0.0);
        assert!(totals[Team::Blue.index()] > 0.0);
    }

    #[test]
    fn test_conquest_credits_value_times_progress() {
        // Same unit positions in both games; only the refinery's cell differs.
        let material_with_refinery_at = |x: u16| {
            let mut builder = open_level(8, 1);
            builder
                .building(BuildingDesc::new(Cell::new(x, 0), BuildingType::OilRefinery, Team::None))
                .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Soldier, Team::Red))
                .unit(UnitDesc::new(Cell::new(7, 0), UnitType::Soldier, Team::Blue));
            let mut game = started(&builder.build().unwrap());
            game.perform(&Action::UnitMove {
                unit: Cell::new(0, 0),
                path: vec![Cell::new(1, 0)],
            })
            .unwrap();
            let progress = game.building_at(Cell::new(1, 0)).map(|b| b.conquer_progress);
            (progress, HeuristicEvaluator::default().material(&game))
        };

        let (progress, conquering) = material_with_refinery_at(1);
        let (_, idle) = material_with_refinery_at(5);
        assert_eq!(progress, Some(1));
        let credit = conquering[Team::Red.index()] - idle[Team::Red.index()];
        assert!((credit - 20.0).abs() < 1e-9, "conquest credit {credit}");
        assert_eq!(conquering[Team::None.index()], 0.0);
    }

    #[test]
    fn test_terminal_positions_are_extreme() {
        let mut builder = open_level(4, 4);
        builder
            .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Tank, Team::Red))
            .unit(UnitDesc::new(Cell::new(1, 0), UnitType::Soldier, Team::Blue).with_health(1));
        let mut game = started(&builder.build().unwrap());
        game.perform(&Action::UnitMoveAndAttack {
            unit: Cell::new(0, 0),
            path: vec![],
            target: Cell::new(1, 0),
        })
        .unwrap();
        assert_eq!(score(&game, Team::Red), f64::MAX);
        assert_eq!(score(&game, Team::Blue), -f64::MAX);
    }

    #[test]
    fn test_killing_improves_score() {
        let mut builder = open_level(6, 6);
        builder
            .unit(UnitDesc::new(Cell::new(2, 2), UnitType::Tank, Team::Red))
            .unit(UnitDesc::new(Cell::new(3, 2), UnitType::Soldier, Team::Blue).with_health(10))
            .unit(UnitDesc::new(Cell::new(5, 5), UnitType::Soldier, Team::Blue));
        let mut game = started(&builder.build().unwrap());
        let before = score(&game, Team::Red);
        game.perform(&Action::UnitMoveAndAttack {
            unit: Cell::new(2, 2),
            path: vec![],
            target: Cell::new(3, 2),
        })
        .unwrap();
        assert!(score(&game, Team::Red) > before);
    }
}
