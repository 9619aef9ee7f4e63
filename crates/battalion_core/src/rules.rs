//! Action validation and application.
//!
//! Every action is checked completely before the first mutation, so a
//! rejected action leaves the game untouched. Application then runs the
//! sub-steps in order, emitting one event after each state change. A step
//! that ends the game returns [`ControlFlow::Break`] and the rest of the
//! action is skipped.

use std::ops::ControlFlow;

use crate::action::Action;
use crate::building::BuildingId;
use crate::combat::{counter_attacks, damage};
use crate::error::ActionError;
use crate::event::{ActionOutcome, GameEvent};
use crate::game::Game;
use crate::grid::Cell;
use crate::movement::Vision;
use crate::team::Team;
use crate::unit::{Category, Unit, UnitId, UnitType, Weapon};

type Flow = ControlFlow<()>;

impl Game {
    /// Validate and apply one action.
    ///
    /// On error the game is unchanged.
    pub fn perform(&mut self, action: &Action) -> Result<ActionOutcome, ActionError> {
        if self.is_finished() {
            return Err(ActionError::GameFinished);
        }
        match (action, self.is_started()) {
            (Action::Start, true) => return Err(ActionError::AlreadyStarted),
            (Action::Start, false) | (_, true) => {}
            (_, false) => return Err(ActionError::NotStarted),
        }

        let team = self.turn();
        let proceed = |(): ()| -> Flow { ControlFlow::Continue(()) };
        let result = match action {
            Action::Start => {
                self.start();
                Ok(ControlFlow::Continue(()))
            }
            Action::TurnEnd => {
                self.end_turn();
                Ok(ControlFlow::Continue(()))
            }
            Action::UnitMove { unit, path } => self
                .check_move(*unit, path)
                .map(|(id, real)| self.move_unit(id, real))
                .map(proceed),
            Action::UnitMoveAndAttack { unit, path, target } => self
                .check_move_and_attack(*unit, path, *target)
                .map(|plan| self.move_and_attack(plan)),
            Action::UnitAttackLongRange { unit, target } => self
                .check_long_range(*unit, *target)
                .map(|(attacker, target)| self.strike(attacker, target)),
            Action::UnitBuild { factory, unit_type } => self
                .check_build(*factory, *unit_type)
                .map(|(factory, price)| self.build(factory, *unit_type, price))
                .map(proceed),
            Action::UnitTransport { unit, transporter } => self
                .check_transport(*unit, *transporter)
                .map(|(id, price)| self.transport(id, *transporter, price))
                .map(proceed),
            Action::UnitTransportFinish { unit } => self
                .check_transport_finish(*unit)
                .map(|id| self.transport_finish(id))
                .map(proceed),
            Action::UnitRepair { unit } => self
                .check_repair(*unit)
                .map(|(id, cost)| self.repair(id, cost))
                .map(proceed),
        };

        let flow = match result {
            Ok(flow) => flow,
            Err(err) => {
                tracing::trace!(turn = %team, %action, error = %err, "action rejected");
                return Err(err);
            }
        };
        if flow.is_break() {
            tracing::info!(winner = ?self.winner(), turn = self.turn_count(), %action, "game ended");
        }

        #[cfg(feature = "debug-validation")]
        self.assert_invariants();

        let outcome = ActionOutcome {
            events: self.take_events(),
        };
        tracing::debug!(
            turn = %team,
            %action,
            events = outcome.events.len(),
            "action performed"
        );
        Ok(outcome)
    }

    /// Whether `action` would be accepted, without applying it.
    #[must_use]
    pub fn is_legal(&self, action: &Action) -> bool {
        if self.is_finished() {
            return false;
        }
        match action {
            Action::Start => !self.is_started(),
            _ if !self.is_started() => false,
            Action::TurnEnd => true,
            Action::UnitMove { unit, path } => self.check_move(*unit, path).is_ok(),
            Action::UnitMoveAndAttack { unit, path, target } => {
                self.check_move_and_attack(*unit, path, *target).is_ok()
            }
            Action::UnitAttackLongRange { unit, target } => {
                self.check_long_range(*unit, *target).is_ok()
            }
            Action::UnitBuild { factory, unit_type } => {
                self.check_build(*factory, *unit_type).is_ok()
            }
            Action::UnitTransport { unit, transporter } => {
                self.check_transport(*unit, *transporter).is_ok()
            }
            Action::UnitTransportFinish { unit } => self.check_transport_finish(*unit).is_ok(),
            Action::UnitRepair { unit } => self.check_repair(*unit).is_ok(),
        }
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// The active unit of the acting team on `cell`.
    fn acting_unit(&self, cell: Cell) -> Result<UnitId, ActionError> {
        if !self.bounds().contains(cell) {
            return Err(ActionError::OutOfBounds(cell));
        }
        let id = self.unit_id_at(cell).ok_or(ActionError::NoUnit(cell))?;
        let unit = self.unit(id).ok_or(ActionError::NoUnit(cell))?;
        if unit.team != self.turn() {
            return Err(ActionError::WrongTurn {
                team: unit.team,
                turn: self.turn(),
            });
        }
        if !unit.active {
            return Err(ActionError::Inactive(cell));
        }
        Ok(id)
    }

    /// Check `path` against the mover's fogged view and work out how far
    /// the unit really gets.
    fn check_path(&self, id: UnitId, unit: &Unit, path: &[Cell]) -> Result<Vec<Cell>, ActionError> {
        let planned = self
            .solution(id, Vision::Fog)
            .ok_or(ActionError::NoUnit(unit.pos))?;
        let Some(&destination) = path.last() else {
            return Err(ActionError::IllegalPath("empty path"));
        };
        if path.len() > unit.stats().move_limit as usize {
            return Err(ActionError::IllegalPath("path exceeds move limit"));
        }
        let mut previous = unit.pos;
        for &cell in path {
            if !previous.is_adjacent(cell) {
                return Err(ActionError::IllegalPath("path is not contiguous"));
            }
            if !planned.passable().contains(cell) {
                return Err(ActionError::IllegalPath("path leaves the passable area"));
            }
            previous = cell;
        }
        if destination == unit.pos {
            return Err(ActionError::IllegalPath("path returns to its start"));
        }
        if !planned.reachable().contains(destination) {
            return Err(ActionError::IllegalPath("destination is occupied"));
        }

        let actual = self
            .solution(id, Vision::Omniscient)
            .ok_or(ActionError::NoUnit(unit.pos))?;
        let mut real: Vec<Cell> = path
            .iter()
            .copied()
            .take_while(|&c| actual.passable().contains(c))
            .collect();
        while real.last().is_some_and(|&c| self.unit_at(c).is_some()) {
            real.pop();
        }
        Ok(real)
    }

    fn check_move(&self, cell: Cell, path: &[Cell]) -> Result<(UnitId, Vec<Cell>), ActionError> {
        let id = self.acting_unit(cell)?;
        let unit = self.unit(id).ok_or(ActionError::NoUnit(cell))?;
        let real = self.check_path(id, unit, path)?;
        Ok((id, real))
    }

    fn check_target(&self, id: UnitId, target: Cell) -> Result<UnitId, ActionError> {
        let solution = self
            .solution(id, Vision::Fog)
            .ok_or(ActionError::IllegalTarget(target))?;
        if !solution.attackable().contains(target) {
            return Err(ActionError::IllegalTarget(target));
        }
        self.unit_id_at(target).ok_or(ActionError::IllegalTarget(target))
    }

    fn check_move_and_attack(
        &self,
        cell: Cell,
        path: &[Cell],
        target: Cell,
    ) -> Result<AttackPlan, ActionError> {
        let id = self.acting_unit(cell)?;
        let unit = self.unit(id).ok_or(ActionError::NoUnit(cell))?;
        if unit.stats().weapon != Weapon::CloseRange {
            return Err(ActionError::WrongWeapon { unit: unit.ty });
        }
        let target_id = self.check_target(id, target)?;
        let strike_from = path.last().copied().unwrap_or(unit.pos);
        if !strike_from.is_adjacent(target) {
            return Err(ActionError::IllegalPath("path does not end next to the target"));
        }
        let real = if path.is_empty() {
            Vec::new()
        } else {
            self.check_path(id, unit, path)?
        };
        Ok(AttackPlan {
            attacker: id,
            target: target_id,
            complete: real.len() == path.len(),
            path: real,
        })
    }

    fn check_long_range(&self, cell: Cell, target: Cell) -> Result<(UnitId, UnitId), ActionError> {
        let id = self.acting_unit(cell)?;
        let unit = self.unit(id).ok_or(ActionError::NoUnit(cell))?;
        if !matches!(unit.stats().weapon, Weapon::LongRange { .. }) {
            return Err(ActionError::WrongWeapon { unit: unit.ty });
        }
        Ok((id, self.check_target(id, target)?))
    }

    fn check_build(&self, cell: Cell, ty: UnitType) -> Result<(BuildingId, u32), ActionError> {
        if !self.bounds().contains(cell) {
            return Err(ActionError::OutOfBounds(cell));
        }
        let id = self.building_id_at(cell).ok_or(ActionError::NoBuilding(cell))?;
        let factory = self.building_at(cell).ok_or(ActionError::NoBuilding(cell))?;
        if factory.team != self.turn() {
            return Err(ActionError::WrongTurn {
                team: factory.team,
                turn: self.turn(),
            });
        }
        if !factory.active {
            return Err(ActionError::Inactive(cell));
        }
        let terrain = self.terrain(cell).ok_or(ActionError::OutOfBounds(cell))?;
        let cannot = ActionError::CannotBuild { cell, unit: ty };
        if !factory.offers(ty, self.build_permissions(factory.team), terrain)
            || !ty.can_stand_on(terrain)
        {
            return Err(cannot);
        }
        if self.unit_at(cell).is_some() {
            return Err(ActionError::FactoryBlocked(cell));
        }
        let price = ty.stats().price.ok_or(cannot)?;
        self.check_funds(factory.team, price)?;
        Ok((id, price))
    }

    fn check_funds(&self, team: Team, required: u32) -> Result<(), ActionError> {
        let available = self.money(team);
        if available < required {
            return Err(ActionError::InsufficientFunds { required, available });
        }
        Ok(())
    }

    fn check_transport(&self, cell: Cell, transporter: UnitType) -> Result<(UnitId, u32), ActionError> {
        let id = self.acting_unit(cell)?;
        let unit = self.unit(id).ok_or(ActionError::NoUnit(cell))?;
        let stats = unit.stats();
        let terrain = self.terrain(cell).ok_or(ActionError::OutOfBounds(cell))?;
        let cannot = ActionError::CannotTransport {
            cell,
            unit: unit.ty,
            transporter,
        };
        if !UnitType::TRANSPORTERS.contains(&transporter)
            || stats.category != Category::Land
            || stats.transporter
            || !transporter.can_stand_on(terrain)
        {
            return Err(cannot);
        }
        let price = transporter.stats().price.ok_or(cannot)?;
        self.check_funds(unit.team, price)?;
        Ok((id, price))
    }

    fn check_transport_finish(&self, cell: Cell) -> Result<UnitId, ActionError> {
        let id = self.acting_unit(cell)?;
        let terrain = self.terrain(cell).ok_or(ActionError::OutOfBounds(cell))?;
        match self.cargo_at(cell) {
            Some(cargo) if cargo.ty.can_stand_on(terrain) => Ok(id),
            _ => Err(ActionError::CannotUnload(cell)),
        }
    }

    fn check_repair(&self, cell: Cell) -> Result<(UnitId, u32), ActionError> {
        let id = self.acting_unit(cell)?;
        let unit = self.unit(id).ok_or(ActionError::NoUnit(cell))?;
        if !unit.is_damaged() || unit.repairing {
            return Err(ActionError::CannotRepair(cell));
        }
        let cost = unit.ty.repair_cost();
        self.check_funds(unit.team, cost)?;
        Ok((id, cost))
    }

    /// Whether the factory on `cell` can train `ty` right now.
    #[must_use]
    pub fn can_build(&self, cell: Cell, ty: UnitType) -> bool {
        self.check_build(cell, ty).is_ok()
    }

    /// Whether the unit on `cell` can board a new `transporter` right now.
    #[must_use]
    pub fn can_transport(&self, cell: Cell, transporter: UnitType) -> bool {
        self.check_transport(cell, transporter).is_ok()
    }

    /// Whether the transporter on `cell` can unload right now.
    #[must_use]
    pub fn can_finish_transport(&self, cell: Cell) -> bool {
        self.check_transport_finish(cell).is_ok()
    }

    /// Whether the unit on `cell` can start repairing right now.
    #[must_use]
    pub fn can_repair(&self, cell: Cell) -> bool {
        self.check_repair(cell).is_ok()
    }

    // ------------------------------------------------------------------
    // Application
    // ------------------------------------------------------------------

    fn start(&mut self) {
        self.mark_started();
        let first = self.participants().first().copied().unwrap_or_default();
        self.begin_turn(first);
    }

    fn begin_turn(&mut self, team: Team) {
        for building in self.all_buildings_mut() {
            building.active = building.ty.can_build_units() && building.team == team;
        }
        for unit in self.all_units_mut() {
            unit.active = unit.team == team;
        }
        self.set_turn(team);
        let turn = self.turn_count();
        tracing::debug!(team = %team, turn, "turn began");
        self.emit(GameEvent::TurnBegan { team, turn });
    }

    fn end_turn(&mut self) {
        let previous = self.turn();

        let income: Vec<(Team, u32)> = self
            .buildings()
            .filter(|b| b.team.is_real() && b.ty.money_gain() > 0)
            .map(|b| (b.team, b.ty.money_gain()))
            .collect();
        for (team, gain) in income {
            self.credit(team, gain);
        }

        let next = self
            .participants_cycle()
            .find(|&team| self.is_alive(team))
            .unwrap_or(previous);
        self.emit(GameEvent::TurnEnded { team: previous, next });

        for id in self.building_ids() {
            let Some(pos) = self.building(id).map(|b| b.pos) else { continue };
            let conquerer = self
                .unit_at(pos)
                .filter(|unit| unit.stats().can_conquer)
                .map(|unit| unit.team);
            match conquerer {
                Some(team) if team == next => self.conquer(id, Some(next)),
                Some(_) => {}
                None => self.conquer(id, None),
            }
        }

        let repairing: Vec<UnitId> = self
            .team_units(next)
            .filter(|(_, unit)| unit.repairing)
            .map(|(id, _)| id)
            .collect();
        for id in repairing {
            let Some(unit) = self.unit_mut(id) else { continue };
            let before = unit.health;
            unit.health = (before + unit.ty.repair_amount()).min(unit.stats().max_health);
            unit.repairing = false;
            let amount = unit.health - before;
            self.emit(GameEvent::UnitHealed { unit: id, amount });
        }

        self.begin_turn(next);
    }

    fn credit(&mut self, team: Team, amount: u32) {
        let economy = self.economy_mut(team);
        let credited = economy.deposit(amount);
        let balance = economy.money();
        if credited > 0 {
            self.emit(GameEvent::MoneyChanged {
                team,
                delta: i64::from(credited),
                balance,
            });
        }
    }

    fn charge(&mut self, team: Team, amount: u32) {
        let economy = self.economy_mut(team);
        let paid = economy.spend(amount);
        debug_assert!(paid, "{team} charged {amount} without funds");
        let balance = economy.money();
        self.emit(GameEvent::MoneyChanged {
            team,
            delta: -i64::from(amount),
            balance,
        });
    }

    fn move_unit(&mut self, id: UnitId, path: Vec<Cell>) {
        let Some(unit) = self.unit(id) else { return };
        let (from, team, can_conquer) = (unit.pos, unit.team, unit.stats().can_conquer);
        let Some(&to) = path.last() else {
            if let Some(unit) = self.unit_mut(id) {
                unit.active = false;
            }
            tracing::debug!(unit = %id, pos = %from, "unit ambushed");
            self.emit(GameEvent::UnitAmbushed { unit: id, pos: from });
            return;
        };

        self.relocate(id, to);
        if let Some(unit) = self.unit_mut(id) {
            unit.active = false;
        }
        self.emit(GameEvent::UnitMoved { unit: id, from, path });
        if let Some(building) = self.building_id_at(from) {
            self.conquer(building, None);
        }
        if let Some(building) = self.building_id_at(to).filter(|_| can_conquer) {
            self.conquer(building, Some(team));
        }
    }

    fn move_and_attack(&mut self, plan: AttackPlan) -> Flow {
        let attacker = plan.attacker;
        if !plan.path.is_empty() {
            self.move_unit(attacker, plan.path);
        } else if !plan.complete {
            self.move_unit(attacker, Vec::new());
        }
        if let Some(unit) = self.unit_mut(attacker) {
            unit.active = false;
        }
        if plan.complete {
            self.strike(attacker, plan.target)?;
        }
        ControlFlow::Continue(())
    }

    /// Resolve one attack and the counter-attack it may provoke.
    fn strike(&mut self, attacker: UnitId, target: UnitId) -> Flow {
        if let Some(unit) = self.unit_mut(attacker) {
            unit.active = false;
        }
        let (Some(striker), Some(defender)) = (self.unit(attacker), self.unit(target)) else {
            return ControlFlow::Continue(());
        };
        let amount = damage(striker);
        let was_repairing = defender.repairing;
        let attacker_team = striker.team;
        self.hit(attacker, target, amount, false, attacker_team)?;

        let (Some(striker), Some(defender)) = (self.unit(attacker), self.unit(target)) else {
            return ControlFlow::Continue(());
        };
        let in_range = self
            .solution(target, Vision::Fog)
            .is_some_and(|s| s.attackable().contains(striker.pos))
            && (defender.stats().weapon != Weapon::CloseRange
                || defender.pos.is_adjacent(striker.pos));
        if counter_attacks(defender, striker, was_repairing, in_range) {
            let amount = damage(defender);
            let defender_team = defender.team;
            self.hit(target, attacker, amount, true, defender_team)?;
        }
        ControlFlow::Continue(())
    }

    fn hit(&mut self, attacker: UnitId, target: UnitId, amount: u32, counter: bool, killer: Team) -> Flow {
        let Some(unit) = self.unit_mut(target) else {
            return ControlFlow::Continue(());
        };
        let before = unit.health;
        let dead = unit.take_damage(amount);
        let health = unit.health;
        self.emit(GameEvent::UnitDamaged {
            unit: target,
            attacker,
            amount: before - health,
            health,
            counter,
        });
        if dead {
            self.kill(target, killer)?;
        }
        ControlFlow::Continue(())
    }

    fn kill(&mut self, id: UnitId, killer: Team) -> Flow {
        let Some(unit) = self.unit(id) else {
            return ControlFlow::Continue(());
        };
        let (ty, team) = (unit.ty, unit.team);
        tracing::debug!(unit = %unit, %killer, "unit destroyed");
        self.emit(GameEvent::UnitDied {
            unit: id,
            ty,
            team,
            killer,
        });
        self.remove_unit(id);
        if !self.is_alive(team) {
            self.eliminate(team)?;
        }
        ControlFlow::Continue(())
    }

    fn eliminate(&mut self, team: Team) -> Flow {
        tracing::info!(%team, "team eliminated");
        self.emit(GameEvent::TeamEliminated { team });
        let remaining: Vec<UnitId> = self.team_units(team).map(|(id, _)| id).collect();
        for id in remaining {
            self.remove_unit(id);
        }
        self.release_buildings(team);

        let alive = self.alive_teams();
        if alive.len() > 1 {
            return ControlFlow::Continue(());
        }
        let winner = alive.first().copied();
        self.finish(winner);
        self.emit(GameEvent::GameEnded { winner });
        ControlFlow::Break(())
    }

    fn build(&mut self, factory: BuildingId, ty: UnitType, price: u32) {
        let Some(pos) = self.building(factory).map(|b| b.pos) else { return };
        let team = self.turn();
        self.charge(team, price);
        let unit = self.add_unit(Unit::new(ty, team, pos));
        self.emit(GameEvent::UnitBuilt { unit, ty, team });
    }

    fn transport(&mut self, cargo: UnitId, transporter: UnitType, price: u32) {
        let Some(unit) = self.unit(cargo) else { return };
        let (team, pos) = (unit.team, unit.pos);
        self.charge(team, price);
        if let Some(unit) = self.unit_mut(cargo) {
            unit.active = false;
        }
        self.lift_unit(cargo);
        let mut carrier = Unit::new(transporter, team, pos);
        carrier.transported = Some(cargo);
        let carrier = self.add_unit(carrier);
        self.emit(GameEvent::UnitTransported {
            transporter: carrier,
            cargo,
        });
    }

    fn transport_finish(&mut self, transporter: UnitId) {
        let Some(unit) = self.unit(transporter) else { return };
        let pos = unit.pos;
        let Some(cargo) = unit.transported else { return };
        if let Some(carrier) = self.unit_mut(transporter) {
            carrier.transported = None;
        }
        self.remove_unit(transporter);
        self.place_unit(cargo, pos);
        if let Some(unit) = self.unit_mut(cargo) {
            unit.active = true;
        }
        self.emit(GameEvent::UnitUnloaded { transporter, cargo });
    }

    fn repair(&mut self, id: UnitId, cost: u32) {
        let Some(team) = self.unit(id).map(|u| u.team) else { return };
        self.charge(team, cost);
        if let Some(unit) = self.unit_mut(id) {
            unit.repairing = true;
            unit.active = false;
        }
        self.emit(GameEvent::UnitRepairing { unit: id });
    }
}

/// A validated move-and-attack.
struct AttackPlan {
    attacker: UnitId,
    target: UnitId,
    /// Cells the attacker really walks.
    path: Vec<Cell>,
    /// Whether the walk covers the whole planned path.
    complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{LevelBuilder, UnitDesc};

    fn started_pair() -> Game {
        let mut builder = LevelBuilder::new(4, 4);
        builder
            .unit(UnitDesc::new(Cell::new(0, 0), UnitType::Soldier, Team::Red))
            .unit(UnitDesc::new(Cell::new(3, 3), UnitType::Soldier, Team::Blue));
        let mut game = Game::new(&builder.build().unwrap()).unwrap();
        game.perform(&Action::Start).unwrap();
        game
    }

    #[test]
    fn test_empty_real_path_ambushes_in_place() {
        let mut game = started_pair();
        let id = game.unit_id_at(Cell::new(0, 0)).unwrap();

        game.move_unit(id, Vec::new());

        assert_eq!(
            game.take_events(),
            vec![GameEvent::UnitAmbushed {
                unit: id,
                pos: Cell::new(0, 0)
            }]
        );
        let unit = game.unit(id).unwrap();
        assert_eq!(unit.pos, Cell::new(0, 0));
        assert!(!unit.active);
    }

    #[test]
    fn test_incomplete_attack_plan_skips_the_strike() {
        let mut game = started_pair();
        let attacker = game.unit_id_at(Cell::new(0, 0)).unwrap();
        let target = game.unit_id_at(Cell::new(3, 3)).unwrap();

        let flow = game.move_and_attack(AttackPlan {
            attacker,
            target,
            path: Vec::new(),
            complete: false,
        });

        assert!(flow.is_continue());
        let events = game.take_events();
        assert!(matches!(events.as_slice(), [GameEvent::UnitAmbushed { .. }]));
        assert_eq!(game.unit(target).unwrap().health, 50);
    }

    #[test]
    fn test_final_kill_breaks_out_of_the_action() {
        let mut builder = LevelBuilder::new(4, 4);
        builder
            .unit(UnitDesc::new(Cell::new(1, 1), UnitType::Tank, Team::Red))
            .unit(UnitDesc::new(Cell::new(2, 1), UnitType::Soldier, Team::Blue).with_health(10));
        let mut game = Game::new(&builder.build().unwrap()).unwrap();
        game.perform(&Action::Start).unwrap();
        let attacker = game.unit_id_at(Cell::new(1, 1)).unwrap();
        let target = game.unit_id_at(Cell::new(2, 1)).unwrap();

        assert!(game.strike(attacker, target).is_break());
        assert!(game.is_finished());
        assert_eq!(game.winner(), Some(Team::Red));
        assert!(matches!(game.take_events().last(), Some(GameEvent::GameEnded { .. })));
    }
}
