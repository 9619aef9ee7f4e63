//! One-ply greedy search.

use tracing::trace;

use crate::tree::{GameTree, Position, ValueFunction};

/// Picks the action whose immediate result scores best.
#[derive(Debug, Clone)]
pub struct Greedy<G, V> {
    tree: G,
    value: V,
}

impl<G, V> Greedy<G, V>
where
    G: GameTree,
    V: ValueFunction<G::Position>,
{
    /// Greedy search over `tree`, scored by `value`.
    pub const fn new(tree: G, value: V) -> Self {
        Self { tree, value }
    }

    /// The value function in use.
    pub const fn value_function(&self) -> &V {
        &self.value
    }

    /// Best action for the side to move, or `None` if no action beats
    /// leaving the position as it is.
    ///
    /// The static value of `position` is the baseline and ties keep the
    /// earlier candidate, so an action must strictly improve on doing nothing.
    pub fn choose_action(
        &self,
        position: &G::Position,
    ) -> Option<<G::Position as Position>::Action> {
        if position.is_terminal() {
            return None;
        }
        let us = position.turn();
        let mut best_value = self.value.evaluate(position, us);
        let mut best = None;

        for action in position.available_actions() {
            let Some(child) = self.tree.child(position, &action) else {
                trace!(?action, "candidate unavailable");
                continue;
            };
            let value = self.value.evaluate_after(position, &action, &child, us);
            if value > best_value {
                best_value = value;
                best = Some(action);
            }
        }

        trace!(value = best_value, action = ?best, "greedy choice");
        best
    }
}
