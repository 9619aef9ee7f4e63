//! Depth-limited minimax, optionally with alpha-beta pruning.
//!
//! The side to move at the root maximizes. Every other side minimizes, so
//! several opponents are searched as one coalition. Positions at the depth
//! limit, terminal positions and positions with no available action are
//! scored statically.
//!
//! Pruning only skips subtrees that cannot change the result: both variants
//! return the same root action for the same inputs.

use tracing::{debug, trace};

use crate::tree::{GameTree, Position, ValueFunction};

/// Whether subtrees are cut off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pruning {
    /// Visit every node.
    None,
    /// Alpha-beta cutoffs.
    #[default]
    AlphaBeta,
}

/// Result of a root search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<A> {
    /// Best root action, `None` if nothing beats the static root value.
    pub action: Option<A>,
    /// Backed-up value of the chosen action, or the static root value.
    pub value: f64,
    /// Positions visited, root included.
    pub nodes: u64,
}

/// Minimax search to a fixed number of plies.
#[derive(Debug, Clone)]
pub struct MiniMax<G, V> {
    tree: G,
    value: V,
    depth: u32,
    pruning: Pruning,
}

impl<G, V> MiniMax<G, V>
where
    G: GameTree,
    V: ValueFunction<G::Position>,
{
    /// Alpha-beta search `depth` plies deep.
    pub const fn new(tree: G, value: V, depth: u32) -> Self {
        Self {
            tree,
            value,
            depth,
            pruning: Pruning::AlphaBeta,
        }
    }

    /// Exhaustive search `depth` plies deep.
    pub const fn plain(tree: G, value: V, depth: u32) -> Self {
        Self {
            tree,
            value,
            depth,
            pruning: Pruning::None,
        }
    }

    /// Switch the pruning mode.
    #[must_use]
    pub const fn with_pruning(mut self, pruning: Pruning) -> Self {
        self.pruning = pruning;
        self
    }

    /// Plies searched.
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Pruning mode.
    pub const fn pruning(&self) -> Pruning {
        self.pruning
    }

    /// Best action for the side to move, or `None` to pass.
    pub fn choose_action(
        &self,
        position: &G::Position,
    ) -> Option<<G::Position as Position>::Action> {
        self.search(position).action
    }

    /// Search from `position` and report the chosen action with its value.
    pub fn search(
        &self,
        position: &G::Position,
    ) -> SearchOutcome<<G::Position as Position>::Action> {
        let us = position.turn();
        let mut nodes = 1;
        let mut best_value = self.value.evaluate(position, us);
        let mut best = None;

        if self.depth > 0 && !position.is_terminal() {
            let mut alpha = best_value;
            for action in position.available_actions() {
                let Some(child) = self.tree.child(position, &action) else {
                    continue;
                };
                let value =
                    self.score_child(position, &action, &child, us, 1, alpha, f64::INFINITY, &mut nodes);
                trace!(?action, value, "root candidate");
                if value > best_value {
                    best_value = value;
                    best = Some(action);
                }
                alpha = alpha.max(value);
            }
        }

        debug!(
            depth = self.depth,
            pruning = ?self.pruning,
            nodes,
            value = best_value,
            action = ?best,
            "minimax choice"
        );
        SearchOutcome {
            action: best,
            value: best_value,
            nodes,
        }
    }

    /// Value of `child`, which sits `depth` plies below the root.
    fn score_child(
        &self,
        parent: &G::Position,
        action: &<G::Position as Position>::Action,
        child: &G::Position,
        us: <G::Position as Position>::Side,
        depth: u32,
        alpha: f64,
        beta: f64,
        nodes: &mut u64,
    ) -> f64 {
        if depth >= self.depth || child.is_terminal() {
            *nodes += 1;
            return self.value.evaluate_after(parent, action, child, us);
        }
        self.evaluate(child, us, depth, alpha, beta, nodes)
    }

    fn evaluate(
        &self,
        position: &G::Position,
        us: <G::Position as Position>::Side,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        nodes: &mut u64,
    ) -> f64 {
        *nodes += 1;
        let maximizing = position.turn() == us;
        let prune = self.pruning == Pruning::AlphaBeta;
        let mut best: Option<f64> = None;

        for action in position.available_actions() {
            let Some(child) = self.tree.child(position, &action) else {
                continue;
            };
            let value = self.score_child(position, &action, &child, us, depth + 1, alpha, beta, nodes);

            if maximizing {
                let current = best.map_or(value, |b| b.max(value));
                best = Some(current);
                if prune && current > beta {
                    break;
                }
                alpha = alpha.max(current);
            } else {
                let current = best.map_or(value, |b| b.min(value));
                best = Some(current);
                if prune && current < alpha {
                    break;
                }
                beta = beta.min(current);
            }
        }

        best.unwrap_or_else(|| self.value.evaluate(position, us))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::testing::*;

    fn searches(tree: &SyntheticTree, depth: u32) -> (SearchOutcome<usize>, SearchOutcome<usize>) {
        let value = |p: &SyntheticPosition, us: u8| tree.value(p, us);
        let root = tree.position(0);
        let pruned = MiniMax::new(tree.clone(), value, depth).search(&root);
        let plain = MiniMax::plain(tree.clone(), value, depth).search(&root);
        (pruned, plain)
    }

    #[test]
    fn test_textbook_tree() {
        let (pruned, plain) = searches(&textbook_tree(), 2);
        assert_eq!(plain.action, Some(1));
        assert_eq!(plain.value, 3.0);
        assert_eq!(pruned.action, plain.action);
        assert_eq!(pruned.value, plain.value);
        assert!(pruned.nodes < plain.nodes, "{} vs {}", pruned.nodes, plain.nodes);
        assert_eq!(plain.nodes, 13);
    }

    #[test]
    fn test_depth_one_is_greedy() {
        // At one ply the answering side never moves: children are scored as is.
        let mut tree = textbook_tree();
        tree.nodes[3].value = 7.0;
        let (pruned, plain) = searches(&tree, 1);
        assert_eq!(plain.action, Some(3));
        assert_eq!(pruned.action, Some(3));
    }

    #[test]
    fn test_depth_zero_passes() {
        let (pruned, _) = searches(&textbook_tree(), 0);
        assert_eq!(pruned.action, None);
        assert_eq!(pruned.nodes, 1);
    }

    #[test]
    fn test_nothing_beats_root_value() {
        let mut tree = textbook_tree();
        tree.nodes[0].value = 3.0;
        let (pruned, plain) = searches(&tree, 2);
        assert_eq!(plain.action, None);
        assert_eq!(pruned.action, None);
        assert_eq!(pruned.value, 3.0);
    }
}
