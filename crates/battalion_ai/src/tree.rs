//! The abstraction every search strategy is written against.
//!
//! A [`Position`] is a snapshot that knows whose turn it is and which
//! actions are open; a [`GameTree`] produces the position an action leads
//! to; a [`ValueFunction`] scores positions for one side. Nothing here knows
//! about Battalion, so the algorithms can be exercised on hand-built trees.

use std::fmt;

/// A searchable game state.
pub trait Position {
    /// Move type.
    type Action: Clone + fmt::Debug;
    /// Identifies the side to move.
    type Side: Copy + Eq + fmt::Debug;

    /// Whether the game is over in this position.
    fn is_terminal(&self) -> bool;

    /// Side to move.
    fn turn(&self) -> Self::Side;

    /// Actions the side to move may take, in a stable order.
    fn available_actions(&self) -> impl Iterator<Item = Self::Action> + '_;
}

/// Successor function over [`Position`]s.
pub trait GameTree {
    /// Position type of this tree.
    type Position: Position;

    /// The position reached by playing `action` in `position`.
    ///
    /// Returns `None` when the action turns out to be unavailable. The
    /// input position is never modified.
    fn child(
        &self,
        position: &Self::Position,
        action: &<Self::Position as Position>::Action,
    ) -> Option<Self::Position>;
}

/// Scores positions from one side's point of view. Higher is better.
pub trait ValueFunction<P: Position> {
    /// Static value of `position` for `us`.
    fn evaluate(&self, position: &P, us: P::Side) -> f64;

    /// Value of `child`, reached from `parent` by `action`.
    ///
    /// Implementations may score the transition incrementally; the default
    /// scores the child from scratch.
    fn evaluate_after(&self, parent: &P, action: &P::Action, child: &P, us: P::Side) -> f64 {
        let _ = (parent, action);
        self.evaluate(child, us)
    }
}

impl<P, F> ValueFunction<P> for F
where
    P: Position,
    F: Fn(&P, P::Side) -> f64,
{
    fn evaluate(&self, position: &P, us: P::Side) -> f64 {
        self(position, us)
    }
}
