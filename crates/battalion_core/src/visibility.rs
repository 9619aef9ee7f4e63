//! Fog of war.
//!
//! A team sees every unit except enemy units of an invisible type, which
//! are revealed only while one of the team's own units stands next to
//! them. The per-team bitmap marks occupied cells whose occupant is seen.

use crate::grid::{Bitmap, Bounds, Cell};
use crate::team::Team;
use crate::unit::Unit;

/// Whether `viewer` sees `unit`, given the board's occupancy.
pub fn is_unit_visible<'a>(
    unit: &Unit,
    viewer: Team,
    bounds: Bounds,
    occupant: impl Fn(Cell) -> Option<&'a Unit>,
) -> bool {
    if unit.team == viewer || !unit.stats().invisible {
        return true;
    }
    bounds
        .neighbors(unit.pos)
        .any(|n| occupant(n).is_some_and(|o| o.team == viewer))
}

/// Cells holding a unit `viewer` can see.
pub fn visibility_map<'a>(
    bounds: Bounds,
    viewer: Team,
    occupant: impl Fn(Cell) -> Option<&'a Unit> + Copy,
) -> Bitmap {
    let map = Bitmap::from_fn(bounds, |c| {
        occupant(c).is_some_and(|unit| is_unit_visible(unit, viewer, bounds, occupant))
    });
    tracing::trace!(team = %viewer, visible = map.count(), "computed visibility");
    map
}
