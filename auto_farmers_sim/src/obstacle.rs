// Rock detection along an agent's planned route.
//
// Agents move one axis at a time (see `movement.rs`), so the route from a
// start cell to a target cell is an L: along the first axis to the bend
// point, then along the other axis to the target. `find_obstruction` walks
// that route in travel order and reports the first rock on it. The start
// cell and the target cell are not checked: the agent already stands on
// one, and the other may be the rock it was sent for.
//
// Detection happens once, at assignment time. An agent whose route is
// blocked is sent to clear the rock first, so rerouting is a single
// decision rather than a replanning loop during movement.
//
// See also: `assignment.rs` which calls this between search and claim.

use crate::grid::FarmGrid;
use crate::types::{Axis, GridCoord, ResourceCode};

/// The corner of the L route, given which axis the agent closes first.
///
/// This is the route the check covers, not always the one walked. The
/// stepper calls an axis done once less than a cell remains on it, so an
/// agent can turn a column (or row) short of the bend and run its second
/// leg beside the checked one.
pub fn bend_point(start: GridCoord, target: GridCoord, first_axis: Axis) -> GridCoord {
    match first_axis {
        Axis::X => GridCoord::new(target.x, start.y),
        Axis::Z => GridCoord::new(start.x, target.y),
    }
}

/// Cells from `from` (exclusive) to `to` (inclusive), x leg then y leg.
fn leg(from: GridCoord, to: GridCoord) -> impl Iterator<Item = GridCoord> {
    let sx = (to.x - from.x).signum();
    let sy = (to.y - from.y).signum();
    (1..=(to.x - from.x).abs())
        .map(move |i| GridCoord::new(from.x + i * sx, from.y))
        .chain((1..=(to.y - from.y).abs()).map(move |i| GridCoord::new(to.x, from.y + i * sy)))
}

/// The cells an agent crosses on `start -> midpoint -> target`, in travel
/// order, without the start and target cells.
pub fn route_cells(
    start: GridCoord,
    midpoint: GridCoord,
    target: GridCoord,
) -> impl Iterator<Item = GridCoord> {
    leg(start, midpoint)
        .chain(leg(midpoint, target))
        .filter(move |&c| c != start && c != target)
}

/// The first rock on the route, if any.
pub fn find_obstruction(
    grid: &FarmGrid,
    start: GridCoord,
    midpoint: GridCoord,
    target: GridCoord,
) -> Option<GridCoord> {
    route_cells(start, midpoint, target).find(|&c| grid.get(c) == ResourceCode::Rock)
}
