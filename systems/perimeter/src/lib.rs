#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Builds the closed enemy route that hugs the outside of the grid.
//!
//! The route is derived in stages. Every coordinate touching a grid cell
//! (edge or corner) that is not itself a cell joins the frontier. The walk
//! starts at the smallest frontier coordinate and greedily prefers an
//! orthogonal step in winding order, then a diagonal step, and finally jumps
//! to the nearest unvisited coordinate. The jump handles frontier fragments
//! left by concave or disconnected grids; on such shapes the resulting ring
//! may cross itself.

use std::collections::BTreeSet;

use block_defence_core::{CellCoord, GridView, PathRing, Winding};

const CLOCKWISE_STEPS: [(i32, i32); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];
const COUNTER_CLOCKWISE_STEPS: [(i32, i32); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];
const DIAGONAL_STEPS: [(i32, i32); 4] = [(1, 1), (-1, 1), (-1, -1), (1, -1)];

/// Orders the grid frontier into a traversal ring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerimeterPathBuilder {
    winding: Winding,
}

impl PerimeterPathBuilder {
    /// Creates a builder that scans orthogonal neighbours in `winding` order.
    #[must_use]
    pub const fn new(winding: Winding) -> Self {
        Self { winding }
    }

    /// Winding used when ordering the ring.
    #[must_use]
    pub const fn winding(&self) -> Winding {
        self.winding
    }

    /// Builds the ring for the current cell set.
    ///
    /// The ring contains every frontier coordinate exactly once. An empty grid
    /// produces an empty ring.
    #[must_use]
    pub fn build(&self, grid: &GridView<'_>) -> PathRing {
        let mut remaining = frontier(grid);
        let Some(start) = remaining.pop_first() else {
            return PathRing::default();
        };

        let mut ordered = Vec::with_capacity(remaining.len() + 1);
        ordered.push(start);
        let mut current = start;

        while let Some(next) = self.next_waypoint(current, &remaining) {
            let _ = remaining.remove(&next);
            ordered.push(next);
            current = next;
        }

        log::debug!(
            "perimeter ring rebuilt with {} waypoints ({:?})",
            ordered.len(),
            self.winding
        );
        PathRing::from_ordered(ordered)
    }

    fn next_waypoint(
        &self,
        current: CellCoord,
        remaining: &BTreeSet<CellCoord>,
    ) -> Option<CellCoord> {
        self.orthogonal_steps()
            .iter()
            .chain(DIAGONAL_STEPS.iter())
            .filter_map(|&(dx, dy)| current.offset(dx, dy))
            .find(|candidate| remaining.contains(candidate))
            .or_else(|| nearest(current, remaining))
    }

    fn orthogonal_steps(&self) -> &'static [(i32, i32); 4] {
        match self.winding {
            Winding::Clockwise => &CLOCKWISE_STEPS,
            Winding::CounterClockwise => &COUNTER_CLOCKWISE_STEPS,
        }
    }
}

/// Collects every coordinate that touches a grid cell by edge or corner
/// without being a cell itself.
#[must_use]
pub fn frontier(grid: &GridView<'_>) -> BTreeSet<CellCoord> {
    grid.positions()
        .flat_map(CellCoord::surrounding)
        .filter(|neighbor| !grid.has_cell(*neighbor))
        .collect()
}

fn nearest(current: CellCoord, remaining: &BTreeSet<CellCoord>) -> Option<CellCoord> {
    remaining
        .iter()
        .copied()
        .min_by_key(|candidate| (current.distance_squared(*candidate), *candidate))
}
