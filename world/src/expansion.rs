//! Grid growth: frontier candidates, free expansion and gated purchases.

use std::collections::BTreeSet;

use block_defence_core::{CellCoord, ExpansionError, GridBounds, GridView, PurchaseError};

use crate::grid::SparseGridMap;

/// Conditions a purchase must satisfy on top of a plain expansion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurchaseGate {
    /// Whether purchase mode is switched on.
    pub enabled: bool,
    /// Area purchases are confined to, if limited.
    pub bounds: Option<GridBounds>,
}

/// Coordinates sharing an edge with a cell without being cells themselves.
#[must_use]
pub fn expandable_positions(grid: &GridView<'_>) -> BTreeSet<CellCoord> {
    grid.positions()
        .flat_map(CellCoord::orthogonal_neighbors)
        .filter(|neighbor| !grid.has_cell(*neighbor))
        .collect()
}

/// Adds `cell` to the grid and refreshes the bounds.
///
/// Adjacency is not required. Requesting an existing cell leaves the grid
/// untouched.
pub fn expand_at(grid: &mut SparseGridMap, cell: CellCoord) -> Result<(), ExpansionError> {
    if !grid.add_cell(cell) {
        log::debug!("expansion at {cell} ignored: cell already exists");
        return Err(ExpansionError::DuplicateExpansion { cell });
    }
    grid.recompute_bounds();
    Ok(())
}

/// Adds `cell` to the grid when the purchase gate allows it.
///
/// Checks run in order: purchase mode, purchasable area, duplicate, adjacency.
pub fn purchase_at(
    grid: &mut SparseGridMap,
    cell: CellCoord,
    gate: PurchaseGate,
) -> Result<(), PurchaseError> {
    if !gate.enabled {
        return Err(PurchaseError::PurchaseModeDisabled);
    }
    if gate.bounds.is_some_and(|bounds| !bounds.contains(cell)) {
        return Err(PurchaseError::OutOfBounds);
    }
    if grid.has_cell(cell) {
        return Err(ExpansionError::DuplicateExpansion { cell }.into());
    }
    let adjacent = cell
        .orthogonal_neighbors()
        .into_iter()
        .any(|neighbor| grid.has_cell(neighbor));
    if !adjacent {
        return Err(PurchaseError::NotAdjacent);
    }

    expand_at(grid, cell)?;
    Ok(())
}
