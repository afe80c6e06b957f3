//! Sparse, append-only cell storage with occupancy tracking.

use std::collections::BTreeMap;

use block_defence_core::{BlockId, Cell, CellCoord, GridBounds, GridView};

/// Mapping from coordinates to cells that only ever grows.
///
/// The map is the single authoritative occupancy store. A cell is only ever
/// occupied when it exists, and carries an occupant only while occupied.
/// Bounds are derived data that lag behind insertions until
/// [`SparseGridMap::recompute_bounds`] runs.
#[derive(Clone, Debug, Default)]
pub struct SparseGridMap {
    cells: BTreeMap<CellCoord, Cell>,
    bounds: Option<GridBounds>,
}

impl SparseGridMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `columns × rows` rectangle with its minimum corner at the origin.
    #[must_use]
    pub fn rectangle(columns: u32, rows: u32) -> Self {
        let columns = i32::try_from(columns).unwrap_or(i32::MAX);
        let rows = i32::try_from(rows).unwrap_or(i32::MAX);

        let mut map = Self::new();
        for x in 0..columns {
            for y in 0..rows {
                let _ = map.add_cell(CellCoord::new(x, y));
            }
        }
        map.recompute_bounds();
        map
    }

    /// Inserts a vacant cell, returning `false` when the cell already existed.
    ///
    /// Existing cells keep their occupancy. Bounds are not refreshed.
    pub fn add_cell(&mut self, cell: CellCoord) -> bool {
        if self.cells.contains_key(&cell) {
            return false;
        }
        let _ = self.cells.insert(cell, Cell::vacant(cell));
        true
    }

    /// Reports whether the coordinate is a grid cell.
    #[must_use]
    pub fn has_cell(&self, cell: CellCoord) -> bool {
        self.cells.contains_key(&cell)
    }

    /// Reports whether the cell exists and is occupied.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.cells.get(&cell).is_some_and(Cell::is_occupied)
    }

    /// Block occupying the cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<BlockId> {
        self.cells.get(&cell).and_then(Cell::occupant)
    }

    /// Sets the raw occupancy flag. Missing cells are ignored.
    pub fn set_occupied(&mut self, cell: CellCoord, occupied: bool) {
        if let Some(entry) = self.cells.get_mut(&cell) {
            entry.set_occupied(occupied);
        }
    }

    /// Marks the cell as occupied by `block`, returning `false` for missing cells.
    pub fn claim(&mut self, cell: CellCoord, block: BlockId) -> bool {
        match self.cells.get_mut(&cell) {
            Some(entry) => {
                entry.claim(block);
                true
            }
            None => false,
        }
    }

    /// Clears occupancy of the cell. Missing cells are ignored.
    pub fn vacate(&mut self, cell: CellCoord) {
        self.set_occupied(cell, false);
    }

    /// Rescans every cell to refresh the bounding box.
    pub fn recompute_bounds(&mut self) {
        let mut positions = self.cells.keys();
        let Some(first) = positions.next() else {
            self.bounds = None;
            return;
        };

        let (mut min_x, mut min_y) = (first.x(), first.y());
        let (mut max_x, mut max_y) = (min_x, min_y);
        for cell in positions {
            min_x = min_x.min(cell.x());
            min_y = min_y.min(cell.y());
            max_x = max_x.max(cell.x());
            max_y = max_y.max(cell.y());
        }

        self.bounds = Some(GridBounds::new(
            CellCoord::new(min_x, min_y),
            CellCoord::new(max_x, max_y),
        ));
    }

    /// Bounds captured by the last call to [`SparseGridMap::recompute_bounds`].
    #[must_use]
    pub const fn bounds(&self) -> Option<GridBounds> {
        self.bounds
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read-only view used by systems and queries.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_cell_is_idempotent_and_keeps_occupancy() {
        let mut grid = SparseGridMap::new();
        let cell = CellCoord::new(2, -1);

        assert!(grid.add_cell(cell));
        assert!(grid.claim(cell, BlockId::new(4)));
        assert!(!grid.add_cell(cell));

        assert_eq!(grid.len(), 1);
        assert_eq!(grid.occupant(cell), Some(BlockId::new(4)));
    }

    #[test]
    fn occupancy_on_missing_cells_is_ignored() {
        let mut grid = SparseGridMap::new();
        let missing = CellCoord::new(5, 5);

        grid.set_occupied(missing, true);
        assert!(!grid.claim(missing, BlockId::new(0)));

        assert!(!grid.has_cell(missing));
        assert!(!grid.is_occupied(missing));
    }

    #[test]
    fn bounds_lag_until_recomputed() {
        let mut grid = SparseGridMap::rectangle(2, 3);
        assert_eq!(
            grid.bounds(),
            Some(GridBounds::new(CellCoord::new(0, 0), CellCoord::new(1, 2)))
        );

        let _ = grid.add_cell(CellCoord::new(-4, 1));
        assert_eq!(grid.bounds().map(|bounds| bounds.width()), Some(2));

        grid.recompute_bounds();
        let bounds = grid.bounds().expect("bounds for non-empty grid");
        assert_eq!(bounds.min(), CellCoord::new(-4, 0));
        assert_eq!(bounds.width(), 6);
        assert_eq!(bounds.height(), 3);
    }

    #[test]
    fn empty_grid_has_no_bounds() {
        let mut grid = SparseGridMap::rectangle(0, 4);
        grid.recompute_bounds();
        assert!(grid.is_empty());
        assert_eq!(grid.bounds(), None);
    }

    #[test]
    fn vacate_forgets_the_occupant() {
        let mut grid = SparseGridMap::rectangle(1, 1);
        let origin = CellCoord::new(0, 0);
        let _ = grid.claim(origin, BlockId::new(1));

        grid.vacate(origin);

        assert!(!grid.is_occupied(origin));
        assert_eq!(grid.view().occupant(origin), None);
    }
}
