//! Validation and commitment of block footprints against the grid.
//!
//! Every operation is all-or-nothing: either the whole footprint is claimed or
//! the grid keeps its previous occupancy exactly.

use block_defence_core::{CellCoord, PlacementError, Rotation};

use crate::{blocks::Block, grid::SparseGridMap};

/// Occupancy change produced by a successful commit or rotation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlacementChange {
    /// Cells the block no longer claims.
    pub released: Vec<CellCoord>,
    /// Cells the block claims now.
    pub claimed: Vec<CellCoord>,
}

/// Checks whether `block` fits at `anchor` in `rotation`, yielding its footprint.
///
/// Cells held by the block's own committed footprint count as free.
pub fn can_place(
    grid: &SparseGridMap,
    block: &Block,
    anchor: CellCoord,
    rotation: Rotation,
) -> Result<Vec<CellCoord>, PlacementError> {
    let Some(footprint) = block.footprint(anchor, rotation) else {
        return Err(PlacementError::OutOfRange { anchor });
    };
    for &cell in &footprint {
        if !grid.has_cell(cell) {
            return Err(PlacementError::MissingCell { cell });
        }
        if grid.is_occupied(cell) && !held_by(grid, block, cell) {
            return Err(PlacementError::Occupied {
                cell,
                occupant: grid.occupant(cell),
            });
        }
    }
    Ok(footprint)
}

/// Places or moves `block` to `anchor` in `rotation`.
///
/// The previous footprint is released before validation. When validation
/// fails the released cells are claimed again and the block keeps its
/// previous anchor and rotation.
pub fn commit(
    grid: &mut SparseGridMap,
    block: &mut Block,
    anchor: CellCoord,
    rotation: Rotation,
) -> Result<PlacementChange, PlacementError> {
    let previous_anchor = block.anchor();
    let previous_rotation = block.rotation();
    let was_placed = block.is_placed();
    let released = release(grid, block);

    match can_place(grid, block, anchor, rotation) {
        Ok(claimed) => {
            claim_all(grid, block, &claimed);
            block.record_commit(anchor, rotation, claimed.clone());
            Ok(PlacementChange { released, claimed })
        }
        Err(reason) => {
            if was_placed {
                claim_all(grid, block, &released);
                block.record_commit(previous_anchor, previous_rotation, released);
            }
            Err(reason)
        }
    }
}

/// Clears occupancy of the block's committed footprint and unplaces it.
///
/// Returns the released cells; an unplaced block releases nothing.
pub fn release(grid: &mut SparseGridMap, block: &mut Block) -> Vec<CellCoord> {
    let released = block.take_committed();
    for &cell in &released {
        if grid.occupant(cell) == Some(block.id()) {
            grid.vacate(cell);
        }
    }
    released
}

/// Turns the block a quarter turn clockwise around its anchor.
///
/// Unplaced blocks always turn. A placed block only turns when the rotated
/// footprint fits; otherwise three more quarter turns restore the previous
/// orientation and occupancy is left alone.
pub fn rotate(
    grid: &mut SparseGridMap,
    block: &mut Block,
) -> Result<PlacementChange, PlacementError> {
    let tentative = block.rotation().quarter_turn();
    block.set_rotation(tentative);
    if !block.is_placed() {
        return Ok(PlacementChange::default());
    }

    let anchor = block.anchor();
    match can_place(grid, block, anchor, tentative) {
        Ok(claimed) => {
            let released = release(grid, block);
            claim_all(grid, block, &claimed);
            block.record_commit(anchor, tentative, claimed.clone());
            Ok(PlacementChange { released, claimed })
        }
        Err(reason) => {
            for _ in 0..3 {
                block.set_rotation(block.rotation().quarter_turn());
            }
            Err(reason)
        }
    }
}

fn held_by(grid: &SparseGridMap, block: &Block, cell: CellCoord) -> bool {
    block.is_placed()
        && grid.occupant(cell) == Some(block.id())
        && block.committed_cells().contains(&cell)
}

fn claim_all(grid: &mut SparseGridMap, block: &Block, cells: &[CellCoord]) {
    for &cell in cells {
        let _ = grid.claim(cell, block.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_defence_core::{BlockId, ShapeKind};

    fn block(id: u32, kind: ShapeKind) -> Block {
        Block::new(BlockId::new(id), kind.shape(), Rotation::Deg0)
    }

    fn occupancy(grid: &SparseGridMap) -> Vec<(CellCoord, Option<BlockId>)> {
        grid.view()
            .positions()
            .filter(|cell| grid.is_occupied(*cell))
            .map(|cell| (cell, grid.occupant(cell)))
            .collect()
    }

    #[test]
    fn missing_cell_blocks_placement() {
        let grid = SparseGridMap::rectangle(3, 3);
        let line = block(0, ShapeKind::Line3);

        assert_eq!(
            can_place(&grid, &line, CellCoord::new(1, 0), Rotation::Deg0),
            Err(PlacementError::MissingCell {
                cell: CellCoord::new(3, 0)
            })
        );
    }

    #[test]
    fn foreign_occupancy_blocks_placement_but_own_footprint_does_not() {
        let mut grid = SparseGridMap::rectangle(4, 4);
        let mut first = block(0, ShapeKind::O);
        let second = block(1, ShapeKind::Single);
        let anchor = CellCoord::new(1, 1);

        let _ = commit(&mut grid, &mut first, anchor, Rotation::Deg0).expect("first placement");

        assert_eq!(
            can_place(&grid, &second, CellCoord::new(2, 2), Rotation::Deg0),
            Err(PlacementError::Occupied {
                cell: CellCoord::new(2, 2),
                occupant: Some(BlockId::new(0)),
            })
        );
        assert!(can_place(&grid, &first, CellCoord::new(2, 1), Rotation::Deg0).is_ok());
        assert!(can_place(&grid, &first, anchor, Rotation::Deg0).is_ok());
    }

    #[test]
    fn raw_occupancy_without_occupant_is_respected() {
        let mut grid = SparseGridMap::rectangle(2, 2);
        grid.set_occupied(CellCoord::new(1, 1), true);

        assert_eq!(
            can_place(&grid, &block(0, ShapeKind::O), CellCoord::new(0, 0), Rotation::Deg0),
            Err(PlacementError::Occupied {
                cell: CellCoord::new(1, 1),
                occupant: None,
            })
        );
    }

    #[test]
    fn release_then_commit_in_place_keeps_occupancy() {
        let mut grid = SparseGridMap::rectangle(5, 5);
        let mut tee = block(3, ShapeKind::T);
        let anchor = CellCoord::new(1, 2);
        let _ = commit(&mut grid, &mut tee, anchor, Rotation::Deg90).expect("placement");
        let before = occupancy(&grid);

        let released = release(&mut grid, &mut tee);
        assert!(occupancy(&grid).is_empty());
        let change = commit(&mut grid, &mut tee, anchor, Rotation::Deg90).expect("recommit");

        assert_eq!(occupancy(&grid), before);
        assert_eq!(change.claimed, released);
        assert!(change.released.is_empty());
    }

    #[test]
    fn failed_move_restores_previous_footprint() {
        let mut grid = SparseGridMap::rectangle(4, 2);
        let mut mover = block(0, ShapeKind::Line2);
        let mut wall = block(1, ShapeKind::Single);
        let _ = commit(&mut grid, &mut mover, CellCoord::new(0, 0), Rotation::Deg0).expect("mover");
        let _ = commit(&mut grid, &mut wall, CellCoord::new(3, 0), Rotation::Deg0).expect("wall");
        let before = occupancy(&grid);

        let result = commit(&mut grid, &mut mover, CellCoord::new(2, 0), Rotation::Deg0);

        assert_eq!(
            result,
            Err(PlacementError::Occupied {
                cell: CellCoord::new(3, 0),
                occupant: Some(BlockId::new(1)),
            })
        );
        assert_eq!(occupancy(&grid), before);
        assert!(mover.is_placed());
        assert_eq!(mover.anchor(), CellCoord::new(0, 0));
    }

    #[test]
    fn successful_move_reports_released_and_claimed_cells() {
        let mut grid = SparseGridMap::rectangle(4, 1);
        let mut mover = block(0, ShapeKind::Line2);
        let _ = commit(&mut grid, &mut mover, CellCoord::new(0, 0), Rotation::Deg0).expect("place");

        let change = commit(&mut grid, &mut mover, CellCoord::new(1, 0), Rotation::Deg0)
            .expect("overlapping move");

        assert_eq!(
            change.released,
            vec![CellCoord::new(0, 0), CellCoord::new(1, 0)]
        );
        assert_eq!(change.claimed, vec![CellCoord::new(1, 0), CellCoord::new(2, 0)]);
        assert!(!grid.is_occupied(CellCoord::new(0, 0)));
    }

    #[test]
    fn unplaced_blocks_rotate_freely() {
        let mut grid = SparseGridMap::new();
        let mut line = block(0, ShapeKind::I);

        let change = rotate(&mut grid, &mut line).expect("free rotation");

        assert_eq!(change, PlacementChange::default());
        assert_eq!(line.rotation(), Rotation::Deg90);
    }

    #[test]
    fn blocked_rotation_rolls_back() {
        let mut grid = SparseGridMap::rectangle(4, 1);
        let mut line = block(0, ShapeKind::I);
        let _ = commit(&mut grid, &mut line, CellCoord::new(0, 0), Rotation::Deg0).expect("place");
        let before = occupancy(&grid);

        let result = rotate(&mut grid, &mut line);

        assert!(matches!(result, Err(PlacementError::MissingCell { .. })));
        assert_eq!(line.rotation(), Rotation::Deg0);
        assert_eq!(occupancy(&grid), before);
    }

    #[test]
    fn rotation_recommits_footprint_with_self_overlap() {
        let mut grid = SparseGridMap::rectangle(4, 4);
        let mut line = block(0, ShapeKind::Line2);
        let anchor = CellCoord::new(0, 0);
        let _ = commit(&mut grid, &mut line, anchor, Rotation::Deg0).expect("place");

        let change = rotate(&mut grid, &mut line).expect("rotation");

        assert_eq!(line.rotation(), Rotation::Deg90);
        assert_eq!(
            Some(change.claimed.clone()),
            line.footprint(anchor, Rotation::Deg90)
        );
        assert_eq!(line.committed_cells(), change.claimed.as_slice());
        for cell in &change.claimed {
            assert_eq!(grid.occupant(*cell), Some(BlockId::new(0)));
        }
        for cell in change.released.iter().filter(|c| !change.claimed.contains(c)) {
            assert!(!grid.is_occupied(*cell));
        }
    }
}
