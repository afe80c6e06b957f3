//! Authoritative block state and identifier allocation.

use std::collections::BTreeMap;

use block_defence_core::{BlockId, BlockSnapshot, CellCoord, PolyominoShape, Rotation};

/// A polyomino owned by the world, placed or waiting to be placed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    id: BlockId,
    shape: PolyominoShape,
    anchor: CellCoord,
    rotation: Rotation,
    placed: bool,
    committed: Vec<CellCoord>,
}

impl Block {
    /// Creates an unplaced block anchored at the origin.
    #[must_use]
    pub fn new(id: BlockId, shape: PolyominoShape, rotation: Rotation) -> Self {
        Self {
            id,
            shape,
            anchor: CellCoord::new(0, 0),
            rotation,
            placed: false,
            committed: Vec::new(),
        }
    }

    /// Identifier allocated to the block.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Base shape, before rotation.
    #[must_use]
    pub fn shape(&self) -> &PolyominoShape {
        &self.shape
    }

    /// Anchor of the last successful commit.
    #[must_use]
    pub const fn anchor(&self) -> CellCoord {
        self.anchor
    }

    /// Current orientation.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Reports whether the block claims grid cells.
    #[must_use]
    pub const fn is_placed(&self) -> bool {
        self.placed
    }

    /// Cells claimed by the last successful commit. Empty while unplaced.
    #[must_use]
    pub fn committed_cells(&self) -> &[CellCoord] {
        &self.committed
    }

    /// Absolute cells the block would cover at `anchor` in `rotation`, if
    /// they all lie inside the coordinate range.
    #[must_use]
    pub fn footprint(&self, anchor: CellCoord, rotation: Rotation) -> Option<Vec<CellCoord>> {
        self.shape.footprint(anchor, rotation)
    }

    pub(crate) fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    pub(crate) fn record_commit(
        &mut self,
        anchor: CellCoord,
        rotation: Rotation,
        cells: Vec<CellCoord>,
    ) {
        self.anchor = anchor;
        self.rotation = rotation;
        self.placed = true;
        self.committed = cells;
    }

    pub(crate) fn take_committed(&mut self) -> Vec<CellCoord> {
        self.placed = false;
        std::mem::take(&mut self.committed)
    }

    pub(crate) fn snapshot(&self) -> BlockSnapshot {
        BlockSnapshot {
            id: self.id,
            shape: self.shape.clone(),
            anchor: self.anchor,
            rotation: self.rotation,
            placed: self.placed,
            cells: self.committed.clone(),
        }
    }
}

/// Registry that stores blocks and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct BlockRegistry {
    entries: BTreeMap<BlockId, Block>,
    next_block_id: BlockId,
}

impl BlockRegistry {
    /// Creates an empty block registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_block_id: BlockId::new(0),
        }
    }

    /// Registers an unplaced block and returns its identifier.
    pub(crate) fn insert(&mut self, shape: PolyominoShape, rotation: Rotation) -> BlockId {
        let id = self.next_block_id;
        self.next_block_id = BlockId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, Block::new(id, shape, rotation));
        id
    }

    pub(crate) fn get(&self, id: BlockId) -> Option<&Block> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.entries.get_mut(&id)
    }

    /// Iterates blocks in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Block> {
        self.entries.values()
    }
}
