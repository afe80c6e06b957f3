#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure interaction system that turns cursor input into block and grid commands.

use block_defence_core::{BlockId, CellCoord, Command, Event, PlacementError};

/// Declarative preview describing where a held block would land.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Block being dragged.
    pub block: BlockId,
    /// Anchor under the cursor.
    pub anchor: CellCoord,
    /// Cells the block would cover.
    pub cells: Vec<CellCoord>,
    /// Indicates whether the preview represents a valid placement location.
    pub placeable: bool,
}

impl PlacementPreview {
    /// Creates a new placement preview descriptor.
    #[must_use]
    pub fn new(
        block: BlockId,
        anchor: CellCoord,
        cells: Vec<CellCoord>,
        placeable: bool,
    ) -> Self {
        Self {
            block,
            anchor,
            cells,
            placeable,
        }
    }

    /// Builds a preview from the outcome of a placement check.
    ///
    /// Rejected checks produce an unplaceable preview without cells.
    #[must_use]
    pub fn from_check(
        block: BlockId,
        anchor: CellCoord,
        check: Result<Vec<CellCoord>, PlacementError>,
    ) -> Self {
        match check {
            Ok(cells) => Self::new(block, anchor, cells, true),
            Err(_) => Self::new(block, anchor, Vec::new(), false),
        }
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the player confirmed the current action on this frame.
    pub confirm_action: bool,
    /// Indicates whether the player asked to turn the held block.
    pub rotate_action: bool,
    /// Indicates whether the player requested block removal on this frame.
    pub remove_action: bool,
    /// Indicates whether the player asked for a free grid expansion.
    pub expand_action: bool,
    /// Cell currently hovered by the cursor.
    pub cursor_cell: Option<CellCoord>,
}

impl BuilderInput {
    /// Creates an input descriptor that only carries a cursor position.
    #[must_use]
    pub const fn hovering(cursor_cell: CellCoord) -> Self {
        Self {
            confirm_action: false,
            rotate_action: false,
            remove_action: false,
            expand_action: false,
            cursor_cell: Some(cursor_cell),
        }
    }
}

/// Interaction system that translates preview + input into world commands.
///
/// While purchase mode is active a confirmation buys the hovered cell;
/// otherwise it drops the held block.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    purchase_mode: bool,
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            purchase_mode: false,
        }
    }

    /// Reports whether the system believes purchase mode is active.
    #[must_use]
    pub const fn purchase_mode(&self) -> bool {
        self.purchase_mode
    }

    /// Consumes world events and adapter-derived input to emit builder commands.
    ///
    /// The `block_at` closure should mirror the occupant lookup of the world's
    /// grid view so the system can identify the hovered block.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        preview: Option<&PlacementPreview>,
        input: BuilderInput,
        mut block_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(CellCoord) -> Option<BlockId>,
    {
        for event in events {
            if let Event::PurchaseModeChanged { enabled } = event {
                self.purchase_mode = *enabled;
            }
        }

        if input.expand_action {
            if let Some(cell) = input.cursor_cell {
                out.push(Command::ExpandGrid { cell });
            }
        }

        if self.purchase_mode {
            if input.confirm_action {
                if let Some(cell) = input.cursor_cell {
                    out.push(Command::PurchaseCell { cell });
                }
            }
            return;
        }

        if input.rotate_action {
            if let Some(preview) = preview {
                out.push(Command::RotateBlock {
                    block: preview.block,
                });
            }
        }

        if input.confirm_action {
            if let Some(preview) = preview.filter(|preview| preview.placeable) {
                out.push(Command::PlaceBlock {
                    block: preview.block,
                    anchor: preview.anchor,
                });
            }
        }

        if input.remove_action {
            if let Some(block) = input.cursor_cell.and_then(&mut block_at) {
                out.push(Command::RemoveBlock { block });
            }
        }
    }
}
