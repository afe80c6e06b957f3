#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Block Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! renderers to react to. Systems consume event streams, query immutable
//! views such as [`GridView`], and respond exclusively with new command
//! batches.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod shape;

pub use shape::{Offset, PolyominoShape, Rotation, ShapeError, ShapeKind};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid with a `columns × rows` rectangle anchored at the origin.
    ///
    /// This is the only way cells ever disappear. Placed blocks are announced
    /// as removed, enemies as cleared, and a [`Event::GridReset`] precedes the
    /// new cells. Every block is discarded.
    ConfigureGrid {
        /// Number of cell columns in the initial grid.
        columns: u32,
        /// Number of cell rows in the initial grid.
        rows: u32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Adds a single cell to the grid.
    ExpandGrid {
        /// Cell to create.
        cell: CellCoord,
    },
    /// Enables or disables purchase mode.
    SetPurchaseMode {
        /// Whether purchases should be accepted.
        enabled: bool,
    },
    /// Buys a frontier cell while purchase mode is active.
    PurchaseCell {
        /// Cell to create.
        cell: CellCoord,
    },
    /// Registers a new, unplaced block.
    CreateBlock {
        /// Base shape of the block.
        shape: PolyominoShape,
        /// Initial orientation of the block.
        rotation: Rotation,
    },
    /// Places a block, or moves an already placed block, to a new anchor.
    PlaceBlock {
        /// Block to place.
        block: BlockId,
        /// Grid cell that receives the shape's `(0, 0)` offset.
        anchor: CellCoord,
    },
    /// Turns a block a quarter turn clockwise around its anchor.
    RotateBlock {
        /// Block to rotate.
        block: BlockId,
    },
    /// Lifts a placed block off the grid, releasing its cells.
    RemoveBlock {
        /// Block to remove.
        block: BlockId,
    },
    /// Selects the scan order used when ordering the perimeter ring.
    SetPathWinding {
        /// Requested winding.
        winding: Winding,
    },
    /// Starts or stops the enemy spawn timer.
    SetSpawning {
        /// Whether spawning should run.
        enabled: bool,
    },
    /// Takes an enemy from the pool and puts it on the first ring waypoint.
    SpawnEnemy,
    /// Returns a single enemy to the pool.
    DespawnEnemy {
        /// Enemy to return.
        enemy: EnemyId,
    },
    /// Returns every active enemy to the pool.
    ClearEnemies,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// A new cell became part of the grid.
    CellAdded {
        /// Coordinate of the new cell.
        cell: CellCoord,
    },
    /// Purchase mode was switched on or off.
    PurchaseModeChanged {
        /// Whether purchases are now accepted.
        enabled: bool,
    },
    /// A purchase request was refused.
    PurchaseRejected {
        /// Coordinate named in the request.
        cell: CellCoord,
        /// Specific reason the purchase failed.
        reason: PurchaseError,
    },
    /// A new block was registered.
    BlockCreated {
        /// Identifier allocated to the block.
        block: BlockId,
        /// Base shape of the block.
        shape: PolyominoShape,
        /// Orientation of the block.
        rotation: Rotation,
    },
    /// A block now occupies the listed cells.
    BlockPlaced {
        /// Block that was placed.
        block: BlockId,
        /// Cells claimed by the block.
        cells: Vec<CellCoord>,
    },
    /// A block was lifted from the listed cells.
    BlockRemoved {
        /// Block that was removed.
        block: BlockId,
        /// Cells released by the block.
        cells: Vec<CellCoord>,
    },
    /// A block changed orientation.
    BlockRotated {
        /// Block that rotated.
        block: BlockId,
        /// Orientation after the turn.
        rotation: Rotation,
    },
    /// A placement or move request was refused.
    PlacementRejected {
        /// Block named in the request.
        block: BlockId,
        /// Anchor requested for the block.
        anchor: CellCoord,
        /// Orientation that was validated.
        rotation: Rotation,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// A rotation request was refused and the block kept its orientation.
    RotationRejected {
        /// Block named in the request.
        block: BlockId,
        /// Specific reason the rotation failed.
        reason: PlacementError,
    },
    /// A removal request was refused.
    RemovalRejected {
        /// Block named in the request.
        block: BlockId,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Every cell and block was dropped; the new grid follows as `CellAdded` events.
    GridReset,
    /// The perimeter ring was rebuilt from the current cell set.
    PathRecomputed {
        /// Waypoints in traversal order; the last connects back to the first.
        cells: Vec<CellCoord>,
    },
    /// The spawn timer was started or stopped.
    SpawningChanged {
        /// Whether spawning is now running.
        enabled: bool,
    },
    /// An enemy entered the ring.
    EnemySpawned {
        /// Identifier of the spawned enemy.
        enemy: EnemyId,
        /// Waypoint the enemy starts on.
        cell: CellCoord,
    },
    /// A spawn attempt was skipped; the next interval retries.
    SpawnSkipped {
        /// Specific reason the spawn was skipped.
        reason: SpawnError,
    },
    /// An enemy stepped to the next waypoint of its ring.
    EnemyAdvanced {
        /// Identifier of the enemy that moved.
        enemy: EnemyId,
        /// Waypoint the enemy left.
        from: CellCoord,
        /// Waypoint the enemy reached.
        to: CellCoord,
    },
    /// An enemy was returned to the pool.
    EnemyDespawned {
        /// Identifier of the returned enemy.
        enemy: EnemyId,
    },
    /// Every active enemy was returned to the pool.
    EnemiesCleared {
        /// Number of enemies that were returned.
        count: usize,
    },
}

const ORTHOGONAL_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const SURROUNDING_OFFSETS: [(i32, i32); 8] = [
    (0, 1),
    (0, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (1, 1),
    (-1, -1),
    (1, -1),
];

/// Location of a single grid cell.
///
/// Coordinates are signed because the grid may grow in any direction.
/// Ordering compares `x` first and then `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate displaced by `(dx, dy)`, or `None` when either
    /// axis leaves the `i32` range.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        match (self.x.checked_add(dx), self.y.checked_add(dy)) {
            (Some(x), Some(y)) => Some(Self::new(x, y)),
            _ => None,
        }
    }

    /// The edge-sharing neighbours in the order right, left, up, down.
    ///
    /// Neighbours outside the coordinate range are skipped.
    pub fn orthogonal_neighbors(self) -> impl Iterator<Item = CellCoord> {
        ORTHOGONAL_OFFSETS
            .into_iter()
            .filter_map(move |(dx, dy)| self.offset(dx, dy))
    }

    /// The edge-sharing and corner-sharing neighbours.
    ///
    /// Neighbours outside the coordinate range are skipped.
    pub fn surrounding(self) -> impl Iterator<Item = CellCoord> {
        SURROUNDING_OFFSETS
            .into_iter()
            .filter_map(move |(dx, dy)| self.offset(dx, dy))
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Squared Euclidean distance; orders candidates exactly like the true distance.
    #[must_use]
    pub fn distance_squared(self, other: CellCoord) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dy = u64::from(self.y.abs_diff(other.y));
        dx * dx + dy * dy
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inclusive bounding box of every cell in the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBounds {
    min: CellCoord,
    max: CellCoord,
}

impl GridBounds {
    /// Creates bounds from inclusive corners.
    #[must_use]
    pub const fn new(min: CellCoord, max: CellCoord) -> Self {
        Self { min, max }
    }

    /// Corner with the smallest `x` and `y`.
    #[must_use]
    pub const fn min(&self) -> CellCoord {
        self.min
    }

    /// Corner with the largest `x` and `y`.
    #[must_use]
    pub const fn max(&self) -> CellCoord {
        self.max
    }

    /// Number of columns spanned by the bounds.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.max.x().abs_diff(self.min.x()) + 1
    }

    /// Number of rows spanned by the bounds.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.max.y().abs_diff(self.min.y()) + 1
    }

    /// Reports whether the cell lies inside the bounds.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        (self.min.x()..=self.max.x()).contains(&cell.x())
            && (self.min.y()..=self.max.y()).contains(&cell.y())
    }
}

/// State of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    position: CellCoord,
    occupied: bool,
    occupant: Option<BlockId>,
}

impl Cell {
    /// Creates an unoccupied cell.
    #[must_use]
    pub const fn vacant(position: CellCoord) -> Self {
        Self {
            position,
            occupied: false,
            occupant: None,
        }
    }

    /// Coordinate of the cell.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.position
    }

    /// Reports whether anything claims the cell.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Block claiming the cell, if the claim came from a block.
    #[must_use]
    pub const fn occupant(&self) -> Option<BlockId> {
        self.occupant
    }

    /// Sets the raw occupancy flag. Clearing it also forgets the occupant.
    pub fn set_occupied(&mut self, occupied: bool) {
        self.occupied = occupied;
        if !occupied {
            self.occupant = None;
        }
    }

    /// Marks the cell as occupied by `block`.
    pub fn claim(&mut self, block: BlockId) {
        self.occupied = true;
        self.occupant = Some(block);
    }
}

/// Read-only view over the sparse cell map.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a BTreeMap<CellCoord, Cell>,
    bounds: Option<GridBounds>,
}

impl<'a> GridView<'a> {
    /// Captures a view backed by the provided cell map and its last computed bounds.
    #[must_use]
    pub fn new(cells: &'a BTreeMap<CellCoord, Cell>, bounds: Option<GridBounds>) -> Self {
        Self { cells, bounds }
    }

    /// Reports whether the cell exists.
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

    /// Full state of a cell.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&'a Cell> {
        self.cells.get(&cell)
    }

    /// Iterator over every cell coordinate in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = CellCoord> + 'a {
        self.cells.keys().copied()
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

    /// Bounds captured at the last explicit recomputation.
    #[must_use]
    pub const fn bounds(&self) -> Option<GridBounds> {
        self.bounds
    }
}

/// Scan order used when walking the perimeter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Winding {
    /// Right, down, left, up.
    #[default]
    Clockwise,
    /// Left, down, right, up.
    CounterClockwise,
}

/// Closed enemy route around the grid.
///
/// The last waypoint connects back to the first. A coordinate never appears twice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathRing {
    cells: Vec<CellCoord>,
}

impl PathRing {
    /// Builds a ring from waypoints in traversal order.
    ///
    /// Later repetitions of a coordinate are dropped so the ring never revisits a cell.
    #[must_use]
    pub fn from_ordered(cells: Vec<CellCoord>) -> Self {
        let mut seen = BTreeSet::new();
        let cells = cells.into_iter().filter(|cell| seen.insert(*cell)).collect();
        Self { cells }
    }

    /// Waypoints in traversal order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the ring has no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Waypoint at `index`, wrapping around the ring.
    #[must_use]
    pub fn waypoint(&self, index: usize) -> Option<CellCoord> {
        if self.cells.is_empty() {
            return None;
        }
        self.cells.get(index % self.cells.len()).copied()
    }

    /// Index following `index`, wrapping from the last waypoint to the first.
    #[must_use]
    pub fn next_index(&self, index: usize) -> usize {
        if self.cells.is_empty() {
            0
        } else {
            (index + 1) % self.cells.len()
        }
    }

    /// Consumes the ring, yielding the waypoints.
    #[must_use]
    pub fn into_vec(self) -> Vec<CellCoord> {
        self.cells
    }
}

/// Unique identifier assigned to a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(u32);

impl BlockId {
    /// Creates a new block identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a pooled enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable representation of a single block used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockSnapshot {
    /// Identifier allocated to the block.
    pub id: BlockId,
    /// Base shape of the block.
    pub shape: PolyominoShape,
    /// Cell receiving the shape's `(0, 0)` offset.
    pub anchor: CellCoord,
    /// Current orientation.
    pub rotation: Rotation,
    /// Whether the block currently claims grid cells.
    pub placed: bool,
    /// Cells claimed by the last successful commit.
    pub cells: Vec<CellCoord>,
}

/// Read-only snapshot describing every registered block.
#[derive(Clone, Debug, Default)]
pub struct BlockView {
    snapshots: Vec<BlockSnapshot>,
}

impl BlockView {
    /// Creates a new block view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BlockSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured block snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<BlockSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single active enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemySnapshot {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Waypoint the enemy currently stands on.
    pub cell: CellCoord,
    /// Index of that waypoint within the enemy's ring.
    pub waypoint: usize,
    /// Time accumulated toward the next step.
    pub accumulated: Duration,
}

/// Read-only snapshot describing every active enemy.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Reasons a block placement, move or rotation may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// No block with the provided identifier exists.
    #[error("unknown block")]
    UnknownBlock,
    /// Part of the footprint would fall outside the coordinate range.
    #[error("footprint anchored at {anchor} leaves the coordinate range")]
    OutOfRange {
        /// Anchor requested for the block.
        anchor: CellCoord,
    },
    /// Part of the footprint falls on a coordinate that is not a grid cell.
    #[error("cell {cell} is not part of the grid")]
    MissingCell {
        /// First footprint cell found missing.
        cell: CellCoord,
    },
    /// Part of the footprint is claimed by something else.
    #[error("cell {cell} is already occupied")]
    Occupied {
        /// First footprint cell found occupied.
        cell: CellCoord,
        /// Block holding the cell, when the claim belongs to a block.
        occupant: Option<BlockId>,
    },
}

/// Reasons a block removal request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RemovalError {
    /// No block with the provided identifier exists.
    #[error("unknown block")]
    UnknownBlock,
    /// The block does not currently occupy the grid.
    #[error("block is not placed")]
    NotPlaced,
}

/// Reasons a grid expansion may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ExpansionError {
    /// The coordinate is already a grid cell.
    #[error("cell {cell} already exists")]
    DuplicateExpansion {
        /// Coordinate named in the request.
        cell: CellCoord,
    },
}

/// Reasons a cell purchase may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PurchaseError {
    /// Purchase mode is switched off.
    #[error("purchase mode is disabled")]
    PurchaseModeDisabled,
    /// The coordinate lies outside the purchasable area.
    #[error("cell lies outside the purchasable area")]
    OutOfBounds,
    /// The coordinate does not touch an existing cell edge.
    #[error("cell is not adjacent to the grid")]
    NotAdjacent,
    /// The coordinate is already a grid cell.
    #[error(transparent)]
    Expansion(#[from] ExpansionError),
}

/// Reasons a spawn attempt may be skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SpawnError {
    /// Every pooled enemy is already active.
    #[error("enemy pool exhausted")]
    PoolExhausted,
    /// No ring exists for enemies to follow.
    #[error("no path available")]
    EmptyPath,
}
