#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Block Defence.
//!
//! The world owns the sparse grid, every block, the enemy pool and the
//! perimeter ring. It only changes through [`apply`]; everything else reads it
//! through [`query`].

mod blocks;
mod enemies;
pub mod expansion;
pub mod grid;
pub mod placement;

use std::time::Duration;

use block_defence_core::{
    BlockId, CellCoord, Command, Event, GridBounds, PathRing, PlacementError, RemovalError,
    Rotation, SpawnError, Winding,
};
use block_defence_system_perimeter::PerimeterPathBuilder;

pub use blocks::Block;
pub use grid::SparseGridMap;

use blocks::BlockRegistry;
use enemies::EnemyPool;
use expansion::PurchaseGate;

const DEFAULT_GRID_COLUMNS: u32 = 10;
const DEFAULT_GRID_ROWS: u32 = 10;
const DEFAULT_ENEMY_CAPACITY: u32 = 20;
const DEFAULT_ENEMY_STEP: Duration = Duration::from_millis(500);

/// Parameters used to build a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    /// Columns of the initial rectangular grid.
    pub columns: u32,
    /// Rows of the initial rectangular grid.
    pub rows: u32,
    /// Scan order used for the perimeter ring.
    pub winding: Winding,
    /// Number of enemies the pool holds.
    pub enemy_capacity: u32,
    /// Time an enemy waits on a waypoint before stepping to the next one.
    pub enemy_step: Duration,
    /// Area purchases are confined to; `None` allows any adjacent cell.
    pub purchase_bounds: Option<GridBounds>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            rows: DEFAULT_GRID_ROWS,
            winding: Winding::default(),
            enemy_capacity: DEFAULT_ENEMY_CAPACITY,
            enemy_step: DEFAULT_ENEMY_STEP,
            purchase_bounds: None,
        }
    }
}

/// Represents the authoritative Block Defence world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    grid: SparseGridMap,
    blocks: BlockRegistry,
    enemies: EnemyPool,
    path: PathRing,
    path_builder: PerimeterPathBuilder,
    purchase_mode: bool,
    spawning: bool,
    tick_index: u64,
}

impl World {
    /// Creates a world using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a world with a `columns × rows` grid and its perimeter ring.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let grid = SparseGridMap::rectangle(config.columns, config.rows);
        let path_builder = PerimeterPathBuilder::new(config.winding);
        let path = path_builder.build(&grid.view());
        Self {
            grid,
            blocks: BlockRegistry::new(),
            enemies: EnemyPool::new(config.enemy_capacity, config.enemy_step),
            path,
            path_builder,
            purchase_mode: false,
            spawning: false,
            tick_index: 0,
            config,
        }
    }

    fn rebuild_path(&mut self, out_events: &mut Vec<Event>) {
        self.path = self.path_builder.build(&self.grid.view());
        out_events.push(Event::PathRecomputed {
            cells: self.path.cells().to_vec(),
        });
    }

    fn configure_grid(&mut self, columns: u32, rows: u32, out_events: &mut Vec<Event>) {
        log::info!("configuring {columns}x{rows} grid");
        out_events.extend(
            self.blocks
                .iter()
                .filter(|block| block.is_placed())
                .map(|block| Event::BlockRemoved {
                    block: block.id(),
                    cells: block.committed_cells().to_vec(),
                }),
        );
        let cleared = self.enemies.clear();
        if cleared > 0 {
            out_events.push(Event::EnemiesCleared { count: cleared });
        }

        self.config.columns = columns;
        self.config.rows = rows;
        self.grid = SparseGridMap::rectangle(columns, rows);
        self.blocks = BlockRegistry::new();
        out_events.push(Event::GridReset);
        out_events.extend(
            self.grid
                .view()
                .positions()
                .map(|cell| Event::CellAdded { cell }),
        );
        self.rebuild_path(out_events);
    }

    fn place_block(&mut self, id: BlockId, anchor: CellCoord, out_events: &mut Vec<Event>) {
        let Some(block) = self.blocks.get_mut(id) else {
            out_events.push(Event::PlacementRejected {
                block: id,
                anchor,
                rotation: Rotation::default(),
                reason: PlacementError::UnknownBlock,
            });
            return;
        };

        let rotation = block.rotation();
        match placement::commit(&mut self.grid, block, anchor, rotation) {
            Ok(change) => {
                if !change.released.is_empty() {
                    out_events.push(Event::BlockRemoved {
                        block: id,
                        cells: change.released,
                    });
                }
                out_events.push(Event::BlockPlaced {
                    block: id,
                    cells: change.claimed,
                });
            }
            Err(reason) => {
                log::debug!("placement of block {} at {anchor} rejected: {reason}", id.get());
                out_events.push(Event::PlacementRejected {
                    block: id,
                    anchor,
                    rotation,
                    reason,
                });
            }
        }
    }

    fn rotate_block(&mut self, id: BlockId, out_events: &mut Vec<Event>) {
        let Some(block) = self.blocks.get_mut(id) else {
            out_events.push(Event::RotationRejected {
                block: id,
                reason: PlacementError::UnknownBlock,
            });
            return;
        };

        match placement::rotate(&mut self.grid, block) {
            Ok(change) => {
                if !change.released.is_empty() {
                    out_events.push(Event::BlockRemoved {
                        block: id,
                        cells: change.released,
                    });
                }
                if !change.claimed.is_empty() {
                    out_events.push(Event::BlockPlaced {
                        block: id,
                        cells: change.claimed,
                    });
                }
                out_events.push(Event::BlockRotated {
                    block: id,
                    rotation: block.rotation(),
                });
            }
            Err(reason) => {
                log::debug!("rotation of block {} rejected: {reason}", id.get());
                out_events.push(Event::RotationRejected { block: id, reason });
            }
        }
    }

    fn remove_block(&mut self, id: BlockId, out_events: &mut Vec<Event>) {
        let reason = match self.blocks.get_mut(id) {
            None => RemovalError::UnknownBlock,
            Some(block) if !block.is_placed() => RemovalError::NotPlaced,
            Some(block) => {
                let cells = placement::release(&mut self.grid, block);
                out_events.push(Event::BlockRemoved { block: id, cells });
                return;
            }
        };
        out_events.push(Event::RemovalRejected { block: id, reason });
    }

    fn spawn_enemy(&mut self, out_events: &mut Vec<Event>) {
        match self.enemies.spawn(&self.path) {
            Ok((enemy, cell)) => out_events.push(Event::EnemySpawned { enemy, cell }),
            Err(reason) => {
                match reason {
                    SpawnError::PoolExhausted => log::warn!("enemy pool exhausted; spawn skipped"),
                    SpawnError::EmptyPath => log::warn!("no path available; spawn skipped"),
                }
                out_events.push(Event::SpawnSkipped { reason });
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { columns, rows } => {
            world.configure_grid(columns, rows, out_events);
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.enemies.advance(dt, out_events);
        }
        Command::ExpandGrid { cell } => {
            if expansion::expand_at(&mut world.grid, cell).is_ok() {
                out_events.push(Event::CellAdded { cell });
                world.rebuild_path(out_events);
            }
        }
        Command::SetPurchaseMode { enabled } => {
            if world.purchase_mode != enabled {
                world.purchase_mode = enabled;
                out_events.push(Event::PurchaseModeChanged { enabled });
            }
        }
        Command::PurchaseCell { cell } => {
            let gate = PurchaseGate {
                enabled: world.purchase_mode,
                bounds: world.config.purchase_bounds,
            };
            match expansion::purchase_at(&mut world.grid, cell, gate) {
                Ok(()) => {
                    out_events.push(Event::CellAdded { cell });
                    world.rebuild_path(out_events);
                }
                Err(reason) => {
                    log::debug!("purchase of {cell} rejected: {reason}");
                    out_events.push(Event::PurchaseRejected { cell, reason });
                }
            }
        }
        Command::CreateBlock { shape, rotation } => {
            let block = world.blocks.insert(shape.clone(), rotation);
            out_events.push(Event::BlockCreated {
                block,
                shape,
                rotation,
            });
        }
        Command::PlaceBlock { block, anchor } => world.place_block(block, anchor, out_events),
        Command::RotateBlock { block } => world.rotate_block(block, out_events),
        Command::RemoveBlock { block } => world.remove_block(block, out_events),
        Command::SetPathWinding { winding } => {
            world.config.winding = winding;
            world.path_builder = PerimeterPathBuilder::new(winding);
            world.rebuild_path(out_events);
        }
        Command::SetSpawning { enabled } => {
            if world.spawning != enabled {
                world.spawning = enabled;
                out_events.push(Event::SpawningChanged { enabled });
            }
        }
        Command::SpawnEnemy => world.spawn_enemy(out_events),
        Command::DespawnEnemy { enemy } => {
            if world.enemies.despawn(enemy) {
                out_events.push(Event::EnemyDespawned { enemy });
            }
        }
        Command::ClearEnemies => {
            let count = world.enemies.clear();
            out_events.push(Event::EnemiesCleared { count });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeSet;

    use block_defence_core::{
        BlockId, BlockSnapshot, BlockView, CellCoord, EnemyView, GridBounds, GridView,
        PlacementError, Rotation, Winding,
    };

    use super::{expansion, placement, World, WorldConfig};

    /// Read-only view of every grid cell and its occupancy.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Bounding box of the grid, absent while the grid is empty.
    #[must_use]
    pub fn bounds(world: &World) -> Option<GridBounds> {
        world.grid.bounds()
    }

    /// Coordinates that may be added to the grid next to an existing cell.
    #[must_use]
    pub fn expandable_positions(world: &World) -> BTreeSet<CellCoord> {
        expansion::expandable_positions(&world.grid.view())
    }

    /// Captures a read-only view of every registered block.
    #[must_use]
    pub fn block_view(world: &World) -> BlockView {
        BlockView::from_snapshots(world.blocks.iter().map(|block| block.snapshot()).collect())
    }

    /// Snapshot of a single block.
    #[must_use]
    pub fn block(world: &World, block: BlockId) -> Option<BlockSnapshot> {
        world.blocks.get(block).map(|block| block.snapshot())
    }

    /// Checks whether the block fits at `anchor` in `rotation` without changing anything.
    pub fn can_place(
        world: &World,
        block: BlockId,
        anchor: CellCoord,
        rotation: Rotation,
    ) -> Result<Vec<CellCoord>, PlacementError> {
        let block = world.blocks.get(block).ok_or(PlacementError::UnknownBlock)?;
        placement::can_place(&world.grid, block, anchor, rotation)
    }

    /// Current perimeter ring in traversal order; empty when no ring exists.
    #[must_use]
    pub fn path(world: &World) -> &[CellCoord] {
        world.path.cells()
    }

    /// Reports whether enemies have a ring to follow.
    #[must_use]
    pub fn has_path(world: &World) -> bool {
        !world.path.is_empty()
    }

    /// Captures a read-only view of every active enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.snapshots())
    }

    /// Reports whether purchases are accepted.
    #[must_use]
    pub fn purchase_mode(world: &World) -> bool {
        world.purchase_mode
    }

    /// Reports whether the spawn timer is running.
    #[must_use]
    pub fn spawning_enabled(world: &World) -> bool {
        world.spawning
    }

    /// Winding used for the perimeter ring.
    #[must_use]
    pub fn winding(world: &World) -> Winding {
        world.path_builder.winding()
    }

    /// Configuration the world currently runs with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Number of ticks applied since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

/// Boolean helpers for interactive callers that only need to know whether a
/// request took effect.
///
/// Each helper applies a single command and inspects the events it produced.
pub mod interaction {
    use block_defence_core::{BlockId, CellCoord, Command, Event};

    use super::{apply, World};

    fn applied(
        world: &mut World,
        command: Command,
        out_events: &mut Vec<Event>,
        accepted: impl Fn(&Event) -> bool,
    ) -> bool {
        let start = out_events.len();
        apply(world, command, out_events);
        out_events[start..].iter().any(accepted)
    }

    /// Places or moves the block, reporting whether it now sits at `anchor`.
    pub fn try_place(
        world: &mut World,
        block: BlockId,
        anchor: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> bool {
        applied(
            world,
            Command::PlaceBlock { block, anchor },
            out_events,
            |event| matches!(event, Event::BlockPlaced { block: placed, .. } if *placed == block),
        )
    }

    /// Turns the block a quarter turn, reporting whether the turn was kept.
    pub fn try_rotate(world: &mut World, block: BlockId, out_events: &mut Vec<Event>) -> bool {
        applied(
            world,
            Command::RotateBlock { block },
            out_events,
            |event| matches!(event, Event::BlockRotated { block: rotated, .. } if *rotated == block),
        )
    }

    /// Adds a cell without gating, reporting whether a new cell was created.
    pub fn try_expand(world: &mut World, cell: CellCoord, out_events: &mut Vec<Event>) -> bool {
        applied(
            world,
            Command::ExpandGrid { cell },
            out_events,
            |event| matches!(event, Event::CellAdded { cell: added } if *added == cell),
        )
    }

    /// Buys a cell, reporting whether the purchase went through.
    pub fn try_purchase(world: &mut World, cell: CellCoord, out_events: &mut Vec<Event>) -> bool {
        applied(
            world,
            Command::PurchaseCell { cell },
            out_events,
            |event| matches!(event, Event::CellAdded { cell: added } if *added == cell),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_defence_core::ShapeKind;

    fn world_with(columns: u32, rows: u32) -> World {
        World::with_config(WorldConfig {
            columns,
            rows,
            ..WorldConfig::default()
        })
    }

    #[test]
    fn default_world_has_ten_by_ten_grid_and_ring() {
        let world = World::new();
        let bounds = query::bounds(&world).expect("bounds");

        assert_eq!(bounds.width(), 10);
        assert_eq!(bounds.height(), 10);
        assert_eq!(query::path(&world).len(), 44);
        assert!(query::has_path(&world));
    }

    #[test]
    fn configure_grid_announces_cells_and_ring() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ConfigureGrid {
                columns: 2,
                rows: 2,
            },
            &mut events,
        );

        let added = events
            .iter()
            .filter(|event| matches!(event, Event::CellAdded { .. }))
            .count();
        assert_eq!(added, 4);
        assert_eq!(
            events.last(),
            Some(&Event::PathRecomputed {
                cells: query::path(&world).to_vec()
            })
        );
        assert_eq!(query::path(&world).len(), 12);
    }

    #[test]
    fn configure_grid_discards_blocks() {
        let mut world = world_with(3, 3);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::CreateBlock {
                shape: ShapeKind::Single.shape(),
                rotation: Rotation::Deg0,
            },
            &mut events,
        );

        apply(
            &mut world,
            Command::ConfigureGrid {
                columns: 3,
                rows: 3,
            },
            &mut events,
        );

        assert_eq!(query::block_view(&world).iter().count(), 0);
    }

    #[test]
    fn configure_grid_announces_removed_blocks_before_the_reset() {
        let mut world = world_with(4, 4);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::CreateBlock {
                shape: ShapeKind::O.shape(),
                rotation: Rotation::Deg0,
            },
            &mut events,
        );
        let block = BlockId::new(0);
        assert!(interaction::try_place(
            &mut world,
            block,
            CellCoord::new(2, 2),
            &mut events
        ));
        apply(&mut world, Command::SpawnEnemy, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::ConfigureGrid {
                columns: 2,
                rows: 2,
            },
            &mut events,
        );

        let footprint = vec![
            CellCoord::new(2, 2),
            CellCoord::new(3, 2),
            CellCoord::new(2, 3),
            CellCoord::new(3, 3),
        ];
        let mut removed = match &events[0] {
            Event::BlockRemoved { block: removed, cells } if *removed == block => cells.clone(),
            other => panic!("expected the placed block to be removed first, got {other:?}"),
        };
        removed.sort();
        let mut expected = footprint;
        expected.sort();
        assert_eq!(removed, expected);
        assert_eq!(events[1], Event::EnemiesCleared { count: 1 });
        assert_eq!(events[2], Event::GridReset);
        assert!(!query::grid_view(&world).has_cell(CellCoord::new(3, 3)));
        assert_eq!(query::grid_view(&world).len(), 4);
    }

    #[test]
    fn duplicate_expansion_is_silent() {
        let mut world = world_with(1, 1);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::ExpandGrid {
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        );

        assert!(events.is_empty());
    }

    #[test]
    fn purchase_mode_change_is_reported_once() {
        let mut world = World::new();
        let mut events = Vec::new();

        for _ in 0..2 {
            apply(
                &mut world,
                Command::SetPurchaseMode { enabled: true },
                &mut events,
            );
        }

        assert_eq!(events, vec![Event::PurchaseModeChanged { enabled: true }]);
        assert!(query::purchase_mode(&world));
    }

    #[test]
    fn tick_advances_clock() {
        let mut world = World::new();
        let mut events = Vec::new();
        let dt = Duration::from_millis(16);

        apply(&mut world, Command::Tick { dt }, &mut events);

        assert_eq!(events, vec![Event::TimeAdvanced { dt }]);
        assert_eq!(query::tick_index(&world), 1);
    }

    #[test]
    fn winding_change_rebuilds_ring() {
        let mut world = world_with(3, 2);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SetPathWinding {
                winding: Winding::CounterClockwise,
            },
            &mut events,
        );

        assert_eq!(query::winding(&world), Winding::CounterClockwise);
        assert!(matches!(
            events.as_slice(),
            [Event::PathRecomputed { cells }] if cells.len() == query::path(&world).len()
        ));
    }
}
