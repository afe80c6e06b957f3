//! Seeded, scripted session driven by an explicit `update(dt)` loop.
//!
//! Every frame applies a `Tick`, hands the accumulated events to the systems
//! and applies the commands they emit. A seeded actor plays the part of the
//! player: it drags blocks onto the grid, turns and removes them, and buys
//! cells with a small wallet.

use std::time::Duration;

use block_defence_core::{BlockId, CellCoord, Command, Event, Rotation, ShapeKind, SpawnError};
use block_defence_system_builder::{Builder, BuilderInput, PlacementPreview};
use block_defence_system_spawning::{Config as SpawningConfig, Spawning};
use block_defence_world::{self as world, interaction, query, World};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::{config::Settings, render::Mirror};

/// Simulated time covered by a single frame.
pub(crate) const FRAME: Duration = Duration::from_millis(16);

const ACTION_INTERVAL: u64 = 20;

/// Funds spent on grid purchases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Wallet {
    balance: u32,
}

impl Wallet {
    fn spend(&mut self, amount: u32) -> bool {
        match self.balance.checked_sub(amount) {
            Some(remaining) => {
                self.balance = remaining;
                true
            }
            None => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Place,
    Rotate,
    Purchase,
    Remove,
    Idle,
}

/// Running tallies of what happened during the session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct SessionStats {
    placements: u32,
    rejected_placements: u32,
    rotations: u32,
    rejected_rotations: u32,
    removals: u32,
    purchases: u32,
    rejected_purchases: u32,
    spawned: u32,
    exhausted_spawns: u32,
}

/// Outcome reported at the end of a run, derived from the event mirror.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct SessionSummary {
    seed: u64,
    frames: u64,
    cells: usize,
    occupied_cells: usize,
    path: Vec<CellCoord>,
    active_enemies: usize,
    funds: u32,
    stats: SessionStats,
}

/// Owns the world, the systems and the scripted player.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    spawning: Spawning,
    builder: Builder,
    mirror: Mirror,
    pending: Vec<Event>,
    rng: ChaCha8Rng,
    seed: u64,
    wallet: Wallet,
    cell_price: u32,
    held: Option<BlockId>,
    frames: u64,
    stats: SessionStats,
}

impl Session {
    pub(crate) fn new(settings: &Settings, seed: u64) -> Self {
        let config = settings.world.to_config();
        let mut session = Self {
            world: World::with_config(config),
            spawning: Spawning::new(SpawningConfig::new(settings.spawning.interval())),
            builder: Builder::new(),
            mirror: Mirror::default(),
            pending: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            wallet: Wallet {
                balance: settings.economy.starting_funds,
            },
            cell_price: settings.economy.cell_price,
            held: None,
            frames: 0,
            stats: SessionStats::default(),
        };

        let _ = session.submit(Command::ConfigureGrid {
            columns: config.columns,
            rows: config.rows,
        });
        let _ = session.submit(Command::SetSpawning { enabled: true });
        session
    }

    /// Runs `frames` fixed-length frames.
    pub(crate) fn run(&mut self, frames: u32) {
        for _ in 0..frames {
            self.update(FRAME);
        }
    }

    /// Advances the simulation by `dt` and lets every system react once.
    pub(crate) fn update(&mut self, dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        let _ = self.submit(Command::Tick { dt });

        let events = std::mem::take(&mut self.pending);
        let mut commands = Vec::new();
        self.spawning
            .handle(&events, query::has_path(&self.world), &mut commands);

        let (preview, input) = self.scripted_input();
        let grid = query::grid_view(&self.world);
        self.builder.handle(
            &events,
            preview.as_ref(),
            input,
            |cell| grid.occupant(cell),
            &mut commands,
        );

        for command in commands {
            let _ = self.submit(command);
        }
    }

    pub(crate) fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    pub(crate) fn summary(&self) -> SessionSummary {
        SessionSummary {
            seed: self.seed,
            frames: self.frames,
            cells: self.mirror.cells().len(),
            occupied_cells: self.mirror.occupancy().len(),
            path: self.mirror.path().to_vec(),
            active_enemies: self.mirror.enemies().len(),
            funds: self.wallet.balance,
            stats: self.stats.clone(),
        }
    }

    fn submit(&mut self, command: Command) -> &[Event] {
        let start = self.pending.len();
        world::apply(&mut self.world, command, &mut self.pending);
        self.observe_from(start);
        &self.pending[start..]
    }

    fn observe_from(&mut self, start: usize) {
        let events = &self.pending[start..];
        self.mirror.observe(events);
        for event in events {
            match event {
                Event::BlockPlaced { block, .. } => {
                    if self.held == Some(*block) {
                        self.held = None;
                        self.stats.placements += 1;
                    }
                }
                Event::PlacementRejected { .. } => self.stats.rejected_placements += 1,
                Event::BlockRotated { .. } => self.stats.rotations += 1,
                Event::RotationRejected { .. } => self.stats.rejected_rotations += 1,
                Event::BlockRemoved { block, .. } => {
                    if query::block(&self.world, *block).is_some_and(|block| !block.placed) {
                        self.stats.removals += 1;
                    }
                }
                Event::PurchaseRejected { .. } => self.stats.rejected_purchases += 1,
                Event::EnemySpawned { .. } => self.stats.spawned += 1,
                Event::SpawnSkipped {
                    reason: SpawnError::PoolExhausted,
                } => self.stats.exhausted_spawns += 1,
                _ => {}
            }
        }
    }

    fn scripted_input(&mut self) -> (Option<PlacementPreview>, BuilderInput) {
        if self.frames % ACTION_INTERVAL != 0 {
            return (None, BuilderInput::default());
        }

        match self.choose_action() {
            Action::Place => self.place_held_block(),
            Action::Rotate => self.rotate_random_block(),
            Action::Purchase => {
                self.purchase_random_cell();
                (None, BuilderInput::default())
            }
            Action::Remove => self.remove_random_block(),
            Action::Idle => (None, BuilderInput::default()),
        }
    }

    fn choose_action(&mut self) -> Action {
        match self.rng.gen_range(0..10) {
            0..=3 => Action::Place,
            4 | 5 => Action::Rotate,
            6 | 7 => Action::Purchase,
            8 => Action::Remove,
            _ => Action::Idle,
        }
    }

    fn held_block(&mut self) -> Option<BlockId> {
        if self.held.is_some() {
            return self.held;
        }

        let kind = ShapeKind::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(ShapeKind::Single);
        let rotation = Rotation::from_quarter_turns(self.rng.gen_range(0..4));
        let created = self
            .submit(Command::CreateBlock {
                shape: kind.shape(),
                rotation,
            })
            .iter()
            .find_map(|event| match event {
                Event::BlockCreated { block, .. } => Some(*block),
                _ => None,
            });
        if let Some(block) = created {
            log::debug!("picked up {} block {}", kind.name(), block.get());
        }
        self.held = created;
        created
    }

    fn random_anchor(&mut self) -> Option<CellCoord> {
        let bounds = query::bounds(&self.world)?;
        let x = self.rng.gen_range(bounds.min().x() - 1..=bounds.max().x());
        let y = self.rng.gen_range(bounds.min().y() - 1..=bounds.max().y());
        Some(CellCoord::new(x, y))
    }

    fn place_held_block(&mut self) -> (Option<PlacementPreview>, BuilderInput) {
        let (Some(block), Some(anchor)) = (self.held_block(), self.random_anchor()) else {
            return (None, BuilderInput::default());
        };
        let rotation = query::block(&self.world, block)
            .map(|snapshot| snapshot.rotation)
            .unwrap_or_default();
        let check = query::can_place(&self.world, block, anchor, rotation);
        let preview = PlacementPreview::from_check(block, anchor, check);
        let input = BuilderInput {
            confirm_action: true,
            ..BuilderInput::hovering(anchor)
        };
        (Some(preview), input)
    }

    fn random_placed_block(&mut self) -> Option<(BlockId, CellCoord)> {
        let placed: Vec<(BlockId, CellCoord)> = query::block_view(&self.world)
            .iter()
            .filter(|snapshot| snapshot.placed)
            .filter_map(|snapshot| snapshot.cells.first().map(|cell| (snapshot.id, *cell)))
            .collect();
        placed.choose(&mut self.rng).copied()
    }

    fn rotate_random_block(&mut self) -> (Option<PlacementPreview>, BuilderInput) {
        let target = match self.random_placed_block() {
            Some((block, anchor)) => Some((block, anchor)),
            None => self.held.map(|block| (block, CellCoord::new(0, 0))),
        };
        let Some((block, anchor)) = target else {
            return (None, BuilderInput::default());
        };
        let preview = PlacementPreview::new(block, anchor, Vec::new(), false);
        let input = BuilderInput {
            rotate_action: true,
            ..BuilderInput::default()
        };
        (Some(preview), input)
    }

    fn remove_random_block(&mut self) -> (Option<PlacementPreview>, BuilderInput) {
        let Some((_, cell)) = self.random_placed_block() else {
            return (None, BuilderInput::default());
        };
        let input = BuilderInput {
            remove_action: true,
            ..BuilderInput::hovering(cell)
        };
        (None, input)
    }

    fn purchase_random_cell(&mut self) {
        let candidates: Vec<CellCoord> = query::expandable_positions(&self.world)
            .into_iter()
            .collect();
        let Some(&cell) = candidates.choose(&mut self.rng) else {
            return;
        };
        if self.wallet.balance < self.cell_price {
            log::debug!(
                "cannot afford {cell}: {} left, {} needed",
                self.wallet.balance,
                self.cell_price
            );
            return;
        }

        let _ = self.submit(Command::SetPurchaseMode { enabled: true });
        let start = self.pending.len();
        let bought = interaction::try_purchase(&mut self.world, cell, &mut self.pending);
        self.observe_from(start);
        if bought && self.wallet.spend(self.cell_price) {
            self.stats.purchases += 1;
            log::info!("bought cell {cell}; {} funds left", self.wallet.balance);
        }
        let _ = self.submit(Command::SetPurchaseMode { enabled: false });
    }
}
