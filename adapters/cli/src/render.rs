//! Terminal mirror of the world, rebuilt purely from broadcast events.

use std::collections::{BTreeMap, BTreeSet};

use block_defence_core::{BlockId, CellCoord, EnemyId, Event};

const EMPTY: char = ' ';
const VACANT: char = '.';
const BLOCK: char = '#';
const PATH: char = '+';
const ENEMY: char = 'e';

/// Renderer-side copy of the grid, block occupancy, ring and enemies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Mirror {
    cells: BTreeSet<CellCoord>,
    occupancy: BTreeMap<CellCoord, BlockId>,
    path: Vec<CellCoord>,
    enemies: BTreeMap<EnemyId, CellCoord>,
}

impl Mirror {
    pub(crate) fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::GridReset => {
                    self.cells.clear();
                    self.occupancy.clear();
                    self.path.clear();
                }
                Event::CellAdded { cell } => {
                    let _ = self.cells.insert(*cell);
                }
                Event::BlockPlaced { block, cells } => {
                    for cell in cells {
                        let _ = self.occupancy.insert(*cell, *block);
                    }
                }
                Event::BlockRemoved { block, cells } => {
                    for cell in cells {
                        if self.occupancy.get(cell) == Some(block) {
                            let _ = self.occupancy.remove(cell);
                        }
                    }
                }
                Event::PathRecomputed { cells } => self.path.clone_from(cells),
                Event::EnemySpawned { enemy, cell } => {
                    let _ = self.enemies.insert(*enemy, *cell);
                }
                Event::EnemyAdvanced { enemy, to, .. } => {
                    let _ = self.enemies.insert(*enemy, *to);
                }
                Event::EnemyDespawned { enemy } => {
                    let _ = self.enemies.remove(enemy);
                }
                Event::EnemiesCleared { .. } => self.enemies.clear(),
                _ => {}
            }
        }
    }

    pub(crate) fn cells(&self) -> &BTreeSet<CellCoord> {
        &self.cells
    }

    pub(crate) fn occupancy(&self) -> &BTreeMap<CellCoord, BlockId> {
        &self.occupancy
    }

    pub(crate) fn path(&self) -> &[CellCoord] {
        &self.path
    }

    pub(crate) fn enemies(&self) -> &BTreeMap<EnemyId, CellCoord> {
        &self.enemies
    }

    /// Draws the mirror with `+y` pointing up, one character per cell.
    pub(crate) fn render(&self) -> String {
        let Some((min, max)) = self.extent() else {
            return String::new();
        };
        let path: BTreeSet<CellCoord> = self.path.iter().copied().collect();
        let enemies: BTreeSet<CellCoord> = self.enemies.values().copied().collect();

        let mut rows = Vec::new();
        for y in (min.y()..=max.y()).rev() {
            let row: String = (min.x()..=max.x())
                .map(|x| {
                    let cell = CellCoord::new(x, y);
                    if enemies.contains(&cell) {
                        ENEMY
                    } else if self.occupancy.contains_key(&cell) {
                        BLOCK
                    } else if self.cells.contains(&cell) {
                        VACANT
                    } else if path.contains(&cell) {
                        PATH
                    } else {
                        EMPTY
                    }
                })
                .collect();
            rows.push(row.trim_end().to_owned());
        }
        rows.join("\n")
    }

    fn extent(&self) -> Option<(CellCoord, CellCoord)> {
        let mut points = self.cells.iter().chain(self.path.iter());
        let first = *points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), cell| {
            (
                CellCoord::new(min.x().min(cell.x()), min.y().min(cell.y())),
                CellCoord::new(max.x().max(cell.x()), max.y().max(cell.y())),
            )
        });
        Some((min, max))
    }
}
