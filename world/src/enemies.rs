//! Bounded enemy pool and ring traversal.

use std::{collections::BTreeMap, time::Duration};

use block_defence_core::{CellCoord, EnemyId, EnemySnapshot, Event, PathRing, SpawnError};

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    ring: PathRing,
    waypoint: usize,
    accumulator: Duration,
}

impl Enemy {
    fn cell(&self) -> Option<CellCoord> {
        self.ring.waypoint(self.waypoint)
    }
}

/// Fixed-capacity pool of enemies looping the ring they spawned on.
#[derive(Debug)]
pub(crate) struct EnemyPool {
    capacity: u32,
    step: Duration,
    active: BTreeMap<EnemyId, Enemy>,
}

impl EnemyPool {
    pub(crate) fn new(capacity: u32, step: Duration) -> Self {
        Self {
            capacity,
            step,
            active: BTreeMap::new(),
        }
    }

    /// Activates the lowest free enemy on the first waypoint of `ring`.
    pub(crate) fn spawn(&mut self, ring: &PathRing) -> Result<(EnemyId, CellCoord), SpawnError> {
        let Some(start) = ring.waypoint(0) else {
            return Err(SpawnError::EmptyPath);
        };
        let Some(id) = (0..self.capacity)
            .map(EnemyId::new)
            .find(|id| !self.active.contains_key(id))
        else {
            return Err(SpawnError::PoolExhausted);
        };

        let _ = self.active.insert(
            id,
            Enemy {
                id,
                ring: ring.clone(),
                waypoint: 0,
                accumulator: Duration::ZERO,
            },
        );
        Ok((id, start))
    }

    /// Accumulates `dt` on every enemy and steps those that waited long enough.
    ///
    /// At most one lap is reported per enemy and call. Whole laps beyond that
    /// end where they started, so they are skipped without events.
    pub(crate) fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let step = self.step.as_nanos();
        if step == 0 {
            return;
        }

        for enemy in self.active.values_mut() {
            let elapsed = enemy.accumulator.saturating_add(dt).as_nanos();
            enemy.accumulator = duration_from_nanos(elapsed % step);

            let lap = enemy.ring.len();
            let steps = elapsed / step;
            let reported = usize::try_from(steps.min(lap as u128)).unwrap_or(lap);
            if reported == 0 {
                continue;
            }
            let skipped = usize::try_from((steps - reported as u128) % lap as u128).unwrap_or(0);
            enemy.waypoint = (enemy.waypoint + skipped) % lap;

            for _ in 0..reported {
                let Some(from) = enemy.cell() else {
                    break;
                };
                enemy.waypoint = enemy.ring.next_index(enemy.waypoint);
                let to = enemy.cell().unwrap_or(from);
                out_events.push(Event::EnemyAdvanced {
                    enemy: enemy.id,
                    from,
                    to,
                });
            }
        }
    }

    /// Returns the enemy to the pool, reporting whether it was active.
    pub(crate) fn despawn(&mut self, id: EnemyId) -> bool {
        self.active.remove(&id).is_some()
    }

    /// Returns every active enemy to the pool.
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.active.len();
        self.active.clear();
        count
    }

    pub(crate) fn snapshots(&self) -> Vec<EnemySnapshot> {
        self.active
            .values()
            .filter_map(|enemy| {
                enemy.cell().map(|cell| EnemySnapshot {
                    id: enemy.id,
                    cell,
                    waypoint: enemy.waypoint,
                    accumulated: enemy.accumulator,
                })
            })
            .collect()
    }
}

fn duration_from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    let subsec = u32::try_from(nanos % NANOS_PER_SEC).unwrap_or(0);
    Duration::new(secs, subsec)
}
