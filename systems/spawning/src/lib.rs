#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Interval timer that emits enemy spawn commands while spawning is enabled.

use std::time::Duration;

use block_defence_core::{Command, Event};

/// Upper bound on spawn attempts emitted by a single update.
///
/// Attempts beyond it could only hit an exhausted pool and are dropped.
pub const MAX_ATTEMPTS_PER_UPDATE: usize = 64;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence.
    #[must_use]
    pub const fn new(spawn_interval: Duration) -> Self {
        Self { spawn_interval }
    }

    /// Time between two spawn attempts.
    #[must_use]
    pub const fn spawn_interval(&self) -> Duration {
        self.spawn_interval
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

/// Pure system that turns elapsed time into spawn attempts.
///
/// The timer starts when a `SpawningChanged { enabled: true }` event arrives
/// and fires once right away. Stopping the timer forgets any partial
/// interval. Attempts that find no ring are dropped; the next interval
/// retries.
#[derive(Debug)]
pub struct Spawning {
    spawn_interval: Duration,
    accumulator: Duration,
    enabled: bool,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            accumulator: Duration::ZERO,
            enabled: false,
        }
    }

    /// Reports whether the timer is running.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Consumes events and the current path availability to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], has_path: bool, out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::SpawningChanged { enabled: true } => {
                    self.enabled = true;
                    self.accumulator = self.spawn_interval;
                    accumulated = Duration::ZERO;
                }
                Event::SpawningChanged { enabled: false } => {
                    self.enabled = false;
                    self.accumulator = Duration::ZERO;
                }
                Event::TimeAdvanced { dt } => accumulated = accumulated.saturating_add(*dt),
                _ => {}
            }
        }

        if !self.enabled || self.spawn_interval.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let spawn_attempts = self.resolve_spawn_attempts();
        if spawn_attempts == 0 {
            return;
        }

        if !has_path {
            log::warn!("skipping {spawn_attempts} spawn attempt(s): no path available");
            return;
        }

        out.extend(std::iter::repeat(Command::SpawnEnemy).take(spawn_attempts));
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        let interval = self.spawn_interval.as_nanos();
        if interval == 0 {
            return 0;
        }

        let elapsed = self.accumulator.as_nanos();
        self.accumulator = duration_from_nanos(elapsed % interval);
        let attempts = elapsed / interval;
        if attempts > MAX_ATTEMPTS_PER_UPDATE as u128 {
            log::debug!("dropping {attempts} spawn attempts down to {MAX_ATTEMPTS_PER_UPDATE}");
        }
        usize::try_from(attempts)
            .unwrap_or(usize::MAX)
            .min(MAX_ATTEMPTS_PER_UPDATE)
    }
}

fn duration_from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    let subsec = u32::try_from(nanos % NANOS_PER_SEC).unwrap_or(0);
    Duration::new(secs, subsec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_spawn_attempts_without_interval() {
        let mut spawning = Spawning::new(Config::new(Duration::ZERO));
        spawning.accumulator = Duration::from_secs(10);
        assert_eq!(spawning.resolve_spawn_attempts(), 0);
    }

    #[test]
    fn enormous_elapsed_time_is_resolved_without_iterating() {
        let interval = Duration::from_millis(750);
        let mut spawning = Spawning::new(Config::new(interval));
        spawning.accumulator = Duration::MAX;

        assert_eq!(spawning.resolve_spawn_attempts(), MAX_ATTEMPTS_PER_UPDATE);
        assert_eq!(
            spawning.accumulator.as_nanos(),
            Duration::MAX.as_nanos() % interval.as_nanos()
        );
        assert!(spawning.accumulator < interval);
    }

    #[test]
    fn default_interval_is_two_seconds() {
        assert_eq!(Config::default().spawn_interval(), Duration::from_secs(2));
    }
}
