//! TOML session settings.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use block_defence_core::{CellCoord, GridBounds, Winding};
use block_defence_world::WorldConfig;
use serde::Deserialize;

const DEFAULT_SPAWN_INTERVAL_MS: u64 = 2_000;
const DEFAULT_STARTING_FUNDS: u32 = 100;
const DEFAULT_CELL_PRICE: u32 = 10;

/// Everything a session needs besides its seed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) world: WorldSettings,
    pub(crate) spawning: SpawningSettings,
    pub(crate) economy: EconomySettings,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WorldSettings {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) winding: Winding,
    pub(crate) enemy_capacity: u32,
    pub(crate) enemy_step_ms: u64,
    pub(crate) purchase_bounds: Option<BoundsSettings>,
}

impl Default for WorldSettings {
    fn default() -> Self {
        let config = WorldConfig::default();
        Self {
            columns: config.columns,
            rows: config.rows,
            winding: config.winding,
            enemy_capacity: config.enemy_capacity,
            enemy_step_ms: u64::try_from(config.enemy_step.as_millis()).unwrap_or(u64::MAX),
            purchase_bounds: None,
        }
    }
}

impl WorldSettings {
    pub(crate) fn to_config(&self) -> WorldConfig {
        WorldConfig {
            columns: self.columns,
            rows: self.rows,
            winding: self.winding,
            enemy_capacity: self.enemy_capacity,
            enemy_step: Duration::from_millis(self.enemy_step_ms),
            purchase_bounds: self
                .purchase_bounds
                .map(|bounds| GridBounds::new(bounds.min, bounds.max)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BoundsSettings {
    pub(crate) min: CellCoord,
    pub(crate) max: CellCoord,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SpawningSettings {
    pub(crate) interval_ms: u64,
}

impl Default for SpawningSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SPAWN_INTERVAL_MS,
        }
    }
}

impl SpawningSettings {
    pub(crate) fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EconomySettings {
    pub(crate) starting_funds: u32,
    pub(crate) cell_price: u32,
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            starting_funds: DEFAULT_STARTING_FUNDS,
            cell_price: DEFAULT_CELL_PRICE,
        }
    }
}

/// Reads and validates settings from a TOML file.
pub(crate) fn load(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid settings in {}", path.display()))
}

pub(crate) fn parse(contents: &str) -> Result<Settings> {
    let settings: Settings =
        toml::from_str(contents).context("failed to parse settings toml contents")?;

    if let Some(bounds) = settings.world.purchase_bounds {
        if bounds.min.x() > bounds.max.x() || bounds.min.y() > bounds.max.y() {
            bail!(
                "purchase bounds are inverted: min {} lies beyond max {}",
                bounds.min,
                bounds.max
            );
        }
    }
    if settings.world.enemy_step_ms == 0 {
        bail!("enemy_step_ms must be positive");
    }

    Ok(settings)
}
