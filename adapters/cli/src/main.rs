#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a scripted, seeded Block Defence session.

mod config;
mod render;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use block_defence_core::Winding;
use clap::{Parser, ValueEnum};
use flexi_logger::Logger;

use crate::{config::Settings, session::Session};

/// Ring direction accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum WindingArg {
    Clockwise,
    CounterClockwise,
}

impl From<WindingArg> for Winding {
    fn from(value: WindingArg) -> Self {
        match value {
            WindingArg::Clockwise => Winding::Clockwise,
            WindingArg::CounterClockwise => Winding::CounterClockwise,
        }
    }
}

/// Options accepted by the `block-defence` binary.
#[derive(Clone, Debug, Parser)]
#[command(name = "block-defence", about = "Runs a scripted polyomino defence session")]
struct Options {
    /// TOML file with world, spawning and economy settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the initial number of columns.
    #[arg(long)]
    columns: Option<u32>,

    /// Overrides the initial number of rows.
    #[arg(long)]
    rows: Option<u32>,

    /// Overrides the direction the enemy ring is walked in.
    #[arg(short, long, value_enum)]
    winding: Option<WindingArg>,

    /// Number of 16ms frames to simulate.
    #[arg(short, long, default_value_t = 1_800)]
    frames: u32,

    /// Seed for the scripted player.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Log specification, for example `info` or `block_defence_world=debug`.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Prints the session summary as JSON instead of drawing the grid.
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Options {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => config::load(path)?,
            None => Settings::default(),
        };

        if let Some(columns) = self.columns {
            settings.world.columns = columns;
        }
        if let Some(rows) = self.rows {
            settings.world.rows = rows;
        }
        if let Some(winding) = self.winding {
            settings.world.winding = winding.into();
        }

        Ok(settings)
    }
}

/// Entry point for the Block Defence command-line interface.
fn main() -> Result<()> {
    let options = Options::parse();
    let _logger = Logger::try_with_env_or_str(options.log_level.as_deref().unwrap_or("warn"))?
        .log_to_stderr()
        .start()?;

    let settings = options.settings()?;
    log::info!(
        "starting {}x{} session with seed {}",
        settings.world.columns,
        settings.world.rows,
        options.seed
    );

    let mut session = Session::new(&settings, options.seed);
    session.run(options.frames);
    let summary = session.summary();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", session.mirror().render());
        println!();
        println!("{summary:#?}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_settings() {
        let options = Options::parse_from([
            "block-defence",
            "--columns",
            "3",
            "--rows",
            "2",
            "--winding",
            "counter-clockwise",
        ]);
        let settings = options.settings().expect("settings");

        assert_eq!(settings.world.columns, 3);
        assert_eq!(settings.world.rows, 2);
        assert_eq!(settings.world.winding, Winding::CounterClockwise);
        assert_eq!(options.frames, 1_800);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let options = Options::parse_from(["block-defence", "--config", "/nonexistent/defence.toml"]);
        let error = options.settings().expect_err("missing file");
        assert!(error.to_string().contains("failed to read settings"));
    }
}
