//! # Quest Chronicles
//!
//! Runs a session script against the game data named by the config.
//!
//! ```text
//! chronicles [SCRIPT.json]
//! ```
//!
//! Without a script the built-in demo session runs. The config is read from
//! `CHRONICLES_CONFIG` if set, otherwise from the platform config directory.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::env;

use anyhow::{Context, Result};
use chronicles_engine::{EngineConfig, GameData, SessionRunner, SessionScript};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    let mut config = match env::var_os("CHRONICLES_CONFIG") {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    config.validate();

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_filter))?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("Quest Chronicles starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let data = GameData::load(&config).context("Failed to load game data")?;
    info!("Loaded {} items and {} quests", data.items.len(), data.quests.len());

    let script = match env::args_os().nth(1) {
        Some(path) => SessionScript::load(&path)
            .with_context(|| format!("Failed to load script {}", path.to_string_lossy()))?,
        None => SessionScript::demo(),
    };

    let mut runner = SessionRunner::from_config(&data, &config);
    let report = runner.run(&script)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if let Some(character) = runner.character() {
        println!(
            "{} the {}: level {}, {}/{} health, {} gold",
            character.name,
            character.class,
            character.level,
            character.health,
            character.max_health,
            character.gold
        );
    }

    info!("Quest Chronicles shutdown complete");
    Ok(())
}
