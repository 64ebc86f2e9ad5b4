//! Engine configuration.
//!
//! Provides file locations, random seeding, battle rules, and log filtering.
//! Configuration can be loaded from and saved to a TOML file.

use chronicles_gameplay::CooldownPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "chronicles.toml";

/// Default log directive when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "chronicles=info";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Files ===
    /// Directory holding character save files
    pub save_dir: PathBuf,
    /// Item definition file
    pub item_data_path: PathBuf,
    /// Quest definition file
    pub quest_data_path: PathBuf,
    /// Write starter data files when they are missing
    pub create_default_data: bool,

    // === Rules ===
    /// Seed for escape and ability rolls (None = random)
    pub rng_seed: Option<u64>,

    // === Debug ===
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,

    /// When class special abilities may be used
    pub special_cooldown: CooldownPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("data/save_games"),
            item_data_path: PathBuf::from("data/items.txt"),
            quest_data_path: PathBuf::from("data/quests.txt"),
            create_default_data: true,

            rng_seed: None,

            log_filter: DEFAULT_LOG_FILTER.to_string(),

            special_cooldown: CooldownPolicy::EvenTurns,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(config_dir) => config_dir.join("chronicles").join(CONFIG_FILE),
            None => PathBuf::from(CONFIG_FILE),
        }
    }

    /// Replace empty values with their defaults.
    pub fn validate(&mut self) {
        let defaults = Self::default();

        if self.save_dir.as_os_str().is_empty() {
            self.save_dir = defaults.save_dir;
        }
        if self.item_data_path.as_os_str().is_empty() {
            self.item_data_path = defaults.item_data_path;
        }
        if self.quest_data_path.as_os_str().is_empty() {
            self.quest_data_path = defaults.quest_data_path;
        }

        let filter = self.log_filter.trim();
        self.log_filter = if filter.is_empty() {
            defaults.log_filter
        } else {
            filter.to_string()
        };
    }

    /// Builds the random source for battles.
    #[must_use]
    pub fn rng(&self) -> fastrand::Rng {
        match self.rng_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}
