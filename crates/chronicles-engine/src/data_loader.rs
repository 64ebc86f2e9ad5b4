//! Item and quest data loading.
//!
//! This module provides:
//! - Parsing of the block-based `KEY: value` data files
//! - Validation of every record on load
//! - Starter data files for a fresh install
//!
//! Records are separated by blank lines. Lines without a `:` are ignored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use chronicles_common::{ItemId, QuestId};
use chronicles_gameplay::{Item, ItemEffect, ItemTable, ItemType, Quest, QuestTable};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;

/// Sentinel meaning "no prerequisite".
pub const NO_PREREQUISITE: &str = "NONE";

const QUEST_KEYS: [&str; 7] = [
    "QUEST_ID",
    "TITLE",
    "DESCRIPTION",
    "REWARD_XP",
    "REWARD_GOLD",
    "REQUIRED_LEVEL",
    "PREREQUISITE",
];

const ITEM_KEYS: [&str; 6] = ["ITEM_ID", "NAME", "TYPE", "EFFECT", "COST", "DESCRIPTION"];

/// Errors that can occur while loading data files.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// File not found.
    #[error("Data file not found: {0}")]
    MissingDataFile(PathBuf),

    /// A record is malformed.
    #[error("Invalid data format: {0}")]
    InvalidDataFormat(String),

    /// The file exists but could not be read.
    #[error("Could not read data file {path}: {reason}")]
    CorruptedData {
        /// File that failed
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// Failed to write starter files.
    #[error("Failed to write data file: {0}")]
    WriteError(#[from] io::Error),
}

/// Result type for data loading operations.
pub type DataLoadResult<T> = Result<T, DataLoadError>;

/// One `KEY: value` block.
type Block<'a> = AHashMap<&'a str, &'a str>;

/// Splits file content into records.
fn parse_blocks(content: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut current = Block::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            current.insert(key.trim(), value.trim());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Checks that a block carries every required key, naming all missing ones.
fn require_keys(block: &Block<'_>, keys: &[&str], kind: &str) -> DataLoadResult<()> {
    let missing: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| !block.contains_key(key))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DataLoadError::InvalidDataFormat(format!(
            "missing required keys in {kind} block: {}",
            missing.join(", ")
        )))
    }
}

fn parse_number(block: &Block<'_>, key: &str, record: &str) -> DataLoadResult<u32> {
    let raw = block.get(key).copied().unwrap_or_default();
    raw.parse().map_err(|_| {
        DataLoadError::InvalidDataFormat(format!("{key} '{raw}' in {record} is not a non-negative integer"))
    })
}

fn field<'a>(block: &Block<'a>, key: &str) -> &'a str {
    block.get(key).copied().unwrap_or_default()
}

/// Parses quest definitions from file content.
pub fn parse_quests(content: &str) -> DataLoadResult<QuestTable> {
    let mut quests = QuestTable::new();

    for block in parse_blocks(content) {
        require_keys(&block, &QUEST_KEYS, "quest")?;

        let id = field(&block, "QUEST_ID");
        if quests.get(id).is_some() {
            return Err(DataLoadError::InvalidDataFormat(format!("duplicate quest id: {id}")));
        }

        let required_level = parse_number(&block, "REQUIRED_LEVEL", id)?;
        if required_level == 0 {
            return Err(DataLoadError::InvalidDataFormat(format!(
                "REQUIRED_LEVEL in {id} must be at least 1"
            )));
        }

        let mut quest = Quest::new(QuestId::new(id), field(&block, "TITLE"))
            .with_description(field(&block, "DESCRIPTION"))
            .with_rewards(
                parse_number(&block, "REWARD_XP", id)?,
                parse_number(&block, "REWARD_GOLD", id)?,
            )
            .with_required_level(required_level);

        let prerequisite = field(&block, "PREREQUISITE");
        if !prerequisite.is_empty() && !prerequisite.eq_ignore_ascii_case(NO_PREREQUISITE) {
            quest = quest.with_prerequisite(QuestId::new(prerequisite));
        }

        quests.insert(quest);
    }

    Ok(quests)
}

/// Parses item definitions from file content.
pub fn parse_items(content: &str) -> DataLoadResult<ItemTable> {
    let mut items = ItemTable::new();

    for block in parse_blocks(content) {
        require_keys(&block, &ITEM_KEYS, "item")?;

        let id = field(&block, "ITEM_ID");
        if items.contains(id) {
            return Err(DataLoadError::InvalidDataFormat(format!("duplicate item id: {id}")));
        }

        let item_type: ItemType = field(&block, "TYPE")
            .parse()
            .map_err(|e| DataLoadError::InvalidDataFormat(format!("{e} in item {id}")))?;
        let effect: ItemEffect = field(&block, "EFFECT")
            .parse()
            .map_err(|e| DataLoadError::InvalidDataFormat(format!("{e} in item {id}")))?;
        let cost = parse_number(&block, "COST", id)?;

        items.insert(
            Item::new(ItemId::new(id), field(&block, "NAME"), item_type, effect, cost)
                .with_description(field(&block, "DESCRIPTION")),
        );
    }

    Ok(items)
}

fn read_data_file(path: &Path) -> DataLoadResult<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DataLoadError::MissingDataFile(path.to_path_buf()),
        _ => DataLoadError::CorruptedData {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })
}

/// Loads quests from a file.
pub fn load_quests(path: impl AsRef<Path>) -> DataLoadResult<QuestTable> {
    let path = path.as_ref();
    let quests = parse_quests(&read_data_file(path)?)?;

    if let Err(e) = quests.validate_prerequisites() {
        warn!("Quest file {} has a broken prerequisite: {}", path.display(), e);
    }

    info!("Loaded {} quests from {}", quests.len(), path.display());
    Ok(quests)
}

/// Loads items from a file.
pub fn load_items(path: impl AsRef<Path>) -> DataLoadResult<ItemTable> {
    let path = path.as_ref();
    let items = parse_items(&read_data_file(path)?)?;
    info!("Loaded {} items from {}", items.len(), path.display());
    Ok(items)
}

/// Formats a quest as a data file block.
#[must_use]
pub fn format_quest_block(quest: &Quest) -> String {
    format!(
        "QUEST_ID: {}\nTITLE: {}\nDESCRIPTION: {}\nREWARD_XP: {}\nREWARD_GOLD: {}\nREQUIRED_LEVEL: {}\nPREREQUISITE: {}\n",
        quest.id,
        quest.title,
        quest.description,
        quest.reward_xp,
        quest.reward_gold,
        quest.required_level,
        quest.prerequisite.as_ref().map_or(NO_PREREQUISITE, QuestId::as_str),
    )
}

/// Formats an item as a data file block.
#[must_use]
pub fn format_item_block(item: &Item) -> String {
    format!(
        "ITEM_ID: {}\nNAME: {}\nTYPE: {}\nEFFECT: {}\nCOST: {}\nDESCRIPTION: {}\n",
        item.id, item.name, item.item_type, item.effect, item.cost, item.description,
    )
}

/// Starter quests for a fresh install.
#[must_use]
pub fn default_quests() -> Vec<Quest> {
    vec![
        Quest::new("first_steps", "First Steps")
            .with_description("Prove yourself by clearing the road outside town.")
            .with_rewards(50, 25),
        Quest::new("goblin_trouble", "Goblin Trouble")
            .with_description("Drive the goblins out of the old mill.")
            .with_rewards(100, 50)
            .with_prerequisite("first_steps"),
        Quest::new("lost_heirloom", "The Lost Heirloom")
            .with_description("Recover a family ring from the marsh.")
            .with_rewards(75, 40)
            .with_required_level(2),
        Quest::new("orc_warlord", "The Orc Warlord")
            .with_description("Break the warband gathering in the hills.")
            .with_rewards(300, 150)
            .with_required_level(3)
            .with_prerequisite("goblin_trouble"),
        Quest::new("dragon_slayer", "Dragon Slayer")
            .with_description("Face the dragon of the northern peaks.")
            .with_rewards(1000, 500)
            .with_required_level(6)
            .with_prerequisite("orc_warlord"),
    ]
}

/// Starter items for a fresh install.
#[must_use]
pub fn default_items() -> Vec<Item> {
    vec![
        Item::new(
            "health_potion",
            "Health Potion",
            ItemType::Consumable,
            ItemEffect::new("health", 20),
            25,
        )
        .with_description("Restores 20 health."),
        Item::new(
            "greater_health_potion",
            "Greater Health Potion",
            ItemType::Consumable,
            ItemEffect::new("health", 50),
            60,
        )
        .with_description("Restores 50 health."),
        Item::new(
            "iron_sword",
            "Iron Sword",
            ItemType::Weapon,
            ItemEffect::new("strength", 5),
            100,
        )
        .with_description("A plain but reliable blade."),
        Item::new(
            "oak_staff",
            "Oak Staff",
            ItemType::Weapon,
            ItemEffect::new("magic", 6),
            90,
        )
        .with_description("Channels arcane power."),
        Item::new(
            "leather_armor",
            "Leather Armor",
            ItemType::Armor,
            ItemEffect::new("max_health", 10),
            60,
        )
        .with_description("Light protection."),
        Item::new(
            "chainmail",
            "Chainmail",
            ItemType::Armor,
            ItemEffect::new("max_health", 25),
            150,
        )
        .with_description("Heavy rings of steel."),
    ]
}

fn write_if_missing(path: &Path, content: &str) -> DataLoadResult<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    info!("Created default data file {}", path.display());
    Ok(true)
}

/// Writes starter item and quest files where none exist.
///
/// Returns the files that were created.
pub fn create_default_data_files(
    item_path: impl AsRef<Path>,
    quest_path: impl AsRef<Path>,
) -> DataLoadResult<Vec<PathBuf>> {
    let item_path = item_path.as_ref();
    let quest_path = quest_path.as_ref();
    let mut created = Vec::new();

    let items: Vec<String> = default_items().iter().map(format_item_block).collect();
    if write_if_missing(item_path, &items.join("\n"))? {
        created.push(item_path.to_path_buf());
    }

    let quests: Vec<String> = default_quests().iter().map(format_quest_block).collect();
    if write_if_missing(quest_path, &quests.join("\n"))? {
        created.push(quest_path.to_path_buf());
    }

    Ok(created)
}

/// Every static table the game needs.
#[derive(Debug, Clone, Default)]
pub struct GameData {
    /// Item definitions
    pub items: ItemTable,
    /// Quest definitions
    pub quests: QuestTable,
}

impl GameData {
    /// Loads both data files named by the config, creating starter files first
    /// if the config asks for it.
    pub fn load(config: &EngineConfig) -> DataLoadResult<Self> {
        if config.create_default_data {
            let created = create_default_data_files(&config.item_data_path, &config.quest_data_path)?;
            debug!("Created {} starter data files", created.len());
        }

        Ok(Self {
            items: load_items(&config.item_data_path)?,
            quests: load_quests(&config.quest_data_path)?,
        })
    }
}
