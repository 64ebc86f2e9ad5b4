//! Character save file management.
//!
//! This module provides:
//! - CharacterStore: save, load, list, and delete characters
//! - The line-based `KEY: value` save format
//! - Atomic save operations (temp file + rename)
//! - Validation of loaded records
//!
//! Each character lives in `{name}_save.txt`, with the name lowercased and
//! spaces replaced by underscores.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use chronicles_common::{ItemId, QuestId};
use chronicles_gameplay::{
    Character, CharacterClass, EquipSlot, Equipment, EquippedItem, Inventory, Stat,
    MAX_INVENTORY_SIZE,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default save directory.
pub const DEFAULT_SAVE_DIR: &str = "data/save_games";

/// Suffix of every save file.
pub const SAVE_SUFFIX: &str = "_save.txt";

const REQUIRED_KEYS: [&str; 4] = ["NAME", "CLASS", "HEALTH", "MAX_HEALTH"];

/// Errors that can occur during save operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No save exists for the character.
    #[error("No save file found for character: {0}")]
    CharacterNotFound(String),

    /// The save file exists but could not be read.
    #[error("Save file for {name} could not be read: {reason}")]
    SaveFileCorrupted {
        /// Character name
        name: String,
        /// Underlying failure
        reason: String,
    },

    /// The save file was read but its contents are wrong.
    #[error("Invalid save data: {0}")]
    InvalidSaveData(String),

    /// Character name cannot be used as a file name.
    #[error("Invalid character name: {0}")]
    InvalidName(String),

    /// Atomic write failed.
    #[error("Atomic write failed: {0}")]
    AtomicWriteFailed(String),
}

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// Returns the save file name for a character name.
#[must_use]
pub fn save_file_name(name: &str) -> String {
    format!("{}{SAVE_SUFFIX}", name.trim().to_lowercase().replace(' ', "_"))
}

/// Recovers a display name from a save file name.
///
/// Underscores become spaces and each word is capitalized.
#[must_use]
pub fn name_from_file_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(SAVE_SUFFIX)?;
    let words: Vec<String> = stem
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    Some(words.join(" "))
}

fn join_ids<T: AsRef<str>>(ids: impl Iterator<Item = T>) -> String {
    ids.map(|id| id.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Serializes a character to the save format.
#[must_use]
pub fn format_character(character: &Character) -> String {
    let mut lines = vec![
        format!("NAME: {}", character.name),
        format!("CLASS: {}", character.class),
        format!("LEVEL: {}", character.level),
        format!("HEALTH: {}", character.health),
        format!("MAX_HEALTH: {}", character.max_health),
        format!("STRENGTH: {}", character.strength),
        format!("MAGIC: {}", character.magic),
        format!("EXPERIENCE: {}", character.experience),
        format!("GOLD: {}", character.gold),
        format!("INVENTORY: {}", join_ids(character.inventory.iter().map(ItemId::as_str))),
        format!("ACTIVE_QUESTS: {}", join_ids(character.active_quests.iter().map(QuestId::as_str))),
        format!(
            "COMPLETED_QUESTS: {}",
            join_ids(character.completed_quests.iter().map(QuestId::as_str))
        ),
    ];

    for (slot, equipped) in character.equipment.iter() {
        lines.push(format!(
            "EQUIPPED_{}: {}:{}:{}",
            slot.as_str().to_uppercase(),
            equipped.item,
            equipped.stat.map_or("", Stat::as_str),
            equipped.bonus
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn parse_u32(fields: &AHashMap<String, String>, key: &str, default: u32) -> SaveResult<u32> {
    match fields.get(key) {
        Some(raw) => raw.parse().map_err(|_| {
            SaveError::InvalidSaveData(format!("{key} must be a non-negative integer, got '{raw}'"))
        }),
        None => Ok(default),
    }
}

fn parse_list(fields: &AHashMap<String, String>, key: &str) -> Vec<String> {
    fields
        .get(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_equipped(raw: &str) -> SaveResult<EquippedItem> {
    let mut parts = raw.splitn(3, ':');
    let (Some(item), Some(stat), Some(bonus)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(SaveError::InvalidSaveData(format!(
            "equipped item '{raw}' must be 'item:stat:bonus'"
        )));
    };
    let item = item.trim();
    if item.is_empty() {
        return Err(SaveError::InvalidSaveData(format!("equipped item '{raw}' has no id")));
    }
    let bonus = bonus
        .trim()
        .parse()
        .map_err(|_| SaveError::InvalidSaveData(format!("equipped bonus in '{raw}' is not an integer")))?;

    Ok(EquippedItem {
        item: ItemId::new(item),
        stat: Stat::from_name(stat.trim()),
        bonus,
    })
}

/// Parses and validates a character from save file contents.
pub fn parse_character(content: &str) -> SaveResult<Character> {
    let mut fields = AHashMap::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line.split_once(':').ok_or_else(|| {
            SaveError::InvalidSaveData(format!("line {} is not 'KEY: value': {line}", index + 1))
        })?;
        fields.insert(key.trim().to_uppercase(), value.trim().to_string());
    }

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !fields.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(SaveError::InvalidSaveData(format!(
            "missing required keys: {}",
            missing.join(", ")
        )));
    }

    let name = fields.get("NAME").cloned().unwrap_or_default();
    if name.is_empty() {
        return Err(SaveError::InvalidSaveData("NAME is empty".to_string()));
    }
    let class = CharacterClass::from_name(fields.get("CLASS").map_or("", String::as_str));
    if !class.is_recognized() {
        warn!("Save for {} has unknown class '{}'", name, class);
    }

    let level = parse_u32(&fields, "LEVEL", 1)?;
    let health = parse_u32(&fields, "HEALTH", 0)?;
    let max_health = parse_u32(&fields, "MAX_HEALTH", 0)?;
    if level == 0 {
        return Err(SaveError::InvalidSaveData("LEVEL must be at least 1".to_string()));
    }
    if health > max_health {
        return Err(SaveError::InvalidSaveData(format!(
            "HEALTH {health} exceeds MAX_HEALTH {max_health}"
        )));
    }

    let active_quests: Vec<QuestId> = parse_list(&fields, "ACTIVE_QUESTS")
        .into_iter()
        .map(QuestId::new)
        .collect();
    let completed_quests: Vec<QuestId> = parse_list(&fields, "COMPLETED_QUESTS")
        .into_iter()
        .map(QuestId::new)
        .collect();
    for (i, quest) in active_quests.iter().enumerate() {
        if active_quests[..i].contains(quest) {
            return Err(SaveError::InvalidSaveData(format!("quest {quest} is listed twice")));
        }
        if completed_quests.contains(quest) {
            return Err(SaveError::InvalidSaveData(format!(
                "quest {quest} is both active and completed"
            )));
        }
    }
    for (i, quest) in completed_quests.iter().enumerate() {
        if completed_quests[..i].contains(quest) {
            return Err(SaveError::InvalidSaveData(format!("quest {quest} is listed twice")));
        }
    }

    let items: Vec<ItemId> = parse_list(&fields, "INVENTORY")
        .into_iter()
        .map(ItemId::new)
        .collect();
    let item_count = items.len();
    let inventory = Inventory::from_items(items).map_err(|_| {
        SaveError::InvalidSaveData(format!(
            "INVENTORY holds {item_count} items, more than {MAX_INVENTORY_SIZE}"
        ))
    })?;

    let mut equipment = Equipment::default();
    for slot in [EquipSlot::Weapon, EquipSlot::Armor] {
        let key = format!("EQUIPPED_{}", slot.as_str().to_uppercase());
        if let Some(raw) = fields.get(&key) {
            if !raw.is_empty() {
                equipment.set(slot, parse_equipped(raw)?);
            }
        }
    }

    Ok(Character {
        name,
        class,
        level,
        health,
        max_health,
        strength: parse_u32(&fields, "STRENGTH", 0)?,
        magic: parse_u32(&fields, "MAGIC", 0)?,
        experience: parse_u32(&fields, "EXPERIENCE", 0)?,
        gold: parse_u32(&fields, "GOLD", 0)?,
        inventory,
        active_quests,
        completed_quests,
        equipment,
    })
}

/// Reads and writes character save files in one directory.
#[derive(Debug, Clone)]
pub struct CharacterStore {
    save_dir: PathBuf,
}

impl Default for CharacterStore {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DIR)
    }
}

impl CharacterStore {
    /// Creates a store rooted at `save_dir`.
    #[must_use]
    pub fn new(save_dir: impl AsRef<Path>) -> Self {
        Self {
            save_dir: save_dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the save directory.
    #[must_use]
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Ensures the save directory exists.
    pub fn ensure_save_dir(&self) -> SaveResult<()> {
        if !self.save_dir.exists() {
            fs::create_dir_all(&self.save_dir)?;
            info!("Created save directory: {}", self.save_dir.display());
        }
        Ok(())
    }

    fn validate_name(name: &str) -> SaveResult<()> {
        if name.trim().is_empty() {
            return Err(SaveError::InvalidName("Empty character name".to_string()));
        }

        let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', ',', '\n', '\r'];
        for c in invalid_chars {
            if name.contains(c) {
                return Err(SaveError::InvalidName(format!(
                    "Invalid character {c:?} in name"
                )));
            }
        }

        Ok(())
    }

    /// Returns the save file path for a character name.
    #[must_use]
    pub fn save_path(&self, name: &str) -> PathBuf {
        self.save_dir.join(save_file_name(name))
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.save_dir.join(format!("{}.tmp", save_file_name(name)))
    }

    /// Checks whether a save exists for a character.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.save_path(name).is_file()
    }

    /// Saves a character, replacing any previous save.
    ///
    /// Returns the path written.
    pub fn save(&self, character: &Character) -> SaveResult<PathBuf> {
        Self::validate_name(&character.name)?;
        self.ensure_save_dir()?;

        let final_path = self.save_path(&character.name);
        let temp_path = self.temp_path(&character.name);

        fs::write(&temp_path, format_character(character))?;
        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            SaveError::AtomicWriteFailed(e.to_string())
        })?;

        info!("Saved {} to {}", character.name, final_path.display());
        Ok(final_path)
    }

    /// Loads a character by name.
    pub fn load(&self, name: &str) -> SaveResult<Character> {
        Self::validate_name(name)?;

        let path = self.save_path(name);
        if !path.is_file() {
            return Err(SaveError::CharacterNotFound(name.to_string()));
        }

        let content = fs::read_to_string(&path).map_err(|e| SaveError::SaveFileCorrupted {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let character = parse_character(&content)?;

        debug!("Loaded {} from {}", character.name, path.display());
        Ok(character)
    }

    /// Lists the names of every saved character, sorted.
    ///
    /// A missing save directory means no saves.
    pub fn list(&self) -> SaveResult<Vec<String>> {
        if !self.save_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.save_dir)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str().and_then(name_from_file_name) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    /// Deletes a character's save.
    pub fn delete(&self, name: &str) -> SaveResult<()> {
        Self::validate_name(name)?;

        let path = self.save_path(name);
        if !path.is_file() {
            return Err(SaveError::CharacterNotFound(name.to_string()));
        }

        fs::remove_file(&path)?;
        info!("Deleted save for {}", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicles_gameplay::{Item, ItemEffect, ItemType};
    use tempfile::TempDir;

    fn hero() -> Character {
        let mut c = Character::create("Sir Aria", "Warrior").expect("valid class");
        c.inventory.add(ItemId::new("health_potion")).expect("space");
        c.inventory.add(ItemId::new("health_potion")).expect("space");
        c.active_quests.push(QuestId::new("goblin_trouble"));
        c.completed_quests.push(QuestId::new("first_steps"));
        c
    }

    #[test]
    fn test_save_file_names() {
        assert_eq!(save_file_name("Sir Aria"), "sir_aria_save.txt");
        assert_eq!(
            name_from_file_name("sir_aria_save.txt"),
            Some("Sir Aria".to_string())
        );
        assert_eq!(name_from_file_name("notes.txt"), None);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = CharacterStore::new(temp_dir.path().join("saves"));
        let mut c = hero();

        let sword = Item::new(
            "iron_sword",
            "Iron Sword",
            ItemType::Weapon,
            ItemEffect::new("strength", 5),
            100,
        );
        c.inventory.add(sword.id.clone()).expect("space");
        c.equip_weapon(&sword).expect("weapon");

        let path = store.save(&c).expect("save");
        assert!(path.ends_with("sir_aria_save.txt"));
        assert!(store.exists("Sir Aria"));

        let loaded = store.load("Sir Aria").expect("load");
        assert_eq!(loaded, c);
        assert_eq!(loaded.strength, 20);

        // Taking the sword off after a reload still restores base strength.
        let mut loaded = loaded;
        loaded.unequip_weapon().expect("space");
        assert_eq!(loaded.strength, 15);
    }

    #[test]
    fn test_format_matches_save_layout() {
        let text = format_character(&hero());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "NAME: Sir Aria");
        assert_eq!(lines[1], "CLASS: Warrior");
        assert_eq!(lines[9], "INVENTORY: health_potion,health_potion");
        assert_eq!(lines[10], "ACTIVE_QUESTS: goblin_trouble");
        assert_eq!(lines[11], "COMPLETED_QUESTS: first_steps");
        assert_eq!(lines.len(), 12);
    }

    #[test]
    fn test_parse_compact_format() {
        let content = "NAME:Bren\nCLASS:mage\nLEVEL:2\nHEALTH:50\nMAX_HEALTH:90\n\
                       STRENGTH:10\nMAGIC:22\nEXPERIENCE:120\nGOLD:7\nINVENTORY:\n\
                       ACTIVE_QUESTS:\nCOMPLETED_QUESTS:first_steps\nNOTES: ignored\n";
        let c = parse_character(content).expect("valid save");
        assert_eq!(c.class, CharacterClass::Mage);
        assert_eq!((c.level, c.health, c.max_health), (2, 50, 90));
        assert!(c.inventory.is_empty());
        assert!(c.active_quests.is_empty());
        assert_eq!(c.completed_quests, vec![QuestId::new("first_steps")]);
    }

    #[test]
    fn test_unknown_class_is_kept() {
        let content = "NAME: Eve\nCLASS: Bard\nHEALTH: 10\nMAX_HEALTH: 10\n";
        let c = parse_character(content).expect("valid save");
        assert_eq!(c.class, CharacterClass::Unrecognized("Bard".to_string()));
        assert_eq!(c.level, 1);
    }

    #[test]
    fn test_invalid_save_data() {
        let cases = [
            ("NAME: Eve\nCLASS: Mage\n", "HEALTH, MAX_HEALTH"),
            ("NAME: Eve\nCLASS: Mage\nHEALTH: lots\nMAX_HEALTH: 10\n", "HEALTH"),
            ("NAME: Eve\nCLASS: Mage\nHEALTH: 20\nMAX_HEALTH: 10\n", "exceeds"),
            ("NAME: Eve\nCLASS: Mage\nLEVEL: 0\nHEALTH: 1\nMAX_HEALTH: 10\n", "LEVEL"),
            ("NAME: Eve\nCLASS: Mage\nHEALTH: 1\nMAX_HEALTH: 10\ngarbage line\n", "line 5"),
            (
                "NAME: Eve\nCLASS: Mage\nHEALTH: 1\nMAX_HEALTH: 10\nACTIVE_QUESTS: q1\nCOMPLETED_QUESTS: q1\n",
                "both active and completed",
            ),
            (
                "NAME: Eve\nCLASS: Mage\nHEALTH: 1\nMAX_HEALTH: 10\nEQUIPPED_WEAPON: sword\n",
                "item:stat:bonus",
            ),
        ];

        for (content, needle) in cases {
            match parse_character(content) {
                Err(SaveError::InvalidSaveData(message)) => {
                    assert!(message.contains(needle), "{message} should mention {needle}");
                },
                other => panic!("expected InvalidSaveData for {content:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_load_missing_character() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = CharacterStore::new(temp_dir.path());
        assert!(matches!(
            store.load("Nobody"),
            Err(SaveError::CharacterNotFound(name)) if name == "Nobody"
        ));
        assert!(matches!(
            store.delete("Nobody"),
            Err(SaveError::CharacterNotFound(_))
        ));
    }

    #[test]
    fn test_load_unreadable_save() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = CharacterStore::new(temp_dir.path());
        fs::write(store.save_path("Eve"), [0xff, 0xfe, 0x80]).expect("write file");
        assert!(matches!(
            store.load("Eve"),
            Err(SaveError::SaveFileCorrupted { .. })
        ));
    }

    #[test]
    fn test_invalid_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = CharacterStore::new(temp_dir.path());
        assert!(matches!(store.load(""), Err(SaveError::InvalidName(_))));
        assert!(matches!(store.load("../etc"), Err(SaveError::InvalidName(_))));

        // A line break would smuggle an extra key into the save file.
        let mut sneaky = hero();
        sneaky.name = "Aria\nGOLD: 999999".to_string();
        assert!(matches!(store.save(&sneaky), Err(SaveError::InvalidName(_))));
        assert!(matches!(store.load("Aria\rX"), Err(SaveError::InvalidName(_))));
        assert!(store.list().expect("list").is_empty());
    }

    #[test]
    fn test_inventory_over_capacity_rejected() {
        let items = vec!["health_potion"; MAX_INVENTORY_SIZE + 5].join(",");
        let content = format!("NAME: Eve\nCLASS: Mage\nHEALTH: 1\nMAX_HEALTH: 10\nINVENTORY: {items}\n");
        match parse_character(&content) {
            Err(SaveError::InvalidSaveData(message)) => assert!(message.contains("INVENTORY")),
            other => panic!("expected InvalidSaveData, got {other:?}"),
        }

        let items = vec!["health_potion"; MAX_INVENTORY_SIZE].join(",");
        let content = format!("NAME: Eve\nCLASS: Mage\nHEALTH: 1\nMAX_HEALTH: 10\nINVENTORY: {items}\n");
        let eve = parse_character(&content).expect("a full inventory is valid");
        assert!(eve.inventory.is_full());
    }

    #[test]
    fn test_list_and_delete() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = CharacterStore::new(temp_dir.path().join("saves"));
        assert!(store.list().expect("list").is_empty());

        store.save(&hero()).expect("save");
        store
            .save(&Character::create("Bren", "Mage").expect("valid class"))
            .expect("save");
        fs::write(store.save_dir().join("readme.md"), "not a save").expect("write");

        assert_eq!(store.list().expect("list"), vec!["Bren", "Sir Aria"]);

        store.delete("sir aria").expect("delete");
        assert_eq!(store.list().expect("list"), vec!["Bren"]);
        assert!(!store.exists("Sir Aria"));
    }

    #[test]
    fn test_save_overwrites_without_temp_leftovers() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = CharacterStore::new(temp_dir.path());
        let mut c = hero();
        store.save(&c).expect("save");
        c.gold = 999;
        store.save(&c).expect("save");

        assert_eq!(store.load("Sir Aria").expect("load").gold, 999);
        let leftovers = fs::read_dir(temp_dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
