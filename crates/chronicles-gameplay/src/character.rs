//! Character record, class definitions, and progression.
//!
//! This module provides:
//! - Character classes and their starting stats
//! - The `Character` record shared by every other system
//! - Experience and level-up handling
//! - Gold and health mutation primitives

use chronicles_common::{GameError, GameResult, QuestId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::equipment::Equipment;
use crate::inventory::Inventory;
use crate::item::Stat;

/// Gold every new character starts with.
pub const STARTING_GOLD: u32 = 100;

/// Experience needed per level to reach the next one (`level * 100`).
pub const XP_PER_LEVEL: u32 = 100;

/// Max health gained per level-up.
pub const LEVEL_UP_HEALTH: u32 = 10;

/// Strength gained per level-up.
pub const LEVEL_UP_STRENGTH: u32 = 2;

/// Magic gained per level-up.
pub const LEVEL_UP_MAGIC: u32 = 2;

/// Starting stats for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseStats {
    /// Starting (and max) health
    pub health: u32,
    /// Starting strength
    pub strength: u32,
    /// Starting magic
    pub magic: u32,
}

/// Character class.
///
/// `Unrecognized` only arises when reading back a record whose class name no
/// longer matches a known class; new characters can never have it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    /// Sturdy melee fighter
    Warrior,
    /// Spellcaster
    Mage,
    /// Opportunistic striker
    Rogue,
    /// Healer
    Cleric,
    /// Class name with no definition
    Unrecognized(String),
}

impl CharacterClass {
    /// Every playable class.
    pub const PLAYABLE: [Self; 4] = [Self::Warrior, Self::Mage, Self::Rogue, Self::Cleric];

    /// Resolves a class name case-insensitively, keeping unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "warrior" => Self::Warrior,
            "mage" => Self::Mage,
            "rogue" => Self::Rogue,
            "cleric" => Self::Cleric,
            _ => Self::Unrecognized(name.trim().to_string()),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Warrior => "Warrior",
            Self::Mage => "Mage",
            Self::Rogue => "Rogue",
            Self::Cleric => "Cleric",
            Self::Unrecognized(name) => name,
        }
    }

    /// Returns the starting stats, or `None` for an unrecognized class.
    #[must_use]
    pub const fn base_stats(&self) -> Option<BaseStats> {
        let (health, strength, magic) = match self {
            Self::Warrior => (120, 15, 5),
            Self::Mage => (80, 8, 20),
            Self::Rogue => (90, 12, 10),
            Self::Cleric => (100, 10, 15),
            Self::Unrecognized(_) => return None,
        };
        Some(BaseStats {
            health,
            strength,
            magic,
        })
    }

    /// Checks whether this is a playable class.
    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharacterClass {
    type Err = GameError;

    /// Strict parse: unknown names are an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_name(s) {
            Self::Unrecognized(name) => Err(GameError::InvalidCharacterClass(name)),
            class => Ok(class),
        }
    }
}

/// A player character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Character name
    pub name: String,
    /// Class
    pub class: CharacterClass,
    /// Level, starting at 1
    pub level: u32,
    /// Current health
    pub health: u32,
    /// Health ceiling
    pub max_health: u32,
    /// Physical power
    pub strength: u32,
    /// Magical power
    pub magic: u32,
    /// Total experience earned
    pub experience: u32,
    /// Gold carried
    pub gold: u32,
    /// Carried items
    pub inventory: Inventory,
    /// Quests in progress
    pub active_quests: Vec<QuestId>,
    /// Quests finished
    pub completed_quests: Vec<QuestId>,
    /// Equipped weapon and armor
    pub equipment: Equipment,
}

impl Character {
    /// Creates a level 1 character with the class's starting stats.
    pub fn new(name: impl Into<String>, class: CharacterClass) -> GameResult<Self> {
        let stats = class
            .base_stats()
            .ok_or_else(|| GameError::InvalidCharacterClass(class.as_str().to_string()))?;
        let name = name.into();

        debug!("Created {} the {}", name, class);

        Ok(Self {
            name,
            class,
            level: 1,
            health: stats.health,
            max_health: stats.health,
            strength: stats.strength,
            magic: stats.magic,
            experience: 0,
            gold: STARTING_GOLD,
            inventory: Inventory::default(),
            active_quests: Vec::new(),
            completed_quests: Vec::new(),
            equipment: Equipment::default(),
        })
    }

    /// Creates a character from a class name (case-insensitive).
    pub fn create(name: impl Into<String>, class_name: &str) -> GameResult<Self> {
        Self::new(name, class_name.parse()?)
    }

    /// Returns true if health has reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Experience total at which the next level-up happens.
    #[must_use]
    pub const fn next_level_xp(&self) -> u32 {
        self.level.saturating_mul(XP_PER_LEVEL)
    }

    /// Adds experience and applies every level-up it unlocks.
    ///
    /// Returns the number of levels gained.
    pub fn gain_experience(&mut self, xp: u32) -> GameResult<u32> {
        if self.is_dead() {
            return Err(GameError::CharacterDead(self.name.clone()));
        }

        self.experience = self.experience.saturating_add(xp);

        // First level whose threshold lies above the experience total.
        let target = self.level.max(self.experience / XP_PER_LEVEL + 1);
        let levels = target - self.level;
        if levels == 0 {
            return Ok(0);
        }

        self.level = target;
        self.max_health = self
            .max_health
            .saturating_add(levels.saturating_mul(LEVEL_UP_HEALTH));
        self.strength = self
            .strength
            .saturating_add(levels.saturating_mul(LEVEL_UP_STRENGTH));
        self.magic = self.magic.saturating_add(levels.saturating_mul(LEVEL_UP_MAGIC));
        self.health = self.max_health;
        info!("{} has reached level {}", self.name, self.level);

        Ok(levels)
    }

    /// Adds (or, with a negative amount, removes) gold.
    ///
    /// Totals above `u32::MAX` saturate. Returns the new total.
    pub fn add_gold(&mut self, amount: i64) -> GameResult<u32> {
        let total = i64::from(self.gold).saturating_add(amount);
        if total < 0 {
            return Err(GameError::InsufficientResources {
                needed: amount.unsigned_abs(),
                have: u64::from(self.gold),
            });
        }
        self.gold = total.min(i64::from(u32::MAX)) as u32;
        Ok(self.gold)
    }

    /// Heals up to `amount`, never past max health.
    ///
    /// Returns the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount).min(self.max_health);
        self.health - before
    }

    /// Brings a dead character back at half health.
    ///
    /// Returns false if the character was not dead.
    pub fn revive(&mut self) -> bool {
        if !self.is_dead() {
            return false;
        }
        self.health = (self.max_health / 2).max(1);
        info!("{} has been revived with {} health", self.name, self.health);
        true
    }

    /// Reduces health by `damage`, stopping at zero.
    pub fn take_damage(&mut self, damage: u32) {
        self.health = self.health.saturating_sub(damage);
    }

    /// Reads a numeric stat.
    #[must_use]
    pub const fn stat(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Health => self.health,
            Stat::MaxHealth => self.max_health,
            Stat::Strength => self.strength,
            Stat::Magic => self.magic,
            Stat::Level => self.level,
            Stat::Experience => self.experience,
            Stat::Gold => self.gold,
        }
    }

    /// Applies a signed delta to a stat and returns the change actually made.
    ///
    /// Stats saturate at zero, level stays at least 1, and health never
    /// exceeds max health.
    pub fn apply_stat_delta(&mut self, stat: Stat, delta: i32) -> i32 {
        let before = self.stat(stat);
        let mut after = before.saturating_add_signed(delta);

        match stat {
            Stat::Health => after = after.min(self.max_health),
            Stat::Level => after = after.max(1),
            _ => {},
        }

        match stat {
            Stat::Health => self.health = after,
            Stat::MaxHealth => {
                self.max_health = after;
                self.health = self.health.min(self.max_health);
            },
            Stat::Strength => self.strength = after,
            Stat::Magic => self.magic = after,
            Stat::Level => self.level = after,
            Stat::Experience => self.experience = after,
            Stat::Gold => self.gold = after,
        }

        (i64::from(after) - i64::from(before)) as i32
    }

    /// Checks whether a quest is in the active list.
    #[must_use]
    pub fn is_quest_active(&self, quest_id: &str) -> bool {
        self.active_quests.iter().any(|q| q.as_str() == quest_id)
    }

    /// Checks whether a quest is in the completed list.
    #[must_use]
    pub fn is_quest_completed(&self, quest_id: &str) -> bool {
        self.completed_quests.iter().any(|q| q.as_str() == quest_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_class_base_stats() {
        let warrior = Character::new("Aria", CharacterClass::Warrior).expect("valid class");
        assert_eq!(warrior.health, 120);
        assert_eq!(warrior.max_health, 120);
        assert_eq!(warrior.strength, 15);
        assert_eq!(warrior.magic, 5);
        assert_eq!(warrior.level, 1);
        assert_eq!(warrior.gold, STARTING_GOLD);

        let mage = Character::create("Bren", "mage").expect("valid class");
        assert_eq!((mage.health, mage.strength, mage.magic), (80, 8, 20));

        let rogue = Character::create("Cai", "ROGUE").expect("valid class");
        assert_eq!((rogue.health, rogue.strength, rogue.magic), (90, 12, 10));

        let cleric = Character::create("Dara", "Cleric").expect("valid class");
        assert_eq!((cleric.health, cleric.strength, cleric.magic), (100, 10, 15));
    }

    #[test]
    fn test_invalid_class() {
        let result = Character::create("Eve", "Bard");
        assert_eq!(
            result,
            Err(GameError::InvalidCharacterClass("Bard".to_string()))
        );

        let result = Character::new("Eve", CharacterClass::Unrecognized("Bard".into()));
        assert!(matches!(result, Err(GameError::InvalidCharacterClass(_))));
    }

    #[test]
    fn test_gain_experience_multiple_levels() {
        let mut c = Character::create("Aria", "Warrior").expect("valid class");
        c.health = 50;

        let levels = c.gain_experience(250).expect("alive");
        assert_eq!(levels, 2);
        assert_eq!(c.level, 3);
        assert_eq!(c.experience, 250);
        assert_eq!(c.max_health, 140);
        assert_eq!(c.health, 140);
        assert_eq!(c.strength, 19);
        assert_eq!(c.magic, 9);

        // 250 < 300: no more level-ups
        assert_eq!(c.gain_experience(0), Ok(0));
        assert_eq!(c.level, 3);
    }

    #[test]
    fn test_gain_experience_at_limit() {
        let mut c = Character::create("Aria", "Warrior").expect("valid class");

        let levels = c.gain_experience(u32::MAX).expect("alive");
        assert_eq!(levels, u32::MAX / XP_PER_LEVEL);
        assert_eq!(c.level, u32::MAX / XP_PER_LEVEL + 1);
        assert_eq!(c.experience, u32::MAX);
        assert_eq!(c.max_health, 120 + levels * LEVEL_UP_HEALTH);
        assert_eq!(c.health, c.max_health);

        assert_eq!(c.gain_experience(u32::MAX), Ok(0));
        assert_eq!(c.experience, u32::MAX);
    }

    #[test]
    fn test_gain_experience_dead() {
        let mut c = Character::create("Aria", "Warrior").expect("valid class");
        c.health = 0;
        assert_eq!(
            c.gain_experience(10),
            Err(GameError::CharacterDead("Aria".to_string()))
        );
        assert_eq!(c.experience, 0);
    }

    #[test]
    fn test_add_gold() {
        let mut c = Character::create("Aria", "Warrior").expect("valid class");
        assert_eq!(c.add_gold(50), Ok(150));
        assert_eq!(c.add_gold(-150), Ok(0));
        assert_eq!(
            c.add_gold(-1),
            Err(GameError::InsufficientResources { needed: 1, have: 0 })
        );
        assert_eq!(c.gold, 0);
    }

    #[test]
    fn test_add_gold_extremes() {
        let mut c = Character::create("Aria", "Warrior").expect("valid class");
        c.gold = u32::MAX - 5;
        assert_eq!(c.add_gold(10), Ok(u32::MAX));
        assert_eq!(c.add_gold(i64::MAX), Ok(u32::MAX));
        assert_eq!(
            c.add_gold(i64::MIN),
            Err(GameError::InsufficientResources {
                needed: i64::MIN.unsigned_abs(),
                have: u64::from(u32::MAX),
            })
        );
        assert_eq!(c.gold, u32::MAX);
    }

    #[test]
    fn test_heal_and_revive() {
        let mut c = Character::create("Dara", "Cleric").expect("valid class");
        c.health = 90;
        assert_eq!(c.heal(30), 10);
        assert_eq!(c.health, 100);

        assert!(!c.revive());
        c.take_damage(500);
        assert!(c.is_dead());
        assert!(c.revive());
        assert_eq!(c.health, 50);
    }

    #[test]
    fn test_apply_stat_delta_clamps() {
        let mut c = Character::create("Aria", "Warrior").expect("valid class");
        c.health = 100;

        assert_eq!(c.apply_stat_delta(Stat::Health, 50), 20);
        assert_eq!(c.health, 120);

        assert_eq!(c.apply_stat_delta(Stat::Strength, -100), -15);
        assert_eq!(c.strength, 0);

        assert_eq!(c.apply_stat_delta(Stat::Level, -5), 0);
        assert_eq!(c.level, 1);

        assert_eq!(c.apply_stat_delta(Stat::MaxHealth, -20), -20);
        assert_eq!(c.max_health, 100);
        assert_eq!(c.health, 100);
    }

    proptest! {
        #[test]
        fn prop_level_up_settles(xp in 0u32..100_000) {
            let mut c = Character::create("Aria", "Warrior").expect("valid class");
            c.gain_experience(xp).expect("alive");
            prop_assert!(c.experience < c.next_level_xp());
            prop_assert_eq!(c.gain_experience(0), Ok(0));
            prop_assert!(c.health <= c.max_health);
        }
    }
}
