//! Enemy templates.

use chronicles_common::{GameError, GameResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in enemy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    /// Weak early enemy
    Goblin,
    /// Mid-level brute
    Orc,
    /// End-game boss
    Dragon,
}

impl EnemyKind {
    /// Every kind, weakest first.
    pub const ALL: [Self; 3] = [Self::Goblin, Self::Orc, Self::Dragon];

    /// Picks a kind suited to a character level.
    #[must_use]
    pub const fn for_level(level: u32) -> Self {
        match level {
            0..=2 => Self::Goblin,
            3..=5 => Self::Orc,
            _ => Self::Dragon,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Goblin => "Goblin",
            Self::Orc => "Orc",
            Self::Dragon => "Dragon",
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnemyKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "goblin" => Ok(Self::Goblin),
            "orc" => Ok(Self::Orc),
            "dragon" => Ok(Self::Dragon),
            _ => Err(GameError::InvalidTarget(s.trim().to_string())),
        }
    }
}

/// An opponent in a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    /// Display name
    pub name: String,
    /// Current health
    pub health: u32,
    /// Health ceiling
    pub max_health: u32,
    /// Physical power
    pub strength: u32,
    /// Magical power
    pub magic: u32,
    /// Experience paid to the victor
    pub xp_reward: u32,
    /// Gold paid to the victor
    pub gold_reward: u32,
}

impl Enemy {
    /// Builds a fresh enemy of the given kind.
    #[must_use]
    pub fn create(kind: EnemyKind) -> Self {
        let (health, strength, magic, xp_reward, gold_reward) = match kind {
            EnemyKind::Goblin => (50, 8, 2, 25, 10),
            EnemyKind::Orc => (80, 12, 5, 50, 25),
            EnemyKind::Dragon => (200, 25, 15, 200, 100),
        };
        Self {
            name: kind.as_str().to_string(),
            health,
            max_health: health,
            strength,
            magic,
            xp_reward,
            gold_reward,
        }
    }

    /// Builds an enemy by name (case-insensitive).
    pub fn from_name(name: &str) -> GameResult<Self> {
        Ok(Self::create(name.parse()?))
    }

    /// Builds the enemy suited to a character level.
    #[must_use]
    pub fn for_level(level: u32) -> Self {
        Self::create(EnemyKind::for_level(level))
    }

    /// Returns true if health has reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health == 0
    }
}
