//! Class special abilities.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::character::{Character, CharacterClass};

/// Health restored by the cleric's Heal.
pub const HEAL_AMOUNT: u32 = 30;

/// Chance that a Critical Strike lands.
pub const CRITICAL_STRIKE_CHANCE: f64 = 0.5;

/// A class's special ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialAbility {
    /// Warrior: twice strength as damage
    PowerStrike,
    /// Mage: twice magic as damage
    Fireball,
    /// Rogue: thrice strength as damage, half the time
    CriticalStrike,
    /// Cleric: restores health
    Heal,
}

impl SpecialAbility {
    /// Returns the ability of a class, if it has one.
    #[must_use]
    pub const fn for_class(class: &CharacterClass) -> Option<Self> {
        match class {
            CharacterClass::Warrior => Some(Self::PowerStrike),
            CharacterClass::Mage => Some(Self::Fireball),
            CharacterClass::Rogue => Some(Self::CriticalStrike),
            CharacterClass::Cleric => Some(Self::Heal),
            CharacterClass::Unrecognized(_) => None,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PowerStrike => "Power Strike",
            Self::Fireball => "Fireball",
            Self::CriticalStrike => "Critical Strike",
            Self::Heal => "Heal",
        }
    }
}

impl fmt::Display for SpecialAbility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a special ability did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AbilityOutcome {
    /// Damage to deal to the enemy
    Damage {
        /// Ability used
        ability: SpecialAbility,
        /// Damage amount, applied without defense reduction
        amount: u32,
    },
    /// The ability was used but failed to land
    Miss {
        /// Ability used
        ability: SpecialAbility,
    },
    /// The user healed
    Healed {
        /// Health actually restored
        amount: u32,
        /// Health after healing
        health: u32,
    },
    /// The class has no ability; nothing happens
    Unknown,
}

impl AbilityOutcome {
    /// Damage this outcome deals to the enemy.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        match self {
            Self::Damage { amount, .. } => *amount,
            _ => 0,
        }
    }
}

/// Resolves the character's special ability.
///
/// Healing is applied to the character here; damage is returned for the
/// caller to apply to the enemy.
pub fn use_special_ability(character: &mut Character, rng: &mut fastrand::Rng) -> AbilityOutcome {
    let Some(ability) = SpecialAbility::for_class(&character.class) else {
        debug!("{} has no special ability", character.name);
        return AbilityOutcome::Unknown;
    };

    let outcome = match ability {
        SpecialAbility::PowerStrike => AbilityOutcome::Damage {
            ability,
            amount: character.strength.saturating_mul(2),
        },
        SpecialAbility::Fireball => AbilityOutcome::Damage {
            ability,
            amount: character.magic.saturating_mul(2),
        },
        SpecialAbility::CriticalStrike => {
            if rng.f64() < CRITICAL_STRIKE_CHANCE {
                AbilityOutcome::Damage {
                    ability,
                    amount: character.strength.saturating_mul(3),
                }
            } else {
                AbilityOutcome::Miss { ability }
            }
        },
        SpecialAbility::Heal => {
            let amount = character.heal(HEAL_AMOUNT);
            AbilityOutcome::Healed {
                amount,
                health: character.health,
            }
        },
    };

    debug!("{} used {}: {:?}", character.name, ability, outcome);
    outcome
}
