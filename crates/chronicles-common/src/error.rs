//! Error types for Quest Chronicles gameplay operations.

use crate::ids::{ItemId, QuestId};
use thiserror::Error;

/// Errors reported by the gameplay core.
///
/// Every public gameplay operation either succeeds or fails with exactly one
/// of these. Validation failures are raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    // === Validity ===
    /// Unknown enemy type
    #[error("invalid enemy type: {0}")]
    InvalidTarget(String),

    /// Unknown character class
    #[error("invalid character class: {0}")]
    InvalidCharacterClass(String),

    /// Item has the wrong category for the operation
    #[error("'{item}' is a {actual}, not a {expected}")]
    InvalidItemType {
        /// Item involved
        item: ItemId,
        /// Category the operation needs
        expected: String,
        /// Category the item has
        actual: String,
    },

    // === State ===
    /// Turn taken on a battle that has already ended
    #[error("combat is not active")]
    CombatNotActive,

    /// Character has no health left
    #[error("{0} is dead")]
    CharacterDead(String),

    /// Special ability chosen before it is ready
    #[error("special ability on cooldown: {turns_remaining} turn(s) remaining")]
    AbilityOnCooldown {
        /// Turns until the ability is ready again
        turns_remaining: u32,
    },

    /// Quest is not in the active list
    #[error("quest not active: {0}")]
    QuestNotActive(QuestId),

    /// Quest is already in the active list
    #[error("quest already active: {0}")]
    QuestAlreadyActive(QuestId),

    /// Quest is already in the completed list
    #[error("quest already completed: {0}")]
    QuestAlreadyCompleted(QuestId),

    // === Resources ===
    /// Inventory has no free slot
    #[error("inventory full (max {capacity})")]
    InventoryFull {
        /// Inventory capacity
        capacity: usize,
    },

    /// Not enough gold
    #[error("insufficient gold: need {needed}, have {have}")]
    InsufficientResources {
        /// Gold required
        needed: u64,
        /// Gold available
        have: u64,
    },

    /// Item not held or not defined
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    // === Data ===
    /// Quest id missing from the quest table
    #[error("quest not found: {0}")]
    QuestNotFound(QuestId),

    /// Character level below the quest requirement
    #[error("level {current} is too low, quest requires level {required}")]
    InsufficientLevel {
        /// Required level
        required: u32,
        /// Character level
        current: u32,
    },

    /// Prerequisite quest not completed
    #[error("quest {quest} requires {prerequisite} to be completed first")]
    QuestRequirementsNotMet {
        /// Quest being accepted
        quest: QuestId,
        /// Missing prerequisite
        prerequisite: QuestId,
    },

    /// Prerequisite links loop back on themselves
    #[error("cyclic prerequisite chain through quest {0}")]
    CyclicPrerequisite(QuestId),
}

/// Result type alias for gameplay operations.
pub type GameResult<T> = Result<T, GameError>;
