//! # Chronicles Gameplay
//!
//! Gameplay core for Quest Chronicles.
//!
//! This crate provides the rules that act on a character record:
//! - Characters, classes, and level progression
//! - Items, inventory, equipment, and the shop
//! - Quests and prerequisite chains
//! - Enemies, turn-based combat, and class special abilities

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ability;
pub mod character;
pub mod combat;
pub mod enemy;
pub mod equipment;
pub mod inventory;
pub mod item;
pub mod quest;
pub mod shop;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ability::*;
    pub use crate::character::*;
    pub use crate::combat::*;
    pub use crate::enemy::*;
    pub use crate::equipment::*;
    pub use crate::inventory::*;
    pub use crate::item::*;
    pub use crate::quest::*;
    pub use crate::shop::*;
}

pub use prelude::*;
