//! # Chronicles Common
//!
//! Shared types for Quest Chronicles:
//! - ID types (`ItemId`, `QuestId`)
//! - The gameplay error taxonomy (`GameError`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;
