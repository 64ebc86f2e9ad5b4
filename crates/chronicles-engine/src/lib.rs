//! Quest Chronicles engine.
//!
//! Ties the gameplay rules to the outside world:
//! - Config: file locations, seeding, cooldown rules, log filter
//! - Data loading: item and quest definition files
//! - Saves: one text file per character, written atomically
//! - Sessions: JSON scripts that drive the game headlessly

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod data_loader;
pub mod save_manager;
pub mod session;


/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::data_loader::*;
    pub use crate::save_manager::*;
    pub use crate::session::*;
}

pub use prelude::*;
