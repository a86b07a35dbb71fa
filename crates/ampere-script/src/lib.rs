//! Ampere Script - RON loader and schema definitions
//!
//! Loads game content from RON files:
//! - Generator type definitions (`generators: [...]`)
//! - Simulator configuration (`config.ron`)
//!
//! The loaded [`GameDefs`] doubles as the simulator's type catalog.

mod error;
mod loader;
mod schema;

pub use error::{Error, Result};
pub use loader::{GameDefs, Loader};
pub use schema::GeneratorTypeDef;
