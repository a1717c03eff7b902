//! Core engine types: players, values, RNG, configuration, errors.
//!
//! These are the game-agnostic building blocks the other subsystems share.
//! Games configure the engine through definitions rather than modifying core.

pub mod config;
pub mod error;
pub mod player;
pub mod rng;
pub mod value;

pub use config::GameConfig;
pub use error::{GameError, RegistryError, ReplayError};
pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;
pub use value::Value;
