//! Example game definitions.
//!
//! These are configuration of the engine, not engine internals; they double
//! as end-to-end exercises of the flow, choice, replay and elimination
//! subsystems.

pub mod gridfill;
pub mod highroll;

pub use gridfill::{grid_fill, GridFill, Point};
pub use highroll::{high_roll, HighRoll};
