//! Deterministic replay: keyed randomness capture, the stored format, and
//! the reconstruction driver.

pub mod data;
pub mod replayer;
pub mod state;

pub use data::{ActionReplay, ReplayData, ReplayRecorder};
pub use replayer::{replay, replay_with_listeners};
pub use state::{ReplayScope, StateMap, StepState};
