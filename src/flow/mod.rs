//! The game-flow engine: definitions, programs, the state machine, events
//! and instance scheduling.

pub mod def;
pub mod engine;
pub mod program;
pub mod runner;
pub mod scope;
pub mod step;

pub use def::{GameDef, GameDefBuilder};
pub use engine::{Game, GamePhase, GameStartInfo};
pub use program::{FlowNode, FlowProgram, StepDef};
pub use runner::{spawn, GameHandle, InstanceStopped};
pub use scope::{ActionScope, EffectScope, RuleScope, SetupScope, ViewScope};
pub use step::{FlowStep, GameListener, LogEntry, StepLog};
