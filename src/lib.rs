//! # turnwise
//!
//! A rule-agnostic engine for turn-based multi-player games. Given a
//! declarative description of legal actions and state-transition rules, the
//! engine drives a game from setup to completion, validates player moves,
//! tracks eliminations and rankings, and supports bit-exact deterministic
//! replay from a compact action log rather than full state snapshots.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: No hardcoded actions, phases or win conditions.
//!    Games declare these in a `GameDef` at startup; the engine only
//!    interprets.
//!
//! 2. **N-Player First**: Every API takes the instance's player count as
//!    context. No convenience methods that assume 2 players.
//!
//! 3. **Determinism Over Snapshots**: Nondeterministic draws are captured
//!    once, keyed per step, and replayed from the log. Generators never run
//!    during replay.
//!
//! ## Architecture
//!
//! - One single-threaded state machine per instance; the only suspension
//!   point is waiting for the next submitted action. Many instances run as
//!   separate tasks on a shared worker pool with no shared mutable state.
//! - Listeners observe the full `FlowStep` stream in emission order, one at
//!   a time: setup before first move, action before any elimination it
//!   causes.
//!
//! ## Modules
//!
//! - `core`: players, values, RNG, configuration, errors
//! - `eliminations`: per-player results and rank positions
//! - `replay`: keyed randomness capture, stored format, replay driver
//! - `actions`: action declarations and the choice tree resolver
//! - `rules`: hierarchical global rules
//! - `flow`: definitions, flow programs, the engine, events, scheduling
//! - `registry`: explicit game-type registry over erased instances
//! - `scorers`: deterministic scoring-based controllers
//! - `games`: example game definitions

pub mod core;
pub mod eliminations;
pub mod replay;
pub mod actions;
pub mod rules;
pub mod flow;
pub mod registry;
pub mod scorers;
pub mod games;

// Re-export commonly used types
pub use crate::core::{
    GameConfig, GameError, GameRng, PlayerId, PlayerMap, RegistryError, ReplayError, Value,
};

pub use crate::eliminations::{EliminationLedger, PlayerElimination, WinResult};

pub use crate::replay::{
    replay, replay_with_listeners, ActionReplay, ReplayData, ReplayRecorder, ReplayScope,
    StateMap,
};

pub use crate::actions::{
    ActionDef, ActionEntry, ActionParameter, Actionable, ChoiceInfo, ChoiceScope, ChoiceSpec,
    RecursiveChoice, SampleSizes,
};

pub use crate::rules::GameRule;

pub use crate::flow::{
    spawn, FlowNode, FlowProgram, FlowStep, Game, GameDef, GameDefBuilder, GameHandle,
    GameListener, GamePhase, GameStartInfo, LogEntry, StepDef, StepLog,
};

pub use crate::registry::{GameRegistry, RunningGame};

pub use crate::scorers::{Scorer, ScorerContext, ScorerController};
