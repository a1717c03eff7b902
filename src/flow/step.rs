//! Flow step events and the listener interface.
//!
//! `FlowStep` is the ordered side-channel a game instance emits while it
//! runs. Listeners (replay recorder, persistence writers, UI bridges)
//! consume the stream; the engine owns emission order and invokes listeners
//! one at a time, so a listener may assume strict happens-before ordering:
//! setup before the first move, an action before any elimination it causes.

use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, Value};
use crate::eliminations::PlayerElimination;
use crate::replay::state::StateMap;

/// One discrete, ordered event describing game progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FlowStep {
    /// Setup completed; carries the randomness captured while constructing
    /// the initial model.
    Setup {
        /// Keyed randomness recorded during setup.
        state: StateMap,
    },

    /// The instance is suspended waiting for exactly one submitted action.
    AwaitInput,

    /// A submitted action passed validation and its effect completed.
    ActionPerformed {
        /// The acting player.
        player: PlayerId,
        /// Name of the action type.
        action_type: String,
        /// The action parameter in wire form.
        parameter: Value,
        /// Keyed randomness captured for this step.
        state: StateMap,
    },

    /// A submitted action failed validation. The model is unchanged and the
    /// instance keeps running.
    IllegalAction {
        /// The submitting player.
        player: PlayerId,
        /// Name of the submitted action type.
        action_type: String,
        /// The rejected parameter in wire form.
        parameter: Value,
        /// Why the action was rejected.
        reason: String,
    },

    /// A global rule's condition held and its effect executed.
    RuleExecution {
        /// Name of the rule.
        rule: String,
    },

    /// A player was eliminated.
    Elimination(PlayerElimination),

    /// An in-game log line produced by an effect.
    Log(LogEntry),

    /// The game reached its end; no further input is accepted.
    GameEnd,

    /// An uncaught fault inside a rule or effect. The instance halts and
    /// will emit no further `AwaitInput`.
    GameException {
        /// Description of the fault.
        message: String,
    },
}

impl FlowStep {
    /// Short tag naming the variant, for assertions and diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            FlowStep::Setup { .. } => "setup",
            FlowStep::AwaitInput => "await-input",
            FlowStep::ActionPerformed { .. } => "action-performed",
            FlowStep::IllegalAction { .. } => "illegal-action",
            FlowStep::RuleExecution { .. } => "rule-execution",
            FlowStep::Elimination(_) => "elimination",
            FlowStep::Log(_) => "log",
            FlowStep::GameEnd => "game-end",
            FlowStep::GameException { .. } => "game-exception",
        }
    }
}

/// An in-game log line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The player the entry concerns, if any.
    pub player: Option<PlayerId>,
    /// Log text.
    pub message: String,
    /// Entries marked private are meant only for `player`.
    pub private: bool,
}

impl LogEntry {
    /// A public log line.
    #[must_use]
    pub fn public(message: impl Into<String>) -> Self {
        Self {
            player: None,
            message: message.into(),
            private: false,
        }
    }

    /// A log line visible only to one player.
    #[must_use]
    pub fn secret(player: PlayerId, message: impl Into<String>) -> Self {
        Self {
            player: Some(player),
            message: message.into(),
            private: true,
        }
    }
}

/// Ordered subscriber to a game instance's event stream.
///
/// Listeners are invoked synchronously, in attach order, one event at a
/// time. They observe every event the instance emits.
pub trait GameListener: Send {
    /// Handle one emitted event.
    fn on_step(&mut self, step: &FlowStep);
}

/// Listener that retains every event, mostly for tests and diagnostics.
#[derive(Default)]
pub struct StepLog {
    steps: std::sync::Arc<std::sync::Mutex<Vec<FlowStep>>>,
}

impl StepLog {
    /// Create a log and a shared handle to its contents.
    #[must_use]
    pub fn new() -> (Self, std::sync::Arc<std::sync::Mutex<Vec<FlowStep>>>) {
        let steps = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        (
            Self {
                steps: std::sync::Arc::clone(&steps),
            },
            steps,
        )
    }
}

impl GameListener for StepLog {
    fn on_step(&mut self, step: &FlowStep) {
        self.steps.lock().expect("step log lock").push(step.clone());
    }
}
