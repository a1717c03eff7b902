//! Stored replay format and the recording listener.
//!
//! `ReplayData` is the persistence-boundary format: game type, player count,
//! configuration, the setup randomness map, and one `ActionReplay` per
//! performed action. It is sufficient to reconstruct a game bit-exactly and
//! round-trips unchanged through serde (JSON for inspection, bincode for
//! compact storage).

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, Value};
use crate::flow::step::{FlowStep, GameListener};

use super::state::StateMap;

/// One recorded action: who did what, in wire form, plus the randomness map
/// captured for that step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionReplay {
    /// Name of the action type.
    pub action_type: String,
    /// The acting player.
    pub player_index: PlayerId,
    /// The action parameter in wire form.
    pub serialized_parameter: Value,
    /// Keyed randomness captured while this step executed.
    pub state: StateMap,
}

/// A stored, ordered description sufficient to reproduce a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayData {
    /// Name of the game definition.
    pub game_type: String,
    /// Number of players in the recorded game.
    pub player_count: usize,
    /// Resolved configuration, as a plain value map.
    pub config: Value,
    /// Randomness captured during setup.
    pub initial_state: StateMap,
    /// One entry per performed action, in order.
    pub actions: Vec<ActionReplay>,
}

impl ReplayData {
    /// Create an empty log for a game about to start.
    #[must_use]
    pub fn new(game_type: impl Into<String>, player_count: usize, config: Value) -> Self {
        Self {
            game_type: game_type.into(),
            player_count,
            config,
            initial_state: StateMap::new(),
            actions: Vec::new(),
        }
    }

    /// Serialize to compact bytes for storage.
    pub fn to_bytes(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    /// Deserialize from stored bytes.
    pub fn from_bytes(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}

/// Listener that assembles `ReplayData` from the event stream of a live game.
///
/// The recorder shares its log behind an `Arc<Mutex<..>>` handle so the data
/// remains reachable after the listener has been moved into an instance.
///
/// ## Example
///
/// ```no_run
/// # use turnwise::replay::ReplayRecorder;
/// # use turnwise::core::Value;
/// let (recorder, handle) = ReplayRecorder::new("gridfill", 2, Value::Null);
/// // game.add_listener(Box::new(recorder));
/// // ... play ...
/// let data = handle.lock().unwrap().clone();
/// ```
pub struct ReplayRecorder {
    data: Arc<Mutex<ReplayData>>,
}

impl ReplayRecorder {
    /// Create a recorder and the shared handle to its log.
    #[must_use]
    pub fn new(
        game_type: impl Into<String>,
        player_count: usize,
        config: Value,
    ) -> (Self, Arc<Mutex<ReplayData>>) {
        let data = Arc::new(Mutex::new(ReplayData::new(game_type, player_count, config)));
        (Self { data: Arc::clone(&data) }, data)
    }
}

impl GameListener for ReplayRecorder {
    fn on_step(&mut self, step: &FlowStep) {
        match step {
            FlowStep::Setup { state } => {
                self.data.lock().expect("recorder lock").initial_state = state.clone();
            }
            FlowStep::ActionPerformed {
                player,
                action_type,
                parameter,
                state,
            } => {
                self.data
                    .lock()
                    .expect("recorder lock")
                    .actions
                    .push(ActionReplay {
                        action_type: action_type.clone(),
                        player_index: *player,
                        serialized_parameter: parameter.clone(),
                        state: state.clone(),
                    });
            }
            _ => {}
        }
    }
}
