//! Reconstructing a game from stored replay data.
//!
//! The driver creates a fresh instance, seeds setup with the recorded
//! initial state, and re-submits every recorded action with its captured
//! randomness map. Generators never run; every nondeterministic draw comes
//! from the log. Any divergence - an illegal action, a missing or
//! out-of-order key, a fault - aborts the replay with a [`ReplayError`]
//! without affecting other instances.

use std::sync::Arc;

use crate::actions::action::Actionable;
use crate::core::ReplayError;
use crate::flow::def::GameDef;
use crate::flow::engine::{Game, GamePhase, GameStartInfo};

use super::data::ReplayData;

/// Deterministically reconstruct a finished (or partial) game.
///
/// Returns the replayed instance; its views and elimination ledger match
/// the live game's bit-exactly.
pub fn replay<T>(def: &Arc<GameDef<T>>, data: &ReplayData) -> Result<Game<T>, ReplayError> {
    replay_with_listeners(def, data, Vec::new())
}

/// Like [`replay`], with listeners attached before setup so they observe
/// the reconstructed event stream from the beginning.
pub fn replay_with_listeners<T>(
    def: &Arc<GameDef<T>>,
    data: &ReplayData,
    listeners: Vec<Box<dyn crate::flow::step::GameListener>>,
) -> Result<Game<T>, ReplayError> {
    if def.name() != data.game_type {
        return Err(ReplayError::GameTypeMismatch {
            expected: def.name().to_string(),
            actual: data.game_type.clone(),
        });
    }
    for action in &data.actions {
        if def.action(&action.action_type).is_none() {
            return Err(ReplayError::UnknownActionType {
                action_type: action.action_type.clone(),
            });
        }
    }

    // The generators never run during replay, so the seed is irrelevant.
    let mut info = GameStartInfo::new(data.player_count, 0);
    if let Some(entries) = data.config.as_map() {
        info.config = entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
    }

    let mut game = Game::new(Arc::clone(def), info);
    for listener in listeners {
        game.add_listener(listener);
    }

    log::debug!(
        "replaying '{}' with {} actions",
        data.game_type,
        data.actions.len()
    );
    let mut phase = game.start_replayed(&data.initial_state)?;
    if phase == GamePhase::Halted {
        return Err(ReplayError::Faulted {
            message: "instance halted during replayed setup".to_string(),
        });
    }
    for action in &data.actions {
        if phase != GamePhase::AwaitingInput {
            return Err(ReplayError::PastGameEnd);
        }
        let actionable = Actionable::new(
            action.player_index,
            action.action_type.clone(),
            action.serialized_parameter.clone(),
        );
        phase = game.perform_replayed(&actionable, &action.state)?;
        if phase == GamePhase::Halted {
            return Err(ReplayError::Faulted {
                message: format!(
                    "instance halted replaying action '{}'",
                    action.action_type
                ),
            });
        }
    }
    Ok(game)
}
