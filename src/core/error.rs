//! Error taxonomy.
//!
//! Three failure classes cross engine boundaries as values:
//!
//! - `ReplayError`: a replayed lookup diverged from the recorded log. Fatal
//!   to that replay attempt; never silently substituted.
//! - `GameError`: a fault raised by a rule or action effect. Converted into
//!   a `GameException` event at the engine boundary; the instance halts.
//! - `RegistryError`: a game type could not be instantiated.
//!
//! Invariant violations (double elimination, out-of-range player index,
//! malformed recursion requests) are programmer errors and panic instead.

use thiserror::Error;

use super::player::PlayerId;

/// A replayed game diverged from its recorded log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// A key was requested that the recorded step never stored.
    #[error("replay state has no value for key '{key}'")]
    MissingKey { key: String },

    /// Keys were requested in a different order than recorded.
    #[error("replay state expected key '{expected}' next but '{requested}' was requested")]
    OutOfOrder { expected: String, requested: String },

    /// The stored value has a different shape than the request.
    #[error("replay value for key '{key}' is not {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// A stored item identity no longer matches any live item.
    #[error("replay value for key '{key}' references unknown item '{id}'")]
    UnknownItem { key: String, id: String },

    /// A stored pick has the wrong number of items.
    #[error("replay value for key '{key}' has {actual} items, expected {expected}")]
    CountMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    /// The replay log names an action type the definition does not declare.
    #[error("replay references unknown action type '{action_type}'")]
    UnknownActionType { action_type: String },

    /// A recorded action was rejected when re-submitted.
    #[error("replayed action '{action_type}' by {player} was rejected: {reason}")]
    IllegalAction {
        action_type: String,
        player: PlayerId,
        reason: String,
    },

    /// The replay log belongs to a different game type.
    #[error("replay data is for game type '{actual}', not '{expected}'")]
    GameTypeMismatch { expected: String, actual: String },

    /// The replay log contains actions past the end of the game.
    #[error("replay log continues after the game ended")]
    PastGameEnd,

    /// The instance faulted while replaying.
    #[error("game faulted during replay: {message}")]
    Faulted { message: String },
}

/// A fault raised inside a rule or action effect.
///
/// Effects return `Result<(), GameError>`; the engine converts an `Err` (or
/// a panic) into a `GameException` event and halts the instance.
#[derive(Error, Debug)]
pub enum GameError {
    /// Replay state diverged. During replay this aborts the replay attempt.
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// Game-specific fault.
    #[error("{0}")]
    Fault(String),
}

impl GameError {
    /// Create a game-specific fault from a message.
    pub fn fault(message: impl Into<String>) -> Self {
        GameError::Fault(message.into())
    }
}

/// A game type could not be instantiated from the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No game type registered under this name.
    #[error("unknown game type '{0}'")]
    UnknownGameType(String),

    /// The requested player count is outside the game's declared range.
    #[error("game '{game}' supports {min}-{max} players, requested {requested}")]
    PlayerCount {
        game: String,
        requested: usize,
        min: usize,
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_error_messages() {
        let e = ReplayError::OutOfOrder {
            expected: "roll".into(),
            requested: "draw".into(),
        };
        assert_eq!(
            e.to_string(),
            "replay state expected key 'roll' next but 'draw' was requested"
        );

        let e = ReplayError::IllegalAction {
            action_type: "claim".into(),
            player: PlayerId::new(1),
            reason: "not your turn".into(),
        };
        assert!(e.to_string().contains("Player 1"));
    }

    #[test]
    fn test_game_error_from_replay() {
        let e: GameError = ReplayError::MissingKey { key: "dice".into() }.into();
        assert!(matches!(e, GameError::Replay(_)));
    }
}
