//! Evaluation scopes handed to rule-author closures.
//!
//! Every closure a game definition supplies - preconditions, option
//! generators, requirements, effects, rule conditions, view projections -
//! receives one of these scopes instead of raw engine internals. Read-only
//! scopes borrow the model immutably; `EffectScope` is the only place the
//! model, the elimination ledger and the replay facade are mutable.

use crate::core::{GameConfig, PlayerId};
use crate::eliminations::EliminationLedger;
use crate::replay::ReplayScope;

use super::step::LogEntry;

/// Read-only scope for `precondition`, `options` and `requires` closures.
pub struct ActionScope<'a, T> {
    /// The game model.
    pub game: &'a T,
    /// Elimination ledger (read-only).
    pub eliminations: &'a EliminationLedger,
    /// The player the query is evaluated for.
    pub player: PlayerId,
    /// Instance configuration.
    pub config: &'a GameConfig,
}

impl<'a, T> Clone for ActionScope<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for ActionScope<'a, T> {}

/// Read-only scope for rule conditions and flow predicates.
pub struct RuleScope<'a, T> {
    /// The game model.
    pub game: &'a T,
    /// Elimination ledger (read-only).
    pub eliminations: &'a EliminationLedger,
    /// Instance configuration.
    pub config: &'a GameConfig,
}

/// Mutable scope for action effects, rule effects and step entry effects.
pub struct EffectScope<'a, T> {
    /// The game model, mutable.
    pub game: &'a mut T,
    /// Elimination ledger, mutable: effects assign outcomes here.
    pub eliminations: &'a mut EliminationLedger,
    /// Facade for nondeterministic draws, keyed per step.
    pub replay: ReplayScope<'a>,
    /// The acting player. `None` for rule and step effects.
    pub player: Option<PlayerId>,
    /// Instance configuration.
    pub config: &'a GameConfig,
    pub(crate) logs: &'a mut Vec<LogEntry>,
}

impl<'a, T> EffectScope<'a, T> {
    /// The acting player; panics when called from a rule or step effect.
    #[must_use]
    pub fn acting_player(&self) -> PlayerId {
        self.player.expect("no acting player in this effect")
    }

    /// Append a public log line, emitted as a `Log` event.
    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(LogEntry::public(message));
    }

    /// Append a log line visible only to one player.
    pub fn log_secret(&mut self, player: PlayerId, message: impl Into<String>) {
        self.logs.push(LogEntry::secret(player, message));
    }
}

/// Scope for the setup closure constructing the initial model.
pub struct SetupScope<'a> {
    /// Number of players in this instance.
    pub player_count: usize,
    /// Instance configuration.
    pub config: &'a GameConfig,
    /// Facade for setup randomness (shuffles, initial deals).
    pub replay: ReplayScope<'a>,
}

/// Scope for view projections.
pub struct ViewScope<'a, T> {
    /// The game model.
    pub game: &'a T,
    /// The player the view is computed for.
    pub viewer: PlayerId,
    /// Elimination ledger (read-only).
    pub eliminations: &'a EliminationLedger,
}
