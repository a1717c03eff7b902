//! Scoring-based controllers.
//!
//! A [`Scorer`] assigns a score to one candidate action; a
//! [`ScorerController`] sums its scorers over every available action and
//! picks the best. The engine guarantees every candidate handed to a scorer
//! has already passed `precondition` and `requires`.
//!
//! Tie-breaking is deterministic - by action type name, then wire parameter
//! order - so a controller-driven game records and replays bit-exactly.

use crate::actions::action::Actionable;
use crate::core::PlayerId;
use crate::flow::engine::{Game, GamePhase};

/// One candidate action under evaluation.
pub struct ScorerContext<'a, T> {
    /// The game model.
    pub model: &'a T,
    /// The player considering the action.
    pub player: PlayerId,
    /// The candidate, already validated.
    pub action: &'a Actionable,
}

/// Assigns a partial score to a candidate action.
///
/// `None` abstains: the candidate is scored by the remaining scorers only.
pub trait Scorer<T>: Send + Sync {
    /// Score a candidate.
    fn score(&self, context: &ScorerContext<'_, T>) -> Option<f64>;
}

impl<T, F> Scorer<T> for F
where
    F: Fn(&ScorerContext<'_, T>) -> Option<f64> + Send + Sync,
{
    fn score(&self, context: &ScorerContext<'_, T>) -> Option<f64> {
        self(context)
    }
}

/// A named bundle of scorers acting as a deterministic controller.
///
/// ## Example
///
/// ```no_run
/// # use turnwise::scorers::ScorerController;
/// # struct Model;
/// let controller: ScorerController<Model> = ScorerController::new("greedy")
///     .with(|context: &turnwise::scorers::ScorerContext<'_, Model>| {
///         context.action.parameter.as_int().map(|amount| amount as f64)
///     });
/// ```
pub struct ScorerController<T> {
    name: String,
    scorers: Vec<Box<dyn Scorer<T>>>,
}

impl<T> ScorerController<T> {
    /// Create an empty controller. At least one scorer must be added.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scorers: Vec::new(),
        }
    }

    /// Add a scorer.
    #[must_use]
    pub fn with(mut self, scorer: impl Scorer<T> + 'static) -> Self {
        self.scorers.push(Box::new(scorer));
        self
    }

    /// Name of the controller.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Choose the best available action for a player, or `None` when the
    /// player has no available action.
    ///
    /// Candidates no scorer voted on lose to any scored candidate; among
    /// equal sums the first in (action type, wire parameter) order wins.
    #[must_use]
    pub fn choose(&self, game: &Game<T>, player: PlayerId) -> Option<Actionable> {
        assert!(
            !self.scorers.is_empty(),
            "controller '{}' has no scorers",
            self.name
        );
        let mut candidates = game.available_actions(player);
        if candidates.is_empty() {
            return None;
        }
        candidates.sort();

        let mut best: Option<(f64, usize)> = None;
        for (index, action) in candidates.iter().enumerate() {
            let context = ScorerContext {
                model: game.model(),
                player,
                action,
            };
            let scores: Vec<f64> = self
                .scorers
                .iter()
                .filter_map(|scorer| scorer.score(&context))
                .collect();
            if scores.is_empty() {
                continue;
            }
            let sum: f64 = scores.iter().sum();
            let better = match best {
                None => true,
                Some((best_sum, _)) => sum > best_sum,
            };
            if better {
                best = Some((sum, index));
            }
        }

        let index = best.map(|(_, index)| index).unwrap_or(0);
        Some(candidates.swap_remove(index))
    }

    /// Let the controller act for whichever player can move, performing the
    /// chosen action. Returns the new phase, or `None` when no player has an
    /// available action.
    pub fn step(
        &self,
        game: &mut Game<T>,
    ) -> Option<Result<GamePhase, crate::core::ReplayError>> {
        if game.phase() != GamePhase::AwaitingInput {
            return None;
        }
        for player in game.eliminations().remaining_players() {
            if let Some(action) = self.choose(game, player) {
                return Some(game.perform(&action));
            }
        }
        None
    }
}
