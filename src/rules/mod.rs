//! Global game rules.
//!
//! A rule is a hierarchical node: a condition, an effect, and child rules
//! evaluated only while their parent applies. The engine runs a rule cycle
//! after every performed action (and when passing through steps that enable
//! no actions); rules are stateless between cycles except through model
//! mutation.
//!
//! Conditions and effects are stored function objects, so dispatch is
//! explicit and each rule is testable in isolation.

use crate::core::GameError;
use crate::flow::scope::{EffectScope, RuleScope};

pub(crate) type RuleCondFn<T> = Box<dyn Fn(&RuleScope<'_, T>) -> bool + Send + Sync>;
pub(crate) type RuleEffectFn<T> =
    Box<dyn Fn(&mut EffectScope<'_, T>) -> Result<(), GameError> + Send + Sync>;

/// One node in the rule tree.
///
/// ## Example
///
/// ```no_run
/// # use turnwise::rules::GameRule;
/// # use turnwise::flow::scope::RuleScope;
/// # use turnwise::eliminations::WinResult;
/// # struct Race { finished: Vec<turnwise::core::PlayerId> }
/// let rule: GameRule<Race> = GameRule::new("finish-line")
///     .applies_when(|scope: &RuleScope<'_, Race>| !scope.game.finished.is_empty())
///     .effect(|scope| {
///         let finished = std::mem::take(&mut scope.game.finished);
///         for player in finished {
///             scope.eliminations.assign(player, WinResult::Win);
///         }
///         Ok(())
///     });
/// ```
pub struct GameRule<T> {
    pub(crate) name: String,
    pub(crate) applies_when: RuleCondFn<T>,
    pub(crate) effect: RuleEffectFn<T>,
    pub(crate) children: Vec<GameRule<T>>,
}

impl<T> GameRule<T> {
    /// Start declaring a rule. With no condition it applies every cycle.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            applies_when: Box::new(|_| true),
            effect: Box::new(|_| Ok(())),
            children: Vec::new(),
        }
    }

    /// Condition under which the rule (and its children) execute.
    #[must_use]
    pub fn applies_when(
        mut self,
        f: impl Fn(&RuleScope<'_, T>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.applies_when = Box::new(f);
        self
    }

    /// The rule's effect.
    #[must_use]
    pub fn effect(
        mut self,
        f: impl Fn(&mut EffectScope<'_, T>) -> Result<(), GameError> + Send + Sync + 'static,
    ) -> Self {
        self.effect = Box::new(f);
        self
    }

    /// Attach a child rule, evaluated only when this rule applies.
    #[must_use]
    pub fn child(mut self, rule: GameRule<T>) -> Self {
        self.children.push(rule);
        self
    }

    /// Name of the rule, as reported in `RuleExecution` events.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
