//! Action types and concrete action instances.
//!
//! A game definition declares one [`ActionDef`] per action type: a name, a
//! typed parameter, validation layers and an effect. The engine works with
//! the type-erased [`ActionEntry`] view, where parameters appear in wire
//! form (`Value`); the typed closures see the domain parameter.
//!
//! ## Two validation layers
//!
//! `precondition` is cheap and runs before any options are computed ("is it
//! this player's turn"). `requires` re-validates a fully constructed
//! candidate. An action reaching `effect` has necessarily passed both.

use crate::core::{GameError, GameRng, PlayerId, Value};
use crate::flow::scope::{ActionScope, EffectScope};

use serde::{Deserialize, Serialize};

use super::choice::{ChoiceSpec, SampleSizes};
use super::resolver::{self, ChoiceInfo};

/// Bidirectional mapping between an in-memory action parameter and its wire
/// form.
///
/// Every action type with a non-primitive parameter supplies this mapping;
/// `create_action` (domain value) and a wire submission of `to_wire`'s output
/// are equivalent for the same logical choice.
pub trait ActionParameter: Clone + Send + Sync + 'static {
    /// Serialize to the wire form.
    fn to_wire(&self) -> Value;

    /// Parse from the wire form. `None` rejects a malformed wire value.
    fn from_wire(value: &Value) -> Option<Self>;
}

impl ActionParameter for Value {
    fn to_wire(&self) -> Value {
        self.clone()
    }

    fn from_wire(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl ActionParameter for () {
    fn to_wire(&self) -> Value {
        Value::Null
    }

    fn from_wire(value: &Value) -> Option<Self> {
        value.is_null().then_some(())
    }
}

impl ActionParameter for i64 {
    fn to_wire(&self) -> Value {
        Value::Int(*self)
    }

    fn from_wire(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl ActionParameter for String {
    fn to_wire(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_wire(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

/// A concrete action instance in wire form: who, what, with which parameter.
///
/// Created per submission and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Actionable {
    /// The acting player.
    pub player: PlayerId,
    /// Name of the action type.
    pub action_type: String,
    /// The parameter in wire form.
    pub parameter: Value,
}

impl Actionable {
    /// Create an actionable from a wire parameter.
    ///
    /// This is the entry point transport code calls with a deserialized
    /// parameter.
    #[must_use]
    pub fn new(player: PlayerId, action_type: impl Into<String>, parameter: Value) -> Self {
        Self {
            player,
            action_type: action_type.into(),
            parameter,
        }
    }
}

pub(crate) type PrecondFn<T> = Box<dyn Fn(&ActionScope<'_, T>) -> bool + Send + Sync>;
pub(crate) type RequiresFn<T, P> =
    Box<dyn Fn(&ActionScope<'_, T>, &P) -> bool + Send + Sync>;
pub(crate) type ActionEffectFn<T, P> =
    Box<dyn Fn(&mut EffectScope<'_, T>, &P) -> Result<(), GameError> + Send + Sync>;

/// Declaration of one action type.
///
/// ## Example
///
/// ```no_run
/// # use turnwise::actions::ActionDef;
/// # use turnwise::flow::scope::ActionScope;
/// # struct Nim { heap: i64, current: turnwise::core::PlayerId }
/// let take: ActionDef<Nim, i64> = ActionDef::new("take")
///     .precondition(|scope: &ActionScope<'_, Nim>| scope.game.current == scope.player)
///     .options(|scope| (1..=3.min(scope.game.heap)).collect())
///     .effect(|scope, amount| {
///         scope.game.heap -= *amount;
///         Ok(())
///     });
/// ```
pub struct ActionDef<T, P: ActionParameter> {
    name: String,
    precondition: PrecondFn<T>,
    choice: Option<ChoiceSpec<T, P>>,
    requires: RequiresFn<T, P>,
    effect: ActionEffectFn<T, P>,
}

impl<T, P: ActionParameter> ActionDef<T, P> {
    /// Start declaring an action type. A choice declaration (`fixed`,
    /// `options` or `choose`) is mandatory before the definition is used.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            precondition: Box::new(|_| true),
            choice: None,
            requires: Box::new(|_, _| true),
            effect: Box::new(|_, _| Ok(())),
        }
    }

    /// Cheap filter evaluated before any options are computed.
    #[must_use]
    pub fn precondition(
        mut self,
        f: impl Fn(&ActionScope<'_, T>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.precondition = Box::new(f);
        self
    }

    /// The action has exactly one parameter value (e.g. "pass").
    #[must_use]
    pub fn fixed(mut self, parameter: P) -> Self {
        self.choice = Some(ChoiceSpec::Fixed(parameter));
        self
    }

    /// The parameter space is a flat, finite list computed per query.
    #[must_use]
    pub fn options(
        mut self,
        f: impl Fn(&ActionScope<'_, T>) -> Vec<P> + Send + Sync + 'static,
    ) -> Self {
        self.choice = Some(ChoiceSpec::Options(Box::new(f)));
        self
    }

    /// The parameter is built step by step through a recursive choice tree.
    #[must_use]
    pub fn choose(mut self, spec: super::choice::RecursiveChoice<T, P>) -> Self {
        self.choice = Some(ChoiceSpec::Recursive(spec));
        self
    }

    /// Re-validation of a fully constructed candidate.
    #[must_use]
    pub fn requires(
        mut self,
        f: impl Fn(&ActionScope<'_, T>, &P) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.requires = Box::new(f);
        self
    }

    /// The state transition. Runs only after `precondition` and `requires`.
    #[must_use]
    pub fn effect(
        mut self,
        f: impl Fn(&mut EffectScope<'_, T>, &P) -> Result<(), GameError> + Send + Sync + 'static,
    ) -> Self {
        self.effect = Box::new(f);
        self
    }

    /// Create an actionable from a domain parameter value.
    ///
    /// Equivalent to wiring `parameter.to_wire()` through
    /// [`Actionable::new`].
    #[must_use]
    pub fn create_action(&self, player: PlayerId, parameter: &P) -> Actionable {
        Actionable::new(player, self.name.clone(), parameter.to_wire())
    }

    fn spec(&self) -> &ChoiceSpec<T, P> {
        self.choice
            .as_ref()
            .unwrap_or_else(|| panic!("action '{}' declares no choices", self.name))
    }
}

/// Type-erased view of an action definition, as the engine sees it.
///
/// All parameters appear in wire form; decoding happens at this boundary.
pub trait ActionEntry<T>: Send + Sync {
    /// Name of the action type.
    fn name(&self) -> &str;

    /// Evaluate the cheap precondition layer.
    fn precondition(&self, scope: &ActionScope<'_, T>) -> bool;

    /// Lazily enumerate available wire parameters for a player.
    ///
    /// Yields only candidates that pass both validation layers. Finite
    /// unless the action's choice space is infinite; callers over infinite
    /// spaces must bound consumption (or use [`ActionEntry::sampled`]).
    fn available<'a>(&'a self, scope: ActionScope<'a, T>) -> Box<dyn Iterator<Item = Value> + 'a>;

    /// Enumerate with exact per-depth sample hints.
    fn sampled(
        &self,
        scope: &ActionScope<'_, T>,
        hints: &SampleSizes,
        rng: &mut GameRng,
    ) -> Vec<Value>;

    /// Validate a wire parameter through both layers.
    ///
    /// Returns the rejection reason; `Ok` means the action may be performed.
    fn validate(&self, scope: &ActionScope<'_, T>, parameter: &Value) -> Result<(), String>;

    /// Decode and run the effect. The caller has already validated.
    fn perform(
        &self,
        scope: &mut EffectScope<'_, T>,
        parameter: &Value,
    ) -> Result<(), GameError>;

    /// Incremental choice navigation: next options and valid parameters at a
    /// chosen prefix. A chosen value absent from the current options is a
    /// programmer error and panics.
    fn with_chosen(&self, scope: &ActionScope<'_, T>, chosen: &[Value]) -> ChoiceInfo;
}

impl<T, P: ActionParameter> ActionEntry<T> for ActionDef<T, P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn precondition(&self, scope: &ActionScope<'_, T>) -> bool {
        (self.precondition)(scope)
    }

    fn available<'a>(&'a self, scope: ActionScope<'a, T>) -> Box<dyn Iterator<Item = Value> + 'a> {
        if !(self.precondition)(&scope) {
            return Box::new(std::iter::empty());
        }
        resolver::available(self.spec(), &self.requires, scope)
    }

    fn sampled(
        &self,
        scope: &ActionScope<'_, T>,
        hints: &SampleSizes,
        rng: &mut GameRng,
    ) -> Vec<Value> {
        if !(self.precondition)(scope) {
            return Vec::new();
        }
        resolver::sampled(self.spec(), &self.requires, scope, hints, rng)
    }

    fn validate(&self, scope: &ActionScope<'_, T>, parameter: &Value) -> Result<(), String> {
        let Some(decoded) = P::from_wire(parameter) else {
            return Err(format!(
                "malformed parameter for action '{}'",
                self.name
            ));
        };
        if !(self.precondition)(scope) {
            return Err("precondition failed".to_string());
        }
        match self.spec() {
            ChoiceSpec::Fixed(expected) => {
                if expected.to_wire() != *parameter {
                    return Err("parameter does not match the declared value".to_string());
                }
            }
            ChoiceSpec::Options(options) => {
                let available = options(scope);
                if !available.iter().any(|p| p.to_wire() == *parameter) {
                    return Err("parameter is not an available option".to_string());
                }
            }
            // Recursive spaces may be infinite; `requires` is the gate.
            ChoiceSpec::Recursive(_) => {}
        }
        if !(self.requires)(scope, &decoded) {
            return Err("requirement failed".to_string());
        }
        Ok(())
    }

    fn perform(
        &self,
        scope: &mut EffectScope<'_, T>,
        parameter: &Value,
    ) -> Result<(), GameError> {
        let decoded = P::from_wire(parameter).ok_or_else(|| {
            GameError::fault(format!(
                "malformed parameter reached perform for action '{}'",
                self.name
            ))
        })?;
        (self.effect)(scope, &decoded)
    }

    fn with_chosen(&self, scope: &ActionScope<'_, T>, chosen: &[Value]) -> ChoiceInfo {
        resolver::with_chosen(&self.name, self.spec(), &self.requires, scope, chosen)
    }
}
