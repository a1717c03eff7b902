//! Game definitions: the immutable product of the rule-author surface.
//!
//! A `GameDef` is built once per game type and never mutated afterwards; it
//! holds the setup factory, the declared action types (type-erased), the
//! global rule tree, the flow program and the view projections. Running
//! instances share the definition behind an `Arc`.

use std::ops::RangeInclusive;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::actions::action::{ActionDef, ActionEntry, ActionParameter};
use crate::core::{GameError, Value};
use crate::rules::GameRule;

use super::program::{FlowNode, FlowProgram};
use super::scope::{SetupScope, ViewScope};

pub(crate) type SetupFn<T> =
    Box<dyn Fn(&mut SetupScope<'_>) -> Result<T, GameError> + Send + Sync>;
pub(crate) type ViewFn<T> = Box<dyn Fn(&ViewScope<'_, T>) -> Value + Send + Sync>;

/// An immutable game definition.
pub struct GameDef<T> {
    pub(crate) name: String,
    pub(crate) players: RangeInclusive<usize>,
    pub(crate) config_defaults: Vec<(String, Value)>,
    pub(crate) setup: SetupFn<T>,
    pub(crate) actions: Vec<Box<dyn ActionEntry<T>>>,
    pub(crate) action_index: FxHashMap<String, usize>,
    pub(crate) rules: Vec<GameRule<T>>,
    pub(crate) flow: FlowProgram<T>,
    pub(crate) views: Vec<(String, ViewFn<T>)>,
}

impl<T> GameDef<T> {
    /// Name of the game type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Supported player-count range.
    #[must_use]
    pub fn players(&self) -> RangeInclusive<usize> {
        self.players.clone()
    }

    /// Declared configuration defaults.
    #[must_use]
    pub fn config_defaults(&self) -> &[(String, Value)] {
        &self.config_defaults
    }

    /// Look up an action entry by name.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&dyn ActionEntry<T>> {
        self.action_index
            .get(name)
            .map(|&index| self.actions[index].as_ref())
    }

    pub(crate) fn action_index(&self, name: &str) -> Option<usize> {
        self.action_index.get(name).copied()
    }
}

/// Builder for [`GameDef`].
///
/// ## Example
///
/// ```no_run
/// # use turnwise::flow::{GameDefBuilder, StepDef, FlowNode};
/// # use turnwise::actions::ActionDef;
/// # use turnwise::core::Value;
/// # struct Model;
/// let def = GameDefBuilder::<Model>::new("nim")
///     .players(2..=2)
///     .setup(|_| Ok(Model))
///     .action(ActionDef::<Model, i64>::new("take").options(|_| vec![1, 2, 3]))
///     .flow(vec![FlowNode::game_loop(vec![
///         StepDef::new("turn").action("take").into(),
///     ])])
///     .view("heap", |_| Value::Int(0))
///     .build();
/// ```
pub struct GameDefBuilder<T> {
    name: String,
    players: RangeInclusive<usize>,
    config_defaults: Vec<(String, Value)>,
    setup: Option<SetupFn<T>>,
    actions: Vec<Box<dyn ActionEntry<T>>>,
    rules: Vec<GameRule<T>>,
    flow: Vec<FlowNode<T>>,
    views: Vec<(String, ViewFn<T>)>,
}

impl<T> GameDefBuilder<T> {
    /// Start a definition. Defaults to 2 players.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            players: 2..=2,
            config_defaults: Vec::new(),
            setup: None,
            actions: Vec::new(),
            rules: Vec::new(),
            flow: Vec::new(),
            views: Vec::new(),
        }
    }

    /// Declare the supported player-count range.
    #[must_use]
    pub fn players(mut self, players: RangeInclusive<usize>) -> Self {
        assert!(!players.is_empty(), "player range must not be empty");
        self.players = players;
        self
    }

    /// Declare a configuration key with its default value.
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, default: Value) -> Self {
        self.config_defaults.push((key.into(), default));
        self
    }

    /// Declare the initial model factory.
    #[must_use]
    pub fn setup(
        mut self,
        f: impl Fn(&mut SetupScope<'_>) -> Result<T, GameError> + Send + Sync + 'static,
    ) -> Self {
        self.setup = Some(Box::new(f));
        self
    }

    /// Declare an action type.
    #[must_use]
    pub fn action<P: ActionParameter>(mut self, def: ActionDef<T, P>) -> Self
    where
        T: 'static,
    {
        self.actions.push(Box::new(def));
        self
    }

    /// Declare a global rule.
    #[must_use]
    pub fn rule(mut self, rule: GameRule<T>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Declare the flow program.
    #[must_use]
    pub fn flow(mut self, nodes: Vec<FlowNode<T>>) -> Self {
        self.flow = nodes;
        self
    }

    /// Declare a view projection, recomputed after every committed step.
    #[must_use]
    pub fn view(
        mut self,
        key: impl Into<String>,
        f: impl Fn(&ViewScope<'_, T>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.views.push((key.into(), Box::new(f)));
        self
    }

    /// Validate and freeze the definition.
    ///
    /// Panics on a missing setup factory, duplicate action or view names, or
    /// a flow step enabling an undeclared action type.
    #[must_use]
    pub fn build(self) -> Arc<GameDef<T>> {
        let setup = self.setup.expect("game definition declares no setup");

        let mut action_index = FxHashMap::default();
        for (index, entry) in self.actions.iter().enumerate() {
            let previous = action_index.insert(entry.name().to_string(), index);
            assert!(
                previous.is_none(),
                "duplicate action type '{}' in game '{}'",
                entry.name(),
                self.name
            );
        }

        let mut seen_views: Vec<&str> = Vec::new();
        for (key, _) in &self.views {
            assert!(
                !seen_views.contains(&key.as_str()),
                "duplicate view key '{}' in game '{}'",
                key,
                self.name
            );
            seen_views.push(key);
        }

        let flow = FlowProgram::new(self.flow);
        for name in flow.enabled_action_names() {
            assert!(
                action_index.contains_key(name),
                "flow step enables undeclared action type '{}' in game '{}'",
                name,
                self.name
            );
        }

        Arc::new(GameDef {
            name: self.name,
            players: self.players,
            config_defaults: self.config_defaults,
            setup,
            actions: self.actions,
            action_index,
            rules: self.rules,
            flow,
            views: self.views,
        })
    }
}
