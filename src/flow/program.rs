//! Declarative flow programs.
//!
//! A game's flow is data: a sequence of steps and loops the engine
//! interprets. A step optionally runs an entry effect, enables action types
//! for the current player(s), and may carry a postcondition (`until`) that
//! repeats the step until it holds. A loop repeats a body of nodes until its
//! predicate holds - or, with no predicate, until the game is over.

use crate::core::GameError;

use super::scope::{EffectScope, RuleScope};

pub(crate) type StepEffectFn<T> =
    Box<dyn Fn(&mut EffectScope<'_, T>) -> Result<(), GameError> + Send + Sync>;
pub(crate) type FlowPredFn<T> = Box<dyn Fn(&RuleScope<'_, T>) -> bool + Send + Sync>;

/// One unit of flow.
///
/// ## Example
///
/// ```no_run
/// # use turnwise::flow::StepDef;
/// # use turnwise::flow::scope::EffectScope;
/// # struct Model { dealt: bool }
/// let deal: StepDef<Model> = StepDef::new("deal")
///     .on_enter(|scope: &mut EffectScope<'_, Model>| {
///         scope.game.dealt = true;
///         Ok(())
///     });
/// let turn: StepDef<Model> = StepDef::new("turn").action("claim");
/// ```
pub struct StepDef<T> {
    pub(crate) name: String,
    pub(crate) on_enter: Option<StepEffectFn<T>>,
    pub(crate) actions: Vec<String>,
    pub(crate) until: Option<FlowPredFn<T>>,
}

impl<T> StepDef<T> {
    /// Start declaring a step.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_enter: None,
            actions: Vec::new(),
            until: None,
        }
    }

    /// Effect to run when the step is entered (also on each repeat).
    #[must_use]
    pub fn on_enter(
        mut self,
        f: impl Fn(&mut EffectScope<'_, T>) -> Result<(), GameError> + Send + Sync + 'static,
    ) -> Self {
        self.on_enter = Some(Box::new(f));
        self
    }

    /// Enable an action type while this step awaits input.
    #[must_use]
    pub fn action(mut self, action_type: impl Into<String>) -> Self {
        self.actions.push(action_type.into());
        self
    }

    /// Repeat this step until the postcondition holds.
    #[must_use]
    pub fn until(
        mut self,
        f: impl Fn(&RuleScope<'_, T>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.until = Some(Box::new(f));
        self
    }

    /// Name of the step.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A node in a flow program.
pub enum FlowNode<T> {
    /// A single step.
    Step(StepDef<T>),
    /// A repeated sequence of nodes.
    Loop {
        /// Nodes to repeat.
        body: Vec<FlowNode<T>>,
        /// Exit condition, checked after each pass. `None` repeats until the
        /// game is over.
        until: Option<FlowPredFn<T>>,
    },
}

impl<T> FlowNode<T> {
    /// A loop running until the game is over.
    #[must_use]
    pub fn game_loop(body: Vec<FlowNode<T>>) -> Self {
        FlowNode::Loop { body, until: None }
    }

    /// A loop running until a predicate holds.
    #[must_use]
    pub fn loop_until(
        body: Vec<FlowNode<T>>,
        f: impl Fn(&RuleScope<'_, T>) -> bool + Send + Sync + 'static,
    ) -> Self {
        FlowNode::Loop {
            body,
            until: Some(Box::new(f)),
        }
    }
}

impl<T> From<StepDef<T>> for FlowNode<T> {
    fn from(step: StepDef<T>) -> Self {
        FlowNode::Step(step)
    }
}

/// The complete flow of a game definition.
pub struct FlowProgram<T> {
    pub(crate) nodes: Vec<FlowNode<T>>,
}

impl<T> FlowProgram<T> {
    /// Build a program from top-level nodes.
    #[must_use]
    pub fn new(nodes: Vec<FlowNode<T>>) -> Self {
        Self { nodes }
    }

    /// Collect the action type names any step enables.
    pub(crate) fn enabled_action_names(&self) -> Vec<&str> {
        fn walk<'a, T>(nodes: &'a [FlowNode<T>], out: &mut Vec<&'a str>) {
            for node in nodes {
                match node {
                    FlowNode::Step(step) => {
                        out.extend(step.actions.iter().map(String::as_str));
                    }
                    FlowNode::Loop { body, .. } => walk(body, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }
}
