//! The game-flow state machine.
//!
//! `Game<T>` interprets a definition's flow program. It is strictly
//! single-threaded: the only suspension point is waiting for the next
//! submitted action, and each submission is processed atomically -
//! validate, apply effect, run global rule checks, run elimination checks,
//! emit events, decide the next state - before another submission is
//! accepted.
//!
//! ## Event ordering
//!
//! Events for one submission flush in fixed causal order:
//! `ActionPerformed` (carrying the step's captured randomness), then
//! `RuleExecution` events, then `Log` entries, then `Elimination` events,
//! then `AwaitInput` or `GameEnd`. The `ActionPerformed` emission is
//! deferred until the next suspension point so that randomness drawn by
//! subsequent step-entry effects folds into the same step map - replay
//! alignment is per performed action, not per flow step.
//!
//! ## Faults
//!
//! An `Err` or panic inside an effect or rule is caught here and converted
//! into a `GameException` event; the instance halts and emits no further
//! `AwaitInput`. Replay corruption instead aborts the surrounding replay
//! call with a `ReplayError`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::actions::action::Actionable;
use crate::actions::choice::SampleSizes;
use crate::actions::resolver::ChoiceInfo;
use crate::core::{GameConfig, GameError, GameRng, PlayerId, ReplayError, Value};
use crate::eliminations::EliminationLedger;
use crate::replay::state::{StateMap, StepState};
use crate::replay::ReplayScope;

use super::def::GameDef;
use super::program::FlowNode;
use super::scope::{ActionScope, EffectScope, RuleScope, SetupScope, ViewScope};
use super::step::{FlowStep, GameListener, LogEntry};

/// Where a game instance stands in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    /// Constructed, setup not yet run.
    Created,
    /// Suspended, waiting for exactly one submitted action.
    AwaitingInput,
    /// Finished; every player has an assigned result or the flow ended.
    Over,
    /// A fault occurred; the instance accepts no further input.
    Halted,
}

/// Parameters for starting one game instance.
#[derive(Clone, Debug)]
pub struct GameStartInfo {
    /// Number of players.
    pub player_count: usize,
    /// Seed for the instance's deterministic RNG.
    pub seed: u64,
    /// Configuration overrides applied over the definition's defaults.
    pub config: Vec<(String, Value)>,
}

impl GameStartInfo {
    /// Start info with no configuration overrides.
    #[must_use]
    pub fn new(player_count: usize, seed: u64) -> Self {
        Self {
            player_count,
            seed,
            config: Vec::new(),
        }
    }

    /// Override a configuration value.
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.push((key.into(), value));
        self
    }
}

type NodePath = SmallVec<[usize; 4]>;

struct Frame {
    // Indices of the enclosing Loop nodes, outermost first.
    path: NodePath,
    index: usize,
}

enum Pending {
    Setup,
    Action {
        player: PlayerId,
        action_type: String,
        parameter: Value,
    },
}

enum Protected<R> {
    Ok(R),
    Fault(String),
    Corrupt(ReplayError),
}

/// One running game instance.
pub struct Game<T> {
    def: Arc<GameDef<T>>,
    config: GameConfig,
    player_count: usize,
    model: Option<T>,
    eliminations: EliminationLedger,
    rng: GameRng,
    step_state: StepState,
    log_buffer: Vec<LogEntry>,
    listeners: Vec<Box<dyn GameListener>>,
    frames: Vec<Frame>,
    entered: bool,
    enabled: Vec<usize>,
    pending: Option<Pending>,
    event_buffer: Vec<FlowStep>,
    phase: GamePhase,
    replaying: bool,
}

impl<T> std::fmt::Debug for Game<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("game_type", &self.def.name)
            .field("player_count", &self.player_count)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<T> Game<T> {
    /// Create an instance of a definition. Setup runs on [`Game::start`].
    ///
    /// Panics when the player count is outside the definition's declared
    /// range; the registry rejects such requests with an error instead.
    #[must_use]
    pub fn new(def: Arc<GameDef<T>>, info: GameStartInfo) -> Self {
        assert!(
            def.players.contains(&info.player_count),
            "game '{}' supports {:?} players, requested {}",
            def.name,
            def.players,
            info.player_count
        );
        let config = GameConfig::resolve(&def.config_defaults, &info.config);
        Self {
            def,
            config,
            player_count: info.player_count,
            model: None,
            eliminations: EliminationLedger::new(info.player_count),
            rng: GameRng::new(info.seed),
            step_state: StepState::new(),
            log_buffer: Vec::new(),
            listeners: Vec::new(),
            frames: vec![Frame {
                path: NodePath::new(),
                index: 0,
            }],
            entered: false,
            enabled: Vec::new(),
            pending: None,
            event_buffer: Vec::new(),
            phase: GamePhase::Created,
            replaying: false,
        }
    }

    /// Attach an ordered listener. Listeners observe the full event stream
    /// in emission order, invoked one at a time.
    pub fn add_listener(&mut self, listener: Box<dyn GameListener>) {
        self.listeners.push(listener);
    }

    /// Run setup and advance to the first suspension point.
    pub fn start(&mut self) -> Result<GamePhase, ReplayError> {
        self.start_inner(None)
    }

    pub(crate) fn start_replayed(&mut self, initial: &StateMap) -> Result<GamePhase, ReplayError> {
        self.start_inner(Some(initial))
    }

    /// Process exactly one submitted action.
    ///
    /// A rejected action leaves the model untouched, emits one
    /// `IllegalAction` event and suspends again. Panics when the game is not
    /// awaiting input.
    pub fn perform(&mut self, action: &Actionable) -> Result<GamePhase, ReplayError> {
        self.perform_inner(action, None)
    }

    pub(crate) fn perform_replayed(
        &mut self,
        action: &Actionable,
        state: &StateMap,
    ) -> Result<GamePhase, ReplayError> {
        self.perform_inner(action, Some(state))
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Check whether the game has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::Over
    }

    /// Name of the game type.
    #[must_use]
    pub fn game_type(&self) -> &str {
        &self.def.name
    }

    /// Number of players in this instance.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// The game model. Panics before [`Game::start`].
    #[must_use]
    pub fn model(&self) -> &T {
        self.model.as_ref().expect("game not started")
    }

    /// The elimination ledger.
    #[must_use]
    pub fn eliminations(&self) -> &EliminationLedger {
        &self.eliminations
    }

    /// The resolved instance configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Compute a player's view: a plain nested structure of primitives,
    /// recomputed fresh on every call and deterministic for an unchanged
    /// model.
    #[must_use]
    pub fn view(&self, player: PlayerId) -> Value {
        let scope = ViewScope {
            game: self.model(),
            viewer: player,
            eliminations: &self.eliminations,
        };
        Value::Map(
            self.def
                .views
                .iter()
                .map(|(key, view)| (key.clone(), view(&scope)))
                .collect(),
        )
    }

    /// Lazily enumerate the actions a player could legally submit right now.
    ///
    /// Every yielded candidate has passed `precondition` and `requires`.
    /// Empty unless the game is awaiting input. The sequence is finite
    /// unless an enabled action declares an infinite choice space - bound
    /// consumption there, or use [`Game::sampled_actions`].
    pub fn available_actions_iter(
        &self,
        player: PlayerId,
    ) -> Box<dyn Iterator<Item = Actionable> + '_> {
        if self.phase != GamePhase::AwaitingInput || self.eliminations.is_eliminated(player) {
            return Box::new(std::iter::empty());
        }
        let scope = self.action_scope(player);
        Box::new(self.enabled.iter().flat_map(move |&index| {
            let entry = self.def.actions[index].as_ref();
            entry
                .available(scope)
                .map(move |wire| Actionable::new(player, entry.name(), wire))
        }))
    }

    /// All actions a player could legally submit right now, materialized.
    ///
    /// See [`Game::available_actions_iter`]; only safe on finite spaces.
    #[must_use]
    pub fn available_actions(&self, player: PlayerId) -> Vec<Actionable> {
        self.available_actions_iter(player).collect()
    }

    /// Like [`Game::available_actions`] with exact per-depth sample hints,
    /// for infinite action spaces. The caller supplies the RNG so sampling
    /// does not disturb the instance's own stream.
    #[must_use]
    pub fn sampled_actions(
        &self,
        player: PlayerId,
        hints: &SampleSizes,
        rng: &mut GameRng,
    ) -> Vec<Actionable> {
        if self.phase != GamePhase::AwaitingInput || self.eliminations.is_eliminated(player) {
            return Vec::new();
        }
        let scope = self.action_scope(player);
        let mut actions = Vec::new();
        for &index in &self.enabled {
            let entry = self.def.actions[index].as_ref();
            for wire in entry.sampled(&scope, hints, rng) {
                actions.push(Actionable::new(player, entry.name(), wire));
            }
        }
        actions
    }

    /// Incremental choice navigation for a currently enabled action type.
    ///
    /// Panics on an unknown action type or a chosen value absent from the
    /// current options - both are programmer errors.
    #[must_use]
    pub fn with_chosen(&self, player: PlayerId, action_type: &str, chosen: &[Value]) -> ChoiceInfo {
        let entry = self
            .def
            .action(action_type)
            .unwrap_or_else(|| panic!("unknown action type '{}'", action_type));
        let scope = self.action_scope(player);
        entry.with_chosen(&scope, chosen)
    }

    // === Internals ===

    fn start_inner(&mut self, replay_state: Option<&StateMap>) -> Result<GamePhase, ReplayError> {
        assert!(
            self.phase == GamePhase::Created,
            "game already started"
        );
        self.replaying = replay_state.is_some();
        match replay_state {
            Some(state) => self.step_state.set_replay(state.clone()),
            None => self.step_state.clear(),
        }

        let def = Arc::clone(&self.def);
        let outcome = {
            let mut scope = SetupScope {
                player_count: self.player_count,
                config: &self.config,
                replay: ReplayScope::new(&mut self.step_state, &mut self.rng),
            };
            run_protected(|| (def.setup)(&mut scope))
        };
        match self.settle(outcome)? {
            Some(model) => self.model = Some(model),
            None => return Ok(GamePhase::Halted),
        }
        self.pending = Some(Pending::Setup);
        log::debug!(
            "game '{}' set up with {} players",
            self.def.name,
            self.player_count
        );
        self.advance()
    }

    fn perform_inner(
        &mut self,
        action: &Actionable,
        replay_state: Option<&StateMap>,
    ) -> Result<GamePhase, ReplayError> {
        assert!(
            self.phase == GamePhase::AwaitingInput,
            "game is not awaiting input"
        );

        if let Err(reason) = self.validate_submission(action) {
            log::debug!(
                "game '{}': rejected '{}' by {}: {}",
                self.def.name,
                action.action_type,
                action.player,
                reason
            );
            if replay_state.is_some() {
                return Err(ReplayError::IllegalAction {
                    action_type: action.action_type.clone(),
                    player: action.player,
                    reason,
                });
            }
            self.emit(FlowStep::IllegalAction {
                player: action.player,
                action_type: action.action_type.clone(),
                parameter: action.parameter.clone(),
                reason,
            });
            self.emit(FlowStep::AwaitInput);
            return Ok(GamePhase::AwaitingInput);
        }
        let index = self
            .def
            .action_index(&action.action_type)
            .expect("validated action type exists");

        // A new discrete step begins with this action.
        self.replaying = replay_state.is_some();
        match replay_state {
            Some(state) => self.step_state.set_replay(state.clone()),
            None => self.step_state.clear(),
        }

        let def = Arc::clone(&self.def);
        let outcome = {
            let entry = def.actions[index].as_ref();
            let mut scope = self.effect_scope(Some(action.player));
            run_protected(|| entry.perform(&mut scope, &action.parameter))
        };
        if self.settle(outcome)?.is_none() {
            return Ok(GamePhase::Halted);
        }
        self.pending = Some(Pending::Action {
            player: action.player,
            action_type: action.action_type.clone(),
            parameter: action.parameter.clone(),
        });

        if !self.run_rule_cycle()? {
            return Ok(GamePhase::Halted);
        }
        self.drain_events();

        let repeat = {
            let step = self.current_step(&def);
            match &step.until {
                Some(until) => !until(&self.rule_scope()),
                None => false,
            }
        };
        if repeat {
            // loop-until on the step: re-enter it, entry effect included.
            self.entered = false;
        } else {
            self.advance_past_step();
        }
        self.advance()
    }

    fn validate_submission(&self, action: &Actionable) -> Result<usize, String> {
        let index = self
            .def
            .action_index(&action.action_type)
            .ok_or_else(|| format!("unknown action type '{}'", action.action_type))?;
        if action.player.index() >= self.player_count {
            return Err(format!(
                "player index {} out of range",
                action.player.index()
            ));
        }
        if self.eliminations.is_eliminated(action.player) {
            return Err(format!("{} is eliminated", action.player));
        }
        if !self.enabled.contains(&index) {
            return Err(format!(
                "action '{}' is not enabled in this step",
                action.action_type
            ));
        }
        let scope = self.action_scope(action.player);
        self.def.actions[index].validate(&scope, &action.parameter)?;
        Ok(index)
    }

    /// Interpret flow nodes until the next suspension point.
    fn advance(&mut self) -> Result<GamePhase, ReplayError> {
        loop {
            if self.phase == GamePhase::Halted {
                return Ok(GamePhase::Halted);
            }
            if self.eliminations.is_game_over() {
                return Ok(self.finish());
            }
            let Some((path, index)) = self.current_position() else {
                return Ok(self.finish());
            };

            let def = Arc::clone(&self.def);
            let nodes = nodes_at(&def, &path);

            if index >= nodes.len() {
                if path.is_empty() {
                    return Ok(self.finish());
                }
                self.close_loop_pass(&def, &path);
                continue;
            }

            match &nodes[index] {
                FlowNode::Loop { .. } => {
                    let mut inner = path.clone();
                    inner.push(index);
                    self.frames.push(Frame {
                        path: inner,
                        index: 0,
                    });
                    continue;
                }
                FlowNode::Step(step) => {
                    if !self.entered {
                        if let Some(on_enter) = &step.on_enter {
                            let outcome = {
                                let mut scope = self.effect_scope(None);
                                run_protected(|| on_enter(&mut scope))
                            };
                            if self.settle(outcome)?.is_none() {
                                return Ok(GamePhase::Halted);
                            }
                        }
                        self.entered = true;
                        // Re-check game over before enabling input.
                        continue;
                    }

                    self.enabled = step
                        .actions
                        .iter()
                        .map(|name| def.action_index(name).expect("validated at build"))
                        .collect();
                    if !self.enabled.is_empty() && self.any_available() {
                        // Entry effects belong to the submission being
                        // flushed, like their randomness.
                        self.drain_events();
                        self.flush_pending();
                        self.emit(FlowStep::AwaitInput);
                        self.phase = GamePhase::AwaitingInput;
                        return Ok(GamePhase::AwaitingInput);
                    }

                    // Rule-only step: run the cycle and move on without
                    // consuming a replay step.
                    if !self.run_rule_cycle()? {
                        return Ok(GamePhase::Halted);
                    }
                    self.drain_events();
                    self.advance_past_step();
                    continue;
                }
            }
        }
    }

    fn current_position(&self) -> Option<(NodePath, usize)> {
        self.frames
            .last()
            .map(|frame| (frame.path.clone(), frame.index))
    }

    fn close_loop_pass(&mut self, def: &GameDef<T>, path: &[usize]) {
        let parent = nodes_at(def, &path[..path.len() - 1]);
        let exit = match &parent[*path.last().expect("loop path is non-empty")] {
            FlowNode::Loop {
                until: Some(until), ..
            } => until(&self.rule_scope()),
            // Bare loops run until the game is over.
            FlowNode::Loop { until: None, .. } => false,
            FlowNode::Step(_) => unreachable!("loop path addresses a step"),
        };
        if exit {
            self.frames.pop();
            if let Some(outer) = self.frames.last_mut() {
                outer.index += 1;
            }
        } else if let Some(frame) = self.frames.last_mut() {
            frame.index = 0;
        }
    }

    fn current_step<'a>(&self, def: &'a GameDef<T>) -> &'a super::program::StepDef<T> {
        let frame = self.frames.last().expect("a step is active");
        match &nodes_at(def, &frame.path)[frame.index] {
            FlowNode::Step(step) => step,
            FlowNode::Loop { .. } => panic!("current node is not a step"),
        }
    }

    fn any_available(&self) -> bool {
        for player in self.eliminations.remaining_players() {
            let scope = self.action_scope(player);
            for &index in &self.enabled {
                let entry = self.def.actions[index].as_ref();
                if entry.available(scope).next().is_some() {
                    return true;
                }
            }
        }
        false
    }

    fn run_rule_cycle(&mut self) -> Result<bool, ReplayError> {
        let def = Arc::clone(&self.def);
        self.rule_walk(&def.rules)
    }

    fn rule_walk(&mut self, rules: &[crate::rules::GameRule<T>]) -> Result<bool, ReplayError> {
        for rule in rules {
            if !(rule.applies_when)(&self.rule_scope()) {
                continue;
            }
            let outcome = {
                let mut scope = self.effect_scope(None);
                run_protected(|| (rule.effect)(&mut scope))
            };
            if self.settle(outcome)?.is_none() {
                return Ok(false);
            }
            self.event_buffer.push(FlowStep::RuleExecution {
                rule: rule.name.clone(),
            });
            if !self.rule_walk(&rule.children)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn drain_events(&mut self) {
        for entry in std::mem::take(&mut self.log_buffer) {
            self.event_buffer.push(FlowStep::Log(entry));
        }
        for elimination in self.eliminations.drain_new() {
            self.event_buffer.push(FlowStep::Elimination(elimination));
        }
    }

    fn advance_past_step(&mut self) {
        self.entered = false;
        self.enabled.clear();
        if let Some(frame) = self.frames.last_mut() {
            frame.index += 1;
        }
    }

    fn finish(&mut self) -> GamePhase {
        if self.phase == GamePhase::Over {
            return GamePhase::Over;
        }
        self.drain_events();
        self.flush_pending();
        self.emit(FlowStep::GameEnd);
        self.phase = GamePhase::Over;
        log::debug!("game '{}' over", self.def.name);
        GamePhase::Over
    }

    /// Emit the deferred `Setup`/`ActionPerformed` event - carrying the
    /// step's final captured state - followed by the buffered rule,
    /// elimination and log events.
    fn flush_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            let state = self.step_state.captured();
            let step = match pending {
                Pending::Setup => FlowStep::Setup { state },
                Pending::Action {
                    player,
                    action_type,
                    parameter,
                } => FlowStep::ActionPerformed {
                    player,
                    action_type,
                    parameter,
                    state,
                },
            };
            self.emit(step);
        }
        for step in std::mem::take(&mut self.event_buffer) {
            self.emit(step);
        }
    }

    fn settle<R>(&mut self, outcome: Protected<R>) -> Result<Option<R>, ReplayError> {
        match outcome {
            Protected::Ok(value) => Ok(Some(value)),
            Protected::Corrupt(error) if self.replaying => {
                self.phase = GamePhase::Halted;
                Err(error)
            }
            Protected::Corrupt(error) => {
                self.halt(error.to_string());
                Ok(None)
            }
            Protected::Fault(message) => {
                self.halt(message);
                Ok(None)
            }
        }
    }

    /// Terminal failure: nothing from the in-flight submission is
    /// observable, only the exception itself.
    fn halt(&mut self, message: String) {
        log::warn!("game '{}' halted: {}", self.def.name, message);
        self.pending = None;
        self.event_buffer.clear();
        self.emit(FlowStep::GameException { message });
        self.phase = GamePhase::Halted;
    }

    fn emit(&mut self, step: FlowStep) {
        log::debug!("game '{}' emits {}", self.def.name, step.kind());
        for listener in &mut self.listeners {
            listener.on_step(&step);
        }
    }

    fn action_scope(&self, player: PlayerId) -> ActionScope<'_, T> {
        ActionScope {
            game: self.model.as_ref().expect("game not started"),
            eliminations: &self.eliminations,
            player,
            config: &self.config,
        }
    }

    fn rule_scope(&self) -> RuleScope<'_, T> {
        RuleScope {
            game: self.model.as_ref().expect("game not started"),
            eliminations: &self.eliminations,
            config: &self.config,
        }
    }

    fn effect_scope(&mut self, player: Option<PlayerId>) -> EffectScope<'_, T> {
        EffectScope {
            game: self.model.as_mut().expect("game not started"),
            eliminations: &mut self.eliminations,
            replay: ReplayScope::new(&mut self.step_state, &mut self.rng),
            player,
            config: &self.config,
            logs: &mut self.log_buffer,
        }
    }
}

fn nodes_at<'a, T>(def: &'a GameDef<T>, path: &[usize]) -> &'a [FlowNode<T>] {
    let mut nodes = &def.flow.nodes[..];
    for &index in path {
        match &nodes[index] {
            FlowNode::Loop { body, .. } => nodes = body,
            FlowNode::Step(_) => panic!("flow path does not address a loop"),
        }
    }
    nodes
}

fn run_protected<R>(f: impl FnOnce() -> Result<R, GameError>) -> Protected<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Protected::Ok(value),
        Ok(Err(GameError::Replay(error))) => Protected::Corrupt(error),
        Ok(Err(GameError::Fault(message))) => Protected::Fault(message),
        Err(payload) => Protected::Fault(panic_message(&payload)),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "effect panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::action::ActionDef;
    use crate::flow::def::GameDefBuilder;
    use crate::flow::program::StepDef;
    use crate::flow::step::StepLog;

    /// Single-heap nim: take 1-3, whoever empties the heap wins.
    struct Nim {
        heap: i64,
        current: PlayerId,
    }

    fn nim_def() -> Arc<GameDef<Nim>> {
        GameDefBuilder::<Nim>::new("nim")
            .players(2..=2)
            .config("heap", Value::Int(7))
            .setup(|scope| {
                Ok(Nim {
                    heap: scope.config.int("heap"),
                    current: PlayerId::new(0),
                })
            })
            .action(
                ActionDef::<Nim, i64>::new("take")
                    .precondition(|scope| scope.game.current == scope.player)
                    .options(|scope| (1..=scope.game.heap.min(3)).collect())
                    .requires(|scope, amount| *amount <= scope.game.heap)
                    .effect(|scope, amount| {
                        let player = scope.acting_player();
                        scope.game.heap -= *amount;
                        if scope.game.heap == 0 {
                            scope.eliminations.single_winner(player);
                        } else {
                            scope.game.current = scope
                                .eliminations
                                .next_player(player)
                                .expect("someone remains");
                        }
                        Ok(())
                    }),
            )
            .flow(vec![FlowNode::game_loop(vec![StepDef::new("turn")
                .action("take")
                .into()])])
            .view("heap", |scope| Value::Int(scope.game.heap))
            .view("current", |scope| {
                Value::Int(scope.game.current.index() as i64)
            })
            .build()
    }

    fn take(player: u8, amount: i64) -> Actionable {
        Actionable::new(PlayerId::new(player), "take", Value::Int(amount))
    }

    #[test]
    fn test_start_awaits_input() {
        let mut game = Game::new(nim_def(), GameStartInfo::new(2, 1));
        let phase = game.start().unwrap();
        assert_eq!(phase, GamePhase::AwaitingInput);
        assert_eq!(game.model().heap, 7);
    }

    #[test]
    fn test_available_actions_pass_both_layers() {
        let mut game = Game::new(nim_def(), GameStartInfo::new(2, 1));
        game.start().unwrap();

        let actions = game.available_actions(PlayerId::new(0));
        assert_eq!(actions.len(), 3);
        // Not player 1's turn: precondition filters everything.
        assert!(game.available_actions(PlayerId::new(1)).is_empty());
    }

    #[test]
    fn test_full_game_and_event_order() {
        let mut game = Game::new(nim_def(), GameStartInfo::new(2, 1));
        let (log, steps) = StepLog::new();
        game.add_listener(Box::new(log));
        game.start().unwrap();

        game.perform(&take(0, 3)).unwrap();
        game.perform(&take(1, 3)).unwrap();
        let phase = game.perform(&take(0, 1)).unwrap();
        assert_eq!(phase, GamePhase::Over);
        assert!(game.is_over());

        let kinds: Vec<&str> = steps.lock().unwrap().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "setup",
                "await-input",
                "action-performed",
                "await-input",
                "action-performed",
                "await-input",
                "action-performed",
                "elimination",
                "elimination",
                "game-end",
            ]
        );
    }

    #[test]
    fn test_illegal_action_leaves_model_unchanged() {
        let mut game = Game::new(nim_def(), GameStartInfo::new(2, 1));
        let (log, steps) = StepLog::new();
        game.add_listener(Box::new(log));
        game.start().unwrap();

        // Not player 1's turn.
        let phase = game.perform(&take(1, 2)).unwrap();
        assert_eq!(phase, GamePhase::AwaitingInput);
        assert_eq!(game.model().heap, 7);

        let steps = steps.lock().unwrap();
        let illegal: Vec<_> = steps
            .iter()
            .filter(|s| matches!(s, FlowStep::IllegalAction { .. }))
            .collect();
        assert_eq!(illegal.len(), 1);
    }

    #[test]
    fn test_unknown_action_type_is_illegal() {
        let mut game = Game::new(nim_def(), GameStartInfo::new(2, 1));
        game.start().unwrap();

        let bogus = Actionable::new(PlayerId::new(0), "bogus", Value::Null);
        let phase = game.perform(&bogus).unwrap();
        assert_eq!(phase, GamePhase::AwaitingInput);
    }

    #[test]
    fn test_effect_fault_halts_instance() {
        let def = GameDefBuilder::<Nim>::new("faulty")
            .players(2..=2)
            .setup(|_| {
                Ok(Nim {
                    heap: 1,
                    current: PlayerId::new(0),
                })
            })
            .action(
                ActionDef::<Nim, ()>::new("boom")
                    .fixed(())
                    .effect(|_, _| Err(GameError::fault("deliberate"))),
            )
            .flow(vec![FlowNode::game_loop(vec![StepDef::new("turn")
                .action("boom")
                .into()])])
            .build();

        let mut game = Game::new(def, GameStartInfo::new(2, 1));
        let (log, steps) = StepLog::new();
        game.add_listener(Box::new(log));
        game.start().unwrap();

        let boom = Actionable::new(PlayerId::new(0), "boom", Value::Null);
        let phase = game.perform(&boom).unwrap();
        assert_eq!(phase, GamePhase::Halted);

        let kinds: Vec<String> = steps
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.kind().to_string())
            .collect();
        // The faulted submission contributes only the exception.
        assert_eq!(kinds.last().unwrap(), "game-exception");
        assert!(!kinds.iter().any(|k| k == "action-performed"));
    }

    #[test]
    fn test_effect_panic_becomes_exception() {
        let def = GameDefBuilder::<Nim>::new("panicky")
            .players(2..=2)
            .setup(|_| {
                Ok(Nim {
                    heap: 1,
                    current: PlayerId::new(0),
                })
            })
            .action(
                ActionDef::<Nim, ()>::new("boom")
                    .fixed(())
                    .effect(|_, _| panic!("unexpected")),
            )
            .flow(vec![FlowNode::game_loop(vec![StepDef::new("turn")
                .action("boom")
                .into()])])
            .build();

        let mut game = Game::new(def, GameStartInfo::new(2, 1));
        game.start().unwrap();
        let boom = Actionable::new(PlayerId::new(0), "boom", Value::Null);
        let phase = game.perform(&boom).unwrap();
        assert_eq!(phase, GamePhase::Halted);
    }

    #[test]
    fn test_step_until_repeats_step() {
        // One step, repeated until the heap is gone; player 0 acts alone.
        let def = GameDefBuilder::<Nim>::new("until")
            .players(2..=2)
            .setup(|_| {
                Ok(Nim {
                    heap: 2,
                    current: PlayerId::new(0),
                })
            })
            .action(
                ActionDef::<Nim, i64>::new("take")
                    .precondition(|scope| scope.player == scope.game.current)
                    .options(|_| vec![1])
                    .effect(|scope, _| {
                        scope.game.heap -= 1;
                        Ok(())
                    }),
            )
            .rule(
                crate::rules::GameRule::new("drained")
                    .applies_when(|scope: &RuleScope<'_, Nim>| scope.game.heap == 0)
                    .effect(|scope| {
                        scope.eliminations.single_winner(PlayerId::new(0));
                        Ok(())
                    }),
            )
            .flow(vec![StepDef::new("drain")
                .action("take")
                .until(|scope: &RuleScope<'_, Nim>| scope.game.heap == 0)
                .into()])
            .build();

        let mut game = Game::new(def, GameStartInfo::new(2, 1));
        game.start().unwrap();
        game.perform(&take(0, 1)).unwrap();
        let phase = game.perform(&take(0, 1)).unwrap();
        assert_eq!(phase, GamePhase::Over);
    }

    #[test]
    #[should_panic(expected = "not awaiting input")]
    fn test_perform_before_start_panics() {
        let mut game = Game::new(nim_def(), GameStartInfo::new(2, 1));
        let _ = game.perform(&take(0, 1));
    }

    #[test]
    #[should_panic(expected = "supports")]
    fn test_player_count_out_of_range_panics() {
        let _ = Game::new(nim_def(), GameStartInfo::new(5, 1));
    }
}
