//! Process-wide game-type registry.
//!
//! An explicit registry object maps game type names to instance factories.
//! Components that need to resolve a game type by name receive the registry
//! by reference - there is no global lookup.
//!
//! Factories produce type-erased [`RunningGame`] instances so the registry,
//! the runner and transport code can drive any game without knowing its
//! model type.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::actions::action::Actionable;
use crate::core::{PlayerId, RegistryError, ReplayError, Value};
use crate::eliminations::EliminationLedger;
use crate::flow::def::GameDef;
use crate::flow::engine::{Game, GamePhase, GameStartInfo};
use crate::flow::step::GameListener;

/// Object-safe view of a running game instance.
///
/// `Game<T>` implements this; the registry and runner work exclusively
/// through it.
pub trait RunningGame: Send {
    /// Name of the game type.
    fn game_type(&self) -> &str;

    /// Number of players in this instance.
    fn player_count(&self) -> usize;

    /// Current lifecycle phase.
    fn phase(&self) -> GamePhase;

    /// Run setup and advance to the first suspension point.
    fn start(&mut self) -> Result<GamePhase, ReplayError>;

    /// Process exactly one submitted action.
    fn perform(&mut self, action: &Actionable) -> Result<GamePhase, ReplayError>;

    /// Compute a player's view.
    fn view(&self, player: PlayerId) -> Value;

    /// The elimination ledger.
    fn eliminations(&self) -> &EliminationLedger;

    /// Check whether the game has ended.
    fn is_over(&self) -> bool;

    /// Attach an ordered listener.
    fn add_listener(&mut self, listener: Box<dyn GameListener>);
}

impl<T: Send + 'static> RunningGame for Game<T> {
    fn game_type(&self) -> &str {
        Game::game_type(self)
    }

    fn player_count(&self) -> usize {
        Game::player_count(self)
    }

    fn phase(&self) -> GamePhase {
        Game::phase(self)
    }

    fn start(&mut self) -> Result<GamePhase, ReplayError> {
        Game::start(self)
    }

    fn perform(&mut self, action: &Actionable) -> Result<GamePhase, ReplayError> {
        Game::perform(self, action)
    }

    fn view(&self, player: PlayerId) -> Value {
        Game::view(self, player)
    }

    fn eliminations(&self) -> &EliminationLedger {
        Game::eliminations(self)
    }

    fn is_over(&self) -> bool {
        Game::is_over(self)
    }

    fn add_listener(&mut self, listener: Box<dyn GameListener>) {
        Game::add_listener(self, listener)
    }
}

type GameFactory =
    Box<dyn Fn(GameStartInfo) -> Result<Box<dyn RunningGame>, RegistryError> + Send + Sync>;

/// Registry of game definitions, keyed by name.
///
/// ## Example
///
/// ```no_run
/// # use turnwise::registry::GameRegistry;
/// # use turnwise::flow::GameStartInfo;
/// # fn demo(registry: &GameRegistry) -> Result<(), turnwise::core::RegistryError> {
/// let mut game = registry.create("gridfill", GameStartInfo::new(2, 42))?;
/// game.start().unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct GameRegistry {
    factories: FxHashMap<String, GameFactory>,
}

impl GameRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a game definition.
    ///
    /// Panics if a definition with the same name already exists.
    pub fn register<T: Send + 'static>(&mut self, def: Arc<GameDef<T>>) {
        let name = def.name().to_string();
        let factory: GameFactory = Box::new(move |info: GameStartInfo| {
            let players = def.players();
            if !players.contains(&info.player_count) {
                return Err(RegistryError::PlayerCount {
                    game: def.name().to_string(),
                    requested: info.player_count,
                    min: *players.start(),
                    max: *players.end(),
                });
            }
            Ok(Box::new(Game::new(Arc::clone(&def), info)) as Box<dyn RunningGame>)
        });

        let previous = self.factories.insert(name.clone(), factory);
        assert!(
            previous.is_none(),
            "game type '{}' already registered",
            name
        );
        log::info!("registered game type '{}'", name);
    }

    /// Instantiate a registered game type.
    pub fn create(
        &self,
        name: &str,
        info: GameStartInfo,
    ) -> Result<Box<dyn RunningGame>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownGameType(name.to_string()))?;
        factory(info)
    }

    /// Names of all registered game types, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check whether a game type is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::action::ActionDef;
    use crate::flow::def::GameDefBuilder;
    use crate::flow::program::{FlowNode, StepDef};

    struct Trivial;

    fn trivial_def(name: &str) -> Arc<GameDef<Trivial>> {
        GameDefBuilder::<Trivial>::new(name)
            .players(2..=4)
            .setup(|_| Ok(Trivial))
            .action(ActionDef::<Trivial, ()>::new("pass").fixed(()).effect(
                |scope, _| {
                    let player = scope.acting_player();
                    scope.eliminations.single_winner(player);
                    Ok(())
                },
            ))
            .flow(vec![FlowNode::game_loop(vec![StepDef::new("turn")
                .action("pass")
                .into()])])
            .build()
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = GameRegistry::new();
        registry.register(trivial_def("trivial"));

        assert!(registry.contains("trivial"));
        assert_eq!(registry.names(), vec!["trivial"]);

        let mut game = registry
            .create("trivial", GameStartInfo::new(3, 7))
            .unwrap();
        assert_eq!(game.player_count(), 3);
        assert_eq!(game.start().unwrap(), GamePhase::AwaitingInput);
    }

    #[test]
    fn test_unknown_game_type() {
        let registry = GameRegistry::new();
        let err = registry
            .create("nope", GameStartInfo::new(2, 0))
            .err()
            .unwrap();
        assert_eq!(err, RegistryError::UnknownGameType("nope".to_string()));
    }

    #[test]
    fn test_player_count_out_of_range() {
        let mut registry = GameRegistry::new();
        registry.register(trivial_def("trivial"));

        let err = registry
            .create("trivial", GameStartInfo::new(9, 0))
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::PlayerCount { requested: 9, .. }));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_registration_panics() {
        let mut registry = GameRegistry::new();
        registry.register(trivial_def("trivial"));
        registry.register(trivial_def("trivial"));
    }
}
