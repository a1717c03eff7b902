//! Choice tree resolution: expanding declared choices into concrete actions.
//!
//! The resolver is an explicit walk over the variant choice structure. It
//! supports three consumption modes:
//!
//! - [`available`]: a lazy depth-first iterator over the full space, for
//!   finite spaces and bounded peeking into infinite ones;
//! - [`sampled`]: exact per-depth sampled enumeration for infinite spaces;
//! - [`with_chosen`]: incremental navigation for wire-driven choosing, one
//!   choice at a time.
//!
//! All yielded candidates have passed `requires`; the caller checks the
//! `precondition` layer first.

use smallvec::SmallVec;

use crate::core::{GameRng, Value};
use crate::flow::scope::ActionScope;

use super::action::{ActionParameter, RequiresFn};
use super::choice::{ChoiceScope, ChoiceSpec, RecursiveChoice, SampleSizes};

/// Next options and already-valid parameters at a chosen prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChoiceInfo {
    /// Wire parameters valid at this prefix.
    pub parameters: Vec<Value>,
    /// Wire values of the next available choices.
    pub options: Vec<Value>,
}

type Chosen = SmallVec<[Value; 4]>;

/// Lazily enumerate the wire parameters of a choice space.
pub(crate) fn available<'a, T, P: ActionParameter>(
    spec: &'a ChoiceSpec<T, P>,
    requires: &'a RequiresFn<T, P>,
    scope: ActionScope<'a, T>,
) -> Box<dyn Iterator<Item = Value> + 'a> {
    match spec {
        ChoiceSpec::Fixed(parameter) => {
            if requires(&scope, parameter) {
                Box::new(std::iter::once(parameter.to_wire()))
            } else {
                Box::new(std::iter::empty())
            }
        }
        ChoiceSpec::Options(options) => {
            let candidates = options(&scope);
            Box::new(
                candidates
                    .into_iter()
                    .filter(move |p| requires(&scope, p))
                    .map(|p| p.to_wire()),
            )
        }
        ChoiceSpec::Recursive(recursive) => Box::new(RecursiveWalk {
            spec: recursive,
            requires,
            scope,
            stack: vec![Chosen::new()],
        }),
    }
}

/// Depth-first pre-order walk over a recursive choice tree.
///
/// Yields a node's parameter before descending into its branches, so the
/// first items of an infinite space arrive without materializing anything.
struct RecursiveWalk<'a, T, P: ActionParameter> {
    spec: &'a RecursiveChoice<T, P>,
    requires: &'a RequiresFn<T, P>,
    scope: ActionScope<'a, T>,
    stack: Vec<Chosen>,
}

impl<'a, T, P: ActionParameter> Iterator for RecursiveWalk<'a, T, P> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        loop {
            let chosen = self.stack.pop()?;
            let node = ChoiceScope {
                game: self.scope.game,
                eliminations: self.scope.eliminations,
                player: self.scope.player,
                chosen: &chosen[..],
            };

            let terminal = (self.spec.until)(&node);
            let mut produced = None;
            if terminal || (self.spec.intermediate)(&node) {
                let parameter = parameter_fn(self.spec)(&node);
                if (self.requires)(&self.scope, &parameter) {
                    produced = Some(parameter.to_wire());
                }
            }

            if !terminal {
                let options = (self.spec.options)(&node);
                for option in options.into_iter().rev() {
                    let mut child = chosen.clone();
                    child.push(option);
                    self.stack.push(child);
                }
            }

            if produced.is_some() {
                return produced;
            }
        }
    }
}

/// Enumerate with exact per-depth sample hints.
///
/// Hint `[k0, k1, ..]` explores exactly `k_d` branches at depth `d`. Every
/// visited node yields its intermediate or terminal parameter, so the total
/// yield is exact, not approximate. Panics when a hint requests more
/// branches than a node offers.
pub(crate) fn sampled<T, P: ActionParameter>(
    spec: &ChoiceSpec<T, P>,
    requires: &RequiresFn<T, P>,
    scope: &ActionScope<'_, T>,
    hints: &SampleSizes,
    rng: &mut GameRng,
) -> Vec<Value> {
    match spec {
        ChoiceSpec::Fixed(parameter) => {
            if requires(scope, parameter) {
                vec![parameter.to_wire()]
            } else {
                Vec::new()
            }
        }
        ChoiceSpec::Options(options) => {
            let candidates = options(scope);
            let (count, _) = hints.next();
            rng.sample_indices(candidates.len(), count)
                .into_iter()
                .filter(|&i| requires(scope, &candidates[i]))
                .map(|i| candidates[i].to_wire())
                .collect()
        }
        ChoiceSpec::Recursive(recursive) => {
            let mut out = Vec::new();
            let mut chosen = Chosen::new();
            sample_walk(recursive, requires, scope, &mut chosen, hints, rng, &mut out);
            out
        }
    }
}

fn sample_walk<T, P: ActionParameter>(
    spec: &RecursiveChoice<T, P>,
    requires: &RequiresFn<T, P>,
    scope: &ActionScope<'_, T>,
    chosen: &mut Chosen,
    hints: &SampleSizes,
    rng: &mut GameRng,
    out: &mut Vec<Value>,
) {
    let node = ChoiceScope {
        game: scope.game,
        eliminations: scope.eliminations,
        player: scope.player,
        chosen: &chosen[..],
    };

    let terminal = (spec.until)(&node);
    if terminal || (spec.intermediate)(&node) {
        let parameter = parameter_fn(spec)(&node);
        if requires(scope, &parameter) {
            out.push(parameter.to_wire());
        }
    }
    if terminal {
        return;
    }

    let (count, rest) = hints.next();
    if count == 0 {
        return;
    }
    let options = (spec.options)(&node);
    for index in rng.sample_indices(options.len(), count) {
        chosen.push(options[index].clone());
        sample_walk(spec, requires, scope, chosen, &rest, rng, out);
        chosen.pop();
    }
}

/// Navigate a choice tree along an explicit chosen prefix.
///
/// A chosen value absent from the options evaluated at its depth - or a
/// prefix continuing past a terminal node - is a malformed recursion request
/// and panics.
pub(crate) fn with_chosen<T, P: ActionParameter>(
    name: &str,
    spec: &ChoiceSpec<T, P>,
    requires: &RequiresFn<T, P>,
    scope: &ActionScope<'_, T>,
    chosen: &[Value],
) -> ChoiceInfo {
    match spec {
        ChoiceSpec::Fixed(parameter) => {
            assert!(
                chosen.is_empty(),
                "action '{}' has no choices to navigate",
                name
            );
            let parameters = if requires(scope, parameter) {
                vec![parameter.to_wire()]
            } else {
                Vec::new()
            };
            ChoiceInfo {
                parameters,
                options: Vec::new(),
            }
        }
        ChoiceSpec::Options(options) => {
            assert!(
                chosen.is_empty(),
                "action '{}' has no choices to navigate",
                name
            );
            let parameters = options(scope)
                .into_iter()
                .filter(|p| requires(scope, p))
                .map(|p| p.to_wire())
                .collect();
            ChoiceInfo {
                parameters,
                options: Vec::new(),
            }
        }
        ChoiceSpec::Recursive(recursive) => {
            for depth in 0..chosen.len() {
                let node = ChoiceScope {
                    game: scope.game,
                    eliminations: scope.eliminations,
                    player: scope.player,
                    chosen: &chosen[..depth],
                };
                assert!(
                    !(recursive.until)(&node),
                    "chosen sequence for action '{}' continues past a terminal node",
                    name
                );
                let options = (recursive.options)(&node);
                assert!(
                    options.contains(&chosen[depth]),
                    "chosen value {} at depth {} is not among the current options for action '{}'",
                    chosen[depth],
                    depth,
                    name
                );
            }

            let node = ChoiceScope {
                game: scope.game,
                eliminations: scope.eliminations,
                player: scope.player,
                chosen,
            };
            let terminal = (recursive.until)(&node);
            let mut parameters = Vec::new();
            if terminal || (recursive.intermediate)(&node) {
                let parameter = parameter_fn(recursive)(&node);
                if requires(scope, &parameter) {
                    parameters.push(parameter.to_wire());
                }
            }
            let options = if terminal {
                Vec::new()
            } else {
                (recursive.options)(&node)
            };
            ChoiceInfo {
                parameters,
                options,
            }
        }
    }
}

fn parameter_fn<T, P: ActionParameter>(
    spec: &RecursiveChoice<T, P>,
) -> &(dyn Fn(&ChoiceScope<'_, T>) -> P + Send + Sync) {
    spec.parameter
        .as_deref()
        .expect("recursive choice declares no parameter constructor")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameConfig, PlayerId};
    use crate::eliminations::EliminationLedger;

    struct Board;

    fn fixtures() -> (Board, EliminationLedger, GameConfig) {
        (Board, EliminationLedger::new(2), GameConfig::default())
    }

    fn pass_requires() -> RequiresFn<Board, Value> {
        Box::new(|_, _| true)
    }

    /// An infinite tree: every node offers digits 1-4, any non-empty prefix
    /// is a valid parameter.
    fn digits_spec() -> ChoiceSpec<Board, Value> {
        ChoiceSpec::Recursive(
            RecursiveChoice::new(|_| (1..=4).map(Value::Int).collect())
                .intermediate(|node| !node.chosen.is_empty())
                .parameter(|node| Value::List(node.chosen.to_vec())),
        )
    }

    fn scope<'a>(
        board: &'a Board,
        ledger: &'a EliminationLedger,
        config: &'a GameConfig,
    ) -> ActionScope<'a, Board> {
        ActionScope {
            game: board,
            eliminations: ledger,
            player: PlayerId::new(0),
            config,
        }
    }

    #[test]
    fn test_lazy_walk_of_infinite_space() {
        let (board, ledger, config) = fixtures();
        let spec = digits_spec();
        let requires = pass_requires();

        let first: Vec<Value> = available(&spec, &requires, scope(&board, &ledger, &config))
            .take(3)
            .collect();

        // Pre-order: [1], then its first child [1,1], then [1,1,1].
        assert_eq!(first[0], Value::list([Value::Int(1)]));
        assert_eq!(first[1], Value::list([Value::Int(1), Value::Int(1)]));
        assert_eq!(
            first[2],
            Value::list([Value::Int(1), Value::Int(1), Value::Int(1)])
        );
    }

    #[test]
    fn test_sampled_counts_are_exact() {
        let (board, ledger, config) = fixtures();
        let spec = digits_spec();
        let requires = pass_requires();
        let mut rng = GameRng::new(11);

        let actions = sampled(
            &spec,
            &requires,
            &scope(&board, &ledger, &config),
            &SampleSizes::new(&[2, 2, 2, 2, 0]),
            &mut rng,
        );

        assert_eq!(actions.len(), 30);
        for length in 1..=4 {
            let count = actions
                .iter()
                .filter(|a| a.as_list().map(|l| l.len()) == Some(length))
                .count();
            assert_eq!(count, 1 << length, "wrong count at length {}", length);
        }
    }

    #[test]
    fn test_sampled_respects_requires() {
        let (board, ledger, config) = fixtures();
        let spec = digits_spec();
        // Reject sequences starting with an even digit.
        let requires: RequiresFn<Board, Value> = Box::new(|_, p| {
            p.as_list()
                .and_then(|l| l.first())
                .and_then(Value::as_int)
                .map(|i| i % 2 == 1)
                .unwrap_or(false)
        });
        let mut rng = GameRng::new(3);

        let actions = sampled(
            &spec,
            &requires,
            &scope(&board, &ledger, &config),
            &SampleSizes::new(&[4, 0]),
            &mut rng,
        );

        // All four depth-1 branches visited, only 1 and 3 survive.
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_with_chosen_navigation() {
        let (board, ledger, config) = fixtures();
        let spec = digits_spec();
        let requires = pass_requires();

        let info = with_chosen(
            "digits",
            &spec,
            &requires,
            &scope(&board, &ledger, &config),
            &[Value::Int(2)],
        );

        assert_eq!(info.parameters, vec![Value::list([Value::Int(2)])]);
        assert_eq!(info.options.len(), 4);
    }

    #[test]
    fn test_with_chosen_root_has_no_parameter() {
        let (board, ledger, config) = fixtures();
        let spec = digits_spec();
        let requires = pass_requires();

        let info = with_chosen(
            "digits",
            &spec,
            &requires,
            &scope(&board, &ledger, &config),
            &[],
        );

        assert!(info.parameters.is_empty());
        assert_eq!(info.options.len(), 4);
    }

    #[test]
    #[should_panic(expected = "not among the current options")]
    fn test_with_chosen_invalid_choice_panics() {
        let (board, ledger, config) = fixtures();
        let spec = digits_spec();
        let requires = pass_requires();

        let _ = with_chosen(
            "digits",
            &spec,
            &requires,
            &scope(&board, &ledger, &config),
            &[Value::Int(9)],
        );
    }

    #[test]
    fn test_terminal_until_stops_expansion() {
        let (board, ledger, config) = fixtures();
        // Exactly two choices, then the sequence is complete.
        let spec: ChoiceSpec<Board, Value> = ChoiceSpec::Recursive(
            RecursiveChoice::new(|_| (1..=2).map(Value::Int).collect())
                .until(|node| node.chosen.len() == 2)
                .parameter(|node| Value::List(node.chosen.to_vec())),
        );
        let requires = pass_requires();

        let all: Vec<Value> =
            available(&spec, &requires, scope(&board, &ledger, &config)).collect();
        assert_eq!(all.len(), 4);
        assert!(all
            .iter()
            .all(|a| a.as_list().map(|l| l.len()) == Some(2)));
    }
}
