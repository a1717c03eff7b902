//! Choice tree declarations.
//!
//! An action's parameter space is declared one of three ways: a single fixed
//! value, a flat options list, or a recursive choice tree built step by
//! step. The recursive form is a variant node structure - an options
//! generator plus terminal predicates - walked by an explicit resolver
//! rather than nested closures calling closures.

use smallvec::SmallVec;

use crate::core::{PlayerId, Value};
use crate::eliminations::EliminationLedger;
use crate::flow::scope::ActionScope;

use super::action::ActionParameter;

/// Scope handed to recursive choice closures: the partial `chosen` sequence
/// so far plus read access to the model.
pub struct ChoiceScope<'a, T> {
    /// The game model.
    pub game: &'a T,
    /// Elimination ledger (read-only).
    pub eliminations: &'a EliminationLedger,
    /// The player the choice space is computed for.
    pub player: PlayerId,
    /// Choice values selected so far, root first.
    pub chosen: &'a [Value],
}

pub(crate) type OptionsFn<T, P> =
    Box<dyn Fn(&ActionScope<'_, T>) -> Vec<P> + Send + Sync>;
pub(crate) type ChoiceOptionsFn<T> =
    Box<dyn Fn(&ChoiceScope<'_, T>) -> Vec<Value> + Send + Sync>;
pub(crate) type ChoicePredFn<T> =
    Box<dyn Fn(&ChoiceScope<'_, T>) -> bool + Send + Sync>;
pub(crate) type ChoiceParamFn<T, P> =
    Box<dyn Fn(&ChoiceScope<'_, T>) -> P + Send + Sync>;

/// How an action's parameter space is produced.
pub enum ChoiceSpec<T, P: ActionParameter> {
    /// Exactly one parameter value.
    Fixed(P),
    /// A flat, finite list computed per query.
    Options(OptionsFn<T, P>),
    /// A recursive tree of intermediate choices.
    Recursive(RecursiveChoice<T, P>),
}

/// Declaration of a recursive choice tree.
///
/// Each node sees the `chosen` prefix so far. `options` generates the branch
/// values; `until` marks a node terminal (no further branches); a node whose
/// `intermediate` predicate holds declares "this partial sequence is already
/// a valid parameter" while still branching further - the variable-length
/// case. `parameter` constructs the parameter for a terminal or intermediate
/// node.
///
/// ## Example
///
/// ```no_run
/// # use turnwise::actions::RecursiveChoice;
/// # use turnwise::core::Value;
/// # struct Bids;
/// // Any non-empty sequence of digits 1-4, unbounded depth.
/// let spec: RecursiveChoice<Bids, Value> =
///     RecursiveChoice::new(|_scope| (1..=4).map(Value::Int).collect())
///         .intermediate(|scope| !scope.chosen.is_empty())
///         .parameter(|scope| Value::List(scope.chosen.to_vec()));
/// ```
pub struct RecursiveChoice<T, P: ActionParameter> {
    pub(crate) options: ChoiceOptionsFn<T>,
    pub(crate) until: ChoicePredFn<T>,
    pub(crate) intermediate: ChoicePredFn<T>,
    pub(crate) parameter: Option<ChoiceParamFn<T, P>>,
}

impl<T, P: ActionParameter> RecursiveChoice<T, P> {
    /// Declare the options generator. By default the tree never terminates
    /// (`until` is false) and no partial sequence is a parameter.
    #[must_use]
    pub fn new(options: impl Fn(&ChoiceScope<'_, T>) -> Vec<Value> + Send + Sync + 'static) -> Self {
        Self {
            options: Box::new(options),
            until: Box::new(|_| false),
            intermediate: Box::new(|_| false),
            parameter: None,
        }
    }

    /// Terminal condition: when it holds, the node yields its parameter and
    /// branches no further.
    #[must_use]
    pub fn until(mut self, f: impl Fn(&ChoiceScope<'_, T>) -> bool + Send + Sync + 'static) -> Self {
        self.until = Box::new(f);
        self
    }

    /// Declare when a partial sequence is already a valid parameter.
    #[must_use]
    pub fn intermediate(
        mut self,
        f: impl Fn(&ChoiceScope<'_, T>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.intermediate = Box::new(f);
        self
    }

    /// Construct the parameter from the chosen sequence. Mandatory for any
    /// tree that terminates or yields intermediates.
    #[must_use]
    pub fn parameter(
        mut self,
        f: impl Fn(&ChoiceScope<'_, T>) -> P + Send + Sync + 'static,
    ) -> Self {
        self.parameter = Some(Box::new(f));
        self
    }
}

/// Per-depth sample hints for enumerating infinite choice spaces.
///
/// Hint `[k0, k1, ..]` explores exactly `k_d` branches at depth `d`; the
/// final hint repeats for all deeper levels. Requesting more branches than a
/// node offers is a loud error - exactness is contractual.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleSizes {
    sizes: SmallVec<[usize; 8]>,
}

impl SampleSizes {
    /// Create sample hints from per-depth branch counts.
    ///
    /// Panics on an empty list.
    #[must_use]
    pub fn new(sizes: &[usize]) -> Self {
        assert!(!sizes.is_empty(), "sample sizes must not be empty");
        Self {
            sizes: SmallVec::from_slice(sizes),
        }
    }

    /// The branch count for the current depth, and the hints for the next.
    ///
    /// When only one hint remains it repeats for all deeper levels.
    #[must_use]
    pub fn next(&self) -> (usize, SampleSizes) {
        if self.sizes.len() == 1 {
            return (self.sizes[0], self.clone());
        }
        (
            self.sizes[0],
            SampleSizes {
                sizes: SmallVec::from_slice(&self.sizes[1..]),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_sizes_consume() {
        let hints = SampleSizes::new(&[3, 2, 0]);
        let (k0, rest) = hints.next();
        assert_eq!(k0, 3);
        let (k1, rest) = rest.next();
        assert_eq!(k1, 2);
        let (k2, rest) = rest.next();
        assert_eq!(k2, 0);
        // Last hint repeats forever.
        let (k3, _) = rest.next();
        assert_eq!(k3, 0);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn test_sample_sizes_empty_panics() {
        let _ = SampleSizes::new(&[]);
    }
}
