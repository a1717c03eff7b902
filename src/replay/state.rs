//! Keyed capture and replay of nondeterministic draws.
//!
//! Domain logic requests random values through [`ReplayScope`], keyed by a
//! string unique within the current step. While recording, the facade runs
//! the caller-supplied generator, stores the produced value under the key and
//! returns it. While replaying, it returns the stored value **without**
//! running the generator - generators may be arbitrarily expensive or
//! non-reproducible and must never execute during replay.
//!
//! ## Ordering discipline
//!
//! Within one step, keys must be requested in the same order during recording
//! and replay. A missing key, an out-of-order request, or a type-mismatched
//! stored value is a [`ReplayError`]: the replay attempt fails immediately
//! and loudly rather than silently diverging into a different game state.
//!
//! State is partitioned per discrete step - setup gets its own map, each
//! performed action gets its own map - so rule-only steps between actions do
//! not shift alignment.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{GameRng, ReplayError, Value};

/// One step's captured randomness: an ordered key-value map.
///
/// Preserves request order so replay can detect out-of-order lookups.
/// Serializes as a plain map and round-trips bit-exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateMap {
    entries: Vec<(String, Value)>,
}

impl StateMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for emptiness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// The entry at a request-order index.
    #[must_use]
    pub fn entry_at(&self, index: usize) -> Option<(&str, &Value)> {
        self.entries.get(index).map(|(k, v)| (k.as_str(), v))
    }

    /// Append an entry. The caller guarantees key uniqueness.
    pub fn push(&mut self, key: String, value: Value) {
        self.entries.push((key, value));
    }

    /// Iterate entries in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for StateMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for StateMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StateMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StateMapVisitor;

        impl<'de> Visitor<'de> for StateMapVisitor {
            type Value = StateMap;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of replay state values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<StateMap, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(StateMap { entries })
            }
        }

        deserializer.deserialize_map(StateMapVisitor)
    }
}

/// The current step's randomness state, in recording or replay mode.
#[derive(Clone, Debug, Default)]
pub struct StepState {
    current: StateMap,
    replay_mode: bool,
    // Next expected entry index while replaying.
    cursor: usize,
}

impl StepState {
    /// Create an empty recording-mode state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh recording step.
    pub fn clear(&mut self) {
        self.current = StateMap::new();
        self.replay_mode = false;
        self.cursor = 0;
    }

    /// Begin a replay step with the recorded map for this step.
    pub fn set_replay(&mut self, state: StateMap) {
        self.current = state;
        self.replay_mode = true;
        self.cursor = 0;
    }

    /// Check whether this step replays recorded values.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        self.replay_mode
    }

    /// Snapshot of the state captured for the step so far.
    #[must_use]
    pub fn captured(&self) -> StateMap {
        self.current.clone()
    }

    /// Replay-mode lookup enforcing the ordering discipline.
    fn lookup(&mut self, key: &str) -> Result<&Value, ReplayError> {
        let expected = match self.current.entry_at(self.cursor) {
            Some((k, _)) => k.to_string(),
            None => {
                return Err(ReplayError::MissingKey {
                    key: key.to_string(),
                })
            }
        };
        if expected != key {
            return Err(ReplayError::OutOfOrder {
                expected,
                requested: key.to_string(),
            });
        }
        let index = self.cursor;
        self.cursor += 1;
        Ok(self.current.entry_at(index).expect("entry exists").1)
    }

    /// Recording-mode store. Re-saving a key within one step is a
    /// programmer error.
    fn record(&mut self, key: &str, value: Value) {
        assert!(
            self.current.get(key).is_none(),
            "state was already saved once for key '{}', use a different key",
            key
        );
        self.current.push(key.to_string(), value);
    }
}

/// Facade through which rule effects request nondeterministic values.
///
/// ## Example
///
/// ```no_run
/// # fn demo(replay: &mut turnwise::replay::ReplayScope<'_>) -> Result<(), turnwise::core::ReplayError> {
/// let roll = replay.int("roll", |rng| rng.gen_range(1..7))?;
/// # Ok(())
/// # }
/// ```
pub struct ReplayScope<'a> {
    state: &'a mut StepState,
    rng: &'a mut GameRng,
}

impl<'a> ReplayScope<'a> {
    /// Create a scope over the current step state and the instance RNG.
    pub fn new(state: &'a mut StepState, rng: &'a mut GameRng) -> Self {
        Self { state, rng }
    }

    /// A single integer.
    pub fn int(
        &mut self,
        key: &str,
        default: impl FnOnce(&mut GameRng) -> i64,
    ) -> Result<i64, ReplayError> {
        if self.state.is_replay() {
            let value = self.state.lookup(key)?;
            return value.as_int().ok_or(ReplayError::TypeMismatch {
                key: key.to_string(),
                expected: "an integer",
            });
        }
        let value = default(self.rng);
        self.state.record(key, Value::Int(value));
        Ok(value)
    }

    /// A list of integers.
    pub fn ints(
        &mut self,
        key: &str,
        default: impl FnOnce(&mut GameRng) -> Vec<i64>,
    ) -> Result<Vec<i64>, ReplayError> {
        if self.state.is_replay() {
            let value = self.state.lookup(key)?;
            return decode_list(key, value, "a list of integers", Value::as_int);
        }
        let values = default(self.rng);
        self.state
            .record(key, values.iter().copied().map(Value::Int).collect());
        Ok(values)
    }

    /// A single string.
    pub fn string(
        &mut self,
        key: &str,
        default: impl FnOnce(&mut GameRng) -> String,
    ) -> Result<String, ReplayError> {
        if self.state.is_replay() {
            let value = self.state.lookup(key)?;
            return value
                .as_str()
                .map(str::to_string)
                .ok_or(ReplayError::TypeMismatch {
                    key: key.to_string(),
                    expected: "a string",
                });
        }
        let value = default(self.rng);
        self.state.record(key, Value::Str(value.clone()));
        Ok(value)
    }

    /// A list of strings.
    pub fn strings(
        &mut self,
        key: &str,
        default: impl FnOnce(&mut GameRng) -> Vec<String>,
    ) -> Result<Vec<String>, ReplayError> {
        if self.state.is_replay() {
            let value = self.state.lookup(key)?;
            return decode_list(key, value, "a list of strings", |v| {
                v.as_str().map(str::to_string)
            });
        }
        let values = default(self.rng);
        self.state
            .record(key, values.iter().cloned().map(Value::Str).collect());
        Ok(values)
    }

    /// Pick `count` items at random from a list, keyed by a string identity
    /// per item.
    ///
    /// Only the identities are stored, which makes deterministic dealing and
    /// reordering of non-trivially-comparable domain objects (cards, tiles)
    /// replayable. Items sharing an identity are interchangeable; each stored
    /// identity consumes one matching item.
    pub fn pick<E: Clone>(
        &mut self,
        key: &str,
        items: &[E],
        count: usize,
        identity: impl Fn(&E) -> String,
    ) -> Result<Vec<E>, ReplayError> {
        let ids = self.strings(key, |rng| {
            rng.sample_indices(items.len(), count.min(items.len()))
                .into_iter()
                .map(|i| identity(&items[i]))
                .collect()
        })?;

        let mut remaining: Vec<E> = items.to_vec();
        let mut result = Vec::with_capacity(ids.len());
        for id in &ids {
            let index = remaining
                .iter()
                .position(|item| identity(item) == *id)
                .ok_or_else(|| ReplayError::UnknownItem {
                    key: key.to_string(),
                    id: id.clone(),
                })?;
            result.push(remaining.remove(index));
        }
        if result.len() != count {
            return Err(ReplayError::CountMismatch {
                key: key.to_string(),
                expected: count,
                actual: result.len(),
            });
        }
        Ok(result)
    }
}

fn decode_list<T>(
    key: &str,
    value: &Value,
    expected: &'static str,
    item: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>, ReplayError> {
    let mismatch = || ReplayError::TypeMismatch {
        key: key.to_string(),
        expected,
    };
    let items = value.as_list().ok_or_else(mismatch)?;
    items
        .iter()
        .map(|v| item(v).ok_or_else(mismatch))
        .collect()
}
