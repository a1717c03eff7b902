//! Engine-level value type for wire parameters, captured randomness and views.
//!
//! Everything that crosses an engine boundary - serialized action parameters,
//! per-step randomness maps, configuration entries, view projections - is a
//! `Value`. The engine never interprets domain types; games convert their own
//! types at the edges.
//!
//! ## Integers only
//!
//! Numeric values are `i64`. Games encode booleans as `Bool`, enums as their
//! discriminant, references as indices. Floats are deliberately absent so
//! `Value` has total ordering and hashing, which the engine relies on for
//! deterministic tie-breaking and choice matching.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A plain, self-describing value tree.
///
/// ## Example
///
/// ```
/// use turnwise::core::Value;
///
/// let v = Value::map([("x", Value::Int(2)), ("y", Value::Int(0))]);
/// assert_eq!(v.get("x").and_then(Value::as_int), Some(2));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Absence of a value (unit action parameters serialize to this).
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integer. The only numeric type.
    Int(i64),
    /// UTF-8 string.
    Str(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Key-ordered map of values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Build a map value from key/value pairs.
    #[must_use]
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a list value.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// Get the integer contents, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the boolean contents, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the string contents, if this is a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the list contents, if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the map contents, if this is a `Map`.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a key, if this is a `Map`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Check for `Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::List(iter.into_iter().collect())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(5).as_int(), Some(5));
        assert_eq!(Value::Str("a".into()).as_int(), None);
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Str("hi".into()).as_str(), Some("hi"));
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
    }

    #[test]
    fn test_map_lookup() {
        let v = Value::map([("x", Value::Int(1)), ("y", Value::Int(2))]);
        assert_eq!(v.get("y").and_then(Value::as_int), Some(2));
        assert_eq!(v.get("z"), None);
        assert_eq!(Value::Int(3).get("x"), None);
    }

    #[test]
    fn test_ordering_is_total() {
        let mut values = vec![
            Value::Int(3),
            Value::Null,
            Value::Str("b".into()),
            Value::Int(1),
            Value::Str("a".into()),
        ];
        values.sort();
        // Sorting is stable and deterministic; exact order is derive-defined.
        let sorted_again = {
            let mut v = values.clone();
            v.sort();
            v
        };
        assert_eq!(values, sorted_again);
    }

    #[test]
    fn test_display() {
        let v = Value::map([("a", Value::list([Value::Int(1), Value::Int(2)]))]);
        assert_eq!(format!("{}", v), "{a: [1, 2]}");
    }

    #[test]
    fn test_serde_round_trip() {
        let v = Value::map([
            ("n", Value::Null),
            ("i", Value::Int(-4)),
            ("s", Value::Str("x".into())),
            ("l", Value::list([Value::Bool(false)])),
        ]);
        let json = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);

        let bytes = bincode::serialize(&v).unwrap();
        let back: Value = bincode::deserialize(&bytes).unwrap();
        assert_eq!(v, back);
    }
}
