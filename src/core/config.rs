//! Game configuration.
//!
//! A game definition declares configuration keys with default values; an
//! instance may override them before setup. The resolved configuration is
//! immutable for the lifetime of the instance and is exported into
//! `ReplayData`, so a replayed game sees the exact same configuration.

use std::collections::BTreeMap;

use super::value::Value;

/// Resolved configuration for one game instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameConfig {
    values: BTreeMap<String, Value>,
}

impl GameConfig {
    /// Build a configuration from declared defaults and instance overrides.
    ///
    /// Overriding a key the definition never declared is a programmer error.
    #[must_use]
    pub fn resolve(defaults: &[(String, Value)], overrides: &[(String, Value)]) -> Self {
        let mut values: BTreeMap<String, Value> =
            defaults.iter().cloned().collect();
        for (key, value) in overrides {
            assert!(
                values.contains_key(key),
                "config override for undeclared key '{}'",
                key
            );
            values.insert(key.clone(), value.clone());
        }
        Self { values }
    }

    /// Rebuild a configuration from its exported `Value::Map` form.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let values = value.as_map().cloned().unwrap_or_default();
        Self { values }
    }

    /// Get a configuration value.
    ///
    /// Panics on an undeclared key; configuration keys are fixed at
    /// definition time.
    #[must_use]
    pub fn get(&self, key: &str) -> &Value {
        self.values
            .get(key)
            .unwrap_or_else(|| panic!("no config value for key '{}'", key))
    }

    /// Get an integer configuration value.
    #[must_use]
    pub fn int(&self, key: &str) -> i64 {
        self.get(key)
            .as_int()
            .unwrap_or_else(|| panic!("config value '{}' is not an integer", key))
    }

    /// Export as a plain `Value::Map` (for `ReplayData`).
    #[must_use]
    pub fn as_value(&self) -> Value {
        Value::Map(self.values.clone())
    }
}
