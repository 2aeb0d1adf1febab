//! Run context: named inputs for a single execution
//!
//! The context is assembled before a run (manifest defaults, then CLI
//! overrides) and is read-only once execution begins. Targets never write
//! to it; cross-target data passing is not part of this model.

use std::collections::HashMap;

/// Named string inputs available to conditions and actions during a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunContext(HashMap<String, String>);

impl RunContext {
    /// Creates an empty context
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Sets an input value, replacing any previous value for the key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Gets an input value by name
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns true if the input is present and non-empty
    ///
    /// This is the check backing a target's `requires` list: an empty
    /// string is treated the same as an absent input.
    pub fn is_set(&self, key: &str) -> bool {
        self.0.get(key).map(|v| !v.is_empty()).unwrap_or(false)
    }

    /// Returns true if the input is set to a truthy value
    ///
    /// Truthy means present, non-empty, and not `0`, `false`, or `no`
    /// (case-insensitive).
    pub fn is_truthy(&self, key: &str) -> bool {
        match self.get(key) {
            Some(v) if !v.is_empty() => {
                !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no")
            }
            _ => false,
        }
    }

    /// Returns the number of inputs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no inputs are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all inputs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RunContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
