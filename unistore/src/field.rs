//! Field identity and value bounds for store snapshots

use std::fmt::Debug;

/// Names a field in a store snapshot.
///
/// Field sets are fixed when a snapshot is constructed; keys are matched
/// dynamically at lookup and notification time, so a `FieldKey` that names
/// no field simply misses.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FieldKey(String);

impl FieldKey {
    /// Create a new field key.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the field name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FieldKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounds required of snapshot values.
///
/// Values are cloned on every snapshot copy, logged on traced transitions,
/// and carried into binding caches that may cross task boundaries:
/// - Clone: reads hand out copies, never aliased mutable access
/// - Debug: transition traces and devtool records
/// - Send + 'static: listener callbacks and binding caches are `Send`
///
/// Blanket-implemented for every type meeting the bounds.
pub trait FieldValue: Clone + Debug + Send + 'static {}

impl<T: Clone + Debug + Send + 'static> FieldValue for T {}
