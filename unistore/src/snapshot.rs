//! State snapshots and atomic multi-field updates

use crate::field::{FieldKey, FieldValue};

/// An ordered mapping from field name to value.
///
/// The field set is fixed at construction: [`set`](Snapshot::set) replaces
/// values for known fields and rejects unknown ones, it never inserts.
/// Iteration follows construction order.
///
/// Backed by a `Vec` with linear-scan lookup - field sets are bounded by
/// what a store's callers observe, the same scale argument that keeps the
/// listener registry unindexed.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<V> {
    fields: Vec<(FieldKey, V)>,
}

impl<V: FieldValue> Snapshot<V> {
    /// Build a snapshot from `(name, value)` pairs.
    ///
    /// A duplicated name collapses into one field: the first occurrence
    /// keeps its position, the last value wins.
    ///
    /// # Example
    ///
    /// ```
    /// use unistore::Snapshot;
    ///
    /// let snapshot = Snapshot::new([("auth", false), ("dirty", false)]);
    /// assert_eq!(snapshot.get("auth"), Some(&false));
    /// assert_eq!(snapshot.len(), 2);
    /// ```
    pub fn new<K, I>(pairs: I) -> Self
    where
        K: Into<FieldKey>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut fields: Vec<(FieldKey, V)> = Vec::new();
        for (key, value) in pairs {
            let key = key.into();
            match fields.iter_mut().find(|(k, _)| k == &key) {
                Some((_, slot)) => *slot = value,
                None => fields.push((key, value)),
            }
        }
        Self { fields }
    }

    /// Current value of a field, `None` for an unknown name.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.fields
            .iter()
            .find(|(k, _)| k.name() == name)
            .map(|(_, v)| v)
    }

    /// Replace the value of a known field.
    ///
    /// Returns `false` and leaves the snapshot untouched when `name` is not
    /// part of the field set.
    pub fn set(&mut self, name: &str, value: V) -> bool {
        match self.fields.iter_mut().find(|(k, _)| k.name() == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Whether `name` is part of the field set.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k.name() == name)
    }

    /// Field keys in construction order.
    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.fields.iter().map(|(k, _)| k)
    }

    /// `(key, value)` pairs in construction order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &V)> {
        self.fields.iter().map(|(k, v)| (k, v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the snapshot has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An ordered set of field writes applied as one state transition.
///
/// Writes land in insertion order, which is also the notification order of
/// [`batch_update`](crate::UniversalStore::batch_update). Setting the same
/// field twice keeps the first position and the last value.
///
/// # Example
///
/// ```
/// use unistore::BatchUpdate;
///
/// let update = BatchUpdate::new()
///     .set("auth", true)
///     .set("dirty", false);
/// assert_eq!(update.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct BatchUpdate<V> {
    writes: Vec<(FieldKey, V)>,
}

impl<V: FieldValue> BatchUpdate<V> {
    /// Create an empty update.
    pub fn new() -> Self {
        Self { writes: Vec::new() }
    }

    /// Add a field write, replacing the value of an earlier write to the
    /// same field.
    pub fn set(mut self, field: impl Into<FieldKey>, value: V) -> Self {
        let field = field.into();
        match self.writes.iter_mut().find(|(k, _)| k == &field) {
            Some((_, slot)) => *slot = value,
            None => self.writes.push((field, value)),
        }
        self
    }

    /// `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &V)> {
        self.writes.iter().map(|(k, v)| (k, v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.writes.iter().map(|(k, _)| k)
    }

    /// Number of distinct fields written.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether the update writes nothing.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl<V: FieldValue> Default for BatchUpdate<V> {
    fn default() -> Self {
        Self::new()
    }
}
