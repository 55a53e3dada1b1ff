//! Universal store: canonical snapshot, transitions, notification

use crate::devtool::TransitionLog;
use crate::field::{FieldKey, FieldValue};
use crate::registry::{ListenerId, ListenerRegistry};
use crate::snapshot::{BatchUpdate, Snapshot};

/// Store configuration, immutable after construction.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Emit a structured trace record for every field transition.
    pub trace_transitions: bool,
    /// Keep an in-memory [`TransitionLog`] for external inspection.
    pub devtool: bool,
    /// Ring-buffer capacity of the devtool log.
    pub devtool_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            trace_transitions: false,
            devtool: false,
            devtool_capacity: 128,
        }
    }
}

/// Errors reported by store write operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The named field is not part of the snapshot's fixed field set.
    UnknownField(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::UnknownField(name) => write!(f, "unknown field: {}", name),
        }
    }
}

impl std::error::Error for StoreError {}

/// Observable state container with field-granular notifications.
///
/// The store exclusively owns the canonical [`Snapshot`]; the field set is
/// fixed by the initial state and never grows or shrinks. Every mutation
/// runs to completion - value replacement, then synchronous delivery to the
/// listeners of each changed field in registration order - before control
/// returns to the caller.
///
/// Mutation takes `&mut self`, so a listener cannot synchronously call back
/// into the store: dispatch is non-reentrant by construction.
///
/// # Example
/// ```
/// use unistore::{Snapshot, UniversalStore};
///
/// let mut store = UniversalStore::new(Snapshot::new([("count", 0i32)]));
///
/// let id = store.allocate_listener_id();
/// store.subscribe(id, "count", |snapshot| {
///     assert_eq!(snapshot.get("count"), Some(&1));
/// });
///
/// store.dispatch("count", 1).unwrap();
/// assert_eq!(store.field("count"), Some(&1));
/// ```
pub struct UniversalStore<V> {
    snapshot: Snapshot<V>,
    initial: Snapshot<V>,
    listeners: ListenerRegistry<V>,
    next_listener_id: u64,
    config: StoreConfig,
    devtool: Option<TransitionLog<V>>,
}

impl<V: FieldValue> UniversalStore<V> {
    /// Create a store with default configuration.
    pub fn new(initial: Snapshot<V>) -> Self {
        Self::with_config(initial, StoreConfig::default())
    }

    /// Create a store with explicit configuration.
    pub fn with_config(initial: Snapshot<V>, config: StoreConfig) -> Self {
        let devtool = config
            .devtool
            .then(|| TransitionLog::new(config.devtool_capacity));
        Self {
            snapshot: initial.clone(),
            initial,
            listeners: ListenerRegistry::new(),
            next_listener_id: 0,
            config,
            devtool,
        }
    }

    /// Full copy of the canonical state. No side effects.
    pub fn state(&self) -> Snapshot<V> {
        self.snapshot.clone()
    }

    /// Current value of one field; an absent name yields `None`, not an
    /// error.
    pub fn field(&self, name: &str) -> Option<&V> {
        self.snapshot.get(name)
    }

    /// The configuration captured at construction.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The devtool transition log, when enabled.
    pub fn devtool(&self) -> Option<&TransitionLog<V>> {
        self.devtool.as_ref()
    }

    /// Number of registered listener slots.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn canonical(&self) -> &Snapshot<V> {
        &self.snapshot
    }

    /// Replace one field's value and notify that field's listeners.
    ///
    /// Dispatching to a field outside the fixed field set is rejected:
    /// state stays untouched, no listener fires, and
    /// [`StoreError::UnknownField`] is returned.
    pub fn dispatch(&mut self, field: impl Into<FieldKey>, value: V) -> Result<(), StoreError> {
        let field = field.into();
        let prev = match self.snapshot.get(field.name()) {
            Some(current) => current.clone(),
            None => {
                tracing::warn!(field = %field, "dispatch to unknown field rejected");
                return Err(StoreError::UnknownField(field.name().to_string()));
            }
        };
        self.record_transition(&field, &prev, &value);
        self.snapshot.set(field.name(), value);
        self.listeners.notify(&field, &self.snapshot);
        Ok(())
    }

    /// Apply every write in `batch` as one atomic transition, then notify
    /// once per written field in the batch's insertion order.
    ///
    /// The snapshot is swapped in a single step, so a listener of any
    /// batched field already observes every other write of the batch.
    /// A batch naming an unknown field is rejected whole: nothing is
    /// applied and nothing fires.
    pub fn batch_update(&mut self, batch: BatchUpdate<V>) -> Result<(), StoreError> {
        for key in batch.keys() {
            if !self.snapshot.contains(key.name()) {
                tracing::warn!(field = %key, "batch update rejected, unknown field");
                return Err(StoreError::UnknownField(key.name().to_string()));
            }
        }

        let mut next = self.snapshot.clone();
        for (key, value) in batch.iter() {
            next.set(key.name(), value.clone());
        }
        let prev = std::mem::replace(&mut self.snapshot, next);

        for (key, value) in batch.iter() {
            if let Some(previous) = prev.get(key.name()) {
                self.record_transition(key, previous, value);
            }
        }
        for (key, _) in batch.iter() {
            self.listeners.notify(key, &self.snapshot);
        }
        Ok(())
    }

    /// Restore the initially configured snapshot and broadcast to every
    /// registered listener regardless of watched field.
    pub fn reset(&mut self) {
        let prev = std::mem::replace(&mut self.snapshot, self.initial.clone());
        if self.config.trace_transitions {
            tracing::debug!("store reset to initial state");
        }
        let Self {
            devtool, snapshot, ..
        } = self;
        if let Some(log) = devtool.as_mut() {
            for (key, next) in snapshot.iter() {
                if let Some(previous) = prev.get(key.name()) {
                    log.record(key.clone(), previous.clone(), next.clone());
                }
            }
        }
        self.listeners.notify_all(&self.snapshot);
    }

    /// Register `callback` against `field`.
    ///
    /// Upsert semantics: a slot already holding `id` has its watched field
    /// and callback replaced in place, keeping its registration order.
    pub fn subscribe<F>(&mut self, id: ListenerId, field: impl Into<FieldKey>, callback: F)
    where
        F: FnMut(&Snapshot<V>) + Send + 'static,
    {
        self.listeners.subscribe(id, field.into(), Box::new(callback));
    }

    /// Remove the listener slot holding `id`; an absent id is a no-op.
    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }

    /// Allocate a listener identity unique for the lifetime of this store.
    pub fn allocate_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        id
    }

    fn record_transition(&mut self, field: &FieldKey, prev: &V, next: &V) {
        if self.config.trace_transitions {
            tracing::debug!(field = %field, ?prev, ?next, "transition");
        }
        if let Some(log) = self.devtool.as_mut() {
            log.record(field.clone(), prev.clone(), next.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NotificationProbe;

    fn store() -> UniversalStore<i32> {
        UniversalStore::new(Snapshot::new([("a", 1), ("b", 2), ("c", 3)]))
    }

    #[test]
    fn test_dispatch_replaces_single_field() {
        let mut store = store();
        store.dispatch("b", 20).unwrap();

        assert_eq!(store.field("a"), Some(&1));
        assert_eq!(store.field("b"), Some(&20));
        assert_eq!(store.field("c"), Some(&3));
    }

    #[test]
    fn test_dispatch_unknown_field_rejected() {
        let mut store = store();
        let probe = NotificationProbe::new();
        let id = store.allocate_listener_id();
        store.subscribe(id, "a", probe.callback());

        let err = store.dispatch("missing", 42).unwrap_err();

        assert_eq!(err, StoreError::UnknownField("missing".to_string()));
        assert_eq!(store.state(), Snapshot::new([("a", 1), ("b", 2), ("c", 3)]));
        assert_eq!(probe.count(), 0);
    }

    #[test]
    fn test_dispatch_notifies_matching_listeners_only() {
        let mut store = store();
        let on_a = NotificationProbe::new();
        let on_b = NotificationProbe::new();
        let id_a = store.allocate_listener_id();
        let id_b = store.allocate_listener_id();
        store.subscribe(id_a, "a", on_a.callback());
        store.subscribe(id_b, "b", on_b.callback());

        store.dispatch("a", 10).unwrap();

        assert_eq!(on_a.count(), 1);
        assert_eq!(on_b.count(), 0);
    }

    #[test]
    fn test_batch_update_applies_atomically() {
        let mut store = store();
        let probe = NotificationProbe::new();
        let id = store.allocate_listener_id();
        store.subscribe(id, "a", probe.callback());

        store
            .batch_update(BatchUpdate::new().set("a", 10).set("b", 20))
            .unwrap();

        // The listener of `a` already sees `b` updated.
        let seen = probe.last().unwrap();
        assert_eq!(seen.get("a"), Some(&10));
        assert_eq!(seen.get("b"), Some(&20));
    }

    #[test]
    fn test_batch_update_unknown_field_rejects_whole_batch() {
        let mut store = store();
        let probe = NotificationProbe::new();
        let id = store.allocate_listener_id();
        store.subscribe(id, "a", probe.callback());

        let err = store
            .batch_update(BatchUpdate::new().set("a", 10).set("missing", 0))
            .unwrap_err();

        assert_eq!(err, StoreError::UnknownField("missing".to_string()));
        assert_eq!(store.field("a"), Some(&1));
        assert_eq!(probe.count(), 0);
    }

    #[test]
    fn test_reset_restores_initial_and_broadcasts() {
        let mut store = store();
        let on_a = NotificationProbe::new();
        let on_b = NotificationProbe::new();
        let id_a = store.allocate_listener_id();
        let id_b = store.allocate_listener_id();
        store.subscribe(id_a, "a", on_a.callback());
        store.subscribe(id_b, "b", on_b.callback());
        store.dispatch("a", 10).unwrap();
        store.dispatch("c", 30).unwrap();

        store.reset();

        assert_eq!(store.state(), Snapshot::new([("a", 1), ("b", 2), ("c", 3)]));
        // Broadcast hits every listener once regardless of watched field.
        assert_eq!(on_a.count(), 2); // dispatch + reset
        assert_eq!(on_b.count(), 1); // reset only
    }

    #[test]
    fn test_listener_ids_are_never_reused() {
        let mut store = store();
        let first = store.allocate_listener_id();
        let second = store.allocate_listener_id();
        assert_ne!(first, second);

        store.subscribe(first, "a", |_| {});
        store.unsubscribe(first);

        let third = store.allocate_listener_id();
        assert_ne!(third, first);
        assert_ne!(third, second);
    }

    #[test]
    fn test_devtool_records_transitions() {
        let config = StoreConfig {
            devtool: true,
            ..Default::default()
        };
        let mut store = UniversalStore::with_config(Snapshot::new([("a", 1), ("b", 2)]), config);

        store.dispatch("a", 10).unwrap();
        store
            .batch_update(BatchUpdate::new().set("a", 100).set("b", 200))
            .unwrap();

        let log = store.devtool().unwrap();
        let fields: Vec<&str> = log.records().map(|r| r.field.name()).collect();
        assert_eq!(fields, vec!["a", "a", "b"]);

        let first = log.records().next().unwrap();
        assert_eq!(first.prev, 1);
        assert_eq!(first.next, 10);
    }

    #[test]
    fn test_devtool_disabled_by_default() {
        let store = store();
        assert!(store.devtool().is_none());
    }

    #[test]
    fn test_state_returns_a_copy() {
        let store = store();
        let mut copy = store.state();
        copy.set("a", 999);
        assert_eq!(store.field("a"), Some(&1));
    }
}
