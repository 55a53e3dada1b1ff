//! Listener registry embedded in the store core

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::field::FieldKey;
use crate::snapshot::Snapshot;

/// Identity of a registered listener slot.
///
/// Identity is unique per slot: subscribing with an id already present
/// replaces that slot in place (last write wins), it never duplicates.
/// [`allocate_listener_id`](crate::UniversalStore::allocate_listener_id)
/// hands out ids that never repeat for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Callback invoked with the post-transition snapshot.
pub type ListenerFn<V> = Box<dyn FnMut(&Snapshot<V>) + Send>;

struct ListenerRecord<V> {
    id: ListenerId,
    field: FieldKey,
    callback: ListenerFn<V>,
}

/// `(identity, field, callback)` records in registration order.
///
/// Watched fields are matched dynamically at notification time with a
/// linear scan - no per-field index. Registries stay small (concurrently
/// mounted bindings x observed fields), so the scan is cheaper than
/// keeping an index coherent across upserts.
pub(crate) struct ListenerRegistry<V> {
    records: Vec<ListenerRecord<V>>,
}

impl<V> ListenerRegistry<V> {
    pub(crate) fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Upsert a record: an existing slot with the same id has its field and
    /// callback replaced in place, keeping its registration order.
    pub(crate) fn subscribe(&mut self, id: ListenerId, field: FieldKey, callback: ListenerFn<V>) {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.field = field;
                record.callback = callback;
            }
            None => self.records.push(ListenerRecord {
                id,
                field,
                callback,
            }),
        }
    }

    /// Remove the record with `id`; removing an absent id is a no-op.
    pub(crate) fn unsubscribe(&mut self, id: ListenerId) {
        self.records.retain(|r| r.id != id);
    }

    /// Invoke, in registration order, every callback watching `field`.
    ///
    /// A panicking callback is caught and logged; delivery continues to the
    /// remaining listeners of the pass.
    pub(crate) fn notify(&mut self, field: &FieldKey, snapshot: &Snapshot<V>) {
        for record in self.records.iter_mut() {
            if record.field != *field {
                continue;
            }
            Self::deliver(record, snapshot);
        }
    }

    /// Invoke every callback regardless of watched field (reset broadcast).
    pub(crate) fn notify_all(&mut self, snapshot: &Snapshot<V>) {
        for record in self.records.iter_mut() {
            Self::deliver(record, snapshot);
        }
    }

    fn deliver(record: &mut ListenerRecord<V>, snapshot: &Snapshot<V>) {
        let callback = &mut record.callback;
        if catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
            tracing::error!(
                listener = %record.id,
                field = %record.field,
                "listener panicked during notification, continuing delivery"
            );
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}
