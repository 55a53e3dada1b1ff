//! Bindings: lifecycle-safe bridges between a store and a reading site
//!
//! A binding makes the store's field-granular notifications look like a
//! single reactive value. It caches the latest output of a selector, stays
//! current while bound, and guarantees that no delivery touches the cache
//! after teardown - the liveness flag is checked when a callback is
//! delivered, not when it is registered.
//!
//! # Example
//!
//! ```
//! use unistore::{BatchUpdate, Snapshot, UniversalStore};
//!
//! let mut store = UniversalStore::new(Snapshot::new([
//!     ("auth", false),
//!     ("dirty", false),
//! ]));
//!
//! // Whole-state mode: re-evaluated when any field changes.
//! let view = store.bind_selector(|s| (*s.get("auth").unwrap(), *s.get("dirty").unwrap()));
//! assert_eq!(view.get(), (false, false));
//!
//! store.dispatch("auth", true).unwrap();
//! assert_eq!(view.get(), (true, false));
//!
//! // Teardown releases every slot; later dispatches no longer reach it.
//! view.dispose(&mut store);
//! assert_eq!(store.listener_count(), 0);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::field::{FieldKey, FieldValue};
use crate::registry::ListenerId;
use crate::snapshot::Snapshot;
use crate::store::{StoreError, UniversalStore};

#[derive(Debug)]
struct BindingCell<T> {
    live: AtomicBool,
    value: Mutex<T>,
}

impl<T> BindingCell<T> {
    fn new(initial: T) -> Arc<Self> {
        Arc::new(Self {
            live: AtomicBool::new(true),
            value: Mutex::new(initial),
        })
    }
}

/// Disposable handle caching the latest output of a bound selector.
///
/// Created by [`bind_selector`](UniversalStore::bind_selector) or
/// [`bind_field`](UniversalStore::bind_field). While live, every store
/// transition that touches a watched field refreshes the cached value.
/// Dropping the handle flips its liveness flag, so a forgotten binding can
/// never receive a late update; [`dispose`](Binding::dispose) additionally
/// releases the listener slots it holds.
#[derive(Debug)]
pub struct Binding<T> {
    cell: Arc<BindingCell<T>>,
    ids: Vec<ListenerId>,
}

impl<T: Clone> Binding<T> {
    /// The most recently cached selector output.
    pub fn get(&self) -> T {
        self.cell.value.lock().clone()
    }
}

impl<T> Binding<T> {
    /// Whether the binding still accepts updates.
    pub fn is_live(&self) -> bool {
        self.cell.live.load(Ordering::Acquire)
    }

    /// The listener slots this binding registered.
    pub fn listener_ids(&self) -> &[ListenerId] {
        &self.ids
    }

    /// Tear the binding down.
    ///
    /// The liveness flag is flipped before any slot is released, so no
    /// callback touches the cached value once this is entered, and every
    /// identity the binding held is free afterwards.
    pub fn dispose<V: FieldValue>(mut self, store: &mut UniversalStore<V>) {
        self.cell.live.store(false, Ordering::Release);
        for id in self.ids.drain(..) {
            store.unsubscribe(id);
        }
    }
}

impl<T> Drop for Binding<T> {
    fn drop(&mut self) {
        // A dropped handle can no longer be read; its callbacks must stop
        // writing even when the slots were never released.
        self.cell.live.store(false, Ordering::Release);
    }
}

impl<V: FieldValue> UniversalStore<V> {
    /// Bind a whole-state selector: re-evaluated whenever any field
    /// changes.
    ///
    /// The store cannot know statically which fields a selector reads, so
    /// one listener slot is registered per field currently in the snapshot,
    /// enumerated at bind time (field sets are fixed per store, never
    /// shared across stores). Every slot draws a fresh identity from the
    /// store's allocator, so concurrently mounted bindings cannot collide
    /// on `(field, identity)`.
    ///
    /// The selector runs once immediately against current state: the
    /// returned handle never starts stale, which also makes
    /// dispose-then-bind the complete re-subscription protocol (see
    /// [`rebind_selector`](UniversalStore::rebind_selector)).
    pub fn bind_selector<T, F>(&mut self, selector: F) -> Binding<T>
    where
        T: Clone + Send + 'static,
        F: Fn(&Snapshot<V>) -> T + Send + Sync + 'static,
    {
        let selector = Arc::new(selector);
        let cell = BindingCell::new((*selector)(self.canonical()));

        let keys: Vec<FieldKey> = self.canonical().keys().cloned().collect();
        let mut ids = Vec::with_capacity(keys.len());
        for key in keys {
            let id = self.allocate_listener_id();
            let cell = Arc::clone(&cell);
            let selector = Arc::clone(&selector);
            self.subscribe(id, key, move |snapshot: &Snapshot<V>| {
                if !cell.live.load(Ordering::Acquire) {
                    return;
                }
                let next = (*selector)(snapshot);
                *cell.value.lock() = next;
            });
            ids.push(id);
        }

        Binding { cell, ids }
    }

    /// Bind exactly one field, caching its value.
    ///
    /// Registers a single listener slot and is strictly cheaper than a
    /// whole-state selector; reading sites that need one field should
    /// prefer it. An unknown field is a reported error.
    pub fn bind_field(&mut self, field: impl Into<FieldKey>) -> Result<Binding<V>, StoreError> {
        let field = field.into();
        let initial = match self.canonical().get(field.name()) {
            Some(value) => value.clone(),
            None => return Err(StoreError::UnknownField(field.name().to_string())),
        };

        let cell = BindingCell::new(initial);
        let id = self.allocate_listener_id();
        let watched = field.clone();
        let cell_for_callback = Arc::clone(&cell);
        self.subscribe(id, field, move |snapshot: &Snapshot<V>| {
            if !cell_for_callback.live.load(Ordering::Acquire) {
                return;
            }
            if let Some(value) = snapshot.get(watched.name()) {
                *cell_for_callback.value.lock() = value.clone();
            }
        });

        Ok(Binding {
            cell,
            ids: vec![id],
        })
    }

    /// Replace a selector binding.
    ///
    /// Teardown of `previous` completes - flag flipped, every slot
    /// released - before the new registration set is installed, and the new
    /// selector is evaluated once immediately, so the caller never observes
    /// a value computed against the stale selector.
    pub fn rebind_selector<T, F>(&mut self, previous: Binding<T>, selector: F) -> Binding<T>
    where
        T: Clone + Send + 'static,
        F: Fn(&Snapshot<V>) -> T + Send + Sync + 'static,
    {
        previous.dispose(self);
        self.bind_selector(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::BatchUpdate;

    fn store() -> UniversalStore<i32> {
        UniversalStore::new(Snapshot::new([("a", 1), ("b", 2), ("c", 3)]))
    }

    fn sum(snapshot: &Snapshot<i32>) -> i32 {
        snapshot.iter().map(|(_, v)| *v).sum()
    }

    #[test]
    fn test_selector_evaluates_immediately() {
        let mut store = store();
        let total = store.bind_selector(sum);
        assert_eq!(total.get(), 6);
    }

    #[test]
    fn test_selector_tracks_every_field() {
        let mut store = store();
        let total = store.bind_selector(sum);

        store.dispatch("a", 10).unwrap();
        assert_eq!(total.get(), 15);

        store.dispatch("c", 30).unwrap();
        assert_eq!(total.get(), 42);
    }

    #[test]
    fn test_selector_registers_one_slot_per_field() {
        let mut store = store();
        let binding = store.bind_selector(sum);

        assert_eq!(store.listener_count(), 3);
        assert_eq!(binding.listener_ids().len(), 3);
    }

    #[test]
    fn test_field_binding_is_single_slot() {
        let mut store = store();
        let a = store.bind_field("a").unwrap();

        assert_eq!(store.listener_count(), 1);
        assert_eq!(a.get(), 1);

        store.dispatch("a", 10).unwrap();
        assert_eq!(a.get(), 10);

        store.dispatch("b", 20).unwrap();
        assert_eq!(a.get(), 10);
    }

    #[test]
    fn test_bind_unknown_field_rejected() {
        let mut store = store();
        let err = store.bind_field("missing").unwrap_err();
        assert_eq!(err, StoreError::UnknownField("missing".to_string()));
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_dispose_releases_all_slots() {
        let mut store = store();
        let binding = store.bind_selector(sum);
        assert_eq!(store.listener_count(), 3);

        binding.dispose(&mut store);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_no_update_after_dispose() {
        let mut store = store();
        let a = store.bind_field("a").unwrap();
        let cell = Arc::clone(&a.cell);

        a.dispose(&mut store);
        store.dispatch("a", 99).unwrap();

        assert_eq!(*cell.value.lock(), 1);
    }

    #[test]
    fn test_dropped_binding_goes_dead_without_release() {
        let mut store = store();
        let a = store.bind_field("a").unwrap();
        let cell = Arc::clone(&a.cell);
        drop(a);

        // The slot is still registered but the delivery-time liveness
        // check keeps the cache untouched.
        assert_eq!(store.listener_count(), 1);
        store.dispatch("a", 99).unwrap();
        assert_eq!(*cell.value.lock(), 1);
        assert!(!cell.live.load(Ordering::Acquire));
    }

    #[test]
    fn test_concurrent_bindings_never_collide() {
        let mut store = store();
        let first = store.bind_selector(sum);
        let second = store.bind_selector(sum);

        let mut all: Vec<ListenerId> = first
            .listener_ids()
            .iter()
            .chain(second.listener_ids())
            .copied()
            .collect();
        all.sort_by_key(|id| id.0);
        all.dedup();
        assert_eq!(all.len(), 6);

        // Disposing one binding leaves the other fully subscribed.
        first.dispose(&mut store);
        store.dispatch("b", 20).unwrap();
        assert_eq!(second.get(), 24);
    }

    #[test]
    fn test_rebind_swaps_selector_and_reevaluates() {
        let mut store = store();
        let binding = store.bind_selector(sum);
        store.dispatch("a", 10).unwrap();
        assert_eq!(binding.get(), 15);

        let binding = store.rebind_selector(binding, |s| s.get("a").copied().unwrap_or(0));

        // Evaluated immediately against current state, not on next dispatch.
        assert_eq!(binding.get(), 10);
        assert_eq!(store.listener_count(), 3);

        store.dispatch("a", 7).unwrap();
        assert_eq!(binding.get(), 7);
    }

    #[test]
    fn test_selector_sees_batch_as_one_transition() {
        let mut store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_selector = Arc::clone(&seen);
        let binding = store.bind_selector(move |s: &Snapshot<i32>| {
            let pair = (*s.get("a").unwrap(), *s.get("b").unwrap());
            seen_in_selector.lock().push(pair);
            pair
        });

        seen.lock().clear();
        store
            .batch_update(BatchUpdate::new().set("a", 10).set("b", 20))
            .unwrap();

        // Two notified fields, two selector runs, no partially applied
        // state in either.
        assert_eq!(*seen.lock(), vec![(10, 20), (10, 20)]);
        assert_eq!(binding.get(), (10, 20));
    }

    #[test]
    fn test_reset_refreshes_bindings() {
        let mut store = store();
        let a = store.bind_field("a").unwrap();
        store.dispatch("a", 10).unwrap();
        assert_eq!(a.get(), 10);

        store.reset();
        assert_eq!(a.get(), 1);
    }
}
