//! Test utilities for store-based code
//!
//! # Example
//!
//! ```
//! use unistore::testing::NotificationProbe;
//! use unistore::{Snapshot, UniversalStore};
//!
//! let mut store = UniversalStore::new(Snapshot::new([("count", 0i32)]));
//! let probe = NotificationProbe::new();
//! let id = store.allocate_listener_id();
//! store.subscribe(id, "count", probe.callback());
//!
//! store.dispatch("count", 1).unwrap();
//!
//! assert_eq!(probe.count(), 1);
//! assert_eq!(probe.last().unwrap().get("count"), Some(&1));
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::field::FieldValue;
use crate::snapshot::Snapshot;

/// Records every snapshot a listener sees.
///
/// Hand [`callback`](NotificationProbe::callback) to
/// [`subscribe`](crate::UniversalStore::subscribe) and assert on
/// notification counts, ordering, and the state captured at delivery time.
pub struct NotificationProbe<V> {
    seen: Arc<Mutex<Vec<Snapshot<V>>>>,
}

impl<V: FieldValue> NotificationProbe<V> {
    /// Create an empty probe.
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A listener callback recording each delivered snapshot.
    ///
    /// Callbacks from the same probe share one recording, so a probe can
    /// count deliveries across several subscriptions.
    pub fn callback(&self) -> impl FnMut(&Snapshot<V>) + Send + 'static {
        let seen = Arc::clone(&self.seen);
        move |snapshot: &Snapshot<V>| seen.lock().push(snapshot.clone())
    }

    /// Number of deliveries recorded.
    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Every recorded snapshot, in delivery order.
    pub fn snapshots(&self) -> Vec<Snapshot<V>> {
        self.seen.lock().clone()
    }

    /// The most recently recorded snapshot.
    pub fn last(&self) -> Option<Snapshot<V>> {
        self.seen.lock().last().cloned()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

impl<V: FieldValue> Default for NotificationProbe<V> {
    fn default() -> Self {
        Self::new()
    }
}
