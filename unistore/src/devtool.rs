//! In-memory transition log for external inspection
//!
//! When [`StoreConfig::devtool`](crate::StoreConfig) is set, the store
//! records every field transition into a capacity-bounded ring buffer that
//! an inspector can read back. Purely observational: the log never affects
//! transition or notification semantics.

use std::collections::VecDeque;
use std::time::Instant;

use crate::field::{FieldKey, FieldValue};

/// One recorded field transition.
#[derive(Debug, Clone)]
pub struct TransitionRecord<V> {
    /// The field that changed.
    pub field: FieldKey,
    /// Value before the transition.
    pub prev: V,
    /// Value after the transition.
    pub next: V,
    /// When the transition was recorded.
    pub timestamp: Instant,
    /// Monotonic ordering across the log's lifetime.
    pub sequence: u64,
}

/// Ring buffer of recent transitions.
///
/// Older records are discarded once capacity is reached; sequence numbers
/// keep ordering stable across eviction.
#[derive(Debug, Clone)]
pub struct TransitionLog<V> {
    records: VecDeque<TransitionRecord<V>>,
    capacity: usize,
    next_sequence: u64,
}

impl<V: FieldValue> TransitionLog<V> {
    /// Create a log keeping at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            next_sequence: 0,
        }
    }

    pub(crate) fn record(&mut self, field: FieldKey, prev: V, next: V) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(TransitionRecord {
            field,
            prev,
            next,
            timestamp: Instant::now(),
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
    }

    /// All retained records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord<V>> {
        self.records.iter()
    }

    /// The most recent `count` records, newest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &TransitionRecord<V>> {
        self.records.iter().rev().take(count)
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every retained record; sequence numbering continues.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
