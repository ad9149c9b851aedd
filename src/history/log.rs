//! Bounded per-form operation history.

use std::collections::vec_deque::{self, VecDeque};

use tracing::debug;

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::types::Operation;

/// Ordered, size-bounded history of resolved operations for one form.
///
/// # Invariants
///
/// - `len() <= capacity()`
/// - Entries are kept in the order they were recorded; the oldest drop first
#[derive(Debug, Clone, PartialEq)]
pub struct OperationHistory {
    entries: VecDeque<Operation>,
    capacity: usize,
}

impl OperationHistory {
    /// Create an empty history holding at most `capacity` operations.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Append `op`, dropping the oldest entries beyond capacity.
    ///
    /// Returns the number of entries dropped.
    pub fn push(&mut self, op: Operation) -> usize {
        self.entries.push_back(op);
        let mut dropped = 0;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            dropped += 1;
        }
        dropped
    }

    /// [`push`](Self::push) on behalf of `form_id`, logging any entries dropped by the cap.
    pub(crate) fn record(&mut self, form_id: &str, op: Operation) {
        let dropped = self.push(op);
        if dropped > 0 {
            debug!(form_id, dropped, "history cap reached, dropped oldest operations");
        }
    }

    /// Drop every entry with `timestamp <= cutoff`. Returns how many were dropped.
    pub fn evict_through(&mut self, cutoff: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|op| op.timestamp > cutoff);
        before - self.entries.len()
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> vec_deque::Iter<'_, Operation> {
        self.entries.iter()
    }

    /// Number of stored operations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of stored operations.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy the entries out, oldest first.
    pub fn to_vec(&self) -> Vec<Operation> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for OperationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<'a> IntoIterator for &'a OperationHistory {
    type Item = &'a Operation;
    type IntoIter = vec_deque::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
