//! Per-form registry of operation histories.

use std::collections::HashMap;

use super::log::OperationHistory;
use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::types::{Operation, Resolution};

/// Owned map from form id to that form's bounded [`OperationHistory`].
///
/// One store is constructed per collaboration-service instance and passed to every
/// call; nothing is global. The store does no locking: callers resolving the same
/// form from several threads must serialize access themselves (see
/// [`FormHub`](crate::hub::FormHub)).
///
/// # Examples
///
/// ```
/// use form_merge::{HistoryStore, Operation};
///
/// let mut store = HistoryStore::new(2);
/// store.record("form-1", Operation::reorder("alice", 10, 0, 1));
/// store.record("form-1", Operation::reorder("alice", 20, 1, 2));
/// store.record("form-1", Operation::reorder("alice", 30, 2, 3));
///
/// assert_eq!(store.len("form-1"), 2);
/// assert_eq!(store.recent("form-1")[0].timestamp, 20);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryStore {
    pub(super) forms: HashMap<String, OperationHistory>,
    capacity: usize,
}

impl HistoryStore {
    /// Create an empty store with a per-form cap of `capacity` operations.
    pub fn new(capacity: usize) -> Self {
        Self {
            forms: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append `op` to the history of `form_id`, dropping the oldest entries
    /// beyond the per-form cap.
    pub fn record(&mut self, form_id: &str, op: Operation) {
        let capacity = self.capacity;
        let history = self
            .forms
            .entry(form_id.to_string())
            .or_insert_with(|| OperationHistory::new(capacity));

        history.record(form_id, op);
    }

    /// Record the accepted and merged operations of `resolution`. Rejected
    /// operations never enter history.
    pub fn record_resolution(&mut self, form_id: &str, resolution: &Resolution) {
        for op in resolution.resolved_operations() {
            self.record(form_id, op.clone());
        }
    }

    /// History of `form_id`, oldest first. Empty for an unknown form.
    pub fn recent(&self, form_id: &str) -> Vec<Operation> {
        self.forms
            .get(form_id)
            .map(OperationHistory::to_vec)
            .unwrap_or_default()
    }

    /// Borrow the history of `form_id` without copying.
    pub fn history(&self, form_id: &str) -> Option<&OperationHistory> {
        self.forms.get(form_id)
    }

    /// Number of operations stored for `form_id`.
    pub fn len(&self, form_id: &str) -> usize {
        self.forms.get(form_id).map_or(0, OperationHistory::len)
    }

    /// Whether no form has any history.
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Ids of every form with history, in arbitrary order.
    pub fn form_ids(&self) -> Vec<String> {
        self.forms.keys().cloned().collect()
    }

    /// Number of operations stored across all forms.
    pub fn total_operations(&self) -> usize {
        self.forms.values().map(OperationHistory::len).sum()
    }

    /// Forget the history of `form_id`. Returns whether it existed.
    pub fn clear(&mut self, form_id: &str) -> bool {
        self.forms.remove(form_id).is_some()
    }

    /// Per-form cap.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
