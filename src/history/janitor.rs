//! Age-based eviction of resolved operations.

use tracing::debug;

use super::store::HistoryStore;

impl HistoryStore {
    /// Drop every operation with `timestamp <= cutoff` from every form, and remove
    /// forms left with no history. Idempotent.
    ///
    /// Returns the number of operations evicted.
    pub fn cleanup(&mut self, cutoff: i64) -> usize {
        let mut evicted = 0;
        self.forms.retain(|_, history| {
            evicted += history.evict_through(cutoff);
            !history.is_empty()
        });

        if evicted > 0 {
            debug!(cutoff, evicted, forms = self.forms.len(), "history cleanup");
        }
        evicted
    }

    /// Drop operations older than `max_age_ms` relative to `now_ms`.
    pub fn cleanup_older_than(&mut self, max_age_ms: i64, now_ms: i64) -> usize {
        self.cleanup(now_ms.saturating_sub(max_age_ms))
    }
}
