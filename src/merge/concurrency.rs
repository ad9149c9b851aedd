//! Detection of operations concurrent with an incoming one.
//!
//! Two operations are concurrent when they come from different actors and their
//! wall-clock timestamps are at most `threshold_ms` apart. There is no logical clock:
//! clock skew or late delivery can misclassify sequential edits, and that limitation
//! is kept as is.

use crate::types::Operation;

/// Whether `a` and `b` count as concurrent edits.
#[inline]
pub fn is_concurrent(a: &Operation, b: &Operation, threshold_ms: i64) -> bool {
    if a.actor_id == b.actor_id {
        return false;
    }
    match u64::try_from(threshold_ms) {
        Ok(threshold) => a.timestamp.abs_diff(b.timestamp) <= threshold,
        Err(_) => false,
    }
}

/// Every operation of `history` concurrent with `incoming`, in history order.
///
/// # Examples
///
/// ```
/// use form_merge::merge::find_concurrent;
/// use form_merge::Operation;
///
/// let history = vec![
///     Operation::delete("bob", 1000, "f1"),
///     Operation::delete("alice", 1010, "f2"),
///     Operation::delete("carol", 1500, "f3"),
/// ];
/// let incoming = Operation::delete("alice", 1050, "f4");
///
/// let concurrent = find_concurrent(&history, &incoming, 100);
/// assert_eq!(concurrent.len(), 1);
/// assert_eq!(concurrent[0].actor_id, "bob");
/// ```
pub fn find_concurrent<'a, I>(history: I, incoming: &Operation, threshold_ms: i64) -> Vec<&'a Operation>
where
    I: IntoIterator<Item = &'a Operation>,
{
    history
        .into_iter()
        .filter(|op| is_concurrent(op, incoming, threshold_ms))
        .collect()
}
