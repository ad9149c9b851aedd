//! Index transformation for concurrent moves.
//!
//! A move is modeled as remove-then-insert. Given a concurrent move `from2 -> to2`
//! that has already been applied, an index `i` of the first move shifts down when
//! the other move removed something before it and shifts up when it inserted at or
//! before it:
//!
//! ```text
//! i' = i - (from2 < i ? 1 : 0) + (to2 <= i ? 1 : 0)      clamped to >= 0
//! ```
//!
//! Chaining this over more than two concurrent moves is order dependent.

use tracing::trace;

#[inline]
fn shift(index: i64, other_from: i64, other_to: i64) -> i64 {
    let mut shifted = index;
    if other_from < index {
        shifted = shifted.saturating_sub(1);
    }
    if other_to <= index {
        shifted = shifted.saturating_add(1);
    }
    shifted.max(0)
}

/// Adjust move `(from1, to1)` against a concurrent move `(from2, to2)`.
///
/// # Examples
///
/// ```
/// use form_merge::merge::transform_move;
///
/// assert_eq!(transform_move(2, 5, 1, 4), (1, 5));
/// assert_eq!(transform_move(0, 0, 3, 4), (0, 0));
/// ```
pub fn transform_move(from1: i64, to1: i64, from2: i64, to2: i64) -> (i64, i64) {
    let transformed = (shift(from1, from2, to2), shift(to1, from2, to2));
    trace!(from1, to1, from2, to2, from = transformed.0, to = transformed.1, "transformed move");
    transformed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_move_entirely_after() {
        assert_eq!(transform_move(0, 1, 3, 4), (0, 1));
    }

    #[test]
    fn test_other_move_entirely_before() {
        // removed at 0 and reinserted at 1: both indices unaffected net
        assert_eq!(transform_move(3, 5, 0, 1), (3, 5));
    }

    #[test]
    fn test_other_move_from_before_to_after() {
        assert_eq!(transform_move(3, 4, 1, 6), (2, 3));
    }

    #[test]
    fn test_other_move_from_after_to_before() {
        assert_eq!(transform_move(3, 4, 6, 0), (4, 5));
    }

    #[test]
    fn test_results_never_negative() {
        assert_eq!(transform_move(-5, -1, -10, 3), (0, 0));
        assert_eq!(transform_move(0, 0, -1, 5), (0, 0));
    }

    #[test]
    fn test_extreme_indices_saturate() {
        let (from, to) = transform_move(i64::MAX, i64::MAX, i64::MAX, 0);
        assert_eq!(from, i64::MAX);
        assert_eq!(to, i64::MAX);
    }
}
