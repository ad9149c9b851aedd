//! Per-kind resolution policies.
//!
//! | Kind | Conflict | Outcome |
//! |------|----------|---------|
//! | Add | concurrent adds at the same position | merged, position shifted by their count |
//! | Update | concurrent delete of the field | rejected |
//! | Update | concurrent updates of the field | merged, updates fill-gap merged |
//! | Delete | concurrent delete of the field | rejected |
//! | Reorder | concurrent reorders | merged, indices transformed in order |
//!
//! An operation whose id is already recorded is a client retry and is rejected
//! before any of the above, see [`reject_duplicate`]. Anything else is accepted
//! unchanged. The add shift counts conflicts and the
//! reorder fold follows the order of the concurrent set, so neither is commutative
//! across several conflicting operations of the same kind.

use crate::types::{Field, FieldAttributes, Operation, OperationKind, RejectReason, Resolution};

use super::fields::merge_updates;
use super::transform::transform_move;

/// Resolve `incoming` against the operations found concurrent with it.
///
/// Total over well-formed operations: it never panics and always places
/// `incoming` in exactly one set of the returned [`Resolution`].
pub fn resolve(incoming: &Operation, concurrent: &[&Operation]) -> Resolution {
    match &incoming.kind {
        OperationKind::Add { field, position } => resolve_add(incoming, field, *position, concurrent),
        OperationKind::Update { field_id, updates } => match field_id {
            Some(field_id) => resolve_update(incoming, field_id, updates, concurrent),
            None => missing_field_id(incoming),
        },
        OperationKind::Delete { field_id } => match field_id {
            Some(field_id) => resolve_delete(incoming, field_id, concurrent),
            None => missing_field_id(incoming),
        },
        OperationKind::Reorder {
            from_index,
            to_index,
        } => resolve_reorder(incoming, *from_index, *to_index, concurrent),
    }
}

/// Reject a retry of an operation already recorded under the same id.
///
/// A repeated delete reports [`RejectReason::AlreadyDeleted`]; any other kind
/// reports [`RejectReason::AlreadyApplied`].
pub fn reject_duplicate(incoming: &Operation) -> Resolution {
    let reason = match incoming.kind {
        OperationKind::Delete { .. } => RejectReason::AlreadyDeleted,
        _ => RejectReason::AlreadyApplied,
    };
    Resolution::rejected(incoming.clone(), reason)
}

fn missing_field_id(incoming: &Operation) -> Resolution {
    Resolution::rejected(
        incoming.clone(),
        RejectReason::InvalidOperation(format!("{} requires fieldId", incoming.kind.name())),
    )
}

fn resolve_add(incoming: &Operation, field: &Field, position: i64, concurrent: &[&Operation]) -> Resolution {
    let conflicting = concurrent
        .iter()
        .filter(|op| matches!(op.kind, OperationKind::Add { position: p, .. } if p == position))
        .count();

    if conflicting == 0 {
        return Resolution::accepted(incoming.clone());
    }

    let shift = i64::try_from(conflicting).unwrap_or(i64::MAX);
    Resolution::merged(incoming.with_kind(OperationKind::Add {
        field: field.clone(),
        position: position.saturating_add(shift),
    }))
}

fn resolve_update(
    incoming: &Operation,
    field_id: &str,
    updates: &FieldAttributes,
    concurrent: &[&Operation],
) -> Resolution {
    let deleted = concurrent.iter().any(|op| {
        matches!(&op.kind, OperationKind::Delete { field_id: Some(id) } if id == field_id)
    });
    if deleted {
        return Resolution::rejected(incoming.clone(), RejectReason::DeletedConcurrently);
    }

    let theirs: Vec<&FieldAttributes> = concurrent
        .iter()
        .filter_map(|op| match &op.kind {
            OperationKind::Update {
                field_id: Some(id),
                updates,
            } if id == field_id => Some(updates),
            _ => None,
        })
        .collect();

    if theirs.is_empty() {
        return Resolution::accepted(incoming.clone());
    }

    Resolution::merged(incoming.with_kind(OperationKind::Update {
        field_id: Some(field_id.to_string()),
        updates: merge_updates(updates, theirs),
    }))
}

fn resolve_delete(incoming: &Operation, field_id: &str, concurrent: &[&Operation]) -> Resolution {
    let already_deleted = concurrent.iter().any(|op| {
        matches!(&op.kind, OperationKind::Delete { field_id: Some(id) } if id == field_id)
    });

    if already_deleted {
        Resolution::rejected(incoming.clone(), RejectReason::AlreadyDeleted)
    } else {
        Resolution::accepted(incoming.clone())
    }
}

fn resolve_reorder(incoming: &Operation, from_index: i64, to_index: i64, concurrent: &[&Operation]) -> Resolution {
    let mut reorders = concurrent
        .iter()
        .filter_map(|op| match op.kind {
            OperationKind::Reorder {
                from_index,
                to_index,
            } => Some((from_index, to_index)),
            _ => None,
        })
        .peekable();

    if reorders.peek().is_none() {
        return Resolution::accepted(incoming.clone());
    }

    let (from_index, to_index) = reorders.fold((from_index, to_index), |(from, to), (their_from, their_to)| {
        transform_move(from, to, their_from, their_to)
    });

    Resolution::merged(incoming.with_kind(OperationKind::Reorder {
        from_index,
        to_index,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;
    use serde_json::{json, Value};

    fn attrs(value: Value) -> FieldAttributes {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    fn resolve_with(incoming: &Operation, concurrent: &[Operation]) -> Resolution {
        let refs: Vec<&Operation> = concurrent.iter().collect();
        resolve(incoming, &refs)
    }

    #[test]
    fn test_add_without_conflict() {
        let incoming = Operation::add("alice", 1000, Field::new("f9"), 2);
        let other = Operation::add("bob", 1000, Field::new("f8"), 3);

        let resolution = resolve_with(&incoming, &[other]);
        assert_eq!(resolution.accepted, vec![incoming]);
    }

    #[test]
    fn test_add_shifts_by_conflict_count() {
        let incoming = Operation::add("alice", 1000, Field::new("f9"), 2);
        let concurrent = vec![
            Operation::add("bob", 990, Field::new("f7"), 2),
            Operation::add("carol", 995, Field::new("f8"), 2),
            Operation::reorder("dave", 1000, 2, 0),
        ];

        let resolution = resolve_with(&incoming, &concurrent);
        assert_eq!(resolution.outcome(), Some(Outcome::Merged));
        assert!(matches!(resolution.merged[0].kind, OperationKind::Add { position: 4, .. }));
        assert_eq!(resolution.merged[0].id, incoming.id);
    }

    #[test]
    fn test_update_missing_field_id() {
        let incoming = Operation::new(
            "alice",
            1000,
            OperationKind::Update {
                field_id: None,
                updates: FieldAttributes::new(),
            },
        );

        let resolution = resolve_with(&incoming, &[]);
        assert_eq!(resolution.rejected.len(), 1);
        assert_eq!(resolution.rejected[0].reason.code(), "invalid-operation");
    }

    #[test]
    fn test_update_rejected_by_concurrent_delete() {
        let incoming = Operation::update("alice", 1040, "f1", attrs(json!({"label": "x"})));
        let concurrent = vec![
            Operation::update("carol", 1010, "f1", attrs(json!({"required": true}))),
            Operation::delete("bob", 1000, "f1"),
        ];

        let resolution = resolve_with(&incoming, &concurrent);
        assert_eq!(resolution.rejected[0].reason, RejectReason::DeletedConcurrently);
        assert_eq!(resolution.rejected[0].operation, Some(incoming));
    }

    #[test]
    fn test_update_delete_of_other_field_is_ignored() {
        let incoming = Operation::update("alice", 1040, "f1", attrs(json!({"label": "x"})));
        let concurrent = vec![Operation::delete("bob", 1000, "f2")];

        let resolution = resolve_with(&incoming, &concurrent);
        assert_eq!(resolution.outcome(), Some(Outcome::Accepted));
    }

    #[test]
    fn test_update_merges_concurrent_updates() {
        let incoming = Operation::update("alice", 1040, "f1", attrs(json!({"label": "mine"})));
        let concurrent = vec![
            Operation::update("bob", 1000, "f1", attrs(json!({"label": "bob", "required": true}))),
            Operation::update("carol", 1010, "f1", attrs(json!({"required": false, "help": "?"}))),
            Operation::update("dave", 1020, "f2", attrs(json!({"hidden": true}))),
        ];

        let resolution = resolve_with(&incoming, &concurrent);
        let OperationKind::Update { updates, .. } = &resolution.merged[0].kind else {
            panic!("expected merged update");
        };
        assert_eq!(updates, &attrs(json!({"label": "mine", "required": true, "help": "?"})));
    }

    #[test]
    fn test_delete_missing_field_id() {
        let incoming = Operation::new("alice", 1000, OperationKind::Delete { field_id: None });
        let resolution = resolve_with(&incoming, &[]);
        assert!(resolution.is_rejected());
    }

    #[test]
    fn test_delete_wins_over_update() {
        let incoming = Operation::delete("alice", 1000, "f1");
        let concurrent = vec![Operation::update("bob", 1000, "f1", attrs(json!({"label": "x"})))];

        let resolution = resolve_with(&incoming, &concurrent);
        assert_eq!(resolution.accepted, vec![incoming]);
    }

    #[test]
    fn test_double_delete_rejected() {
        let incoming = Operation::delete("alice", 1000, "f1");
        let concurrent = vec![Operation::delete("bob", 1000, "f1")];

        let resolution = resolve_with(&incoming, &concurrent);
        assert_eq!(resolution.rejected[0].reason, RejectReason::AlreadyDeleted);
    }

    #[test]
    fn test_reject_duplicate_reason_by_kind() {
        let delete = Operation::delete("bob", 1000, "f1");
        let resolution = reject_duplicate(&delete);
        assert_eq!(resolution.rejected[0].reason, RejectReason::AlreadyDeleted);
        assert_eq!(resolution.rejected[0].operation, Some(delete));

        let reorder = Operation::reorder("bob", 1000, 0, 2);
        assert_eq!(
            reject_duplicate(&reorder).rejected[0].reason,
            RejectReason::AlreadyApplied
        );
    }

    #[test]
    fn test_reorder_without_concurrent_reorders() {
        let incoming = Operation::reorder("alice", 1000, 0, 3);
        let concurrent = vec![Operation::add("bob", 1000, Field::new("f1"), 0)];

        let resolution = resolve_with(&incoming, &concurrent);
        assert_eq!(resolution.accepted, vec![incoming]);
    }

    #[test]
    fn test_reorder_folds_in_order() {
        let incoming = Operation::reorder("alice", 1000, 3, 4);
        let concurrent = vec![
            Operation::reorder("bob", 1000, 1, 6),
            Operation::reorder("carol", 1000, 6, 0),
        ];

        // (3,4) vs (1,6) -> (2,3); (2,3) vs (6,0) -> (3,4)
        let resolution = resolve_with(&incoming, &concurrent);
        assert_eq!(
            resolution.merged[0].kind,
            OperationKind::Reorder {
                from_index: 3,
                to_index: 4
            }
        );
    }
}
