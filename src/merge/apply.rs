//! Application of resolved operations to a field snapshot.
//!
//! Every index is clamped before use, so out-of-range or negative input never
//! panics and never silently drops an operation that can still be placed.

use crate::types::{Field, Operation, OperationKind};

/// Clamp a signed index into `0..=max`.
#[inline]
fn clamp_index(index: i64, max: usize) -> usize {
    match usize::try_from(index) {
        Ok(index) => index.min(max),
        Err(_) => 0,
    }
}

/// Apply `ops` in order to a copy of `fields` and renormalize positions.
///
/// - Add inserts `field` at `clamp(position, 0, len)`
/// - Update shallow-merges `updates` into the field with `field_id`
/// - Delete removes the field with `field_id`
/// - Reorder removes at `clamp(from, 0, len - 1)` and reinserts at
///   `clamp(to, 0, len)`, where `len` is the length after removal
///
/// Updates and deletes of unknown fields are no-ops. Afterwards
/// `result[i].position == i` for every `i`.
///
/// # Examples
///
/// ```
/// use form_merge::merge::apply_operations;
/// use form_merge::{Field, Operation};
///
/// let fields = vec![Field::new("a"), Field::new("b"), Field::new("c")];
/// let ops = vec![Operation::reorder("alice", 1, 0, 2)];
///
/// let result = apply_operations(&fields, &ops);
/// let ids: Vec<_> = result.iter().map(|f| f.id.as_str()).collect();
/// assert_eq!(ids, vec!["b", "c", "a"]);
/// assert_eq!(result[2].position, 2);
/// ```
pub fn apply_operations<'a, I>(fields: &[Field], ops: I) -> Vec<Field>
where
    I: IntoIterator<Item = &'a Operation>,
{
    let mut result = fields.to_vec();
    for op in ops {
        apply_operation(&mut result, op);
    }
    renormalize(&mut result);
    result
}

/// Apply one operation in place, without renormalizing.
pub fn apply_operation(fields: &mut Vec<Field>, op: &Operation) {
    match &op.kind {
        OperationKind::Add { field, position } => {
            let index = clamp_index(*position, fields.len());
            fields.insert(index, field.clone());
        }
        OperationKind::Update { field_id, updates } => {
            let Some(field_id) = field_id else { return };
            if let Some(field) = fields.iter_mut().find(|f| &f.id == field_id) {
                field.apply_updates(updates);
            }
        }
        OperationKind::Delete { field_id } => {
            let Some(field_id) = field_id else { return };
            if let Some(index) = fields.iter().position(|f| &f.id == field_id) {
                fields.remove(index);
            }
        }
        OperationKind::Reorder {
            from_index,
            to_index,
        } => {
            if fields.is_empty() {
                return;
            }
            let from = clamp_index(*from_index, fields.len() - 1);
            let moved = fields.remove(from);
            let to = clamp_index(*to_index, fields.len());
            fields.insert(to, moved);
        }
    }
}

/// Set every field's `position` to its index.
pub fn renormalize(fields: &mut [Field]) {
    for (index, field) in fields.iter_mut().enumerate() {
        field.position = index;
    }
}
