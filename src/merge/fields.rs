//! Fill-gap merging of concurrent field updates.

use crate::types::FieldAttributes;

/// Merge concurrent partial updates into `incoming`.
///
/// Starts from a copy of `incoming` and, for each map of `concurrent` in order,
/// fills in the keys still missing. Keys of `incoming` are never overwritten, and
/// among the concurrent maps the earliest one wins.
///
/// # Examples
///
/// ```
/// use form_merge::merge::merge_updates;
/// use serde_json::json;
///
/// let incoming = json!({"label": "Email"});
/// let theirs = json!({"label": "E-mail", "required": true});
///
/// let merged = merge_updates(
///     incoming.as_object().unwrap(),
///     [theirs.as_object().unwrap()],
/// );
/// assert_eq!(merged["label"], "Email");
/// assert_eq!(merged["required"], true);
/// ```
pub fn merge_updates<'a, I>(incoming: &FieldAttributes, concurrent: I) -> FieldAttributes
where
    I: IntoIterator<Item = &'a FieldAttributes>,
{
    let mut merged = incoming.clone();
    for updates in concurrent {
        for (key, value) in updates {
            merged
                .entry(key.as_str())
                .or_insert_with(|| value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn attrs(value: Value) -> FieldAttributes {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_no_concurrent_updates() {
        let incoming = attrs(json!({"label": "A"}));
        let merged = merge_updates(&incoming, std::iter::empty());
        assert_eq!(merged, incoming);
    }

    #[test]
    fn test_earlier_concurrent_wins() {
        let incoming = attrs(json!({"label": "A"}));
        let first = attrs(json!({"placeholder": "first"}));
        let second = attrs(json!({"placeholder": "second", "required": false}));

        let merged = merge_updates(&incoming, [&first, &second]);
        assert_eq!(merged, attrs(json!({
            "label": "A",
            "placeholder": "first",
            "required": false
        })));
    }

    #[test]
    fn test_incoming_null_is_kept() {
        let incoming = attrs(json!({"placeholder": null}));
        let theirs = attrs(json!({"placeholder": "x"}));

        let merged = merge_updates(&incoming, [&theirs]);
        assert_eq!(merged["placeholder"], Value::Null);
    }
}
