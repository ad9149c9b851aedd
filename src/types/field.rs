//! Form field records and the ordered field snapshot.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Partial or full attribute map of a field (label, type, required, options, ...).
pub type FieldAttributes = Map<String, Value>;

/// Attribute keys owned by the engine rather than by field updates.
const RESERVED_KEYS: [&str; 2] = ["id", "position"];

/// A single field of a form.
///
/// `position` is advisory while operations are in flight; after
/// [`apply_operations`](crate::merge::apply_operations) it always equals the field's
/// index in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Stable field identifier
    pub id: String,

    /// Index of the field in its form
    #[serde(default)]
    pub position: usize,

    /// Every other attribute of the field
    #[serde(flatten)]
    pub attributes: FieldAttributes,
}

impl Field {
    /// Create a field with no attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: 0,
            attributes: Map::new(),
        }
    }

    /// Set a single attribute, builder style.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Shallow-merge `updates` into this field. Later values win; `id` and
    /// `position` are never taken from an update.
    pub fn apply_updates(&mut self, updates: &FieldAttributes) {
        for (key, value) in updates {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            self.attributes.insert(key.clone(), value.clone());
        }
    }
}

/// Ordered field list of a form.
pub type FieldSnapshot = Vec<Field>;
