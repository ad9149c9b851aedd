//! Proposed edits to a form's field list.
//!
//! An [`Operation`] is an immutable value: who proposed it, when, and a kind-specific
//! payload in [`OperationKind`]. On the wire it is a flat JSON object with a `type`
//! tag:
//!
//! ```
//! use form_merge::types::{Operation, OperationKind};
//! use serde_json::json;
//!
//! let op = Operation::from_json(&json!({
//!     "id": "op-1",
//!     "actorId": "alice",
//!     "timestamp": 1000,
//!     "type": "reorder",
//!     "fromIndex": 1,
//!     "toIndex": 4
//! }))
//! .unwrap();
//!
//! assert_eq!(op.kind, OperationKind::Reorder { from_index: 1, to_index: 4 });
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::field::{Field, FieldAttributes};
use crate::error::{ResolveError, Result};

/// Wire names of every supported operation kind.
pub const OPERATION_TYPES: [&str; 4] = ["add", "update", "delete", "reorder"];

/// Unique identifier of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        OperationId(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        OperationId(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationId {
    fn from(s: &str) -> Self {
        OperationId(s.to_string())
    }
}

impl From<String> for OperationId {
    fn from(s: String) -> Self {
        OperationId(s)
    }
}

/// Kind-specific payload of an operation.
///
/// `field_id` is optional because a client can send an update or delete without
/// one; resolution rejects such operations as invalid rather than failing to parse.
/// Indices are signed so out-of-range input survives until it is clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OperationKind {
    /// Insert a new field at `position`.
    Add {
        /// Full field record
        field: Field,
        /// Target insertion index
        position: i64,
    },
    /// Change attributes of an existing field.
    Update {
        /// Target field
        #[serde(default)]
        field_id: Option<String>,
        /// Partial attribute map
        #[serde(default)]
        updates: FieldAttributes,
    },
    /// Remove a field.
    Delete {
        /// Target field
        #[serde(default)]
        field_id: Option<String>,
    },
    /// Move the field at `from_index` to `to_index`.
    Reorder {
        /// Source index
        from_index: i64,
        /// Destination index
        to_index: i64,
    },
}

impl OperationKind {
    /// Wire name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Add { .. } => "add",
            OperationKind::Update { .. } => "update",
            OperationKind::Delete { .. } => "delete",
            OperationKind::Reorder { .. } => "reorder",
        }
    }

    /// The field an update or delete targets, if any.
    pub fn field_id(&self) -> Option<&str> {
        match self {
            OperationKind::Update { field_id, .. } | OperationKind::Delete { field_id } => {
                field_id.as_deref()
            }
            OperationKind::Add { .. } | OperationKind::Reorder { .. } => None,
        }
    }
}

/// Identifying fields every inbound operation carries, whatever its kind.
///
/// Parsed before the payload so that an operation with an unknown kind or a
/// malformed payload can still be rejected by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationEnvelope {
    /// Operation identifier, generated when absent on the wire
    #[serde(default = "OperationId::generate")]
    pub id: OperationId,

    /// Collaborator who proposed the edit
    pub actor_id: String,

    /// Wall-clock time of the edit in milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Raw `type` tag, if any
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl OperationEnvelope {
    /// Parse the envelope of an inbound JSON operation.
    ///
    /// # Errors
    ///
    /// [`ResolveError::InvalidOperation`] when `actorId` or `timestamp` is missing
    /// or malformed.
    pub fn from_json(value: &Value) -> Result<Self> {
        OperationEnvelope::deserialize(value)
            .map_err(|e| ResolveError::InvalidOperation(format!("operation envelope: {}", e)))
    }

    /// Parse the kind-specific payload on top of this envelope.
    ///
    /// # Errors
    ///
    /// [`ResolveError::UnsupportedType`] when the `type` tag is unknown, and
    /// [`ResolveError::InvalidOperation`] when it is missing or the payload is malformed.
    pub fn parse_operation(&self, value: &Value) -> Result<Operation> {
        let kind = self
            .kind
            .as_deref()
            .ok_or_else(|| ResolveError::InvalidOperation("missing type".to_string()))?;

        if !OPERATION_TYPES.contains(&kind) {
            return Err(ResolveError::UnsupportedType(kind.to_string()));
        }

        let kind = OperationKind::deserialize(value)
            .map_err(|e| ResolveError::InvalidOperation(format!("{} operation: {}", kind, e)))?;

        Ok(Operation {
            id: self.id.clone(),
            actor_id: self.actor_id.clone(),
            timestamp: self.timestamp,
            kind,
        })
    }
}

/// A single proposed mutation of a form's field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation identifier, generated when absent on the wire
    #[serde(default = "OperationId::generate")]
    pub id: OperationId,

    /// Collaborator who proposed the edit
    pub actor_id: String,

    /// Wall-clock time of the edit in milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Kind and payload
    #[serde(flatten)]
    pub kind: OperationKind,
}

impl Operation {
    /// Create an operation with a generated id.
    pub fn new(actor_id: impl Into<String>, timestamp: i64, kind: OperationKind) -> Self {
        Self {
            id: OperationId::generate(),
            actor_id: actor_id.into(),
            timestamp,
            kind,
        }
    }

    /// Insert `field` at `position`.
    pub fn add(actor_id: impl Into<String>, timestamp: i64, field: Field, position: i64) -> Self {
        Self::new(actor_id, timestamp, OperationKind::Add { field, position })
    }

    /// Update attributes of `field_id`.
    pub fn update(
        actor_id: impl Into<String>,
        timestamp: i64,
        field_id: impl Into<String>,
        updates: FieldAttributes,
    ) -> Self {
        Self::new(
            actor_id,
            timestamp,
            OperationKind::Update {
                field_id: Some(field_id.into()),
                updates,
            },
        )
    }

    /// Delete `field_id`.
    pub fn delete(actor_id: impl Into<String>, timestamp: i64, field_id: impl Into<String>) -> Self {
        Self::new(
            actor_id,
            timestamp,
            OperationKind::Delete {
                field_id: Some(field_id.into()),
            },
        )
    }

    /// Move the field at `from_index` to `to_index`.
    pub fn reorder(actor_id: impl Into<String>, timestamp: i64, from_index: i64, to_index: i64) -> Self {
        Self::new(
            actor_id,
            timestamp,
            OperationKind::Reorder {
                from_index,
                to_index,
            },
        )
    }

    /// Replace the generated id.
    pub fn with_id(mut self, id: impl Into<OperationId>) -> Self {
        self.id = id.into();
        self
    }

    /// Copy of this operation carrying a different payload. Identity, actor and
    /// timestamp are preserved.
    pub fn with_kind(&self, kind: OperationKind) -> Self {
        Self {
            id: self.id.clone(),
            actor_id: self.actor_id.clone(),
            timestamp: self.timestamp,
            kind,
        }
    }

    /// Parse an inbound JSON operation.
    ///
    /// # Errors
    ///
    /// [`ResolveError::UnsupportedType`] when the `type` tag is unknown, and
    /// [`ResolveError::InvalidOperation`] when it is missing or the payload is malformed.
    pub fn from_json(value: &Value) -> Result<Self> {
        OperationEnvelope::from_json(value)?.parse_operation(value)
    }

    /// Encode as wire JSON.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
