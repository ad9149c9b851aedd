//! Outcome of resolving one incoming operation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::operation::{Operation, OperationEnvelope, OperationId};

/// Why an operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "kebab-case")]
pub enum RejectReason {
    /// A field required by the operation's kind is missing, or the payload is malformed.
    InvalidOperation(String),
    /// The operation's `type` tag names a kind the engine does not know.
    UnsupportedType(String),
    /// A concurrent delete removed the field this update targets.
    DeletedConcurrently,
    /// A concurrent delete of the same field was already resolved, or this delete
    /// is a retry of one already recorded.
    AlreadyDeleted,
    /// An operation with the same id is already recorded for the form.
    AlreadyApplied,
}

impl RejectReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::InvalidOperation(_) => "invalid-operation",
            RejectReason::UnsupportedType(_) => "unsupported-type",
            RejectReason::DeletedConcurrently => "deleted-concurrently",
            RejectReason::AlreadyDeleted => "already-deleted",
            RejectReason::AlreadyApplied => "already-applied",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidOperation(detail) => write!(f, "invalid-operation: {}", detail),
            RejectReason::UnsupportedType(kind) => write!(f, "unsupported-type: {}", kind),
            RejectReason::DeletedConcurrently => f.write_str("field was deleted concurrently"),
            RejectReason::AlreadyDeleted => f.write_str("field is already being deleted"),
            RejectReason::AlreadyApplied => f.write_str("operation was already applied"),
        }
    }
}

/// A rejected operation and the reason it was rejected.
///
/// `operation` is `None` when the submitted value could not be turned into a typed
/// [`Operation`]; the identifying envelope fields are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    /// Id of the rejected operation
    pub id: OperationId,
    /// Collaborator who proposed it
    pub actor_id: String,
    /// Its wall-clock timestamp
    pub timestamp: i64,
    /// Wire `type` tag as submitted
    #[serde(rename = "type")]
    pub kind: String,
    /// The operation exactly as submitted, when it parsed
    pub operation: Option<Operation>,
    /// Reason surfaced to the originating client
    pub reason: RejectReason,
}

impl Rejection {
    /// Reject a typed operation.
    pub fn new(op: Operation, reason: RejectReason) -> Self {
        Self {
            id: op.id.clone(),
            actor_id: op.actor_id.clone(),
            timestamp: op.timestamp,
            kind: op.kind.name().to_string(),
            operation: Some(op),
            reason,
        }
    }

    /// Reject a value whose payload could not be parsed.
    pub fn unparsed(envelope: OperationEnvelope, reason: RejectReason) -> Self {
        Self {
            id: envelope.id,
            actor_id: envelope.actor_id,
            timestamp: envelope.timestamp,
            kind: envelope.kind.unwrap_or_default(),
            operation: None,
            reason,
        }
    }
}

/// Which set of a [`Resolution`] the incoming operation landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// Accepted unchanged
    Accepted,
    /// Rejected as a conflict
    Rejected,
    /// Accepted with adjusted parameters
    Merged,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Accepted => "accepted",
            Outcome::Rejected => "rejected",
            Outcome::Merged => "merged",
        })
    }
}

/// Accepted, rejected and merged operations.
///
/// The sets are disjoint. A resolution produced by the engine for a single incoming
/// operation holds it in exactly one set; in `merged` its payload may differ from
/// what was submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Operations accepted unchanged
    pub accepted: Vec<Operation>,
    /// Operations rejected as conflicts
    pub rejected: Vec<Rejection>,
    /// Operations accepted after transformation
    pub merged: Vec<Operation>,
}

impl Resolution {
    /// Resolution accepting `op` unchanged.
    pub fn accepted(op: Operation) -> Self {
        Self {
            accepted: vec![op],
            ..Self::default()
        }
    }

    /// Resolution rejecting `op`.
    pub fn rejected(op: Operation, reason: RejectReason) -> Self {
        Self {
            rejected: vec![Rejection::new(op, reason)],
            ..Self::default()
        }
    }

    /// Resolution carrying a transformed `op`.
    pub fn merged(op: Operation) -> Self {
        Self {
            merged: vec![op],
            ..Self::default()
        }
    }

    /// Outcome of a single-operation resolution. `None` when empty.
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.accepted.is_empty() {
            Some(Outcome::Accepted)
        } else if !self.merged.is_empty() {
            Some(Outcome::Merged)
        } else if !self.rejected.is_empty() {
            Some(Outcome::Rejected)
        } else {
            None
        }
    }

    /// `accepted ∪ merged`, accepted first: what should be applied and recorded.
    pub fn resolved_operations(&self) -> impl Iterator<Item = &Operation> {
        self.accepted.iter().chain(self.merged.iter())
    }

    /// Whether every operation was rejected.
    pub fn is_rejected(&self) -> bool {
        self.accepted.is_empty() && self.merged.is_empty() && !self.rejected.is_empty()
    }
}
