//! Core value types: operations, fields and resolutions.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Operation`] | A proposed edit with actor, timestamp and payload |
//! | [`OperationKind`] | Add / Update / Delete / Reorder payloads |
//! | [`Field`] | One field of a form |
//! | [`Resolution`] | Accepted, rejected and merged operations |

mod field;
mod operation;
mod resolution;

pub use field::{Field, FieldAttributes, FieldSnapshot};
pub use operation::{Operation, OperationEnvelope, OperationId, OperationKind, OPERATION_TYPES};
pub use resolution::{Outcome, RejectReason, Rejection, Resolution};
