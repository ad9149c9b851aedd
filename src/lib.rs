#![warn(missing_docs)]

//! # Form Merge: conflict resolution for collaborative form editing
//!
//! This crate decides what happens when several collaborators edit the same form's
//! field list at the same time. Each proposed edit is an [`Operation`]; the engine
//! compares it with the recent, concurrent history of the form and returns a
//! [`Resolution`] that accepts it unchanged, rejects it, or accepts a transformed
//! ("merged") version. Applying the resolved operations never loses or corrupts the
//! shared field list.
//!
//! ## Overview
//!
//! 1. **Concurrency detection** - operations from other actors within a wall-clock
//!    window (100 ms by default) are treated as concurrent
//! 2. **Per-kind resolution** - Add / Update / Delete / Reorder each have a policy
//! 3. **Index transformation** - concurrent moves are adjusted like operational
//!    transformation
//! 4. **Field-update merging** - concurrent partial updates are fill-gap merged
//! 5. **State application** - clamped insert/remove plus position renormalization
//! 6. **Bounded history** - 1000 operations per form, with age-based cleanup
//!
//! ## Resolution Rules
//!
//! | Incoming | Concurrent with | Result |
//! |----------|-----------------|--------|
//! | Add at `p` | `n` adds at `p` | merged at `p + n` |
//! | Update `f` | delete of `f` | rejected |
//! | Update `f` | updates of `f` | merged, own keys win |
//! | Delete `f` | delete of `f` | rejected |
//! | Reorder | reorders | merged, indices transformed |
//!
//! ## Usage
//!
//! ```
//! use form_merge::{ConflictEngine, Field, Operation, OperationKind};
//!
//! let mut engine = ConflictEngine::new();
//! let fields: Vec<Field> = ["a", "b", "c", "d", "e", "f"].into_iter().map(Field::new).collect();
//!
//! // Bob moves field 1 to 4, Alice concurrently moves field 2 to 5
//! let bob = engine.submit("form-1", Operation::reorder("bob", 1000, 1, 4), &fields);
//! let alice = engine.submit("form-1", Operation::reorder("alice", 1020, 2, 5), &bob.fields);
//!
//! assert_eq!(
//!     alice.resolution.merged[0].kind,
//!     OperationKind::Reorder { from_index: 1, to_index: 5 }
//! );
//! ```
//!
//! Multi-threaded hosts use [`hub::FormHub`], which serializes resolution per form.
//!
//! ## Module Structure
//!
//! - **[types]** - Operations, fields and resolutions
//! - **[error]** - Error types and result handling
//! - **[config]** - Engine configuration
//! - **[history]** - Bounded per-form operation history and cleanup
//! - **[merge]** - Concurrency detection, resolution, transforms and application
//! - **[engine]** - Single-owner engine facade
//! - **[hub]** - Thread-safe per-form registry

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod hub;
pub mod merge;
pub mod types;

pub use config::EngineConfig;
pub use engine::{ConflictEngine, SubmitOutcome};
pub use error::{ResolveError, Result};
pub use history::{HistoryStore, OperationHistory};
pub use hub::{FormHub, FormSession};
pub use types::{
    Field, FieldAttributes, FieldSnapshot, Operation, OperationEnvelope, OperationId,
    OperationKind, Outcome, RejectReason, Rejection, Resolution,
};
