//! Merge algorithms for concurrent edits of a form's field list.
//!
//! The pieces are pure functions; only [`HistoryStore`](crate::HistoryStore) holds
//! state. A resolution runs as:
//!
//! 1. [`find_concurrent`] picks the history entries concurrent with the incoming
//!    operation (different actor, timestamps within the window)
//! 2. [`resolve`] dispatches on the operation kind and returns a
//!    [`Resolution`](crate::Resolution)
//! 3. [`apply_operations`] applies `accepted ∪ merged` to a field snapshot
//!
//! # Key Functions
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`find_concurrent`] | Wall-clock concurrency detection |
//! | [`resolve`] | Per-kind resolution policy |
//! | [`reject_duplicate`] | Rejection of a retried operation id |
//! | [`transform_move`] | Adjust a move against a concurrent move |
//! | [`merge_updates`] | Fill-gap merge of partial field updates |
//! | [`apply_operations`] | Clamped application plus position renormalization |
//!
//! # Examples
//!
//! ## Concurrent moves
//!
//! ```
//! use form_merge::merge::{find_concurrent, resolve};
//! use form_merge::{Operation, OperationKind};
//!
//! let history = vec![Operation::reorder("bob", 1000, 1, 4)];
//! let incoming = Operation::reorder("alice", 1020, 2, 5);
//!
//! let concurrent = find_concurrent(&history, &incoming, 100);
//! let resolution = resolve(&incoming, &concurrent);
//!
//! assert_eq!(
//!     resolution.merged[0].kind,
//!     OperationKind::Reorder { from_index: 1, to_index: 5 }
//! );
//! ```
//!
//! ## Concurrent additions at the same slot
//!
//! ```
//! use form_merge::merge::{find_concurrent, resolve};
//! use form_merge::{Field, Operation, OperationKind};
//!
//! let history = vec![Operation::add("bob", 1000, Field::new("f1"), 2)];
//! let incoming = Operation::add("alice", 1050, Field::new("f2"), 2);
//!
//! let resolution = resolve(&incoming, &find_concurrent(&history, &incoming, 100));
//! assert!(matches!(resolution.merged[0].kind, OperationKind::Add { position: 3, .. }));
//! ```

pub mod apply;
pub mod concurrency;
pub mod fields;
pub mod strategy;
pub mod transform;

pub use apply::{apply_operation, apply_operations, renormalize};
pub use concurrency::{find_concurrent, is_concurrent};
pub use fields::merge_updates;
pub use strategy::{reject_duplicate, resolve};
pub use transform::transform_move;
