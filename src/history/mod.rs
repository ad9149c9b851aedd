//! Operation history: the only mutable state of the engine.
//!
//! - [`OperationHistory`] - bounded, ordered log for one form
//! - [`HistoryStore`] - owned map of form id to history, with age-based cleanup

mod janitor;
mod log;
mod store;

pub use log::OperationHistory;
pub use store::HistoryStore;
