//! Single-owner conflict-resolution engine.
//!
//! [`ConflictEngine`] owns the [`HistoryStore`] and the [`EngineConfig`] and runs the
//! full resolve → apply → record sequence. Recording needs `&mut self`, so one
//! engine value can only be driven by one caller at a time; hosts that resolve from
//! several threads should use [`FormHub`](crate::hub::FormHub) instead.
//!
//! # Examples
//!
//! ```
//! use form_merge::{ConflictEngine, Field, Operation, Outcome};
//!
//! let mut engine = ConflictEngine::new();
//! let fields = vec![Field::new("name"), Field::new("email")];
//!
//! let first = engine.submit("form-1", Operation::delete("bob", 1000, "email"), &fields);
//! assert_eq!(first.resolution.outcome(), Some(Outcome::Accepted));
//!
//! let second = engine.submit("form-1", Operation::delete("alice", 1030, "email"), &first.fields);
//! assert_eq!(second.resolution.outcome(), Some(Outcome::Rejected));
//! assert_eq!(second.fields, first.fields);
//! ```

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{ResolveError, Result};
use crate::history::HistoryStore;
use crate::merge::{apply_operations, find_concurrent, reject_duplicate, resolve};
use crate::types::{Field, Operation, OperationEnvelope, RejectReason, Rejection, Resolution};

/// Resolution of one submitted operation and the snapshot after applying it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOutcome {
    /// How the operation was resolved
    pub resolution: Resolution,
    /// Field snapshot after applying `accepted ∪ merged`, positions renormalized
    pub fields: Vec<Field>,
}

/// Resolve `incoming` against `history` and log the outcome.
pub(crate) fn resolve_against<'a, I>(
    form_id: &str,
    history: I,
    incoming: &Operation,
    window_ms: i64,
) -> Resolution
where
    I: IntoIterator<Item = &'a Operation>,
{
    let history: Vec<&Operation> = history.into_iter().collect();
    if history.iter().any(|op| op.id == incoming.id) {
        let resolution = reject_duplicate(incoming);
        warn!(
            form_id,
            op_id = %incoming.id,
            kind = incoming.kind.name(),
            actor = %incoming.actor_id,
            "operation id already recorded, rejecting retry"
        );
        return resolution;
    }

    let concurrent = find_concurrent(history.iter().copied(), incoming, window_ms);
    let resolution = resolve(incoming, &concurrent);

    match resolution.rejected.first() {
        Some(rejection) => warn!(
            form_id,
            op_id = %incoming.id,
            kind = incoming.kind.name(),
            actor = %incoming.actor_id,
            reason = %rejection.reason,
            "operation rejected"
        ),
        None => debug!(
            form_id,
            op_id = %incoming.id,
            kind = incoming.kind.name(),
            concurrent = concurrent.len(),
            outcome = ?resolution.outcome(),
            "operation resolved"
        ),
    }

    resolution
}

/// Conflict-resolution engine for many forms, owned by a single caller.
#[derive(Debug, Clone, Default)]
pub struct ConflictEngine {
    config: EngineConfig,
    history: HistoryStore,
}

impl ConflictEngine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Config`](crate::ResolveError::Config) when the
    /// configuration is out of range.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            history: HistoryStore::new(config.history_capacity),
            config,
        })
    }

    /// Engine configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recorded history of every form.
    #[inline]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Decide the fate of `incoming` without recording anything.
    ///
    /// Deterministic: the same history and operation always give the same
    /// resolution.
    pub fn resolve(&self, form_id: &str, incoming: &Operation) -> Resolution {
        let history = self.history.history(form_id).into_iter().flatten();
        resolve_against(form_id, history, incoming, self.config.concurrency_window_ms)
    }

    /// Parse an inbound JSON operation and resolve it.
    ///
    /// A value with an unknown `type` is rejected with
    /// [`RejectReason::UnsupportedType`]; one with a missing or malformed payload is
    /// rejected with [`RejectReason::InvalidOperation`]. Either rejection carries the
    /// submitted id, actor, timestamp and type, with no typed operation.
    ///
    /// # Errors
    ///
    /// [`ResolveError::InvalidOperation`] only when the value has no usable
    /// `actorId` or `timestamp`, so there is no one to send a rejection to.
    pub fn resolve_json(&self, form_id: &str, value: &Value) -> Result<Resolution> {
        let envelope = OperationEnvelope::from_json(value)?;

        let reason = match envelope.parse_operation(value) {
            Ok(incoming) => return Ok(self.resolve(form_id, &incoming)),
            Err(ResolveError::UnsupportedType(kind)) => RejectReason::UnsupportedType(kind),
            Err(ResolveError::InvalidOperation(detail)) => RejectReason::InvalidOperation(detail),
            Err(e) => return Err(e),
        };

        warn!(
            form_id,
            op_id = %envelope.id,
            kind = envelope.kind.as_deref().unwrap_or_default(),
            actor = %envelope.actor_id,
            reason = %reason,
            "operation rejected before resolution"
        );
        Ok(Resolution {
            rejected: vec![Rejection::unparsed(envelope, reason)],
            ..Resolution::default()
        })
    }

    /// Record the accepted and merged operations of `resolution`.
    pub fn record(&mut self, form_id: &str, resolution: &Resolution) {
        self.history.record_resolution(form_id, resolution);
    }

    /// Resolve `incoming`, apply the result to `fields` and record it.
    pub fn submit(&mut self, form_id: &str, incoming: Operation, fields: &[Field]) -> SubmitOutcome {
        let resolution = self.resolve(form_id, &incoming);
        let fields = apply_operations(fields, resolution.resolved_operations());
        self.record(form_id, &resolution);
        SubmitOutcome { resolution, fields }
    }

    /// Evict operations with `timestamp <= cutoff`.
    pub fn cleanup(&mut self, cutoff: i64) -> usize {
        self.history.cleanup(cutoff)
    }

    /// Evict operations older than the configured maximum age.
    pub fn cleanup_expired(&mut self, now_ms: i64) -> usize {
        self.history
            .cleanup_older_than(self.config.history_max_age_ms, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OperationKind, Outcome};
    use serde_json::json;

    #[test]
    fn test_resolve_does_not_record() {
        let engine = ConflictEngine::new();
        let op = Operation::delete("alice", 1000, "f1");
        let _ = engine.resolve("form-1", &op);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_submit_records_merged_version() {
        let mut engine = ConflictEngine::new();
        let fields = vec![Field::new("a"), Field::new("b"), Field::new("c")];

        engine.submit("form-1", Operation::add("bob", 1000, Field::new("x"), 1), &fields);
        let outcome = engine.submit("form-1", Operation::add("alice", 1010, Field::new("y"), 1), &fields);

        assert_eq!(outcome.resolution.outcome(), Some(Outcome::Merged));
        let recorded = engine.history().recent("form-1");
        assert!(matches!(recorded[1].kind, OperationKind::Add { position: 2, .. }));
    }

    #[test]
    fn test_submit_rejected_keeps_snapshot_and_history() {
        let mut engine = ConflictEngine::new();
        let fields = vec![Field::new("f1")];

        let first = engine.submit("form-1", Operation::delete("bob", 1000, "f1"), &fields);
        let update = Operation::update("alice", 1040, "f1", json!({"label": "x"}).as_object().unwrap().clone());
        let second = engine.submit("form-1", update, &first.fields);

        assert!(second.resolution.is_rejected());
        assert_eq!(engine.history().len("form-1"), 1);
    }

    #[test]
    fn test_forms_do_not_interfere() {
        let mut engine = ConflictEngine::new();
        engine.submit("form-a", Operation::delete("bob", 1000, "f1"), &[]);

        let resolution = engine.resolve("form-b", &Operation::delete("alice", 1000, "f1"));
        assert_eq!(resolution.outcome(), Some(Outcome::Accepted));
    }

    #[test]
    fn test_custom_window() {
        let config = EngineConfig::default().with_concurrency_window_ms(10);
        let mut engine = ConflictEngine::with_config(config).unwrap();
        engine.submit("form-1", Operation::delete("bob", 1000, "f1"), &[]);

        let resolution = engine.resolve("form-1", &Operation::delete("alice", 1050, "f1"));
        assert_eq!(resolution.outcome(), Some(Outcome::Accepted));
    }

    #[test]
    fn test_invalid_config() {
        let config = EngineConfig::default().with_history_capacity(0);
        assert!(ConflictEngine::with_config(config).is_err());
    }

    #[test]
    fn test_resolve_json_unsupported_type() {
        let engine = ConflictEngine::new();
        let resolution = engine
            .resolve_json(
                "form-1",
                &json!({"id": "op-9", "actorId": "alice", "timestamp": 1, "type": "rename"}),
            )
            .unwrap();

        assert!(resolution.is_rejected());
        let rejection = &resolution.rejected[0];
        assert_eq!(rejection.reason, RejectReason::UnsupportedType("rename".to_string()));
        assert_eq!(rejection.id.as_str(), "op-9");
        assert_eq!(rejection.actor_id, "alice");
        assert_eq!(rejection.kind, "rename");
        assert!(rejection.operation.is_none());
    }

    #[test]
    fn test_resolve_json_missing_payload_field() {
        let engine = ConflictEngine::new();
        let resolution = engine
            .resolve_json(
                "form-1",
                &json!({
                    "id": "op-4",
                    "actorId": "bob",
                    "timestamp": 20,
                    "type": "add",
                    "field": {"id": "f1"}
                }),
            )
            .unwrap();

        let rejection = &resolution.rejected[0];
        assert_eq!(rejection.reason.code(), "invalid-operation");
        assert_eq!(rejection.id.as_str(), "op-4");
        assert_eq!(rejection.timestamp, 20);
        assert_eq!(rejection.kind, "add");
        assert!(rejection.operation.is_none());
    }

    #[test]
    fn test_resolve_json_missing_type() {
        let engine = ConflictEngine::new();
        let resolution = engine
            .resolve_json("form-1", &json!({"actorId": "bob", "timestamp": 20}))
            .unwrap();

        assert_eq!(resolution.rejected[0].reason.code(), "invalid-operation");
        assert_eq!(resolution.rejected[0].kind, "");
    }

    #[test]
    fn test_resolve_json_without_envelope_is_error() {
        let engine = ConflictEngine::new();
        let result = engine.resolve_json("form-1", &json!({"type": "delete", "fieldId": "f1"}));
        assert!(matches!(result, Err(ResolveError::InvalidOperation(_))));
    }

    #[test]
    fn test_retry_of_recorded_operation_rejected() {
        let mut engine = ConflictEngine::new();
        let fields = vec![Field::new("a"), Field::new("b")];
        let add = Operation::add("alice", 1000, Field::new("x"), 0);

        let first = engine.submit("form-1", add.clone(), &fields);
        assert_eq!(first.resolution.outcome(), Some(Outcome::Accepted));

        let second = engine.submit("form-1", add, &first.fields);
        assert_eq!(second.resolution.rejected[0].reason, RejectReason::AlreadyApplied);
        assert_eq!(second.fields, first.fields);
        assert_eq!(engine.history().len("form-1"), 1);
    }

    #[test]
    fn test_cleanup_expired() {
        let config = EngineConfig::default().with_history_max_age_ms(1_000);
        let mut engine = ConflictEngine::with_config(config).unwrap();
        engine.submit("form-1", Operation::delete("bob", 1_000, "f1"), &[]);
        engine.submit("form-1", Operation::delete("bob", 5_000, "f2"), &[]);

        assert_eq!(engine.cleanup_expired(5_500), 1);
        assert_eq!(engine.history().len("form-1"), 1);
        assert_eq!(engine.cleanup(10_000), 1);
        assert!(engine.history().is_empty());
    }
}
