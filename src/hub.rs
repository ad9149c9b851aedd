//! Per-form serialized state for multi-threaded hosts.
//!
//! Resolving an operation reads the form's history, decides, then appends to it.
//! Two threads doing that for the same form at once would race, so [`FormHub`]
//! keeps one [`FormSession`] per form behind its own mutex: operations on one form
//! are resolved strictly one at a time in lock-acquisition order, while different
//! forms proceed in parallel.
//!
//! Lock order is session first, then the registry. Nothing takes a session lock
//! while holding the registry's write lock, except [`FormHub::cleanup`] which only
//! ever tries it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::engine::{resolve_against, SubmitOutcome};
use crate::error::Result;
use crate::history::OperationHistory;
use crate::merge::{apply_operations, renormalize};
use crate::types::{Field, Operation};

/// Live state of a single form.
///
/// # Invariants
///
/// - `fields[i].position == i` whenever the session lock is released
/// - `history` holds only accepted and merged operations
#[derive(Debug, Clone)]
pub struct FormSession {
    /// Current field snapshot
    pub fields: Vec<Field>,

    /// Resolved operations, bounded by the hub's history capacity
    pub history: OperationHistory,

    /// When this form was last modified
    pub last_sync: SystemTime,
}

impl FormSession {
    fn new(capacity: usize) -> Self {
        Self {
            fields: Vec::new(),
            history: OperationHistory::new(capacity),
            last_sync: SystemTime::now(),
        }
    }
}

/// Thread-safe registry of form sessions.
///
/// Cloning a hub creates another handle to the same registry.
///
/// # Examples
///
/// ```
/// use form_merge::hub::FormHub;
/// use form_merge::{Field, Operation};
///
/// let hub = FormHub::new();
/// hub.load_form("form-1", vec![Field::new("name"), Field::new("email")]);
///
/// let outcome = hub.submit("form-1", Operation::reorder("alice", 1000, 1, 0));
/// let ids: Vec<_> = outcome.fields.iter().map(|f| f.id.as_str()).collect();
/// assert_eq!(ids, vec!["email", "name"]);
/// ```
#[derive(Debug, Clone)]
pub struct FormHub {
    config: EngineConfig,
    /// Form id → session
    forms: Arc<RwLock<HashMap<String, Arc<Mutex<FormSession>>>>>,
}

impl FormHub {
    /// Create an empty hub with the default configuration.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            forms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create an empty hub with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            forms: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Hub configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========== Form Lifecycle ==========

    /// Get or lazily create the session of `form_id`.
    ///
    /// # Arguments
    ///
    /// * `form_id` - Unique form identifier
    ///
    /// # Returns
    ///
    /// An Arc-wrapped Mutex to the form session. A new session starts with no
    /// fields and an empty history sized by the hub's configuration.
    ///
    /// # Note
    ///
    /// The session may be unregistered by [`remove_form`](Self::remove_form) or
    /// [`cleanup`](Self::cleanup) while the caller holds it; writes made through a
    /// stale handle are not seen by later calls.
    pub fn get_or_create_form(&self, form_id: &str) -> Arc<Mutex<FormSession>> {
        if let Some(session) = self.get_form(form_id) {
            return session;
        }

        let capacity = self.config.history_capacity;
        let mut forms = self.forms.write();
        forms
            .entry(form_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(FormSession::new(capacity))))
            .clone()
    }

    /// Get an existing session without creating it.
    pub fn get_form(&self, form_id: &str) -> Option<Arc<Mutex<FormSession>>> {
        self.forms.read().get(form_id).cloned()
    }

    /// Replace the field snapshot of `form_id`, e.g. after loading it from storage.
    ///
    /// # Arguments
    ///
    /// * `form_id` - Form to load, created if absent
    /// * `fields` - Stored field list; positions are renormalized to `0..n`
    ///
    /// # Returns
    ///
    /// Nothing. History is kept when the form already exists.
    pub fn load_form(&self, form_id: &str, mut fields: Vec<Field>) {
        renormalize(&mut fields);
        self.with_live_session(form_id, |session| {
            session.fields = fields;
            session.last_sync = SystemTime::now();
        });
    }

    /// Drop a form and its history. Returns whether it existed.
    pub fn remove_form(&self, form_id: &str) -> bool {
        self.forms.write().remove(form_id).is_some()
    }

    /// Ids of every form in memory, in arbitrary order.
    pub fn list_forms(&self) -> Vec<String> {
        self.forms.read().keys().cloned().collect()
    }

    // ========== Edit Operations ==========

    /// Resolve `incoming` for `form_id`, apply it to the form's snapshot and record
    /// it, all under the form's lock.
    ///
    /// # Arguments
    ///
    /// * `form_id` - Form to edit, created empty if absent
    /// * `incoming` - Operation proposed by a collaborator
    ///
    /// # Returns
    ///
    /// The resolution of `incoming` and the form's field snapshot afterwards. A
    /// rejected operation leaves both snapshot and history untouched, and so does a
    /// retry of an operation id the form already recorded.
    pub fn submit(&self, form_id: &str, incoming: Operation) -> SubmitOutcome {
        self.with_live_session(form_id, |session| {
            Self::submit_locked(&self.config, form_id, session, incoming)
        })
    }

    fn submit_locked(
        config: &EngineConfig,
        form_id: &str,
        session: &mut FormSession,
        incoming: Operation,
    ) -> SubmitOutcome {
        let resolution = resolve_against(
            form_id,
            &session.history,
            &incoming,
            config.concurrency_window_ms,
        );

        if resolution.is_rejected() {
            return SubmitOutcome {
                resolution,
                fields: session.fields.clone(),
            };
        }

        let fields = apply_operations(&session.fields, resolution.resolved_operations());
        for op in resolution.resolved_operations() {
            session.history.record(form_id, op.clone());
        }
        session.fields = fields.clone();
        session.last_sync = SystemTime::now();

        SubmitOutcome { resolution, fields }
    }

    /// Run `f` on the registered session of `form_id`, creating it if absent.
    ///
    /// The session can be unregistered between looking it up and locking it; the
    /// registration is checked again under the lock and the lookup retried, so `f`
    /// never writes into a session no later call can see.
    fn with_live_session<R>(&self, form_id: &str, f: impl FnOnce(&mut FormSession) -> R) -> R {
        loop {
            let session = self.get_or_create_form(form_id);
            let mut guard = session.lock();

            let registered = self
                .forms
                .read()
                .get(form_id)
                .is_some_and(|current| Arc::ptr_eq(current, &session));
            if registered {
                return f(&mut *guard);
            }

            trace!(form_id, "form unregistered while waiting for its lock, retrying");
        }
    }

    // ========== Query Methods ==========

    /// Current field snapshot of `form_id`.
    pub fn snapshot(&self, form_id: &str) -> Option<Vec<Field>> {
        self.get_form(form_id).map(|session| session.lock().fields.clone())
    }

    /// Recorded history of `form_id`, oldest first.
    pub fn history(&self, form_id: &str) -> Vec<Operation> {
        self.get_form(form_id)
            .map(|session| session.lock().history.to_vec())
            .unwrap_or_default()
    }

    /// Evict history entries with `timestamp <= cutoff` from every form.
    ///
    /// A form whose history this pass empties is unregistered together with its
    /// field snapshot; hosts reload it with [`load_form`](Self::load_form) before the
    /// next edit. Forms that had no history to begin with are kept. A form that is
    /// locked or edited again before it can be unregistered is kept too.
    ///
    /// Returns the number of operations evicted.
    pub fn cleanup(&self, cutoff: i64) -> usize {
        let sessions: Vec<(String, Arc<Mutex<FormSession>>)> = self
            .forms
            .read()
            .iter()
            .map(|(id, session)| (id.clone(), session.clone()))
            .collect();

        let mut evicted = 0;
        let mut emptied = Vec::new();
        for (form_id, session) in sessions {
            let mut guard = session.lock();
            let n = guard.history.evict_through(cutoff);
            if n > 0 && guard.history.is_empty() {
                drop(guard);
                emptied.push((form_id, session));
            }
            evicted += n;
        }

        let mut removed = 0;
        if !emptied.is_empty() {
            let mut forms = self.forms.write();
            for (form_id, session) in &emptied {
                let still_empty = forms
                    .get(form_id)
                    .is_some_and(|current| Arc::ptr_eq(current, session))
                    && session.try_lock().is_some_and(|s| s.history.is_empty());
                if still_empty {
                    forms.remove(form_id);
                    removed += 1;
                }
            }
        }

        if evicted > 0 {
            debug!(cutoff, evicted, removed, "hub history cleanup");
        }
        evicted
    }
}

impl Default for FormHub {
    fn default() -> Self {
        Self::new()
    }
}
