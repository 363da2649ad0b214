//! # Types
//!
//! Core types for the reconciler.

use crate::cluster::{ConfigMapLookup, EventSink, ResourceStore, SecretLookup};
use crate::controller::backoff::FibonacciBackoff;
use crate::error::CopyError;
use crate::provider::BackendFactory;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Operation chosen for one reconciliation pass, derived from deletion intent only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Store,
    Delete,
}

impl SyncAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Store => "store",
            SyncAction::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced to the controller runtime, which retries with backoff
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to fetch CopyRequest: {0:#}")]
    Fetch(#[source] anyhow::Error),

    #[error("failed to persist finalizer change: {0:#}")]
    Finalizer(#[source] anyhow::Error),

    #[error("{action} failed: {source}")]
    Action {
        action: SyncAction,
        #[source]
        source: CopyError,
    },

    #[error("failed to persist status: {0:#}")]
    StatusPersist(#[source] anyhow::Error),
}

impl ReconcilerError {
    /// Stable label for logs and metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcilerError::Fetch(_) => "fetch",
            ReconcilerError::Finalizer(_) => "finalizer",
            ReconcilerError::Action { source, .. } => source.kind(),
            ReconcilerError::StatusPersist(_) => "status",
        }
    }
}

/// What a reconciliation pass ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The resource no longer exists
    Missing,
    /// Payload written and status marked synced
    Stored,
    /// Store failed; recorded in status and events, not retried
    StoreFailed,
    /// Object deleted and finalizer removed
    Deleted,
    /// Object kept by the retain policy and finalizer removed
    Retained,
    /// Deleting resource without our finalizer
    Released,
}

/// Result of a successful store or delete action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Stored { bytes: usize },
    Deleted,
    Retained,
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Reconciliation context shared by every invocation
///
/// Collaborators are injected here rather than looked up globally, so the same
/// state machine runs against the API server or against in-memory fakes.
#[derive(Clone)]
pub struct Reconciler {
    pub(crate) resources: Arc<dyn ResourceStore>,
    pub(crate) secrets: Arc<dyn SecretLookup>,
    pub(crate) config_maps: Arc<dyn ConfigMapLookup>,
    pub(crate) backends: Arc<dyn BackendFactory>,
    pub(crate) events: Arc<dyn EventSink>,
    // Per resource (namespace/name), owned by the error policy
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
    pub(crate) backoff_min_secs: u64,
    pub(crate) backoff_max_secs: u64,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("backoff_min_secs", &self.backoff_min_secs)
            .field("backoff_max_secs", &self.backoff_max_secs)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        secrets: Arc<dyn SecretLookup>,
        config_maps: Arc<dyn ConfigMapLookup>,
        backends: Arc<dyn BackendFactory>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            resources,
            secrets,
            config_maps,
            backends,
            events,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
            backoff_min_secs: crate::constants::DEFAULT_ERROR_BACKOFF_MIN_SECS,
            backoff_max_secs: crate::constants::DEFAULT_ERROR_BACKOFF_MAX_SECS,
        }
    }

    /// Override the per-resource error backoff bounds
    #[must_use]
    pub fn with_backoff(mut self, min_secs: u64, max_secs: u64) -> Self {
        self.backoff_min_secs = min_secs;
        self.backoff_max_secs = max_secs;
        self
    }

    /// Fresh backoff state using this reconciler's bounds
    #[must_use]
    pub fn new_backoff_state(&self) -> BackoffState {
        BackoffState::new(self.backoff_min_secs, self.backoff_max_secs)
    }

    /// Forget the error history of a resource after it reconciled cleanly
    pub fn reset_backoff(&self, resource_key: &str) -> bool {
        match self.backoff_states.lock() {
            Ok(mut states) => states
                .get_mut(resource_key)
                .map(|state| {
                    let had_errors = state.error_count > 0;
                    state.reset();
                    had_errors
                })
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}
