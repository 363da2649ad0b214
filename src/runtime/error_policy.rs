//! # Error Policy
//!
//! Requeue decisions for failed reconciliations and handling of watch stream
//! errors.

use crate::cluster::ResourceKey;
use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::CopyRequest;
use crate::observability::metrics;
use kube::runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Requeue a failed resource with per-resource Fibonacci backoff
///
/// The counter is keyed by `namespace/name`, so one failing resource never
/// slows down retries of another. It is reset by the next successful pass.
pub fn handle_reconciliation_error(
    obj: Arc<CopyRequest>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let key = ResourceKey::of(&obj);

    let error_span = tracing::error_span!(
        "controller.watch.reconciliation_error",
        resource.name = key.name.as_str(),
        resource.namespace = key.namespace.as_str(),
        error.kind = error.kind(),
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}: {}", key, error);

    let (backoff_secs, error_count) = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states
                .entry(key.to_string())
                .or_insert_with(|| ctx.new_backoff_state());
            state.increment_error();
            (state.backoff.next_backoff_seconds(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff states: {}, using maximum backoff", e);
            (ctx.backoff_max_secs, 0)
        }
    };

    let next_attempt = chrono::Utc::now()
        + chrono::Duration::seconds(i64::try_from(backoff_secs).unwrap_or(i64::MAX));
    info!(
        "Retrying {} in {}s (error count: {}, next attempt: {})",
        key,
        backoff_secs,
        error_count,
        next_attempt.to_rfc3339()
    );

    metrics::increment_requeues_total("error-backoff");
    Action::requeue(Duration::from_secs(backoff_secs))
}

/// Broad category of a watch stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorClass {
    /// Credentials rejected (401), usually revoked RBAC or an expired token
    Unauthorized,
    /// Resource version too old (410), expected across restarts
    Expired,
    /// API server throttling or storage re-initializing (429)
    Throttled,
    /// 404, typically a missing CRD
    NotFound,
    Other,
}

/// Classify an error from the controller stream by its rendered text
#[must_use]
pub fn classify_watch_error(error: &str) -> WatchErrorClass {
    // 404 is checked first: a plain-text 404 body surfaces wrapped in WatchFailed
    let not_found =
        error.contains("ObjectNotFound") || error.contains("404") || error.contains("not found");
    if not_found {
        return WatchErrorClass::NotFound;
    }
    if error.contains("401") || error.contains("Unauthorized") {
        return WatchErrorClass::Unauthorized;
    }
    if error.contains("410")
        || error.contains("too old resource version")
        || error.contains("Expired")
        || error.contains("Gone")
    {
        return WatchErrorClass::Expired;
    }
    if error.contains("429")
        || error.contains("storage is (re)initializing")
        || error.contains("TooManyRequests")
    {
        return WatchErrorClass::Throttled;
    }
    WatchErrorClass::Other
}

/// Handle one watch stream error
///
/// Returns `true` when the event should be passed on and `false` when it is
/// dropped so the stream can restart. Throttling doubles `backoff_ms` up to
/// `max_backoff_ms`.
pub async fn handle_watch_stream_error(
    error: &str,
    backoff_ms: &AtomicU64,
    max_backoff_ms: u64,
    restart_delay: Duration,
) -> bool {
    let error_span = tracing::warn_span!("controller.watch.error", error = %error);
    let _error_guard = error_span.enter();

    match classify_watch_error(error) {
        WatchErrorClass::Unauthorized => {
            error!("Watch authentication failed (401 Unauthorized), check the controller ServiceAccount and its RBAC bindings");
            error!("  kubectl auth can-i watch copyrequests.s3-copy.octopilot.io --as=system:serviceaccount:<namespace>:s3-copy-controller --all-namespaces");
            warn!("Waiting {}s before retrying watch", restart_delay.as_secs());
            tokio::time::sleep(restart_delay).await;
            false
        }
        WatchErrorClass::Expired => {
            warn!("Watch resource version expired (410), watch will restart");
            false
        }
        WatchErrorClass::Throttled => {
            let current = backoff_ms.load(Ordering::Relaxed);
            warn!(
                "API server throttling (429), backing off for {}ms before restart",
                current
            );
            tokio::time::sleep(Duration::from_millis(current)).await;
            backoff_ms.store(
                current.saturating_mul(2).min(max_backoff_ms),
                Ordering::Relaxed,
            );
            false
        }
        WatchErrorClass::NotFound => {
            warn!(
                "Resource not found (404), the CopyRequest CRD may be missing: {}",
                error
            );
            true
        }
        WatchErrorClass::Other => {
            error!("Controller stream error: {}", error);
            tokio::time::sleep(restart_delay).await;
            false
        }
    }
}
