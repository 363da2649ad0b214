//! # Reconcile
//!
//! One reconciliation pass for a CopyRequest key.
//!
//! The resource is always re-read from the store, so a pass acts on current
//! state rather than on the watch event that triggered it.
//!
//! | State                        | Pass                                   |
//! |------------------------------|----------------------------------------|
//! | gone                         | nothing                                |
//! | active, no finalizer         | add finalizer, then store              |
//! | active, finalizer            | store                                  |
//! | deleting, finalizer          | delete or retain, then drop finalizer  |
//! | deleting, no finalizer       | nothing                                |

use crate::cluster::ResourceKey;
use crate::controller::reconciler::finalizer::{add_finalizer, remove_finalizer};
use crate::controller::reconciler::process::{execute, settle};
use crate::controller::reconciler::types::{
    ActionOutcome, ReconcileOutcome, Reconciler, ReconcilerError, SyncAction,
};
use crate::crd::CopyRequest;
use crate::observability::metrics;
use kube::runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, Instrument};

impl Reconciler {
    /// Drive the CopyRequest identified by `key` one step towards its desired state
    pub async fn reconcile_key(
        &self,
        key: &ResourceKey,
    ) -> Result<ReconcileOutcome, ReconcilerError> {
        let Some(resource) = self
            .resources
            .get(key)
            .await
            .map_err(ReconcilerError::Fetch)?
        else {
            debug!("CopyRequest {} not found, nothing to do", key);
            return Ok(ReconcileOutcome::Missing);
        };

        let deleting = resource.is_deleting();
        let has_finalizer = resource.has_finalizer();

        if deleting && !has_finalizer {
            debug!("CopyRequest {} is being deleted without our finalizer", key);
            return Ok(ReconcileOutcome::Released);
        }

        let action = if deleting {
            SyncAction::Delete
        } else {
            SyncAction::Store
        };

        let span = tracing::info_span!(
            "reconcile",
            resource.namespace = key.namespace.as_str(),
            resource.name = key.name.as_str(),
            action = action.as_str()
        );

        async move {
            let resource = if has_finalizer {
                resource
            } else {
                add_finalizer(self, &resource).await?
            };

            self.run_action(&resource, action).await
        }
        .instrument(span)
        .await
    }

    async fn run_action(
        &self,
        resource: &CopyRequest,
        action: SyncAction,
    ) -> Result<ReconcileOutcome, ReconcilerError> {
        info!("Running {} for {}", action, resource.describe());

        let result = execute(self, resource, action).await;
        let settled = settle(self, resource, action, result).await?;

        match (action, settled) {
            (SyncAction::Store, Some(_)) => Ok(ReconcileOutcome::Stored),
            (SyncAction::Store, None) => Ok(ReconcileOutcome::StoreFailed),
            (SyncAction::Delete, outcome) => {
                remove_finalizer(self, resource).await?;
                Ok(match outcome {
                    Some(ActionOutcome::Retained) => ReconcileOutcome::Retained,
                    _ => ReconcileOutcome::Deleted,
                })
            }
        }
    }
}

/// Entry point for the kube controller runtime
///
/// Errors are returned to the runtime, whose error policy requeues with
/// per-resource backoff.
pub async fn reconcile(
    obj: Arc<CopyRequest>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    let key = ResourceKey::of(&obj);
    metrics::increment_reconciliations();

    let result = ctx.reconcile_key(&key).await;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    match result {
        Ok(outcome) => {
            debug!("Reconciled {}: {:?}", key, outcome);
            if ctx.reset_backoff(&key.to_string()) {
                debug!("Reset error backoff for {}", key);
            }
            Ok(Action::await_change())
        }
        Err(err) => {
            metrics::increment_reconciliation_errors();
            Err(err)
        }
    }
}
