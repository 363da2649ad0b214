//! # Action Processing
//!
//! Runs a store or delete action and settles its result.
//!
//! `execute` performs the action and returns a plain `Result`. `settle` is the
//! single place that result is turned into status, events and the error the
//! runtime sees. It runs on every exit path of `execute`.

use crate::cluster::EventSeverity;
use crate::constants::{REASON_FAILED, REASON_REMOVED, REASON_RETAINED, REASON_SYNCED};
use crate::controller::reconciler::resolve::{resolve_content, resolve_credentials};
use crate::controller::reconciler::status::{persist_status, project};
use crate::controller::reconciler::types::{
    ActionOutcome, Reconciler, ReconcilerError, SyncAction,
};
use crate::crd::{CopyRequest, DeletionPolicy};
use crate::error::CopyError;
use crate::observability::metrics;
use crate::provider::{ConfigData, ObjectStore};
use kube::ResourceExt;
use tracing::{error, info, warn};

/// What `execute` does once the backend is built
enum Step {
    Store(Vec<u8>),
    Delete,
    Retain,
}

/// Perform one action against a freshly built backend
pub(crate) async fn execute(
    ctx: &Reconciler,
    resource: &CopyRequest,
    action: SyncAction,
) -> Result<ActionOutcome, CopyError> {
    // An unusable policy is reported before credentials are looked up
    let policy = match action {
        SyncAction::Delete => Some(resource.deletion_policy()?),
        SyncAction::Store => None,
    };

    let credentials = resolve_credentials(ctx, resource).await?;
    let step = match policy {
        None => Step::Store(resolve_content(ctx, resource).await?),
        Some(DeletionPolicy::Delete) => Step::Delete,
        Some(DeletionPolicy::Retain) => Step::Retain,
    };

    let target = &resource.spec.target;
    let config = ConfigData::new(credentials, target.region.as_str());
    let backend = ctx.backends.create(&config).await?;

    match step {
        Step::Store(payload) => {
            backend
                .store(&payload, target)
                .await
                .map_err(|e| CopyError::backend("store", e))?;
            Ok(ActionOutcome::Stored {
                bytes: payload.len(),
            })
        }
        Step::Delete => {
            backend
                .delete(target)
                .await
                .map_err(|e| CopyError::backend("delete", e))?;
            Ok(ActionOutcome::Deleted)
        }
        Step::Retain => {
            info!(
                "Retaining {}:{} for {} (deletionPolicy: retain)",
                target.bucket,
                target.key,
                resource.name_any()
            );
            Ok(ActionOutcome::Retained)
        }
    }
}

/// Record the result of an action
///
/// Returns `Ok(None)` for a store failure: the failure is visible in status
/// and events but not retried. Delete failures and status write failures
/// are returned as errors.
pub(crate) async fn settle(
    ctx: &Reconciler,
    resource: &CopyRequest,
    action: SyncAction,
    result: Result<ActionOutcome, CopyError>,
) -> Result<Option<ActionOutcome>, ReconcilerError> {
    let status = project(resource, &result);

    match result {
        Ok(outcome) => {
            if let Some(status) = status {
                persist_status(ctx, resource, status).await?;
            }
            record_success(ctx, resource, outcome).await;
            Ok(Some(outcome))
        }
        Err(err) => {
            metrics::increment_action_failures(action.as_str(), err.kind());
            warn!(
                resource.name = resource.name_any().as_str(),
                action = action.as_str(),
                error.kind = err.kind(),
                "{} failed for {}: {}",
                action,
                resource.describe(),
                err
            );

            ctx.events
                .emit(
                    resource,
                    EventSeverity::Warning,
                    REASON_FAILED,
                    &err.to_string(),
                )
                .await;

            if let Some(status) = status {
                if let Err(persist_err) = persist_status(ctx, resource, status).await {
                    error!(
                        "Failed to record {} failure in status of {}: {}",
                        action,
                        resource.name_any(),
                        persist_err
                    );
                    return Err(persist_err);
                }
            }

            match action {
                SyncAction::Delete => Err(ReconcilerError::Action {
                    action,
                    source: err,
                }),
                SyncAction::Store => Ok(None),
            }
        }
    }
}

async fn record_success(ctx: &Reconciler, resource: &CopyRequest, outcome: ActionOutcome) {
    let target = &resource.spec.target;
    let (reason, message) = match outcome {
        ActionOutcome::Stored { bytes } => {
            metrics::increment_objects_stored();
            info!(
                "Stored {} bytes for {} at {}",
                bytes,
                resource.name_any(),
                resource.reference_uri()
            );
            (
                REASON_SYNCED,
                format!("object reference: {}", resource.describe()),
            )
        }
        ActionOutcome::Deleted => {
            metrics::increment_objects_deleted();
            (
                REASON_REMOVED,
                format!("object removed: {}:{}", target.bucket, target.key),
            )
        }
        ActionOutcome::Retained => {
            metrics::increment_objects_retained();
            (
                REASON_RETAINED,
                format!("object retained: {}:{}", target.bucket, target.key),
            )
        }
    };

    ctx.events
        .emit(resource, EventSeverity::Normal, reason, &message)
        .await;
}
