//! # Status Projection
//!
//! Maps the outcome of an action to `status.synced` / `status.reference`
//! and writes it back.

use crate::controller::reconciler::types::{ActionOutcome, Reconciler, ReconcilerError};
use crate::crd::{CopyRequest, CopyRequestStatus};
use crate::error::CopyError;
use kube::ResourceExt;
use tracing::debug;

/// Status to persist for an outcome, `None` when status is left untouched
///
/// Only a store writes status on success. A delete or retain is followed by
/// finalizer removal, after which the resource is gone.
#[must_use]
pub fn project(
    resource: &CopyRequest,
    outcome: &Result<ActionOutcome, CopyError>,
) -> Option<CopyRequestStatus> {
    match outcome {
        Ok(ActionOutcome::Stored { .. }) => {
            Some(CopyRequestStatus::synced(resource.reference_uri()))
        }
        Ok(ActionOutcome::Deleted | ActionOutcome::Retained) => None,
        Err(_) => Some(CopyRequestStatus::failed()),
    }
}

/// Write `status`, skipping the call when nothing changed
pub(crate) async fn persist_status(
    ctx: &Reconciler,
    resource: &CopyRequest,
    status: CopyRequestStatus,
) -> Result<(), ReconcilerError> {
    if resource.status.as_ref() == Some(&status) {
        debug!(
            "Skipping status update for {} - unchanged (synced={})",
            resource.name_any(),
            status.synced
        );
        return Ok(());
    }

    let mut updated = resource.clone();
    updated.status = Some(status);
    ctx.resources
        .update_status(&updated)
        .await
        .map_err(ReconcilerError::StatusPersist)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CopyRequest {
        serde_json::from_value(serde_json::json!({
            "apiVersion": "s3-copy.octopilot.io/v1alpha1",
            "kind": "CopyRequest",
            "metadata": { "name": "settings", "namespace": "default" },
            "spec": {
                "deletionPolicy": "delete",
                "credentials": { "secretRef": { "name": "c", "key": "k" } },
                "target": { "bucket": "b", "region": "us-west-2", "key": "k" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_store_success_projects_reference() {
        let status = project(&request(), &Ok(ActionOutcome::Stored { bytes: 4 })).unwrap();
        assert!(status.synced);
        assert_eq!(status.reference, "s3://b/k");
    }

    #[test]
    fn test_failure_clears_reference() {
        let outcome = Err(CopyError::Credential("key not found creds-key".to_string()));
        let status = project(&request(), &outcome).unwrap();
        assert!(!status.synced);
        assert_eq!(status.reference, "");
    }

    #[test]
    fn test_delete_and_retain_leave_status() {
        assert_eq!(project(&request(), &Ok(ActionOutcome::Deleted)), None);
        assert_eq!(project(&request(), &Ok(ActionOutcome::Retained)), None);
    }
}
