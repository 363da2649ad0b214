//! # Finalizer
//!
//! Attaches and clears the controller finalizer. Both changes are persisted
//! before the caller moves on.

use crate::constants::FINALIZER;
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::CopyRequest;
use crate::observability::metrics;
use kube::ResourceExt;
use tracing::info;

/// Add the finalizer and return the stored resource
pub(crate) async fn add_finalizer(
    ctx: &Reconciler,
    resource: &CopyRequest,
) -> Result<CopyRequest, ReconcilerError> {
    let mut updated = resource.clone();
    updated.finalizers_mut().push(FINALIZER.to_string());

    let stored = ctx
        .resources
        .update(&updated)
        .await
        .map_err(ReconcilerError::Finalizer)?;

    metrics::increment_finalizer_operations("add");
    info!("Added finalizer to {}", resource.name_any());
    Ok(stored)
}

/// Remove the finalizer, letting the API server finish the deletion
pub(crate) async fn remove_finalizer(
    ctx: &Reconciler,
    resource: &CopyRequest,
) -> Result<(), ReconcilerError> {
    let mut updated = resource.clone();
    updated.finalizers_mut().retain(|f| f != FINALIZER);

    ctx.resources
        .update(&updated)
        .await
        .map_err(ReconcilerError::Finalizer)?;

    metrics::increment_finalizer_operations("remove");
    info!("Removed finalizer from {}", resource.name_any());
    Ok(())
}
