//! # Error Boundary Tests
//!
//! Status write failures, the controller entry point and the per-resource
//! requeue backoff applied by the error policy.

mod common;

use common::*;
use kube::runtime::controller::Action;
use s3_copy_controller::controller::reconciler::{reconcile, ReconcileOutcome, ReconcilerError};
use s3_copy_controller::provider::Operation;
use s3_copy_controller::runtime::error_policy::handle_reconciliation_error;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_status_write_failure_after_store_is_an_error() {
    let harness = Harness::new();
    harness.store.fail_status.store(true, Ordering::SeqCst);
    harness
        .store
        .insert(with_finalizer(copy_request("settings", "delete")));

    let err = harness
        .reconciler
        .reconcile_key(&Harness::key("settings"))
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcilerError::StatusPersist(_)));
    assert_eq!(harness.backend.calls_of(Operation::Store), 1);
    // No success event when the status could not be recorded
    assert!(harness.events.all().is_empty());
}

#[tokio::test]
async fn test_status_write_failure_after_failed_store_is_an_error() {
    let harness = Harness::without_credentials();
    harness.store.fail_status.store(true, Ordering::SeqCst);
    harness
        .store
        .insert(with_finalizer(copy_request("settings", "delete")));

    let err = harness
        .reconciler
        .reconcile_key(&Harness::key("settings"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "status");
    assert_eq!(harness.events.reasons(), vec!["Failed".to_string()]);
}

#[tokio::test]
async fn test_unchanged_failed_status_is_not_rewritten() {
    let harness = Harness::without_credentials();
    let mut manifest = manifest("settings", "delete");
    manifest["status"] = serde_json::json!({ "synced": false, "reference": "" });
    harness.store.insert(with_finalizer(from_manifest(manifest)));
    harness.store.fail_status.store(true, Ordering::SeqCst);

    let outcome = harness
        .reconciler
        .reconcile_key(&Harness::key("settings"))
        .await
        .unwrap();

    assert_eq!(outcome, ReconcileOutcome::StoreFailed);
    assert!(harness.store.status_updates().is_empty());
}

#[tokio::test]
async fn test_reconcile_entry_point_waits_for_change() {
    let harness = Harness::new();
    let resource = with_finalizer(copy_request("settings", "delete"));
    harness.store.insert(resource.clone());
    let ctx = Arc::new(harness.reconciler.clone());

    let action = reconcile(Arc::new(resource), ctx).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(harness.backend.calls_of(Operation::Store), 1);
}

#[tokio::test]
async fn test_error_policy_backs_off_per_resource() {
    let harness = Harness::new();
    let ctx = Arc::new(harness.reconciler.clone());
    let first = Arc::new(copy_request("first", "delete"));
    let second = Arc::new(copy_request("second", "delete"));
    let err = ReconcilerError::Fetch(anyhow::anyhow!("apiserver unavailable"));

    let delays: Vec<Action> = (0..4)
        .map(|_| handle_reconciliation_error(first.clone(), &err, ctx.clone()))
        .collect();
    assert_eq!(
        delays,
        vec![
            Action::requeue(Duration::from_secs(5)),
            Action::requeue(Duration::from_secs(5)),
            Action::requeue(Duration::from_secs(10)),
            Action::requeue(Duration::from_secs(15)),
        ]
    );

    // Another resource starts from the minimum
    assert_eq!(
        handle_reconciliation_error(second, &err, ctx.clone()),
        Action::requeue(Duration::from_secs(5))
    );

    let states = ctx.backoff_states.lock().unwrap();
    assert_eq!(states["default/first"].error_count, 4);
    assert_eq!(states["default/second"].error_count, 1);
}

#[tokio::test]
async fn test_successful_pass_resets_backoff() {
    let harness = Harness::new();
    let resource = Arc::new(with_finalizer(copy_request("settings", "delete")));
    harness.store.insert((*resource).clone());
    let ctx = Arc::new(harness.reconciler.clone());
    let err = ReconcilerError::Fetch(anyhow::anyhow!("apiserver unavailable"));

    handle_reconciliation_error(resource.clone(), &err, ctx.clone());
    handle_reconciliation_error(resource.clone(), &err, ctx.clone());
    reconcile(resource.clone(), ctx.clone()).await.unwrap();

    assert_eq!(
        ctx.backoff_states.lock().unwrap()["default/settings"].error_count,
        0
    );
    assert_eq!(
        handle_reconciliation_error(resource, &err, ctx),
        Action::requeue(Duration::from_secs(5))
    );
}

#[tokio::test]
async fn test_failed_delete_surfaces_through_entry_point() {
    let harness = Harness::new();
    harness.backend.set_unavailable(true);
    let resource = deleting(with_finalizer(copy_request("settings", "delete")));
    harness.store.insert(resource.clone());

    let err = reconcile(Arc::new(resource), Arc::new(harness.reconciler.clone()))
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("delete failed: backend delete failed"));
}
