//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `s3_copy_reconciliations_total` - Total number of reconciliations
//! - `s3_copy_reconciliation_errors_total` - Reconciliations that returned an error to the runtime
//! - `s3_copy_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `s3_copy_objects_stored_total` - Objects written to the backend
//! - `s3_copy_objects_deleted_total` - Objects removed from the backend
//! - `s3_copy_objects_retained_total` - Deletions skipped by `deletionPolicy: retain`
//! - `s3_copy_action_failures_total` - Failed actions by action and error kind
//! - `s3_copy_finalizer_operations_total` - Finalizer add/remove operations
//! - `s3_copy_requeues_total` - Requeues by reason
//! - `s3_copy_backend_operations_total` - Backend calls by backend
//! - `s3_copy_backend_operation_duration_seconds` - Backend call latency by backend
//! - `s3_copy_backend_operation_errors_total` - Backend call errors by backend

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "s3_copy_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "s3_copy_reconciliation_errors_total",
        "Total number of reconciliations that returned an error",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "s3_copy_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static OBJECTS_STORED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "s3_copy_objects_stored_total",
        "Total number of objects written to the backend",
    )
    .expect("Failed to create OBJECTS_STORED_TOTAL metric - this should never happen")
});

static OBJECTS_DELETED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "s3_copy_objects_deleted_total",
        "Total number of objects removed from the backend",
    )
    .expect("Failed to create OBJECTS_DELETED_TOTAL metric - this should never happen")
});

static OBJECTS_RETAINED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "s3_copy_objects_retained_total",
        "Total number of deletions skipped because of the retain policy",
    )
    .expect("Failed to create OBJECTS_RETAINED_TOTAL metric - this should never happen")
});

static ACTION_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "s3_copy_action_failures_total",
            "Total number of failed store/delete actions by action and error kind",
        ),
        &["action", "kind"],
    )
    .expect("Failed to create ACTION_FAILURES_TOTAL metric - this should never happen")
});

static FINALIZER_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "s3_copy_finalizer_operations_total",
            "Total number of finalizer add/remove operations",
        ),
        &["operation"],
    )
    .expect("Failed to create FINALIZER_OPERATIONS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new("s3_copy_requeues_total", "Total number of requeues by reason"),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static BACKEND_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "s3_copy_backend_operations_total",
            "Total number of backend operations by backend and operation",
        ),
        &["backend", "operation"],
    )
    .expect("Failed to create BACKEND_OPERATIONS_TOTAL metric - this should never happen")
});

static BACKEND_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "s3_copy_backend_operation_duration_seconds",
            "Duration of backend operations in seconds by backend",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["backend"],
    )
    .expect("Failed to create BACKEND_OPERATION_DURATION metric - this should never happen")
});

static BACKEND_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "s3_copy_backend_operation_errors_total",
            "Total number of backend operation errors by backend",
        ),
        &["backend"],
    )
    .expect("Failed to create BACKEND_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only when a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(OBJECTS_STORED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(OBJECTS_DELETED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(OBJECTS_RETAINED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ACTION_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(FINALIZER_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BACKEND_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BACKEND_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(BACKEND_OPERATION_ERRORS_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_objects_stored() {
    OBJECTS_STORED_TOTAL.inc();
}

pub fn increment_objects_deleted() {
    OBJECTS_DELETED_TOTAL.inc();
}

pub fn increment_objects_retained() {
    OBJECTS_RETAINED_TOTAL.inc();
}

/// Record a failed action, `kind` is [`crate::error::CopyError::kind`]
pub fn increment_action_failures(action: &str, kind: &str) {
    ACTION_FAILURES_TOTAL.with_label_values(&[action, kind]).inc();
}

/// `operation` is `add` or `remove`
pub fn increment_finalizer_operations(operation: &str) {
    FINALIZER_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn record_backend_operation(backend: &str, operation: &str, duration: f64) {
    BACKEND_OPERATIONS_TOTAL
        .with_label_values(&[backend, operation])
        .inc();
    BACKEND_OPERATION_DURATION
        .with_label_values(&[backend])
        .observe(duration);
}

pub fn increment_backend_operation_errors(backend: &str) {
    BACKEND_OPERATION_ERRORS_TOTAL
        .with_label_values(&[backend])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        // Only registration in this test binary, so it must succeed
        assert!(register_metrics().is_ok());
        assert!(!REGISTRY.gather().is_empty());
    }

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.get();
        increment_reconciliations();
        assert_eq!(RECONCILIATIONS_TOTAL.get(), before + 1);
    }

    #[test]
    fn test_increment_reconciliation_errors() {
        let before = RECONCILIATION_ERRORS_TOTAL.get();
        increment_reconciliation_errors();
        assert_eq!(RECONCILIATION_ERRORS_TOTAL.get(), before + 1);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        let before = RECONCILIATION_DURATION.get_sample_count();
        observe_reconciliation_duration(0.25);
        assert_eq!(RECONCILIATION_DURATION.get_sample_count(), before + 1);
    }

    #[test]
    fn test_object_counters() {
        let stored = OBJECTS_STORED_TOTAL.get();
        let deleted = OBJECTS_DELETED_TOTAL.get();
        let retained = OBJECTS_RETAINED_TOTAL.get();

        increment_objects_stored();
        increment_objects_deleted();
        increment_objects_retained();

        assert_eq!(OBJECTS_STORED_TOTAL.get(), stored + 1);
        assert_eq!(OBJECTS_DELETED_TOTAL.get(), deleted + 1);
        assert_eq!(OBJECTS_RETAINED_TOTAL.get(), retained + 1);
    }

    #[test]
    fn test_action_failures_are_labelled() {
        let before = ACTION_FAILURES_TOTAL
            .with_label_values(&["delete", "policy"])
            .get();
        increment_action_failures("delete", "policy");
        let after = ACTION_FAILURES_TOTAL
            .with_label_values(&["delete", "policy"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_record_backend_operation() {
        let before = BACKEND_OPERATIONS_TOTAL
            .with_label_values(&["memory", "store"])
            .get();
        record_backend_operation("memory", "store", 0.01);
        let after = BACKEND_OPERATIONS_TOTAL
            .with_label_values(&["memory", "store"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_backend_errors_and_requeues() {
        let errors = BACKEND_OPERATION_ERRORS_TOTAL.with_label_values(&["s3"]).get();
        let requeues = REQUEUES_TOTAL.with_label_values(&["error-backoff"]).get();

        increment_backend_operation_errors("s3");
        increment_requeues_total("error-backoff");

        assert_eq!(
            BACKEND_OPERATION_ERRORS_TOTAL.with_label_values(&["s3"]).get(),
            errors + 1
        );
        assert_eq!(
            REQUEUES_TOTAL.with_label_values(&["error-backoff"]).get(),
            requeues + 1
        );
    }

    #[test]
    fn test_finalizer_operations() {
        let before = FINALIZER_OPERATIONS_TOTAL.with_label_values(&["add"]).get();
        increment_finalizer_operations("add");
        assert_eq!(
            FINALIZER_OPERATIONS_TOTAL.with_label_values(&["add"]).get(),
            before + 1
        );
    }
}
