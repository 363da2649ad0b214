//! # Prelude
//!
//! Commonly used types, importable with `use s3_copy_controller::prelude::*;`.

pub use crate::crd::*;

pub use crate::cluster::{
    ConfigMapLookup, EventSeverity, EventSink, ResourceKey, ResourceStore, SecretLookup,
};

pub use crate::provider::{BackendFactory, BackendKind, ConfigData, ObjectStore, StoreBackend};

pub use crate::controller::reconciler::{
    reconcile, ReconcileOutcome, Reconciler, ReconcilerError, SyncAction,
};

pub use crate::config::ControllerConfig;

pub use crate::error::CopyError;
