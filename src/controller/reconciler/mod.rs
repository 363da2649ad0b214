//! # Reconciler
//!
//! Reconciliation core for `CopyRequest` resources.
//!
//! A pass reads the resource by key, makes sure the finalizer is attached,
//! then either stores the payload in the target bucket or, once the resource
//! is being deleted, deletes or retains the object before releasing the
//! finalizer. Every action result goes through a single settle step that
//! writes status and emits an event.

mod finalizer;
mod process;
mod reconcile;
mod resolve;
pub mod status;
mod types;

pub use reconcile::reconcile;
pub use types::{
    ActionOutcome, BackoffState, ReconcileOutcome, Reconciler, ReconcilerError, SyncAction,
};
