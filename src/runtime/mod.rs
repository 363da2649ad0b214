//! # Runtime
//!
//! Process wiring around the reconciler: startup, the watch loop and the
//! error policy the controller runtime calls on failed passes.

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
