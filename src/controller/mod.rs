//! # Controller
//!
//! - `backoff`: Fibonacci backoff for failed reconciliations
//! - `reconciler`: CopyRequest reconciliation
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod reconciler;
pub mod server;
