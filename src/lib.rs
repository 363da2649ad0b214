//! S3 Copy Controller Library
//!
//! Reconciliation core for `CopyRequest` resources: each request names an S3
//! bucket, region and key, a credentials Secret and a payload source. The
//! controller stores the payload, reports `status.synced` and
//! `status.reference`, and removes or retains the object when the request
//! is deleted.
//!
//! ```rust
//! use s3_copy_controller::prelude::*;
//! ```

pub mod cluster;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
