//! # Custom Resource Definitions
//!
//! CRD types for the S3 Copy Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - CopyRequest resource, target and deletion policy
//! - `credentials.rs` - Credential secret reference
//! - `source.rs` - Inline or ConfigMap payload source
//! - `status.rs` - Status written after each attempt

mod credentials;
mod source;
mod spec;
mod status;

pub use credentials::{Credentials, CredentialsSource, SecretKeySelector};
pub use source::{ObjectSource, SourceKind};
pub use spec::{CopyRequest, CopyRequestSpec, DeletionPolicy, ObjectTarget};
pub use status::CopyRequestStatus;
