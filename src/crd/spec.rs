//! # CopyRequest Spec
//!
//! The CopyRequest custom resource and its deletion policy.

use crate::crd::{Credentials, CopyRequestStatus, ObjectSource};
use crate::error::CopyError;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CopyRequest Custom Resource Definition
///
/// Declares a payload to copy into an S3 bucket and what to do with the
/// object when the resource is deleted.
///
/// # Example
///
/// ```yaml
/// apiVersion: s3-copy.octopilot.io/v1alpha1
/// kind: CopyRequest
/// metadata:
///   name: app-settings
///   namespace: default
/// spec:
///   deletionPolicy: delete
///   credentials:
///     source: Secret
///     secretRef:
///       name: aws-credentials
///       namespace: default
///       key: credentials
///   source:
///     reference: configmap
///     namespace: default
///     name: app-settings
///     key: settings.json
///   target:
///     bucket: my-bucket
///     region: us-west-2
///     key: config/settings.json
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "CopyRequest",
    group = "s3-copy.octopilot.io",
    version = "v1alpha1",
    namespaced,
    shortname = "cpr",
    status = "CopyRequestStatus",
    printcolumn = r#"{"name":"Synced", "type":"boolean", "jsonPath":".status.synced"}"#,
    printcolumn = r#"{"name":"Reference", "type":"string", "jsonPath":".status.reference"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CopyRequestSpec {
    /// What happens to the object when the CopyRequest is deleted:
    /// `delete` removes it, `retain` leaves it in the bucket (case-insensitive)
    pub deletion_policy: String,
    /// Where the backend credentials come from
    pub credentials: Credentials,
    /// Where the payload comes from
    #[serde(default)]
    pub source: ObjectSource,
    /// Destination bucket, region and key
    pub target: ObjectTarget,
}

/// Destination of the copied payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTarget {
    pub bucket: String,
    pub region: String,
    pub key: String,
}

/// Normalized `spec.deletionPolicy`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPolicy {
    Delete,
    Retain,
}

impl DeletionPolicy {
    /// Parse a policy string, ignoring case and surrounding whitespace
    pub fn parse(value: &str) -> Result<Self, CopyError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "delete" => Ok(Self::Delete),
            "retain" => Ok(Self::Retain),
            _ => Err(CopyError::Policy(format!(
                "unknown deletionPolicy '{value}', expected 'delete' or 'retain'"
            ))),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Retain => "retain",
        }
    }
}

impl fmt::Display for DeletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CopyRequest {
    /// Parsed deletion policy
    pub fn deletion_policy(&self) -> Result<DeletionPolicy, CopyError> {
        DeletionPolicy::parse(&self.spec.deletion_policy)
    }

    /// Canonical location of the copied object, e.g. `s3://bucket/key`
    #[must_use]
    pub fn reference_uri(&self) -> String {
        format!(
            "{}://{}/{}",
            crate::constants::REFERENCE_SCHEME,
            self.spec.target.bucket,
            self.spec.target.key
        )
    }

    /// Human readable mapping used in events and logs
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{} -> {}:{}",
            self.name_any(),
            self.spec.target.bucket,
            self.spec.target.key
        )
    }

    /// Whether the resource has been marked for deletion
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Whether the controller finalizer is present
    #[must_use]
    pub fn has_finalizer(&self) -> bool {
        self.finalizers()
            .iter()
            .any(|f| f == crate::constants::FINALIZER)
    }
}
