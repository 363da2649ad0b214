//! # Errors
//!
//! Failure taxonomy for a single store or delete attempt.
//!
//! Every variant carries the text that ends up in the `Failed` event, so the
//! messages are written for operators reading `kubectl describe`.

use thiserror::Error;

/// Why a store or delete action failed
#[derive(Debug, Error)]
pub enum CopyError {
    /// Credential source unrecognized, secret missing, key absent, or
    /// credential bytes the backend cannot use
    #[error("credentials: {0}")]
    Credential(String),

    /// Content reference invalid or missing, or inline data empty
    #[error("source: {0}")]
    Source(String),

    /// `deletionPolicy` is neither `delete` nor `retain`
    #[error("deletion policy: {0}")]
    Policy(String),

    /// The store or delete call itself failed
    #[error("backend {operation} failed: {source:#}")]
    Backend {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl CopyError {
    pub fn backend(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Backend { operation, source }
    }

    /// Stable label used for metrics and log fields
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Credential(_) => "credential",
            Self::Source(_) => "source",
            Self::Policy(_) => "policy",
            Self::Backend { .. } => "backend",
        }
    }
}
