//! # Cluster Collaborators
//!
//! Interfaces the reconciler uses to read and write cluster state.
//!
//! The reconciler never talks to the Kubernetes API directly. It is handed
//! implementations of these traits at construction time, which keeps the
//! state machine testable with in-memory fakes.
//!
//! - `ResourceStore`: get/update CopyRequests and persist their status
//! - `SecretLookup`: read credential Secrets
//! - `ConfigMapLookup`: read payload ConfigMaps
//! - `EventSink`: publish Kubernetes events

use crate::crd::CopyRequest;
use anyhow::Result;
use async_trait::async_trait;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;

pub mod kubernetes;

pub use kubernetes::{KubeEventSink, KubeLookup, KubeResourceStore};

/// Namespace/name identity of a CopyRequest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an observed resource, `default` namespace when unset
    #[must_use]
    pub fn of(resource: &CopyRequest) -> Self {
        Self::new(
            resource.namespace().unwrap_or_else(|| "default".to_string()),
            resource.name_any(),
        )
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Severity of an emitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSeverity {
    Normal,
    Warning,
}

/// Read/write access to CopyRequest resources
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Current state of the resource, `None` once it is gone
    async fn get(&self, key: &ResourceKey) -> Result<Option<CopyRequest>>;

    /// Persist metadata changes (finalizers) and return the stored copy
    async fn update(&self, resource: &CopyRequest) -> Result<CopyRequest>;

    /// Persist `resource.status`
    async fn update_status(&self, resource: &CopyRequest) -> Result<()>;
}

/// Secret data lookup, values are raw (already base64-decoded) bytes
#[async_trait]
pub trait SecretLookup: Send + Sync {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>>;
}

/// ConfigMap data lookup
#[async_trait]
pub trait ConfigMapLookup: Send + Sync {
    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>>;
}

/// Fire-and-forget notification sink
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(
        &self,
        resource: &CopyRequest,
        severity: EventSeverity,
        reason: &str,
        message: &str,
    );
}
