//! # Object Store Providers
//!
//! Backends the controller writes objects to, and the factory that builds them.
//!
//! Each backend implements the `ObjectStore` trait. The reconciler never holds a
//! backend across reconciliations: it asks the `BackendFactory` for a fresh one
//! every time, because the credentials in the referenced secret may have rotated.

use crate::crd::ObjectTarget;
use crate::error::CopyError;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub mod credentials;
pub mod memory;
pub mod s3;

pub use memory::{BackendCall, MemoryObjectStore, Operation};
pub use s3::{S3ObjectStore, S3Settings};

/// Store/delete capability of an object backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `payload` to the target, overwriting any existing object
    async fn store(&self, payload: &[u8], target: &ObjectTarget) -> Result<()>;

    /// Remove the target object. Removing an absent object is not an error
    async fn delete(&self, target: &ObjectTarget) -> Result<()>;
}

/// Resolved credentials and region handed to the factory, wiped on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ConfigData {
    credentials: Vec<u8>,
    region: String,
}

impl ConfigData {
    pub fn new(credentials: Vec<u8>, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
        }
    }

    #[must_use]
    pub fn credentials(&self) -> &[u8] {
        &self.credentials
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }
}

impl fmt::Debug for ConfigData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigData")
            .field("credentials", &format_args!("<{} bytes>", self.credentials.len()))
            .field("region", &self.region)
            .finish()
    }
}

/// Backend implementations the factory can select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    S3,
    Memory,
}

impl BackendKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown object store backend '{other}'")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constructed backend, one variant per `BackendKind`
#[derive(Debug, Clone)]
pub enum StoreBackend {
    S3(S3ObjectStore),
    Memory(MemoryObjectStore),
}

impl StoreBackend {
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::S3(_) => BackendKind::S3,
            Self::Memory(_) => BackendKind::Memory,
        }
    }
}

#[async_trait]
impl ObjectStore for StoreBackend {
    async fn store(&self, payload: &[u8], target: &ObjectTarget) -> Result<()> {
        match self {
            Self::S3(store) => store.store(payload, target).await,
            Self::Memory(store) => store.store(payload, target).await,
        }
    }

    async fn delete(&self, target: &ObjectTarget) -> Result<()> {
        match self {
            Self::S3(store) => store.delete(target).await,
            Self::Memory(store) => store.delete(target).await,
        }
    }
}

/// Maps resolved credentials and region to a backend instance
#[async_trait]
pub trait BackendFactory: Send + Sync {
    /// Build a new backend. Construction failures are credential errors
    async fn create(&self, config: &ConfigData) -> Result<StoreBackend, CopyError>;
}

/// Factory selecting a backend by configured kind
#[derive(Debug, Clone)]
pub struct DefaultBackendFactory {
    kind: BackendKind,
    s3: S3Settings,
    memory: MemoryObjectStore,
}

impl DefaultBackendFactory {
    #[must_use]
    pub fn new(kind: BackendKind, s3: S3Settings) -> Self {
        Self {
            kind,
            s3,
            memory: MemoryObjectStore::new(),
        }
    }

    /// Factory handing out clones of one shared in-memory store
    #[must_use]
    pub fn memory(store: MemoryObjectStore) -> Self {
        Self {
            kind: BackendKind::Memory,
            s3: S3Settings::default(),
            memory: store,
        }
    }

    /// Factory for S3 with the given per-operation timeout
    #[must_use]
    pub fn s3(operation_timeout: Duration, endpoint_url: Option<String>) -> Self {
        Self::new(
            BackendKind::S3,
            S3Settings {
                operation_timeout: Some(operation_timeout),
                endpoint_url,
            },
        )
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.kind
    }
}

#[async_trait]
impl BackendFactory for DefaultBackendFactory {
    async fn create(&self, config: &ConfigData) -> Result<StoreBackend, CopyError> {
        match self.kind {
            BackendKind::S3 => Ok(StoreBackend::S3(
                S3ObjectStore::connect(config, &self.s3).await?,
            )),
            BackendKind::Memory => {
                if config.credentials().is_empty() {
                    return Err(CopyError::Credential(
                        "cannot build memory backend: credentials are empty".to_string(),
                    ));
                }
                Ok(StoreBackend::Memory(self.memory.clone()))
            }
        }
    }
}
