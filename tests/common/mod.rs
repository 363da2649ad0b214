//! Shared fakes and fixtures for reconciler integration tests
//!
//! The fakes stand in for the API server: a resource store that completes a
//! deletion once the last finalizer is gone, Secret and ConfigMap lookups,
//! and an event sink that records what was emitted.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use anyhow::{bail, Result};
use async_trait::async_trait;
use s3_copy_controller::cluster::{
    ConfigMapLookup, EventSeverity, EventSink, ResourceKey, ResourceStore, SecretLookup,
};
use s3_copy_controller::controller::reconciler::Reconciler;
use s3_copy_controller::crd::{CopyRequest, CopyRequestStatus};
use s3_copy_controller::provider::{DefaultBackendFactory, MemoryObjectStore};
use kube::ResourceExt;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const NAMESPACE: &str = "default";
pub const BUCKET: &str = "my-bucket";
pub const REGION: &str = "us-east-1";
pub const OBJECT_KEY: &str = "path/obj.txt";
pub const CREDENTIALS_SECRET: &str = "aws-creds";
pub const CREDENTIALS_KEY: &str = "credentials";

pub const CREDENTIALS_DOCUMENT: &str =
    "[default]\naws_access_key_id = AKIDEXAMPLE\naws_secret_access_key = wJalrXUtnFEMI\n";

/// Resource store backed by a map
///
/// Every `update` records how many backend calls had happened at that point,
/// so tests can assert that a finalizer was persisted before the backend ran.
#[derive(Default)]
pub struct FakeResourceStore {
    objects: Mutex<BTreeMap<ResourceKey, CopyRequest>>,
    updates: Mutex<Vec<(CopyRequest, usize)>>,
    status_updates: Mutex<Vec<CopyRequestStatus>>,
    backend: MemoryObjectStore,
    pub fail_get: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_status: AtomicBool,
}

impl FakeResourceStore {
    pub fn new(backend: MemoryObjectStore) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    pub fn insert(&self, resource: CopyRequest) {
        self.objects
            .lock()
            .unwrap()
            .insert(ResourceKey::of(&resource), resource);
    }

    pub fn current(&self, name: &str) -> Option<CopyRequest> {
        self.objects
            .lock()
            .unwrap()
            .get(&ResourceKey::new(NAMESPACE, name))
            .cloned()
    }

    /// Updates in order, each with the backend call count at the time
    pub fn updates(&self) -> Vec<(CopyRequest, usize)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn status_updates(&self) -> Vec<CopyRequestStatus> {
        self.status_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceStore for FakeResourceStore {
    async fn get(&self, key: &ResourceKey) -> Result<Option<CopyRequest>> {
        if self.fail_get.load(Ordering::SeqCst) {
            bail!("apiserver unavailable");
        }
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn update(&self, resource: &CopyRequest) -> Result<CopyRequest> {
        if self.fail_update.load(Ordering::SeqCst) {
            bail!("conflict updating {}", resource.name_any());
        }
        self.updates
            .lock()
            .unwrap()
            .push((resource.clone(), self.backend.call_count()));

        let key = ResourceKey::of(resource);
        let mut objects = self.objects.lock().unwrap();
        if resource.metadata.deletion_timestamp.is_some() && resource.finalizers().is_empty() {
            objects.remove(&key);
        } else {
            objects.insert(key, resource.clone());
        }
        Ok(resource.clone())
    }

    async fn update_status(&self, resource: &CopyRequest) -> Result<()> {
        if self.fail_status.load(Ordering::SeqCst) {
            bail!("status subresource rejected the patch");
        }
        let status = resource.status.clone().unwrap_or_default();
        self.status_updates.lock().unwrap().push(status.clone());
        if let Some(stored) = self
            .objects
            .lock()
            .unwrap()
            .get_mut(&ResourceKey::of(resource))
        {
            stored.status = Some(status);
        }
        Ok(())
    }
}

/// Secrets keyed by `namespace/name`
#[derive(Default)]
pub struct FakeSecrets {
    secrets: Mutex<BTreeMap<(String, String), BTreeMap<String, Vec<u8>>>>,
    lookups: Mutex<Vec<(String, String)>>,
}

impl FakeSecrets {
    pub fn insert(&self, namespace: &str, name: &str, key: &str, value: &[u8]) {
        self.secrets
            .lock()
            .unwrap()
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.to_vec());
    }

    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretLookup for FakeSecrets {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>> {
        let key = (namespace.to_string(), name.to_string());
        self.lookups.lock().unwrap().push(key.clone());
        Ok(self.secrets.lock().unwrap().get(&key).cloned())
    }
}

#[derive(Default)]
pub struct FakeConfigMaps {
    config_maps: Mutex<BTreeMap<(String, String), BTreeMap<String, String>>>,
}

impl FakeConfigMaps {
    pub fn insert(&self, namespace: &str, name: &str, key: &str, value: &str) {
        self.config_maps
            .lock()
            .unwrap()
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl ConfigMapLookup for FakeConfigMaps {
    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>> {
        Ok(self
            .config_maps
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub resource: String,
    pub severity: EventSeverity,
    pub reason: String,
    pub message: String,
}

#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEvents {
    pub fn all(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.all().into_iter().map(|e| e.reason).collect()
    }
}

#[async_trait]
impl EventSink for RecordingEvents {
    async fn emit(
        &self,
        resource: &CopyRequest,
        severity: EventSeverity,
        reason: &str,
        message: &str,
    ) {
        self.events.lock().unwrap().push(RecordedEvent {
            resource: resource.name_any(),
            severity,
            reason: reason.to_string(),
            message: message.to_string(),
        });
    }
}

/// A reconciler wired to fakes and a shared in-memory backend
pub struct Harness {
    pub store: Arc<FakeResourceStore>,
    pub secrets: Arc<FakeSecrets>,
    pub config_maps: Arc<FakeConfigMaps>,
    pub backend: MemoryObjectStore,
    pub events: Arc<RecordingEvents>,
    pub reconciler: Reconciler,
}

impl Harness {
    /// Harness with the default credentials Secret in place
    pub fn new() -> Self {
        let harness = Self::without_credentials();
        harness.secrets.insert(
            NAMESPACE,
            CREDENTIALS_SECRET,
            CREDENTIALS_KEY,
            CREDENTIALS_DOCUMENT.as_bytes(),
        );
        harness
    }

    pub fn without_credentials() -> Self {
        let backend = MemoryObjectStore::new();
        let store = Arc::new(FakeResourceStore::new(backend.clone()));
        let secrets = Arc::new(FakeSecrets::default());
        let config_maps = Arc::new(FakeConfigMaps::default());
        let events = Arc::new(RecordingEvents::default());

        let reconciler = Reconciler::new(
            store.clone(),
            secrets.clone(),
            config_maps.clone(),
            Arc::new(DefaultBackendFactory::memory(backend.clone())),
            events.clone(),
        )
        .with_backoff(5, 300);

        Self {
            store,
            secrets,
            config_maps,
            backend,
            events,
            reconciler,
        }
    }

    pub fn key(name: &str) -> ResourceKey {
        ResourceKey::new(NAMESPACE, name)
    }
}

/// Raw CopyRequest manifest with inline data
pub fn manifest(name: &str, deletion_policy: &str) -> Value {
    json!({
        "apiVersion": "s3-copy.octopilot.io/v1alpha1",
        "kind": "CopyRequest",
        "metadata": {
            "name": name,
            "namespace": NAMESPACE,
            "resourceVersion": "1"
        },
        "spec": {
            "deletionPolicy": deletion_policy,
            "credentials": {
                "source": "Secret",
                "secretRef": { "name": CREDENTIALS_SECRET, "key": CREDENTIALS_KEY }
            },
            "source": { "reference": "local", "data": "hello" },
            "target": { "bucket": BUCKET, "region": REGION, "key": OBJECT_KEY }
        }
    })
}

pub fn from_manifest(manifest: Value) -> CopyRequest {
    serde_json::from_value(manifest).expect("fixture should deserialize")
}

pub fn copy_request(name: &str, deletion_policy: &str) -> CopyRequest {
    from_manifest(manifest(name, deletion_policy))
}

pub fn with_finalizer(mut resource: CopyRequest) -> CopyRequest {
    resource
        .finalizers_mut()
        .push(s3_copy_controller::constants::FINALIZER.to_string());
    resource
}

/// Mark a resource as deleted by the API server
pub fn deleting(resource: CopyRequest) -> CopyRequest {
    let mut value = serde_json::to_value(resource).expect("fixture should serialize");
    value["metadata"]["deletionTimestamp"] = json!("2026-01-01T00:00:00Z");
    from_manifest(value)
}
