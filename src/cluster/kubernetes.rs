//! # Kubernetes Collaborators
//!
//! `kube::Api` backed implementations of the cluster traits.

use crate::cluster::{
    ConfigMapLookup, EventSeverity, EventSink, ResourceKey, ResourceStore, SecretLookup,
};
use crate::crd::CopyRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Kubernetes caps event notes at 1KiB
const MAX_EVENT_NOTE_LEN: usize = 1024;

/// CopyRequest access through the API server
#[derive(Clone)]
pub struct KubeResourceStore {
    client: Client,
    field_manager: String,
}

impl std::fmt::Debug for KubeResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeResourceStore")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeResourceStore {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn api(&self, namespace: &str) -> Api<CopyRequest> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ResourceStore for KubeResourceStore {
    async fn get(&self, key: &ResourceKey) -> Result<Option<CopyRequest>> {
        self.api(&key.namespace)
            .get_opt(&key.name)
            .await
            .with_context(|| format!("Failed to get CopyRequest {key}"))
    }

    async fn update(&self, resource: &CopyRequest) -> Result<CopyRequest> {
        let key = ResourceKey::of(resource);
        self.api(&key.namespace)
            .replace(&key.name, &PostParams::default(), resource)
            .await
            .with_context(|| format!("Failed to update CopyRequest {key}"))
    }

    async fn update_status(&self, resource: &CopyRequest) -> Result<()> {
        let key = ResourceKey::of(resource);
        let patch = serde_json::json!({
            "status": resource.status.clone().unwrap_or_default()
        });

        self.api(&key.namespace)
            .patch_status(
                &key.name,
                &PatchParams::apply(&self.field_manager),
                &Patch::Merge(patch),
            )
            .await
            .with_context(|| format!("Failed to update status of CopyRequest {key}"))?;

        debug!("Updated status for {}", key);
        Ok(())
    }
}

/// Secret and ConfigMap reads through the API server
#[derive(Clone)]
pub struct KubeLookup {
    client: Client,
}

impl std::fmt::Debug for KubeLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeLookup").finish_non_exhaustive()
    }
}

impl KubeLookup {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretLookup for KubeLookup {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets
            .get_opt(name)
            .await
            .with_context(|| format!("Failed to get secret {namespace}/{name}"))?;

        Ok(secret.map(|s| {
            s.data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect()
        }))
    }
}

#[async_trait]
impl ConfigMapLookup for KubeLookup {
    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let config_map = config_maps
            .get_opt(name)
            .await
            .with_context(|| format!("Failed to get configmap {namespace}/{name}"))?;

        Ok(config_map.map(|cm| cm.data.unwrap_or_default()))
    }
}

/// Kubernetes Events published through the runtime recorder
#[derive(Clone)]
pub struct KubeEventSink {
    recorder: Recorder,
}

impl std::fmt::Debug for KubeEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeEventSink").finish_non_exhaustive()
    }
}

impl KubeEventSink {
    /// `instance` identifies this replica, typically the pod name
    pub fn new(client: Client, controller: &str, instance: Option<String>) -> Self {
        let reporter = Reporter {
            controller: controller.to_string(),
            instance,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventSink for KubeEventSink {
    async fn emit(
        &self,
        resource: &CopyRequest,
        severity: EventSeverity,
        reason: &str,
        message: &str,
    ) {
        let event = Event {
            type_: match severity {
                EventSeverity::Normal => EventType::Normal,
                EventSeverity::Warning => EventType::Warning,
            },
            reason: reason.to_string(),
            note: Some(truncate_note(message)),
            action: "Reconcile".to_string(),
            secondary: None,
        };

        if let Err(e) = self.recorder.publish(&event, &resource.object_ref(&())).await {
            warn!(
                "Failed to publish {} event for {}: {}",
                reason,
                resource.name_any(),
                e
            );
        }
    }
}

fn truncate_note(message: &str) -> String {
    if message.len() <= MAX_EVENT_NOTE_LEN {
        return message.to_string();
    }
    let mut end = MAX_EVENT_NOTE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_note_keeps_short_messages() {
        assert_eq!(truncate_note("object reference"), "object reference");
    }

    #[test]
    fn test_truncate_note_respects_char_boundaries() {
        let long = "é".repeat(MAX_EVENT_NOTE_LEN);
        let truncated = truncate_note(&long);
        assert!(truncated.len() <= MAX_EVENT_NOTE_LEN);
        assert!(truncated.chars().all(|c| c == 'é'));
    }
}
