//! # Resolution
//!
//! Turns the credential and source descriptors of a CopyRequest into bytes.
//! Both lookups are read-only.

use crate::controller::reconciler::types::Reconciler;
use crate::crd::{CopyRequest, CredentialsSource, SourceKind};
use crate::error::CopyError;
use kube::ResourceExt;
use tracing::debug;
use zeroize::Zeroize;

/// Namespace of a referenced object, falling back to the CopyRequest namespace
fn namespace_or_own(declared: &str, resource: &CopyRequest) -> String {
    if declared.trim().is_empty() {
        resource.namespace().unwrap_or_else(|| "default".to_string())
    } else {
        declared.trim().to_string()
    }
}

/// Credential document referenced by `spec.credentials`
pub(crate) async fn resolve_credentials(
    ctx: &Reconciler,
    resource: &CopyRequest,
) -> Result<Vec<u8>, CopyError> {
    let credentials = &resource.spec.credentials;
    let CredentialsSource::Secret = credentials.kind()?;

    let selector = &credentials.secret_ref;
    let namespace = namespace_or_own(&selector.namespace, resource);
    if selector.name.trim().is_empty() {
        return Err(CopyError::Credential(
            "credentials secretRef.name is empty".to_string(),
        ));
    }

    let mut data = ctx
        .secrets
        .get_secret(&namespace, &selector.name)
        .await
        .map_err(|e| {
            CopyError::Credential(format!(
                "unrecognized credentials {namespace}:{}: {e:#}",
                selector.name
            ))
        })?
        .ok_or_else(|| {
            CopyError::Credential(format!(
                "unrecognized credentials {namespace}:{}",
                selector.name
            ))
        })?;

    let value = if selector.key.is_empty() {
        None
    } else {
        data.remove(&selector.key)
    };
    for other in data.values_mut() {
        other.zeroize();
    }
    let Some(value) = value else {
        return Err(CopyError::Credential(format!(
            "key not found {}",
            selector.key
        )));
    };

    debug!(
        "Resolved credentials from secret {}/{} key {}",
        namespace, selector.name, selector.key
    );
    Ok(value)
}

/// Payload declared by `spec.source`
pub(crate) async fn resolve_content(
    ctx: &Reconciler,
    resource: &CopyRequest,
) -> Result<Vec<u8>, CopyError> {
    let source = &resource.spec.source;
    match source.kind()? {
        SourceKind::Local => {
            if source.data.is_empty() {
                return Err(CopyError::Source(
                    "source invalid: inline data is empty".to_string(),
                ));
            }
            Ok(source.data.as_bytes().to_vec())
        }
        SourceKind::ConfigMap => {
            let namespace = namespace_or_own(&source.namespace, resource);
            if source.name.trim().is_empty() {
                return Err(CopyError::Source(
                    "source invalid: configmap name is empty".to_string(),
                ));
            }

            let data = ctx
                .config_maps
                .get_config_map(&namespace, &source.name)
                .await
                .map_err(|e| {
                    CopyError::Source(format!(
                        "unrecognized configmap {namespace}:{}: {e:#}",
                        source.name
                    ))
                })?
                .ok_or_else(|| {
                    CopyError::Source(format!(
                        "unrecognized configmap {namespace}:{}",
                        source.name
                    ))
                })?;

            let Some(value) = data.get(&source.key).filter(|_| !source.key.is_empty()) else {
                return Err(CopyError::Source(format!("key not found {}", source.key)));
            };

            debug!(
                "Resolved {} bytes from configmap {}/{} key {}",
                value.len(),
                namespace,
                source.name,
                source.key
            );
            Ok(value.as_bytes().to_vec())
        }
    }
}
