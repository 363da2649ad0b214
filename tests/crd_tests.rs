//! # CRD Tests
//!
//! Generated CustomResourceDefinition shape and manifest parsing.

mod common;

use common::*;
use kube::CustomResourceExt;
use s3_copy_controller::crd::{CopyRequest, DeletionPolicy};

#[test]
fn test_crd_identity() {
    let crd = CopyRequest::crd();
    assert_eq!(crd.metadata.name.as_deref(), Some("copyrequests.s3-copy.octopilot.io"));
    assert_eq!(crd.spec.group, "s3-copy.octopilot.io");
    assert_eq!(crd.spec.scope, "Namespaced");
    assert_eq!(crd.spec.names.kind, "CopyRequest");
    assert_eq!(
        crd.spec.names.short_names.as_deref(),
        Some(&["cpr".to_string()][..])
    );
}

#[test]
fn test_crd_version_has_status_and_columns() {
    let crd = CopyRequest::crd();
    let version = &crd.spec.versions[0];
    assert_eq!(version.name, "v1alpha1");
    assert!(version.served && version.storage);
    assert!(version
        .subresources
        .as_ref()
        .and_then(|s| s.status.as_ref())
        .is_some());

    let columns: Vec<&str> = version
        .additional_printer_columns
        .as_ref()
        .unwrap()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(columns, vec!["Synced", "Reference", "Age"]);
}

#[test]
fn test_crd_schema_requires_target_and_credentials() {
    let crd = CopyRequest::crd();
    let schema = serde_json::to_value(&crd.spec.versions[0].schema).unwrap();
    let spec = &schema["openAPIV3Schema"]["properties"]["spec"];
    let required: Vec<&str> = spec["required"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();

    assert!(required.contains(&"deletionPolicy"));
    assert!(required.contains(&"credentials"));
    assert!(required.contains(&"target"));
    assert!(!required.contains(&"source"));
    assert!(spec["properties"]["target"]["properties"]["region"].is_object());
}

#[test]
fn test_manifest_round_trips_through_yaml() {
    let yaml = r#"
apiVersion: s3-copy.octopilot.io/v1alpha1
kind: CopyRequest
metadata:
  name: app-settings
  namespace: team-a
spec:
  deletionPolicy: Retain
  credentials:
    secretRef:
      name: aws-credentials
      key: credentials
  source:
    reference: configmap
    name: app-settings
    key: settings.json
  target:
    bucket: my-bucket
    region: us-west-2
    key: config/settings.json
"#;
    let resource: CopyRequest = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(resource.deletion_policy().unwrap(), DeletionPolicy::Retain);
    assert_eq!(resource.spec.credentials.source, "");
    assert_eq!(resource.spec.credentials.secret_ref.namespace, "");
    assert_eq!(resource.reference_uri(), "s3://my-bucket/config/settings.json");
    assert!(resource.status.is_none());
}

#[test]
fn test_source_defaults_to_empty_local() {
    let mut manifest = manifest("settings", "delete");
    manifest["spec"]
        .as_object_mut()
        .unwrap()
        .remove("source");
    let resource = from_manifest(manifest);

    assert_eq!(resource.spec.source.reference, "");
    assert_eq!(resource.spec.source.data, "");
}
