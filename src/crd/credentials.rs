//! # Credentials
//!
//! Credential descriptor pointing at a key inside a Kubernetes Secret.

use crate::error::CopyError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Backend credentials declaration
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Credential source kind. Only `Secret` is supported; empty means `Secret`
    #[serde(default)]
    pub source: String,
    /// Secret holding the credentials document
    #[serde(default)]
    pub secret_ref: SecretKeySelector,
}

/// Reference to a single key of a Secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    pub name: String,
    /// Defaults to the CopyRequest namespace when empty
    #[serde(default)]
    pub namespace: String,
    pub key: String,
}

/// Normalized `spec.credentials.source`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsSource {
    Secret,
}

impl CredentialsSource {
    pub fn parse(value: &str) -> Result<Self, CopyError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "secret" => Ok(Self::Secret),
            other => Err(CopyError::Credential(format!(
                "wrong source '{other}', only 'Secret' is supported"
            ))),
        }
    }
}

impl Credentials {
    pub fn kind(&self) -> Result<CredentialsSource, CopyError> {
        CredentialsSource::parse(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_defaults_to_secret() {
        assert_eq!(CredentialsSource::parse("").unwrap(), CredentialsSource::Secret);
        assert_eq!(CredentialsSource::parse("Secret").unwrap(), CredentialsSource::Secret);
        assert_eq!(CredentialsSource::parse("SECRET").unwrap(), CredentialsSource::Secret);
    }

    #[test]
    fn test_unknown_source_is_a_credential_error() {
        let err = CredentialsSource::parse("vault").unwrap_err();
        assert_eq!(err.kind(), "credential");
        assert!(err.to_string().contains("wrong source"));
    }

    #[test]
    fn test_secret_ref_deserializes_without_namespace() {
        let creds: Credentials = serde_json::from_value(serde_json::json!({
            "secretRef": { "name": "aws", "key": "credentials" }
        }))
        .unwrap();
        assert_eq!(creds.secret_ref.namespace, "");
        assert_eq!(creds.kind().unwrap(), CredentialsSource::Secret);
    }
}
