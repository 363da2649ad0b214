//! # Object Source
//!
//! Where the payload of a CopyRequest comes from: inline data or a ConfigMap key.

use crate::error::CopyError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Payload source declaration
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSource {
    /// `local` (inline `data`) or `configmap`; empty means `local`
    #[serde(default)]
    pub reference: String,
    /// ConfigMap namespace, defaults to the CopyRequest namespace when empty
    #[serde(default)]
    pub namespace: String,
    /// ConfigMap name
    #[serde(default)]
    pub name: String,
    /// ConfigMap key
    #[serde(default)]
    pub key: String,
    /// Inline payload
    #[serde(default)]
    pub data: String,
}

/// Normalized `spec.source.reference`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Local,
    ConfigMap,
}

impl SourceKind {
    pub fn parse(value: &str) -> Result<Self, CopyError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "local" => Ok(Self::Local),
            "configmap" => Ok(Self::ConfigMap),
            other => Err(CopyError::Source(format!(
                "source invalid: unknown reference '{other}', expected 'local' or 'configmap'"
            ))),
        }
    }
}

impl ObjectSource {
    pub fn kind(&self) -> Result<SourceKind, CopyError> {
        SourceKind::parse(&self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!(SourceKind::parse("").unwrap(), SourceKind::Local);
        assert_eq!(SourceKind::parse("Local").unwrap(), SourceKind::Local);
        assert_eq!(SourceKind::parse("ConfigMap").unwrap(), SourceKind::ConfigMap);
        assert_eq!(SourceKind::parse("configmap").unwrap(), SourceKind::ConfigMap);
    }

    #[test]
    fn test_unknown_source_kind() {
        let err = SourceKind::parse("git").unwrap_err();
        assert_eq!(err.kind(), "source");
        assert!(err.to_string().contains("source invalid"));
    }

    #[test]
    fn test_missing_source_block_defaults_to_local() {
        let source = ObjectSource::default();
        assert_eq!(source.kind().unwrap(), SourceKind::Local);
        assert!(source.data.is_empty());
    }
}
