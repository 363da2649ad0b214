//! # Status
//!
//! Observable outcome of the last store attempt.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CopyRequestStatus {
    /// True once the payload has been written to the target
    #[serde(default)]
    pub synced: bool,
    /// `s3://bucket/key` of the written object, empty unless synced
    #[serde(default)]
    pub reference: String,
}

impl CopyRequestStatus {
    #[must_use]
    pub fn synced(reference: String) -> Self {
        Self {
            synced: true,
            reference,
        }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self::default()
    }
}
