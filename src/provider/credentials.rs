//! # Shared Credentials Document
//!
//! Parses the AWS shared-credentials INI format stored in the credentials secret:
//!
//! ```ini
//! [default]
//! aws_access_key_id = AKIA...
//! aws_secret_access_key = ...
//! aws_session_token = ...   # optional
//! ```
//!
//! Section and key names are matched case-insensitively and both `=` and `:`
//! separate keys from values. Only the `default` profile is read, but the
//! whole document must parse.

use crate::constants::CREDENTIALS_PROFILE;
use crate::error::CopyError;
use ini::{Ini, Properties};
use zeroize::{Zeroize, ZeroizeOnDrop};

const ACCESS_KEY_ID: &str = "aws_access_key_id";
const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const SESSION_TOKEN: &str = "aws_session_token";

/// Static credentials read from the `default` profile
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Parse the `default` profile out of a credentials document
pub fn parse_credentials(raw: &[u8]) -> Result<StaticCredentials, CopyError> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        CopyError::Credential(format!("credentials document is not valid UTF-8: {e}"))
    })?;

    let document = Ini::load_from_str(text).map_err(|e| {
        CopyError::Credential(format!("cannot parse credentials document: {e}"))
    })?;

    let profile = document
        .section(Some(CREDENTIALS_PROFILE))
        .ok_or_else(|| {
            CopyError::Credential(format!(
                "profile [{CREDENTIALS_PROFILE}] not found in credentials document"
            ))
        })?;

    let access_key_id = required(profile, ACCESS_KEY_ID)?;
    let secret_access_key = required(profile, SECRET_ACCESS_KEY)?;
    let session_token = optional(profile, SESSION_TOKEN);

    Ok(StaticCredentials {
        access_key_id,
        secret_access_key,
        session_token,
    })
}

fn optional(profile: &Properties, name: &str) -> Option<String> {
    profile
        .get(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(profile: &Properties, name: &str) -> Result<String, CopyError> {
    optional(profile, name).ok_or_else(|| {
        CopyError::Credential(format!(
            "{name} missing from profile [{CREDENTIALS_PROFILE}]"
        ))
    })
}
