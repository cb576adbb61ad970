//! API tokens and the token file they are loaded from.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;

/// The user code and API token sent with every request.
///
/// Neither value is exposed in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user_token: String,
    api_token: String,
}

#[derive(Deserialize)]
struct TokenFile {
    #[serde(rename = "crm-tokens")]
    crm_tokens: TokenEntry,
}

#[derive(Deserialize)]
struct TokenEntry {
    #[serde(rename = "user-token")]
    user_token: String,
    #[serde(rename = "api-token")]
    api_token: String,
}

impl Credentials {
    pub fn new(user_token: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            user_token: user_token.into(),
            api_token: api_token.into(),
        }
    }

    /// Load tokens from a JSON file shaped like
    /// `{"crm-tokens": {"user-token": "...", "api-token": "..."}}`.
    ///
    /// Other top-level keys (test fixtures, notes) are ignored.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let fail = |reason: String| ApiError::Credentials {
            path: path.to_path_buf(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
        let file: TokenFile = serde_json::from_str(&raw).map_err(|e| fail(e.to_string()))?;
        debug!(path = %path.display(), "loaded CRM tokens");

        Ok(Self::new(file.crm_tokens.user_token, file.crm_tokens.api_token))
    }

    pub fn user_token(&self) -> &str {
        &self.user_token
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_token", &"[REDACTED]")
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}
