//! Error types for the CRM client.
//!
//! # Design
//! The remote API reports application failures in the response body (and
//! occasionally through odd status codes), so none of those become errors
//! here. `ApiError` only covers what goes wrong locally: loading credentials,
//! serializing arguments, and the network round-trip itself.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `LacrmClient` and its supporting types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The credential file is missing, unreadable, or lacks the token entries.
    #[error("failed to load credentials from {}: {reason}", .path.display())]
    Credentials { path: PathBuf, reason: String },

    /// The request never produced an HTTP response (DNS, connect, TLS, I/O).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request arguments could not be serialized into a JSON object.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Indexed access named a field that `Contact` does not carry.
    #[error("unknown contact field: {0}")]
    UnknownField(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
