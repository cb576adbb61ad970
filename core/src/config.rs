//! Client settings: endpoint, token file location, and suppression policy.

use std::path::PathBuf;

use tracing::warn;

use crate::params::SuppressionPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.lessannoyingcrm.com";
pub const DEFAULT_TOKEN_LOCATION: &str = "config.json";

pub const ENV_BASE_URL: &str = "LACRM_BASE_URL";
pub const ENV_TOKEN_FILE: &str = "LACRM_TOKEN_FILE";
pub const ENV_SUPPRESSION: &str = "LACRM_SUPPRESSION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token_location: PathBuf,
    pub suppression: SuppressionPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_location: PathBuf::from(DEFAULT_TOKEN_LOCATION),
            suppression: SuppressionPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `LACRM_BASE_URL`, `LACRM_TOKEN_FILE`, and
    /// `LACRM_SUPPRESSION` (`falsy` or `null`).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            config.base_url = url;
        }
        if let Some(path) = lookup(ENV_TOKEN_FILE).filter(|v| !v.is_empty()) {
            config.token_location = PathBuf::from(path);
        }
        if let Some(policy) = lookup(ENV_SUPPRESSION) {
            match parse_policy(&policy) {
                Some(p) => config.suppression = p,
                None => warn!(value = %policy, "ignoring unknown {ENV_SUPPRESSION}"),
            }
        }
        config
    }
}

fn parse_policy(value: &str) -> Option<SuppressionPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "falsy" => Some(SuppressionPolicy::Falsy),
        "null" | "null-only" | "nullonly" => Some(SuppressionPolicy::NullOnly),
        _ => None,
    }
}
