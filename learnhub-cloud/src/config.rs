//! Remote backend configuration.

use serde::{Deserialize, Serialize};

/// Connection parameters for the hosted backend, supplied by the embedder
/// at process start.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the hosted service (e.g. "https://app.learnhub.dev").
    pub base_url: String,

    /// Public API key sent with every request.
    pub api_key: String,

    /// Client identification string recorded on audit log rows.
    pub client_info: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client_info: concat!("learnhub/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
        }
    }
}
