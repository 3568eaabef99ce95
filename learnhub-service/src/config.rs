//! Facade configuration.

use learnhub_cloud::RemoteConfig;

/// Which backend a [`crate::StorageService`] talks to. Fixed at
/// construction and never switched mid-instance; two independent
/// instances with different modes can coexist in one process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendMode {
    /// Embedded key-value persistence only.
    Local,
    /// Hosted auth + table backend.
    Remote,
}

/// Storage facade configuration, supplied by the embedder at process
/// start.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub mode: BackendMode,
    /// Connection parameters; required in [`BackendMode::Remote`].
    pub remote: Option<RemoteConfig>,
}

impl StorageConfig {
    pub fn local() -> Self {
        Self {
            mode: BackendMode::Local,
            remote: None,
        }
    }

    pub fn remote(config: RemoteConfig) -> Self {
        Self {
            mode: BackendMode::Remote,
            remote: Some(config),
        }
    }
}
