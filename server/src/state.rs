//! Application state for the leafcure server
//!
//! Holds the configuration and the lazily loaded model handle shared by all
//! requests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use leafcure::ModelCache;
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Path to the model manifest
    pub model_path: PathBuf,
    /// Load the model before accepting requests instead of on first use
    pub eager_load: bool,
    /// Largest accepted image upload, in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            model_path: PathBuf::from("models/tomato.json"),
            eager_load: false,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Upload limit in bytes for a size given in MiB, capped at `usize::MAX`
    pub fn upload_limit_bytes(mib: usize) -> usize {
        mib.saturating_mul(1024 * 1024)
    }

    /// `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared application state
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Classifier, loaded once on first use
    pub model: ModelCache,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let model = ModelCache::new(config.model_path.clone());
        Self {
            config,
            model,
            started_at: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_limit_bytes() {
        assert_eq!(ServerConfig::upload_limit_bytes(10), 10 * 1024 * 1024);
        assert_eq!(ServerConfig::upload_limit_bytes(usize::MAX), usize::MAX);
        assert_eq!(ServerConfig::upload_limit_bytes(usize::MAX / 1024), usize::MAX);
    }

    #[test]
    fn test_bind_address() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..ServerConfig::default()
        };
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
