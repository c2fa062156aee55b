//! Metrics exporter configuration

use serde::{Deserialize, Serialize};

/// Prometheus scrape endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Start the Prometheus listener in `serve`
    pub enabled: bool,
    /// Socket address the listener binds to
    pub listen: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: "127.0.0.1:9464".to_string(),
        }
    }
}
