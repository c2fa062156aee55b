//! Configuration module for the dispatch engine
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`DISPATCH_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use dispatch::config::DispatchConfig;
//!
//! let config = DispatchConfig::default();
//! assert_eq!(config.sweep.interval_seconds, 30);
//!
//! let toml = r#"
//! [sweep]
//! interval_seconds = 10
//! "#;
//! let config: DispatchConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.sweep.interval_seconds, 10);
//! ```

pub mod callers;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod sources;

pub use callers::CallerConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use metrics::MetricsConfig;
pub use sources::{SourceConfig, SourceType};

// Section types owned by their modules
pub use crate::allocation::AllocationConfig;
pub use crate::disposition::DispositionConfig;
pub use crate::sweep::SweepConfig;

use crate::allocation::MAX_DELAY_SECONDS;
use crate::disposition::TransitionGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

/// Bundled example configuration, written by `dispatch config init`.
pub const EXAMPLE_CONFIG: &str = include_str!("../../dispatch.example.toml");

/// Unified configuration for the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Assignment tuning
    pub allocation: AllocationConfig,
    /// Periodic requeue sweep
    pub sweep: SweepConfig,
    /// Disposition category and transition overrides
    pub dispositions: DispositionConfig,
    /// Callers seeded into the roster
    pub callers: Vec<CallerConfig>,
    /// Order feeds polled by the sweep
    pub sources: Vec<SourceConfig>,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl DispatchConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse {
                    path: p.to_path_buf(),
                    message: e.to_string(),
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports DISPATCH_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("DISPATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DISPATCH_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(sweep) = std::env::var("DISPATCH_SWEEP") {
            self.sweep.enabled = sweep.to_lowercase() == "true";
        }
        if let Ok(interval) = std::env::var("DISPATCH_SWEEP_INTERVAL") {
            if let Ok(secs) = interval.parse() {
                self.sweep.interval_seconds = secs;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep.interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "sweep.interval_seconds".to_string(),
                message: "interval must be non-zero".to_string(),
            });
        }
        if self.sweep.stale_assignment_seconds == Some(0) {
            return Err(ConfigError::Validation {
                field: "sweep.stale_assignment_seconds".to_string(),
                message: "threshold must be non-zero; omit it to disable".to_string(),
            });
        }

        let bounded = [
            ("sweep.interval_seconds", Some(self.sweep.interval_seconds)),
            ("sweep.stale_assignment_seconds", self.sweep.stale_assignment_seconds),
            (
                "allocation.follow_up_delay_seconds",
                Some(self.allocation.follow_up_delay_seconds),
            ),
        ];
        for (field, value) in bounded {
            if value.is_some_and(|v| v > MAX_DELAY_SECONDS) {
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: format!("must be at most {} seconds", MAX_DELAY_SECONDS),
                });
            }
        }

        let mut caller_ids = HashSet::new();
        for (i, caller) in self.callers.iter().enumerate() {
            if caller.id.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("callers[{}].id", i),
                    message: "id cannot be empty".to_string(),
                });
            }
            if !caller_ids.insert(caller.id.as_str()) {
                return Err(ConfigError::Validation {
                    field: format!("callers[{}].id", i),
                    message: format!("duplicate caller id '{}'", caller.id),
                });
            }
        }

        let mut source_ids = HashSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            if source.id.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("sources[{}].id", i),
                    message: "id cannot be empty".to_string(),
                });
            }
            if !source_ids.insert(source.id.as_str()) {
                return Err(ConfigError::Validation {
                    field: format!("sources[{}].id", i),
                    message: format!("duplicate source id '{}'", source.id),
                });
            }
            if source.path.as_os_str().is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("sources[{}].path", i),
                    message: "path cannot be empty".to_string(),
                });
            }
        }

        if self.metrics.enabled && self.metrics.listen.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation {
                field: "metrics.listen".to_string(),
                message: format!("'{}' is not a socket address", self.metrics.listen),
            });
        }

        self.transition_graph()?;
        Ok(())
    }

    /// Build the disposition graph described by `[dispositions]`.
    pub fn transition_graph(&self) -> Result<TransitionGraph, ConfigError> {
        Ok(TransitionGraph::from_config(&self.dispositions)?)
    }
}
