//! Errors from loading and validating `dispatch.toml`

use crate::disposition::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be used.
///
/// Load errors name the file; validation errors name the offending key, e.g.
/// `callers[1].id` or `allocation.follow_up_delay_seconds`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// `[dispositions]` overrides that break the graph's invariants
    #[error("invalid [dispositions] section: {0}")]
    Graph(#[from] GraphError),
}

impl ConfigError {
    /// Key the error points at, if it is a validation error.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
