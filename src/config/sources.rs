//! Order source configuration

use crate::source::{JsonLinesSource, OrderSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// File of newline-delimited JSON orders
    JsonLines,
}

/// Source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Store identifier; orders keep their own `source_id`
    pub id: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub path: PathBuf,
}

impl SourceConfig {
    pub fn build(&self) -> Arc<dyn OrderSource> {
        match self.source_type {
            SourceType::JsonLines => Arc::new(JsonLinesSource::new(&self.id, &self.path)),
        }
    }
}
