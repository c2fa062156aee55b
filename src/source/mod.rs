//! Order sources
//!
//! A source is one storefront feed already normalized into [`NewOrder`]
//! records. The engine polls each source with the cursor returned by its
//! previous poll; sources must tolerate a cursor being replayed, since the
//! engine deduplicates by order id rather than trusting delivery.

use crate::order::NewOrder;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Opaque position in a source's feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCursor(pub String);

impl SourceCursor {
    /// Cursor for the start of a feed.
    pub fn start() -> Self {
        Self::default()
    }
}

/// One poll's worth of orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBatch {
    pub orders: Vec<NewOrder>,
    /// Cursor to pass to the next poll
    pub next_cursor: SourceCursor,
}

/// Errors that can occur while polling a source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read source {source_id}: {message}")]
    Io { source_id: String, message: String },

    #[error("malformed order in source {source_id} at line {line}: {message}")]
    Malformed {
        source_id: String,
        line: usize,
        message: String,
    },

    #[error("invalid cursor for source {source_id}: {cursor}")]
    InvalidCursor { source_id: String, cursor: String },
}

/// A feed of normalized orders from one store.
#[async_trait]
pub trait OrderSource: Send + Sync + 'static {
    /// Stable identifier of the store behind this source.
    fn id(&self) -> &str;

    /// Orders delivered after `since`, plus the cursor to resume from.
    async fn poll_new_orders(&self, since: &SourceCursor) -> Result<SourceBatch, SourceError>;
}

/// Source backed by a file of JSON lines, one [`NewOrder`] per line.
///
/// The cursor is the number of lines already consumed, so appending to the
/// file delivers only the new lines on the next poll. Blank lines count
/// toward the cursor but carry no order.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    id: String,
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_cursor(&self, cursor: &SourceCursor) -> Result<usize, SourceError> {
        if cursor.0.is_empty() {
            return Ok(0);
        }
        cursor.0.parse().map_err(|_| SourceError::InvalidCursor {
            source_id: self.id.clone(),
            cursor: cursor.0.clone(),
        })
    }
}

#[async_trait]
impl OrderSource for JsonLinesSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn poll_new_orders(&self, since: &SourceCursor) -> Result<SourceBatch, SourceError> {
        let skip = self.parse_cursor(since)?;

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            // Feed not created yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(SourceError::Io {
                    source_id: self.id.clone(),
                    message: e.to_string(),
                })
            }
        };

        // A trailing line without a newline may still be in the middle of a
        // write; leave it for the next poll.
        let complete = match content.rfind('\n') {
            Some(pos) => &content[..=pos],
            None => "",
        };

        let mut orders = Vec::new();
        let mut consumed = 0;
        for (index, line) in complete.lines().enumerate() {
            consumed = index + 1;
            if index < skip || line.trim().is_empty() {
                continue;
            }
            let order: NewOrder =
                serde_json::from_str(line).map_err(|e| SourceError::Malformed {
                    source_id: self.id.clone(),
                    line: index + 1,
                    message: e.to_string(),
                })?;
            orders.push(order);
        }

        Ok(SourceBatch {
            orders,
            next_cursor: SourceCursor(consumed.max(skip).to_string()),
        })
    }
}
