//! Error types for the persistence seam.

use thiserror::Error;

/// Errors returned by an [`OrderStore`](super::OrderStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The record changed since it was read; reload and retry.
    #[error("version conflict on order {order_id}: expected {expected}, found {actual}")]
    Conflict {
        order_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// Backend failure (connection loss, constraint violation, ...)
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors from queue store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Non-fatal: the entry was already gone.
    #[error("order {order_id} not in queue of caller {caller_id}")]
    NotFound { caller_id: String, order_id: String },
}
