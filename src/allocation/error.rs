//! Error types for allocation failures

use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur while assigning an order to a caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The order already has a caller
    #[error("order {order_id} is already assigned to {caller_id}")]
    AlreadyAssigned { order_id: String, caller_id: String },

    /// No caller is currently active; the order stays unassigned
    #[error("no active callers available for order {order_id}")]
    NoActiveCallers { order_id: String },

    /// The order reached a terminal state
    #[error("order {order_id} is closed")]
    OrderClosed { order_id: String },

    #[error("unknown order: {0}")]
    UnknownOrder(String),

    /// Version conflicts persisted through every retry
    #[error("order {order_id} kept changing; gave up after {attempts} attempts")]
    ConcurrencyConflict { order_id: String, attempts: u32 },

    #[error(transparent)]
    Store(StoreError),
}
