//! Error taxonomy surfaced by the engine.

use crate::allocation::AllocationError;
use crate::call_log::CallLogError;
use crate::disposition::{Disposition, TransitionError};
use crate::source::SourceError;
use crate::store::{QueueError, StoreError};
use std::fmt;
use thiserror::Error;

/// Errors returned by [`DispositionEngine`](super::DispositionEngine) operations.
///
/// A failed operation leaves every entity in its last committed state.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid transition for order {order_id}: {from} -> {to}")]
    InvalidTransition {
        order_id: String,
        from: Disposition,
        to: Disposition,
    },

    #[error("order {order_id} is closed")]
    OrderClosed { order_id: String },

    #[error("order {order_id} is assigned to {caller_id}")]
    AlreadyAssigned { order_id: String, caller_id: String },

    #[error("no active callers available for order {order_id}")]
    NoActiveCallers { order_id: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown order: {0}")]
    UnknownOrder(String),

    #[error("unknown caller: {0}")]
    UnknownCaller(String),

    #[error("order {order_id} kept changing; gave up after {attempts} attempts")]
    ConcurrencyConflict { order_id: String, attempts: u32 },

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Stable, transport-agnostic name of an [`EngineError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidTransition,
    OrderClosed,
    AlreadyAssigned,
    NoActiveCallers,
    NotFound,
    UnknownOrder,
    UnknownCaller,
    ConcurrencyConflict,
    Store,
    Source,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::OrderClosed => "order_closed",
            ErrorKind::AlreadyAssigned => "already_assigned",
            ErrorKind::NoActiveCallers => "no_active_callers",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnknownOrder => "unknown_order",
            ErrorKind::UnknownCaller => "unknown_caller",
            ErrorKind::ConcurrencyConflict => "concurrency_conflict",
            ErrorKind::Store => "store",
            ErrorKind::Source => "source",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            EngineError::OrderClosed { .. } => ErrorKind::OrderClosed,
            EngineError::AlreadyAssigned { .. } => ErrorKind::AlreadyAssigned,
            EngineError::NoActiveCallers { .. } => ErrorKind::NoActiveCallers,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::UnknownOrder(_) => ErrorKind::UnknownOrder,
            EngineError::UnknownCaller(_) => ErrorKind::UnknownCaller,
            EngineError::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            EngineError::Store(_) => ErrorKind::Store,
            EngineError::Source(_) => ErrorKind::Source,
        }
    }
}

impl From<TransitionError> for EngineError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::OrderClosed { order_id, .. } => EngineError::OrderClosed { order_id },
            TransitionError::InvalidTransition { order_id, from, to } => {
                EngineError::InvalidTransition { order_id, from, to }
            }
        }
    }
}

impl From<AllocationError> for EngineError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::AlreadyAssigned {
                order_id,
                caller_id,
            } => EngineError::AlreadyAssigned {
                order_id,
                caller_id,
            },
            AllocationError::NoActiveCallers { order_id } => {
                EngineError::NoActiveCallers { order_id }
            }
            AllocationError::OrderClosed { order_id } => EngineError::OrderClosed { order_id },
            AllocationError::UnknownOrder(id) => EngineError::UnknownOrder(id),
            AllocationError::ConcurrencyConflict { order_id, attempts } => {
                EngineError::ConcurrencyConflict { order_id, attempts }
            }
            AllocationError::Store(e) => e.into(),
        }
    }
}

impl From<CallLogError> for EngineError {
    fn from(err: CallLogError) -> Self {
        match err {
            CallLogError::UnknownOrder(id) => EngineError::UnknownOrder(id),
            CallLogError::UnknownCaller(id) => EngineError::UnknownCaller(id),
            CallLogError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OrderNotFound(id) => EngineError::UnknownOrder(id),
            StoreError::Conflict { order_id, .. } => EngineError::ConcurrencyConflict {
                order_id,
                attempts: 1,
            },
            other => EngineError::Store(other),
        }
    }
}

impl From<QueueError> for EngineError {
    fn from(err: QueueError) -> Self {
        EngineError::NotFound(err.to_string())
    }
}
