//! Call log recorder
//!
//! Builds the immutable history entry for each accepted disposition change.
//! Inside a disposition update the entry is only drafted here and appended by
//! the store in the same commit as the order write; [`CallLogRecorder::record`]
//! is the standalone path for callers that append outside of an update.

use crate::disposition::Disposition;
use crate::order::{CallLogEntry, CallTiming, Order};
use crate::roster::CallerDirectory;
use crate::store::{OrderStore, StoreError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors from recording a call log entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallLogError {
    #[error("unknown order: {0}")]
    UnknownOrder(String),

    #[error("unknown caller: {0}")]
    UnknownCaller(String),

    #[error(transparent)]
    Store(StoreError),
}

/// Creates call log entries.
pub struct CallLogRecorder {
    store: Arc<dyn OrderStore>,
    callers: Arc<dyn CallerDirectory>,
}

impl CallLogRecorder {
    pub fn new(store: Arc<dyn OrderStore>, callers: Arc<dyn CallerDirectory>) -> Self {
        Self { store, callers }
    }

    /// Build an unsaved entry for a change to `order`.
    ///
    /// The sequence number and final timestamp are assigned by the store when
    /// the entry is appended. The dialed phone is the order's current one.
    pub fn draft(
        &self,
        order: &Order,
        caller_id: &str,
        from: Disposition,
        to: Disposition,
        note: Option<String>,
        timing: CallTiming,
    ) -> Result<CallLogEntry, CallLogError> {
        if self.callers.caller(caller_id).is_none() {
            return Err(CallLogError::UnknownCaller(caller_id.to_string()));
        }

        Ok(CallLogEntry {
            entry_id: Uuid::new_v4(),
            sequence: 0,
            order_id: order.id.clone(),
            caller_id: caller_id.to_string(),
            phone: order.customer.phone.clone(),
            from,
            to,
            note: note.filter(|n| !n.trim().is_empty()),
            timing: timing.normalized(),
            recorded_at: Utc::now(),
        })
    }

    /// Append an entry for an existing order.
    ///
    /// # Errors
    ///
    /// - `UnknownOrder` if the order was never ingested
    /// - `UnknownCaller` if the caller is not in the directory
    pub async fn record(
        &self,
        order_id: &str,
        caller_id: &str,
        from: Disposition,
        to: Disposition,
        note: Option<String>,
        timing: CallTiming,
    ) -> Result<CallLogEntry, CallLogError> {
        let order = self
            .store
            .load_order(order_id)
            .await
            .map_err(CallLogError::Store)?
            .ok_or_else(|| CallLogError::UnknownOrder(order_id.to_string()))?;

        let entry = self.draft(&order, caller_id, from, to, note, timing)?;
        let stored = self.store.append_log(entry).await.map_err(|e| match e {
            StoreError::OrderNotFound(id) => CallLogError::UnknownOrder(id),
            other => CallLogError::Store(other),
        })?;

        tracing::debug!(
            order_id = %stored.order_id,
            sequence = stored.sequence,
            from = %stored.from,
            to = %stored.to,
            "Call logged"
        );
        Ok(stored)
    }

    /// History of an order, oldest first.
    pub async fn history(&self, order_id: &str) -> Result<Vec<CallLogEntry>, CallLogError> {
        if self
            .store
            .load_order(order_id)
            .await
            .map_err(CallLogError::Store)?
            .is_none()
        {
            return Err(CallLogError::UnknownOrder(order_id.to_string()));
        }
        self.store
            .history(order_id)
            .await
            .map_err(CallLogError::Store)
    }
}
