//! Queue reader
//!
//! Read-only projection of a caller's queue into [`OrderSummary`] values.
//! Each traversal starts from a fresh snapshot of the queue and fetches
//! orders one at a time, so a long queue is never materialized up front and
//! readers never block writers.

use crate::order::OrderSummary;
use crate::store::{OrderStore, StoreError};
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// Produces queue views.
#[derive(Clone)]
pub struct QueueReader {
    store: Arc<dyn OrderStore>,
}

impl QueueReader {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// The queue of `caller_id`. Unknown callers have an empty queue.
    pub fn queue_for(&self, caller_id: &str) -> QueueView {
        QueueView {
            store: Arc::clone(&self.store),
            caller_id: caller_id.to_string(),
        }
    }
}

/// A restartable view over one caller's queue, oldest assignment first.
#[derive(Clone)]
pub struct QueueView {
    store: Arc<dyn OrderStore>,
    caller_id: String,
}

impl QueueView {
    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }

    /// Lazily yield the queue's orders.
    ///
    /// Orders that left the caller between the snapshot and the fetch are
    /// skipped. Calling `stream` again starts a new traversal.
    pub fn stream(&self) -> impl Stream<Item = Result<OrderSummary, StoreError>> + Send + 'static {
        let store = Arc::clone(&self.store);
        let caller_id = self.caller_id.clone();

        async_stream::stream! {
            let entries = match store.queue_snapshot(&caller_id).await {
                Ok(entries) => entries,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for entry in entries {
                match store.load_order(&entry.order_id).await {
                    Ok(Some(order)) if order.assigned_caller.as_deref() == Some(caller_id.as_str()) => {
                        yield Ok(OrderSummary::from(&order));
                    }
                    Ok(_) => {
                        tracing::trace!(
                            caller_id = %caller_id,
                            order_id = %entry.order_id,
                            "Skipping order that left the queue"
                        );
                    }
                    Err(e) => yield Err(e),
                }
            }
        }
    }

    /// Drain the stream into a vector.
    pub async fn collect(&self) -> Result<Vec<OrderSummary>, StoreError> {
        let mut out = Vec::new();
        let stream = self.stream();
        futures::pin_mut!(stream);
        while let Some(item) = stream.next().await {
            out.push(item?);
        }
        Ok(out)
    }
}
