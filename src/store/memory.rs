//! In-memory [`OrderStore`] implementation.

use super::{
    CallLog, CallerQueues, CommitReceipt, InsertOutcome, OrderCommit, OrderStore, QueueEntry,
    QueueStats, StoreError,
};
use crate::order::{CallLogEntry, Order};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Thread-safe in-memory store.
///
/// The order's map entry is the per-order guard: a commit holds it while it
/// checks the version and applies the queue and log effects, so two commits
/// on the same order serialize and commits on different orders do not.
/// Locks are always taken in the order orders → queues → log, and readers
/// never hold a queue entry while reading an order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    orders: DashMap<String, Order>,
    queues: CallerQueues,
    log: CallLog,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders, open or closed.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Direct access to the queue store.
    pub fn queues(&self) -> &CallerQueues {
        &self.queues
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: Order) -> Result<InsertOutcome, StoreError> {
        match self.orders.entry(order.id.clone()) {
            Entry::Occupied(existing) => Ok(InsertOutcome::Existing(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(InsertOutcome::Inserted(order))
            }
        }
    }

    async fn load_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(order_id).map(|entry| entry.value().clone()))
    }

    async fn commit(&self, commit: OrderCommit) -> Result<CommitReceipt, StoreError> {
        let OrderCommit {
            expected_version,
            mut order,
            queue,
            log_entry,
        } = commit;

        let mut stored = self
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::OrderNotFound(order.id.clone()))?;

        if stored.version != expected_version {
            return Err(StoreError::Conflict {
                order_id: order.id.clone(),
                expected: expected_version,
                actual: stored.version,
            });
        }

        if let Some(caller_id) = &queue.dequeue {
            if let Err(e) = self.queues.dequeue(caller_id, &order.id) {
                tracing::debug!(error = %e, "Dequeue was a no-op");
            }
        }
        if let Some((caller_id, assigned_at)) = &queue.enqueue {
            self.queues.enqueue(caller_id, &order.id, *assigned_at);
        }
        let log_entry = log_entry.map(|entry| self.log.append(entry));

        order.version = expected_version + 1;
        *stored = order.clone();

        Ok(CommitReceipt { order, log_entry })
    }

    async fn append_log(&self, entry: CallLogEntry) -> Result<CallLogEntry, StoreError> {
        // Hold the order entry so the append serializes with commits.
        let _guard = self
            .orders
            .get(&entry.order_id)
            .ok_or_else(|| StoreError::OrderNotFound(entry.order_id.clone()))?;
        Ok(self.log.append(entry))
    }

    async fn history(&self, order_id: &str) -> Result<Vec<CallLogEntry>, StoreError> {
        Ok(self.log.history(order_id))
    }

    async fn queue_snapshot(&self, caller_id: &str) -> Result<Vec<QueueEntry>, StoreError> {
        Ok(self.queues.snapshot(caller_id))
    }

    async fn queue_stats(&self, caller_ids: &[String]) -> Result<Vec<QueueStats>, StoreError> {
        Ok(caller_ids.iter().map(|id| self.queues.stats(id)).collect())
    }

    async fn open_orders(&self) -> Result<Vec<Order>, StoreError> {
        let mut open: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| !entry.value().is_closed())
            .map(|entry| entry.value().clone())
            .collect();
        open.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(open)
    }
}
