//! Persistence seam for orders, caller queues and call history.
//!
//! The engine talks to storage only through [`OrderStore`]. A store must
//! provide insert-if-absent by order id and a versioned commit that applies
//! the order write, its queue effects and an optional call log entry as one
//! unit. [`InMemoryStore`] is the bundled implementation; a relational
//! backend maps `commit` onto a row-level compare-and-set in one transaction.

mod error;
mod log;
mod memory;
mod queue;

pub use error::*;
pub use log::CallLog;
pub use memory::InMemoryStore;
pub use queue::{CallerQueues, QueueEntry, QueueStats};

use crate::order::{CallLogEntry, Order};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of inserting an order that may already exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The order was new and is now stored.
    Inserted(Order),
    /// An order with the same id was already stored; it is returned unchanged.
    Existing(Order),
}

/// Where a committed order lands in the caller queues.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueEffect {
    /// Caller whose queue the order leaves
    pub dequeue: Option<String>,
    /// Caller whose queue the order joins, and when
    pub enqueue: Option<(String, DateTime<Utc>)>,
}

impl QueueEffect {
    /// No queue change.
    pub fn none() -> Self {
        Self::default()
    }

    /// Leave `caller_id`'s queue.
    pub fn release(caller_id: Option<String>) -> Self {
        Self {
            dequeue: caller_id,
            enqueue: None,
        }
    }

    /// Leave `from` (if any) and join `to` at `assigned_at`.
    pub fn move_to(from: Option<String>, to: String, assigned_at: DateTime<Utc>) -> Self {
        Self {
            dequeue: from,
            enqueue: Some((to, assigned_at)),
        }
    }
}

/// A guarded write of one order.
///
/// The store applies it only if the stored version still equals
/// `expected_version`; otherwise it fails with [`StoreError::Conflict`] and
/// nothing is written.
#[derive(Debug, Clone)]
pub struct OrderCommit {
    pub expected_version: u64,
    /// The order as it should be stored (its `version` field is ignored)
    pub order: Order,
    pub queue: QueueEffect,
    pub log_entry: Option<CallLogEntry>,
}

/// What a successful commit wrote.
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    /// The stored order, with its new version
    pub order: Order,
    /// The stored log entry, with its sequence number and final timestamp
    pub log_entry: Option<CallLogEntry>,
}

/// Transactional storage for orders, queues and call history.
///
/// All methods are cancellation-safe: a dropped future either committed fully
/// or not at all.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Store `order` unless an order with the same id exists.
    async fn insert_order(&self, order: Order) -> Result<InsertOutcome, StoreError>;

    /// Latest committed copy of an order.
    async fn load_order(&self, order_id: &str) -> Result<Option<Order>, StoreError>;

    /// Apply a versioned commit atomically.
    async fn commit(&self, commit: OrderCommit) -> Result<CommitReceipt, StoreError>;

    /// Append a call log entry outside of an order commit.
    async fn append_log(&self, entry: CallLogEntry) -> Result<CallLogEntry, StoreError>;

    /// Call history of an order, oldest first.
    async fn history(&self, order_id: &str) -> Result<Vec<CallLogEntry>, StoreError>;

    /// A caller's queue, oldest assignment first.
    async fn queue_snapshot(&self, caller_id: &str) -> Result<Vec<QueueEntry>, StoreError>;

    /// Queue load for each of `caller_ids`, in the same order.
    async fn queue_stats(&self, caller_ids: &[String]) -> Result<Vec<QueueStats>, StoreError>;

    /// Every order that has not reached a terminal state.
    async fn open_orders(&self) -> Result<Vec<Order>, StoreError>;
}
