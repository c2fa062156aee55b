//! Per-caller queues of assigned orders.

use super::QueueError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One order reference in a caller's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub order_id: String,
    pub assigned_at: DateTime<Utc>,
}

/// Load figures the allocator ranks callers by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub caller_id: String,
    pub size: usize,
    /// Most recent assignment to this caller, if any
    pub last_assigned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct CallerQueue {
    /// Ordered by assignment time, then order id
    entries: BTreeSet<(DateTime<Utc>, String)>,
    positions: HashMap<String, DateTime<Utc>>,
    last_assigned_at: Option<DateTime<Utc>>,
}

/// Mapping caller → ordered set of order references.
///
/// Callers of [`CallerQueues::enqueue`] must hold the per-order guard (the
/// order's versioned commit); that is what keeps an order in at most one
/// queue. Each caller's queue lives behind its own map entry, so operations
/// on different callers never contend.
#[derive(Debug, Default)]
pub struct CallerQueues {
    queues: DashMap<String, CallerQueue>,
}

impl CallerQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an order to a caller's queue.
    ///
    /// Re-enqueueing an order the caller already holds moves it to its new
    /// assignment time.
    pub fn enqueue(&self, caller_id: &str, order_id: &str, assigned_at: DateTime<Utc>) {
        let mut queue = self.queues.entry(caller_id.to_string()).or_default();

        if let Some(previous) = queue.positions.remove(order_id) {
            queue.entries.remove(&(previous, order_id.to_string()));
        }
        queue.entries.insert((assigned_at, order_id.to_string()));
        queue.positions.insert(order_id.to_string(), assigned_at);
        queue.last_assigned_at = Some(match queue.last_assigned_at {
            Some(last) if last > assigned_at => last,
            _ => assigned_at,
        });
    }

    /// Remove an order from a caller's queue.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotFound` if the caller does not hold the order;
    /// nothing is changed in that case.
    pub fn dequeue(&self, caller_id: &str, order_id: &str) -> Result<(), QueueError> {
        let not_found = || QueueError::NotFound {
            caller_id: caller_id.to_string(),
            order_id: order_id.to_string(),
        };

        let mut queue = self.queues.get_mut(caller_id).ok_or_else(not_found)?;
        let assigned_at = queue.positions.remove(order_id).ok_or_else(not_found)?;
        queue.entries.remove(&(assigned_at, order_id.to_string()));
        Ok(())
    }

    /// Number of orders in a caller's queue.
    pub fn size_of(&self, caller_id: &str) -> usize {
        self.queues
            .get(caller_id)
            .map(|queue| queue.entries.len())
            .unwrap_or(0)
    }

    pub fn contains(&self, caller_id: &str, order_id: &str) -> bool {
        self.queues
            .get(caller_id)
            .map(|queue| queue.positions.contains_key(order_id))
            .unwrap_or(false)
    }

    /// Copy of a caller's queue, oldest assignment first.
    pub fn snapshot(&self, caller_id: &str) -> Vec<QueueEntry> {
        self.queues
            .get(caller_id)
            .map(|queue| {
                queue
                    .entries
                    .iter()
                    .map(|(assigned_at, order_id)| QueueEntry {
                        order_id: order_id.clone(),
                        assigned_at: *assigned_at,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Load figures for one caller. Unknown callers report an empty queue.
    pub fn stats(&self, caller_id: &str) -> QueueStats {
        match self.queues.get(caller_id) {
            Some(queue) => QueueStats {
                caller_id: caller_id.to_string(),
                size: queue.entries.len(),
                last_assigned_at: queue.last_assigned_at,
            },
            None => QueueStats {
                caller_id: caller_id.to_string(),
                size: 0,
                last_assigned_at: None,
            },
        }
    }
}
