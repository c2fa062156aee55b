//! Assignment allocator
//!
//! Chooses the caller for a new or requeued order. Every assignment is a
//! versioned commit against the order record, so the exclusivity check and
//! the assignment write happen as one compare-and-set; a caller that loses
//! the race reloads and re-validates against the winner's write.

mod config;
mod error;
mod selection;

pub use config::{delay, saturating_after, AllocationConfig, MAX_DELAY_SECONDS};
pub use error::AllocationError;
pub use selection::{classify, select_caller, AssignmentReason, SweepAction};

use crate::order::Order;
use crate::roster::CallerDirectory;
use crate::store::{OrderCommit, OrderStore, QueueEffect, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A committed assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub caller_id: String,
    /// The order as stored after the assignment
    pub order: Order,
}

/// Assigns orders to callers with fairness and exclusivity guarantees.
pub struct Allocator {
    store: Arc<dyn OrderStore>,
    callers: Arc<dyn CallerDirectory>,
    config: AllocationConfig,
}

impl Allocator {
    pub fn new(
        store: Arc<dyn OrderStore>,
        callers: Arc<dyn CallerDirectory>,
        config: AllocationConfig,
    ) -> Self {
        Self {
            store,
            callers,
            config,
        }
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// Assign an unassigned order to the least-loaded active caller.
    ///
    /// # Errors
    ///
    /// - `AlreadyAssigned` if the order has a caller (including when a
    ///   concurrent assignment won the race)
    /// - `OrderClosed` if the order is terminal
    /// - `NoActiveCallers` if nobody can take it; the order is left untouched
    pub async fn assign(
        &self,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Assignment, AllocationError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let order = self.load(order_id).await?;

            if order.is_closed() {
                return Err(AllocationError::OrderClosed {
                    order_id: order.id,
                });
            }
            if let Some(caller_id) = &order.assigned_caller {
                return Err(AllocationError::AlreadyAssigned {
                    order_id: order.id.clone(),
                    caller_id: caller_id.clone(),
                });
            }

            let caller_id = self.pick(&order.id, None).await?;
            match self
                .commit_assignment(order, caller_id, now, AssignmentReason::Initial)
                .await
            {
                Ok(assignment) => return Ok(assignment),
                Err(StoreError::Conflict { .. }) => {
                    self.on_conflict(order_id, attempts)?;
                }
                Err(e) => return Err(AllocationError::Store(e)),
            }
        }
    }

    /// Clear the current assignment and pick a caller again, avoiding the
    /// previous one while another active caller exists.
    ///
    /// Returns `Ok(None)` for a closed order.
    pub async fn reassign(
        &self,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Assignment>, AllocationError> {
        self.reassign_when(order_id, now, AssignmentReason::Manual, |_| true)
            .await
    }

    /// Reassign only while `needed` holds for the latest copy of the order.
    ///
    /// The predicate is re-checked after every reload, so repeating a call
    /// whose work was already done (by an earlier sweep, or a concurrent
    /// update) is a no-op that returns `Ok(None)`.
    pub async fn reassign_when<F>(
        &self,
        order_id: &str,
        now: DateTime<Utc>,
        reason: AssignmentReason,
        needed: F,
    ) -> Result<Option<Assignment>, AllocationError>
    where
        F: Fn(&Order) -> bool + Send + Sync,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let order = self.load(order_id).await?;
            if order.is_closed() || !needed(&order) {
                return Ok(None);
            }

            let exclude = order
                .assigned_caller
                .clone()
                .or_else(|| order.previous_caller.clone());
            let caller_id = self.pick(&order.id, exclude.as_deref()).await?;

            match self.commit_assignment(order, caller_id, now, reason).await {
                Ok(assignment) => return Ok(Some(assignment)),
                Err(StoreError::Conflict { .. }) => {
                    self.on_conflict(order_id, attempts)?;
                }
                Err(e) => return Err(AllocationError::Store(e)),
            }
        }
    }

    async fn load(&self, order_id: &str) -> Result<Order, AllocationError> {
        self.store
            .load_order(order_id)
            .await
            .map_err(AllocationError::Store)?
            .ok_or_else(|| AllocationError::UnknownOrder(order_id.to_string()))
    }

    async fn pick(&self, order_id: &str, exclude: Option<&str>) -> Result<String, AllocationError> {
        let no_callers = || AllocationError::NoActiveCallers {
            order_id: order_id.to_string(),
        };

        let ids: Vec<String> = self
            .callers
            .active_callers()
            .into_iter()
            .map(|c| c.id)
            .collect();
        if ids.is_empty() {
            return Err(no_callers());
        }

        let stats = self
            .store
            .queue_stats(&ids)
            .await
            .map_err(AllocationError::Store)?;
        select_caller(&stats, exclude).ok_or_else(no_callers)
    }

    async fn commit_assignment(
        &self,
        order: Order,
        caller_id: String,
        now: DateTime<Utc>,
        reason: AssignmentReason,
    ) -> Result<Assignment, StoreError> {
        let expected_version = order.version;
        let released = order.assigned_caller.clone();

        let mut next = order;
        if released.is_some() {
            next.previous_caller = released.clone();
        }
        next.assigned_caller = Some(caller_id.clone());
        next.assigned_at = Some(now);
        next.follow_up_at = None;
        next.updated_at = now;

        let receipt = self
            .store
            .commit(OrderCommit {
                expected_version,
                order: next,
                queue: QueueEffect::move_to(released, caller_id.clone(), now),
                log_entry: None,
            })
            .await?;

        metrics::counter!("dispatch_assignments_total", "reason" => reason.as_str())
            .increment(1);
        tracing::info!(
            order_id = %receipt.order.id,
            caller_id = %caller_id,
            reason = %reason,
            "Order assigned"
        );

        Ok(Assignment {
            caller_id,
            order: receipt.order,
        })
    }

    fn on_conflict(&self, order_id: &str, attempts: u32) -> Result<(), AllocationError> {
        metrics::counter!("dispatch_conflict_retries_total").increment(1);
        if attempts > self.config.max_conflict_retries {
            tracing::warn!(order_id = %order_id, attempts, "Giving up on contended order");
            return Err(AllocationError::ConcurrencyConflict {
                order_id: order_id.to_string(),
                attempts,
            });
        }
        tracing::debug!(order_id = %order_id, attempts, "Version conflict, retrying");
        Ok(())
    }
}
