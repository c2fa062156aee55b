//! Disposition engine
//!
//! The facade the API layer calls. It wires the state machine, allocator,
//! call log recorder and queue reader over one [`OrderStore`] and one
//! [`CallerDirectory`], and owns the per-source ingestion cursors.
//!
//! Every mutation follows the same shape: load the order, validate against
//! that copy, and commit with the copy's version. A version conflict means
//! another writer got there first, so the whole step is re-run against the
//! fresh record, which is how a race loser ends up with `AlreadyAssigned`,
//! `OrderClosed` or `InvalidTransition` instead of a silent overwrite.

mod error;

pub use error::{EngineError, ErrorKind};

use crate::allocation::{
    classify, saturating_after, AllocationConfig, AllocationError, Allocator, SweepAction,
};
use crate::call_log::CallLogRecorder;
use crate::disposition::{Category, Disposition, TransitionGraph};
use crate::order::{CallLogEntry, CallTiming, NewOrder, Order, OrderSummary};
use crate::reader::{QueueReader, QueueView};
use crate::roster::CallerDirectory;
use crate::source::{OrderSource, SourceCursor};
use crate::store::{InsertOutcome, OrderCommit, OrderStore, QueueEffect, StoreError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A caller's report of a call outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionUpdate {
    pub order_id: String,
    pub caller_id: String,
    pub disposition: Disposition,
    #[serde(default)]
    pub note: Option<String>,
    /// Requested follow-up time for PENDING_ACTION outcomes
    #[serde(default)]
    pub follow_up_at: Option<DateTime<Utc>>,
    /// Dialer timing, copied into the call log
    #[serde(flatten)]
    pub timing: CallTiming,
}

impl DispositionUpdate {
    pub fn new(order_id: &str, caller_id: &str, disposition: Disposition) -> Self {
        Self {
            order_id: order_id.to_string(),
            caller_id: caller_id.to_string(),
            disposition,
            note: None,
            follow_up_at: None,
            timing: CallTiming::default(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_follow_up_at(mut self, at: DateTime<Utc>) -> Self {
        self.follow_up_at = Some(at);
        self
    }

    pub fn with_timing(mut self, timing: CallTiming) -> Self {
        self.timing = timing;
        self
    }
}

/// Result of [`DispositionEngine::ingest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// The stored order after ingestion and any assignment
    pub order: Order,
    /// False when the order id was already known
    pub created: bool,
    /// Caller the order was assigned to by this call, if any
    pub assigned_to: Option<String>,
}

/// Result of one ingestion cycle for a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullReport {
    pub source_id: String,
    /// Orders delivered by the source
    pub received: usize,
    /// Orders that were new to the engine
    pub created: usize,
    /// Orders assigned during this cycle
    pub assigned: usize,
}

/// Order distribution and disposition engine.
pub struct DispositionEngine {
    store: Arc<dyn OrderStore>,
    callers: Arc<dyn CallerDirectory>,
    graph: Arc<TransitionGraph>,
    allocator: Allocator,
    recorder: CallLogRecorder,
    reader: QueueReader,
    config: AllocationConfig,
    sources: DashMap<String, Arc<dyn OrderSource>>,
    cursors: DashMap<String, SourceCursor>,
}

impl DispositionEngine {
    pub fn new(
        store: Arc<dyn OrderStore>,
        callers: Arc<dyn CallerDirectory>,
        graph: TransitionGraph,
        config: AllocationConfig,
    ) -> Self {
        Self {
            allocator: Allocator::new(Arc::clone(&store), Arc::clone(&callers), config.clone()),
            recorder: CallLogRecorder::new(Arc::clone(&store), Arc::clone(&callers)),
            reader: QueueReader::new(Arc::clone(&store)),
            store,
            callers,
            graph: Arc::new(graph),
            config,
            sources: DashMap::new(),
            cursors: DashMap::new(),
        }
    }

    pub fn graph(&self) -> &TransitionGraph {
        &self.graph
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    pub fn callers(&self) -> &Arc<dyn CallerDirectory> {
        &self.callers
    }

    /// Ingest an order delivered by a source.
    ///
    /// Idempotent by order id: a repeated delivery never creates a second
    /// record or a second assignment. A re-delivered order that is still in
    /// NEW takes the storefront's latest contact and line-item fields.
    pub async fn ingest(&self, incoming: NewOrder) -> Result<IngestOutcome, EngineError> {
        let now = Utc::now();
        let order_id = incoming.order_id.clone();

        let (mut order, created) = match self
            .store
            .insert_order(Order::from_new(incoming.clone(), now))
            .await?
        {
            InsertOutcome::Inserted(order) => {
                metrics::counter!("dispatch_orders_ingested_total", "source" => order.source_id.clone())
                    .increment(1);
                tracing::info!(order_id = %order.id, source_id = %order.source_id, "Order ingested");
                (order, true)
            }
            InsertOutcome::Existing(existing) => {
                tracing::debug!(order_id = %existing.id, "Duplicate delivery");
                (self.refresh_if_new(existing, incoming, now).await?, false)
            }
        };

        let mut assigned_to = None;
        if order.assigned_caller.is_none()
            && !order.is_closed()
            && self.graph.category(order.disposition) == Category::Active
        {
            match self.allocator.assign(&order_id, now).await {
                Ok(assignment) => {
                    assigned_to = Some(assignment.caller_id);
                    order = assignment.order;
                }
                Err(AllocationError::NoActiveCallers { .. }) => {
                    tracing::warn!(order_id = %order_id, "No active callers, order left unassigned");
                }
                Err(AllocationError::AlreadyAssigned { .. }) => {
                    order = self.load(&order_id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(IngestOutcome {
            order,
            created,
            assigned_to,
        })
    }

    async fn refresh_if_new(
        &self,
        mut existing: Order,
        incoming: NewOrder,
        now: DateTime<Utc>,
    ) -> Result<Order, EngineError> {
        let mut attempts = 0;
        loop {
            if existing.disposition != Disposition::New || !existing.content_differs(&incoming) {
                return Ok(existing);
            }
            attempts += 1;

            let expected_version = existing.version;
            let mut next = existing.clone();
            next.refresh_content(incoming.clone());
            next.updated_at = now;

            match self
                .store
                .commit(OrderCommit {
                    expected_version,
                    order: next,
                    queue: QueueEffect::none(),
                    log_entry: None,
                })
                .await
            {
                Ok(receipt) => {
                    tracing::debug!(order_id = %receipt.order.id, "Refreshed order content");
                    return Ok(receipt.order);
                }
                Err(StoreError::Conflict { .. }) => {
                    self.on_conflict(&existing.id, attempts)?;
                    existing = self.load(&existing.id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Apply a caller's disposition update.
    ///
    /// Validates the transition, records it in the call log in the same
    /// commit as the order change, then requeues the order if its new state
    /// calls for it. Returns the order as stored afterwards.
    ///
    /// # Errors
    ///
    /// - `UnknownOrder` / `UnknownCaller` for ids the engine does not know
    /// - `OrderClosed` if the order is terminal
    /// - `InvalidTransition` if the graph has no such edge
    /// - `AlreadyAssigned` if another caller holds the order
    /// - `ConcurrencyConflict` if the order kept changing through every retry
    pub async fn update_disposition(
        &self,
        update: DispositionUpdate,
    ) -> Result<Order, EngineError> {
        let mut attempts = 0;
        let (committed, category, now) = loop {
            attempts += 1;
            let now = Utc::now();
            let order = self.load(&update.order_id).await?;

            if self.callers.caller(&update.caller_id).is_none() {
                return Err(EngineError::UnknownCaller(update.caller_id.clone()));
            }

            let outcome = self
                .graph
                .transition(&order, update.disposition, &update.caller_id)?;

            if let Some(holder) = &order.assigned_caller {
                if holder != &update.caller_id {
                    return Err(EngineError::AlreadyAssigned {
                        order_id: order.id.clone(),
                        caller_id: holder.clone(),
                    });
                }
            }

            let entry = self.recorder.draft(
                &order,
                &update.caller_id,
                outcome.from,
                outcome.to,
                update.note.clone(),
                update.timing,
            )?;

            let expected_version = order.version;
            let (next, queue) = self.apply_outcome(order, &update, outcome.category, now);

            match self
                .store
                .commit(OrderCommit {
                    expected_version,
                    order: next,
                    queue,
                    log_entry: Some(entry),
                })
                .await
            {
                Ok(receipt) => break (receipt, outcome.category, now),
                Err(StoreError::Conflict { .. }) => {
                    self.on_conflict(&update.order_id, attempts)?;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let mut order = committed.order;
        metrics::counter!("dispatch_transitions_total", "to" => order.disposition.as_str())
            .increment(1);
        tracing::info!(
            order_id = %order.id,
            caller_id = %update.caller_id,
            from = ?committed.log_entry.as_ref().map(|e| e.from),
            to = %order.disposition,
            category = %category,
            "Disposition recorded"
        );

        match category {
            Category::Active if order.assigned_caller.is_none() => {
                if let Some(assigned) = self.requeue(&order.id, now, None).await? {
                    order = assigned;
                }
            }
            Category::PendingAction if order.follow_up_at.is_some_and(|due| due <= now) => {
                if let Some(assigned) = self
                    .requeue(&order.id, now, Some(SweepAction::ReleaseFollowUp))
                    .await?
                {
                    order = assigned;
                }
            }
            _ => {}
        }

        Ok(order)
    }

    /// Build the post-transition order and its queue effect.
    fn apply_outcome(
        &self,
        order: Order,
        update: &DispositionUpdate,
        category: Category,
        now: DateTime<Utc>,
    ) -> (Order, QueueEffect) {
        let holder = order.assigned_caller.clone();
        let mut next = order;
        next.disposition = update.disposition;
        next.attempts += 1;
        next.updated_at = now;

        let queue = match category {
            Category::Active => {
                next.follow_up_at = None;
                QueueEffect::none()
            }
            Category::PendingAction => {
                let due = update
                    .follow_up_at
                    .unwrap_or_else(|| saturating_after(now, self.config.follow_up_delay_seconds));
                next.previous_caller = holder.clone().or_else(|| Some(update.caller_id.clone()));
                next.assigned_caller = None;
                next.assigned_at = None;
                next.follow_up_at = Some(due);
                QueueEffect::release(holder)
            }
            Category::Terminal => {
                next.previous_caller = holder.clone().or_else(|| Some(update.caller_id.clone()));
                next.assigned_caller = None;
                next.assigned_at = None;
                next.follow_up_at = None;
                next.closed_at = Some(now);
                QueueEffect::release(holder)
            }
        };

        (next, queue)
    }

    /// Reactive requeue after a transition. Allocation problems are logged;
    /// the transition itself already committed.
    async fn requeue(
        &self,
        order_id: &str,
        now: DateTime<Utc>,
        action: Option<SweepAction>,
    ) -> Result<Option<Order>, EngineError> {
        let result = match action {
            None => self.allocator.assign(order_id, now).await.map(Some),
            Some(action) => {
                let graph = Arc::clone(&self.graph);
                self.allocator
                    .reassign_when(order_id, now, action.reason(), move |order| {
                        classify(order, &graph, now, None) == Some(action)
                    })
                    .await
            }
        };

        match result {
            Ok(assignment) => Ok(assignment.map(|a| a.order)),
            Err(AllocationError::NoActiveCallers { .. }) => {
                tracing::warn!(order_id = %order_id, "No active callers, requeue deferred to sweep");
                Ok(None)
            }
            Err(AllocationError::AlreadyAssigned { .. }) | Err(AllocationError::OrderClosed { .. }) => {
                Ok(Some(self.load(order_id).await?))
            }
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Requeue failed, deferred to sweep");
                Ok(None)
            }
        }
    }

    /// Assign an unassigned order. Exposed for administrative use and the sweep.
    pub async fn assign(&self, order_id: &str) -> Result<Order, EngineError> {
        Ok(self.allocator.assign(order_id, Utc::now()).await?.order)
    }

    /// Force a reassignment away from the current caller.
    pub async fn reassign(&self, order_id: &str) -> Result<Option<Order>, EngineError> {
        Ok(self
            .allocator
            .reassign(order_id, Utc::now())
            .await?
            .map(|a| a.order))
    }

    /// Latest copy of an order.
    pub async fn get_order(&self, order_id: &str) -> Result<Order, EngineError> {
        self.load(order_id).await
    }

    /// A caller's queue, oldest assignment first.
    pub async fn get_queue(&self, caller_id: &str) -> Result<Vec<OrderSummary>, EngineError> {
        Ok(self.queue_view(caller_id)?.collect().await?)
    }

    /// Lazy view over a caller's queue.
    pub fn queue_view(&self, caller_id: &str) -> Result<QueueView, EngineError> {
        if self.callers.caller(caller_id).is_none() {
            return Err(EngineError::UnknownCaller(caller_id.to_string()));
        }
        Ok(self.reader.queue_for(caller_id))
    }

    /// Call history of an order, oldest first.
    pub async fn get_history(&self, order_id: &str) -> Result<Vec<CallLogEntry>, EngineError> {
        Ok(self.recorder.history(order_id).await?)
    }

    /// Register a source for [`DispositionEngine::pull_source`].
    ///
    /// Re-registering an id replaces the source but keeps its cursor.
    pub fn register_source(&self, source: Arc<dyn OrderSource>) {
        let id = source.id().to_string();
        tracing::info!(source_id = %id, "Source registered");
        self.sources.insert(id, source);
    }

    /// Ids of registered sources, sorted.
    pub fn source_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sources.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Cursor the next poll of `source_id` will use.
    pub fn source_cursor(&self, source_id: &str) -> SourceCursor {
        self.cursors
            .get(source_id)
            .map(|c| c.value().clone())
            .unwrap_or_default()
    }

    /// Run one ingestion cycle for a registered source.
    ///
    /// The cursor only advances once every delivered order is stored; a
    /// failed cycle is replayed in full next time and deduplicated by id.
    pub async fn pull_source(&self, source_id: &str) -> Result<PullReport, EngineError> {
        let source = self
            .sources
            .get(source_id)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| EngineError::NotFound(format!("source {}", source_id)))?;

        let cursor = self.source_cursor(source_id);
        let batch = source.poll_new_orders(&cursor).await?;

        let mut report = PullReport {
            source_id: source_id.to_string(),
            received: batch.orders.len(),
            ..Default::default()
        };
        for order in batch.orders {
            let outcome = self.ingest(order).await?;
            if outcome.created {
                report.created += 1;
            }
            if outcome.assigned_to.is_some() {
                report.assigned += 1;
            }
        }

        self.cursors
            .insert(source_id.to_string(), batch.next_cursor);
        if report.received > 0 {
            tracing::info!(
                source_id = %source_id,
                received = report.received,
                created = report.created,
                "Source pulled"
            );
        }
        Ok(report)
    }

    async fn load(&self, order_id: &str) -> Result<Order, EngineError> {
        self.store
            .load_order(order_id)
            .await?
            .ok_or_else(|| EngineError::UnknownOrder(order_id.to_string()))
    }

    fn on_conflict(&self, order_id: &str, attempts: u32) -> Result<(), EngineError> {
        metrics::counter!("dispatch_conflict_retries_total").increment(1);
        if attempts > self.config.max_conflict_retries {
            return Err(EngineError::ConcurrencyConflict {
                order_id: order_id.to_string(),
                attempts,
            });
        }
        tracing::debug!(order_id = %order_id, attempts, "Version conflict, retrying");
        Ok(())
    }
}
