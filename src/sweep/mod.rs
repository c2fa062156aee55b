//! Requeue sweep
//!
//! The only timer-driven work in the engine. Each cycle pulls every
//! registered source, then walks the open orders and hands anything that
//! needs a caller to the allocator: unassigned ACTIVE orders (typically left
//! over from a moment with no active callers), PENDING_ACTION orders whose
//! follow-up time has passed, and, when configured, stale assignments.
//!
//! A cycle is idempotent. Every reassignment re-checks its trigger against
//! the latest copy of the order, so overlapping cycles, or a cycle racing a
//! caller's update, never move an order twice.

mod config;

pub use config::SweepConfig;

use crate::allocation::{classify, delay, AllocationError, SweepAction};
use crate::engine::DispositionEngine;
use crate::telemetry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What one sweep cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// New orders ingested from sources
    pub ingested: usize,
    /// Unassigned ACTIVE orders given a caller
    pub assigned: usize,
    /// PENDING_ACTION orders released to a caller
    pub released: usize,
    /// Stale assignments moved to another caller
    pub stale_reassigned: usize,
    /// Orders that still need a caller because none is active
    pub waiting_for_callers: usize,
    /// Orders or sources that failed; see logs
    pub errors: usize,
}

/// Background task that requeues orders on a fixed interval.
pub struct RequeueSweeper {
    engine: Arc<DispositionEngine>,
    config: SweepConfig,
}

impl RequeueSweeper {
    pub fn new(engine: Arc<DispositionEngine>, config: SweepConfig) -> Self {
        Self { engine, config }
    }

    /// Run one cycle as of `now`.
    pub async fn run_once(&self, now: DateTime<Utc>) -> SweepReport {
        let started = Instant::now();
        let mut report = SweepReport::default();

        if self.config.pull_sources {
            for source_id in self.engine.source_ids() {
                match self.engine.pull_source(&source_id).await {
                    Ok(pull) => report.ingested += pull.created,
                    Err(e) => {
                        tracing::warn!(source_id = %source_id, error = %e, "Source pull failed");
                        report.errors += 1;
                    }
                }
            }
        }

        let orders = match self.engine.store().open_orders().await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list open orders");
                report.errors += 1;
                return report;
            }
        };

        // A threshold chrono cannot represent never fires
        let stale_after = self.config.stale_assignment_seconds.and_then(delay);
        let graph = self.engine.graph();
        let allocator = self.engine.allocator();

        for order in orders {
            let Some(action) = classify(&order, graph, now, stale_after) else {
                continue;
            };

            let result = match action {
                SweepAction::Assign => allocator.assign(&order.id, now).await.map(Some),
                SweepAction::ReleaseFollowUp | SweepAction::ReassignStale => {
                    allocator
                        .reassign_when(&order.id, now, action.reason(), |fresh| {
                            classify(fresh, graph, now, stale_after) == Some(action)
                        })
                        .await
                }
            };

            match result {
                Ok(Some(_)) => match action {
                    SweepAction::Assign => report.assigned += 1,
                    SweepAction::ReleaseFollowUp => report.released += 1,
                    SweepAction::ReassignStale => report.stale_reassigned += 1,
                },
                // Someone else already handled it
                Ok(None)
                | Err(AllocationError::AlreadyAssigned { .. })
                | Err(AllocationError::OrderClosed { .. }) => {}
                Err(AllocationError::NoActiveCallers { .. }) => report.waiting_for_callers += 1,
                Err(e) => {
                    tracing::warn!(order_id = %order.id, error = %e, "Sweep could not requeue order");
                    report.errors += 1;
                }
            }
        }

        self.publish_queue_gauges().await;
        metrics::histogram!("dispatch_sweep_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        if report != SweepReport::default() {
            tracing::info!(
                ingested = report.ingested,
                assigned = report.assigned,
                released = report.released,
                stale_reassigned = report.stale_reassigned,
                waiting_for_callers = report.waiting_for_callers,
                errors = report.errors,
                "Sweep cycle completed"
            );
        }
        report
    }

    /// Inactive callers keep their queues, so every known caller is published.
    async fn publish_queue_gauges(&self) {
        let callers = self.engine.callers().all_callers();
        let active = callers.iter().filter(|c| c.is_active()).count();
        let ids: Vec<String> = callers.into_iter().map(|c| c.id).collect();
        match self.engine.store().queue_stats(&ids).await {
            Ok(stats) => telemetry::record_queue_gauges(&stats, active),
            Err(e) => tracing::debug!(error = %e, "Could not read queue stats"),
        }
    }

    /// Start the sweep loop as a background task.
    ///
    /// Runs until `cancel_token` is cancelled. Missed ticks are skipped, so
    /// a slow cycle never causes a burst of catch-up cycles.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.interval_seconds.max(1)));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.config.interval_seconds,
                "Requeue sweep started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Requeue sweep shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let report = self.run_once(Utc::now()).await;
                        tracing::debug!(?report, "Sweep tick");
                    }
                }
            }
        })
    }
}
