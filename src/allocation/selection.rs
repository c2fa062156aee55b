//! Caller selection and sweep classification.

use crate::disposition::{Category, TransitionGraph};
use crate::order::Order;
use crate::store::QueueStats;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Pick the caller that should receive the next order.
///
/// Smallest queue wins; ties go to the caller assigned least recently
/// (never-assigned first), then to the lowest caller id. `exclude` is honored
/// only while another candidate remains.
pub fn select_caller(candidates: &[QueueStats], exclude: Option<&str>) -> Option<String> {
    let eligible: Vec<&QueueStats> = match exclude {
        Some(excluded) if candidates.len() > 1 => candidates
            .iter()
            .filter(|c| c.caller_id != excluded)
            .collect(),
        _ => candidates.iter().collect(),
    };

    let pool = if eligible.is_empty() {
        candidates.iter().collect()
    } else {
        eligible
    };

    pool.into_iter()
        .min_by(|a, b| {
            a.size
                .cmp(&b.size)
                .then_with(|| a.last_assigned_at.cmp(&b.last_assigned_at))
                .then_with(|| a.caller_id.cmp(&b.caller_id))
        })
        .map(|c| c.caller_id.clone())
}

/// Why an order is being (re)assigned. Used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentReason {
    /// First assignment after ingestion, or a retry after no callers were active
    Initial,
    /// A PENDING_ACTION order reached its follow-up time
    FollowUp,
    /// The assignee held the order longer than the stale threshold
    Stale,
    /// Explicit reassignment
    Manual,
}

impl AssignmentReason {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentReason::Initial => "initial",
            AssignmentReason::FollowUp => "follow_up",
            AssignmentReason::Stale => "stale",
            AssignmentReason::Manual => "manual",
        }
    }
}

impl fmt::Display for AssignmentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work the sweep should do for one open order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    /// Queue-eligible but unassigned
    Assign,
    /// PENDING_ACTION order whose follow-up time has passed
    ReleaseFollowUp,
    /// Assignment older than the stale threshold
    ReassignStale,
}

impl SweepAction {
    pub fn reason(self) -> AssignmentReason {
        match self {
            SweepAction::Assign => AssignmentReason::Initial,
            SweepAction::ReleaseFollowUp => AssignmentReason::FollowUp,
            SweepAction::ReassignStale => AssignmentReason::Stale,
        }
    }
}

/// Decide what, if anything, the sweep should do with `order` at `now`.
pub fn classify(
    order: &Order,
    graph: &TransitionGraph,
    now: DateTime<Utc>,
    stale_after: Option<Duration>,
) -> Option<SweepAction> {
    if order.is_closed() {
        return None;
    }

    match (graph.category(order.disposition), &order.assigned_caller) {
        (Category::Terminal, _) => None,
        (Category::Active, None) => Some(SweepAction::Assign),
        (Category::PendingAction, None) => match order.follow_up_at {
            Some(due) if due > now => None,
            _ => Some(SweepAction::ReleaseFollowUp),
        },
        (_, Some(_)) => {
            let stale_after = stale_after?;
            let assigned_at = order.assigned_at?;
            (now - assigned_at >= stale_after).then_some(SweepAction::ReassignStale)
        }
    }
}
