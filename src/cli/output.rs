//! Output formatting helpers for CLI commands

use crate::disposition::{Category, Disposition, TransitionGraph};
use crate::order::{CallLogEntry, OrderSummary};
use crate::sweep::SweepReport;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

/// View model for one disposition state
#[derive(Debug, Clone, Serialize)]
pub struct DispositionView {
    pub state: Disposition,
    pub category: Category,
    pub successors: Vec<Disposition>,
}

impl DispositionView {
    /// Every state of `graph`, in declaration order
    pub fn all(graph: &TransitionGraph) -> Vec<Self> {
        Disposition::ALL
            .iter()
            .map(|&state| Self {
                state,
                category: graph.category(state),
                successors: graph.successors(state),
            })
            .collect()
    }
}

/// View model for a caller's queue
#[derive(Debug, Clone, Serialize)]
pub struct CallerQueueView {
    pub caller_id: String,
    pub name: String,
    pub active: bool,
    pub orders: Vec<OrderSummary>,
}

/// A disposition update the engine refused
#[derive(Debug, Clone, Serialize)]
pub struct RejectionView {
    /// 1-based line in the updates file
    pub line: usize,
    pub order_id: String,
    pub caller_id: String,
    pub disposition: Disposition,
    /// Stable error kind, e.g. `invalid_transition`
    pub kind: String,
    pub message: String,
}

/// Everything a replay run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayView {
    pub orders_received: usize,
    pub orders_created: usize,
    pub updates_applied: usize,
    pub rejected: Vec<RejectionView>,
    pub sweep: SweepReport,
    pub queues: Vec<CallerQueueView>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub histories: BTreeMap<String, Vec<CallLogEntry>>,
}

/// Colored category label
pub fn category_label(category: Category) -> String {
    match category {
        Category::Active => category.as_str().green().to_string(),
        Category::PendingAction => category.as_str().yellow().to_string(),
        Category::Terminal => category.as_str().cyan().to_string(),
    }
}

/// Format dispositions as a table
pub fn format_dispositions_table(states: &[DispositionView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["State", "Category", "Allowed Next"]);

    for s in states {
        let next = if s.successors.is_empty() {
            "-".to_string()
        } else {
            s.successors
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.add_row(vec![
            Cell::new(s.state),
            Cell::new(category_label(s.category)),
            Cell::new(next),
        ]);
    }

    table.to_string()
}

/// Format dispositions as JSON
pub fn format_dispositions_json(states: &[DispositionView]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "dispositions": states
    }))
}

/// Format a caller queue as a table
pub fn format_queue_table(queue: &CallerQueueView) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Order", "Customer", "Phone", "Product", "Qty", "Total", "Attempts", "State",
    ]);

    for o in &queue.orders {
        table.add_row(vec![
            Cell::new(&o.order_id),
            Cell::new(&o.customer_name),
            Cell::new(&o.phone),
            Cell::new(&o.product),
            Cell::new(o.quantity),
            Cell::new(format_amount(o.total, o.currency.as_deref())),
            Cell::new(o.attempts),
            Cell::new(o.disposition),
        ]);
    }

    table.to_string()
}

/// Format a replay run as human-readable text
pub fn format_replay_text(view: &ReplayView) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Orders: {} received, {} new\n",
        view.orders_received, view.orders_created
    ));
    out.push_str(&format!(
        "Updates: {} applied, {} rejected\n",
        view.updates_applied,
        view.rejected.len()
    ));
    out.push_str(&format!(
        "Sweep: {} assigned, {} released, {} stale, {} waiting for callers\n",
        view.sweep.assigned,
        view.sweep.released,
        view.sweep.stale_reassigned,
        view.sweep.waiting_for_callers
    ));

    for r in &view.rejected {
        out.push_str(&format!(
            "  {} line {}: {} -> {} by {}: {}\n",
            "✗".red(),
            r.line,
            r.order_id,
            r.disposition,
            r.caller_id,
            r.kind
        ));
    }

    for queue in &view.queues {
        let status = if queue.active {
            "active".green()
        } else {
            "inactive".red()
        };
        out.push_str(&format!(
            "\n{} ({}) [{}] - {} orders\n",
            queue.name.bold(),
            queue.caller_id,
            status,
            queue.orders.len()
        ));
        if !queue.orders.is_empty() {
            out.push_str(&format_queue_table(queue));
            out.push('\n');
        }
    }

    for (order_id, entries) in &view.histories {
        out.push_str(&format!("\nHistory {}\n", order_id.bold()));
        for e in entries {
            let call = match e.timing.duration_seconds {
                Some(secs) => format!(" [{}s]", secs),
                None => String::new(),
            };
            let note = e.note.as_deref().unwrap_or("");
            out.push_str(&format!(
                "  #{} {} {} -> {} by {}{} {}\n",
                e.sequence,
                e.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                e.from,
                e.to,
                e.caller_id,
                call,
                note
            ));
        }
    }

    out
}

/// Format a replay run as JSON
pub fn format_replay_json(view: &ReplayView) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(view)
}

/// Render minor currency units, e.g. `49900` as `499.00 INR`
pub fn format_amount(total: u64, currency: Option<&str>) -> String {
    let major = format!("{}.{:02}", total / 100, total % 100);
    match currency {
        Some(c) => format!("{} {}", major, c),
        None => major,
    }
}
