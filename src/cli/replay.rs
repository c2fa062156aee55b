//! Replay command implementation
//!
//! Runs an orders file and an optional updates file through a fresh
//! in-memory engine, then one sweep, and reports where every order ended up.
//! Nothing is persisted; the command is for rehearsing allocation and
//! disposition rules against real data.

use crate::allocation::delay;
use crate::cli::output::{
    format_replay_json, format_replay_text, CallerQueueView, RejectionView, ReplayView,
};
use crate::cli::serve::{build_engine, build_roster};
use crate::cli::ReplayArgs;
use crate::config::DispatchConfig;
use crate::engine::{DispositionEngine, DispositionUpdate};
use crate::order::NewOrder;
use crate::roster::{Caller, Roster};
use crate::sweep::RequeueSweeper;
use anyhow::{bail, Context};
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Handle `dispatch replay` command
pub async fn handle_replay(args: &ReplayArgs) -> Result<String, Box<dyn std::error::Error>> {
    let view = run_replay(args).await?;
    if args.json {
        Ok(format_replay_json(&view)?)
    } else {
        Ok(format_replay_text(&view))
    }
}

/// Replay the files named in `args` and collect the result
pub async fn run_replay(args: &ReplayArgs) -> anyhow::Result<ReplayView> {
    let mut config = if args.config.exists() {
        DispatchConfig::load(Some(&args.config))
            .with_context(|| format!("loading {}", args.config.display()))?
    } else {
        DispatchConfig::default()
    };
    config.validate().context("invalid configuration")?;
    // Only the files given on the command line feed a replay
    config.sources.clear();
    config.sweep.pull_sources = false;

    let roster = build_roster(&config).map_err(|e| anyhow::anyhow!("{}", e))?;
    for id in &args.callers {
        if roster.get_caller(id).is_none() {
            roster
                .add_caller(Caller::new(id.clone(), id.clone()))
                .with_context(|| format!("adding caller {}", id))?;
        }
    }
    if roster.caller_count() == 0 {
        bail!("no callers: add [[callers]] to the config or pass --caller");
    }

    let engine =
        build_engine(&config, Arc::clone(&roster)).map_err(|e| anyhow::anyhow!("{}", e))?;
    let mut view = ReplayView::default();

    let orders: Vec<(usize, NewOrder)> = read_json_lines(&args.orders)?;
    view.orders_received = orders.len();
    let mut order_ids = Vec::new();
    for (_, order) in orders {
        let order_id = order.order_id.clone();
        let outcome = engine
            .ingest(order)
            .await
            .with_context(|| format!("ingesting order {}", order_id))?;
        if outcome.created {
            view.orders_created += 1;
            order_ids.push(order_id);
        }
    }

    if let Some(path) = &args.updates {
        let updates: Vec<(usize, DispositionUpdate)> = read_json_lines(path)?;
        for (line, update) in updates {
            match engine.update_disposition(update.clone()).await {
                Ok(_) => view.updates_applied += 1,
                Err(e) => view.rejected.push(RejectionView {
                    line,
                    order_id: update.order_id,
                    caller_id: update.caller_id,
                    disposition: update.disposition,
                    kind: e.kind().as_str().to_string(),
                    message: e.to_string(),
                }),
            }
        }
    }

    let sweeper = RequeueSweeper::new(Arc::clone(&engine), config.sweep.clone());
    let as_of = delay(args.advance_seconds)
        .and_then(|d| Utc::now().checked_add_signed(d))
        .with_context(|| format!("--advance-seconds {} is out of range", args.advance_seconds))?;
    view.sweep = sweeper.run_once(as_of).await;

    view.queues = collect_queues(&engine, &roster).await?;

    if args.history {
        for order_id in order_ids {
            let entries = engine.get_history(&order_id).await?;
            view.histories.insert(order_id, entries);
        }
    }

    Ok(view)
}

async fn collect_queues(
    engine: &DispositionEngine,
    roster: &Roster,
) -> anyhow::Result<Vec<CallerQueueView>> {
    let mut queues = Vec::new();
    for caller in roster.all_callers() {
        let orders = engine.get_queue(&caller.id).await?;
        queues.push(CallerQueueView {
            active: caller.is_active(),
            caller_id: caller.id,
            name: caller.name,
            orders,
        });
    }
    Ok(queues)
}

/// Parse a file of JSON lines, skipping blank lines. Records come back with
/// their 1-based line number.
fn read_json_lines<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<(usize, T)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line)
            .with_context(|| format!("{} line {}", path.display(), index + 1))?;
        records.push((index + 1, record));
    }
    Ok(records)
}
