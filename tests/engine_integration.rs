//! End-to-end engine behavior: ingestion, allocation, dispositions and requeue.

mod common;

use chrono::{Duration, Utc};
use common::{make_engine, make_order, set_status};
use dispatch::disposition::{Category, Disposition};
use dispatch::engine::{DispositionUpdate, ErrorKind};
use dispatch::roster::CallerStatus;
use dispatch::store::OrderStore;
use dispatch::sweep::{RequeueSweeper, SweepConfig};
use futures::StreamExt;
use std::sync::Arc;

fn no_pull() -> SweepConfig {
    SweepConfig {
        pull_sources: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_new_order_goes_to_emptiest_queue() {
    let t = make_engine(&["a", "b", "c"]);

    // Build queue sizes {a: 2, b: 0, c: 1}
    set_status(&t.roster, &["b", "c"], CallerStatus::Inactive);
    t.engine.ingest(make_order("ord-1")).await.unwrap();
    t.engine.ingest(make_order("ord-2")).await.unwrap();
    set_status(&t.roster, &["a"], CallerStatus::Inactive);
    set_status(&t.roster, &["c"], CallerStatus::Active);
    t.engine.ingest(make_order("ord-3")).await.unwrap();
    set_status(&t.roster, &["a", "b"], CallerStatus::Active);

    assert_eq!(t.store.queues().size_of("a"), 2);
    assert_eq!(t.store.queues().size_of("b"), 0);
    assert_eq!(t.store.queues().size_of("c"), 1);

    let outcome = t.engine.ingest(make_order("ord-4")).await.unwrap();
    assert_eq!(outcome.assigned_to.as_deref(), Some("b"));
    assert_eq!(outcome.order.assigned_caller.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_closed_order_rejects_update_without_side_effects() {
    let t = make_engine(&["a"]);
    t.engine.ingest(make_order("ord-1")).await.unwrap();
    let confirmed = t
        .engine
        .update_disposition(DispositionUpdate::new("ord-1", "a", Disposition::Confirmed))
        .await
        .unwrap();

    let err = t
        .engine
        .update_disposition(DispositionUpdate::new("ord-1", "a", Disposition::NoAnswer))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OrderClosed);
    let stored = t.engine.get_order("ord-1").await.unwrap();
    assert_eq!(stored, confirmed);
    assert_eq!(t.engine.get_history("ord-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_callback_is_handed_to_another_caller_after_due_time() {
    let t = make_engine(&["a", "b", "c"]);
    let first = t.engine.ingest(make_order("ord-1")).await.unwrap();
    assert_eq!(first.assigned_to.as_deref(), Some("a"));

    let pending = t
        .engine
        .update_disposition(DispositionUpdate::new("ord-1", "a", Disposition::Callback))
        .await
        .unwrap();
    assert!(pending.assigned_caller.is_none());
    assert!(t.engine.get_queue("a").await.unwrap().is_empty());
    let due = pending.follow_up_at.unwrap();

    let sweeper = RequeueSweeper::new(Arc::clone(&t.engine), no_pull());
    let report = sweeper.run_once(due + Duration::seconds(1)).await;
    assert_eq!(report.released, 1);

    let order = t.engine.get_order("ord-1").await.unwrap();
    let holder = order.assigned_caller.clone().unwrap();
    assert_ne!(holder, "a");
    assert_eq!(order.previous_caller.as_deref(), Some("a"));
    assert_eq!(order.disposition, Disposition::Callback);

    let queue = t.engine.get_queue(&holder).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].order_id, "ord-1");
}

#[tokio::test]
async fn test_assignment_only_held_in_active_states() {
    let t = make_engine(&["a", "b"]);
    let graph = t.engine.graph().clone();
    let steps = [
        ("ord-1", Disposition::NoAnswer),
        ("ord-1", Disposition::Rescheduled),
        ("ord-2", Disposition::LineBusy),
        ("ord-2", Disposition::Cancelled),
        ("ord-3", Disposition::FraudSuspected),
    ];
    for id in ["ord-1", "ord-2", "ord-3"] {
        t.engine.ingest(make_order(id)).await.unwrap();
    }

    for (id, to) in steps {
        let current = t.engine.get_order(id).await.unwrap();
        let actor = current.assigned_caller.unwrap_or_else(|| "a".to_string());
        t.engine
            .update_disposition(DispositionUpdate::new(id, &actor, to))
            .await
            .unwrap();

        for order_id in ["ord-1", "ord-2", "ord-3"] {
            let order = t.engine.get_order(order_id).await.unwrap();
            if order.assigned_caller.is_some() {
                assert_eq!(graph.category(order.disposition), Category::Active);
            }
        }
    }
}

#[tokio::test]
async fn test_never_assigned_order_has_no_caller() {
    let t = make_engine(&["a"]);
    set_status(&t.roster, &["a"], CallerStatus::Inactive);

    let outcome = t.engine.ingest(make_order("ord-1")).await.unwrap();
    assert_eq!(outcome.order.disposition, Disposition::New);
    assert!(outcome.order.assigned_caller.is_none());
    assert!(outcome.order.assigned_at.is_none());
}

#[tokio::test]
async fn test_duplicate_ingest_creates_one_record_and_one_assignment() {
    let t = make_engine(&["a", "b", "c"]);

    let first = t.engine.ingest(make_order("ord-1")).await.unwrap();
    let second = t.engine.ingest(make_order("ord-1")).await.unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(t.store.order_count(), 1);
    let total: usize = ["a", "b", "c"]
        .iter()
        .map(|c| t.store.queues().size_of(c))
        .sum();
    assert_eq!(total, 1);
    assert_eq!(second.order.version, first.order.version);
}

#[tokio::test]
async fn test_queue_contains_assigned_order_until_terminal() {
    let t = make_engine(&["a"]);
    t.engine.ingest(make_order("ord-1")).await.unwrap();
    t.engine.ingest(make_order("ord-2")).await.unwrap();

    let queue = t.engine.get_queue("a").await.unwrap();
    let ids: Vec<&str> = queue.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(ids, vec!["ord-1", "ord-2"]);

    t.engine
        .update_disposition(DispositionUpdate::new("ord-1", "a", Disposition::Cancelled))
        .await
        .unwrap();

    let queue = t.engine.get_queue("a").await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].order_id, "ord-2");
}

#[tokio::test]
async fn test_queue_view_streams_summaries() {
    let t = make_engine(&["a"]);
    t.engine.ingest(make_order("ord-1")).await.unwrap();

    let view = t.engine.queue_view("a").unwrap();
    let items: Vec<_> = view.stream().collect().await;
    assert_eq!(items.len(), 1);

    let summary = items.into_iter().next().unwrap().unwrap();
    assert_eq!(summary.order_id, "ord-1");
    assert_eq!(summary.customer_name, "Customer ord-1");
    assert_eq!(summary.quantity, 2);
    assert_eq!(summary.product, "Cotton Kurta");

    assert_eq!(
        t.engine.queue_view("ghost").err().map(|e| e.kind()),
        Some(ErrorKind::UnknownCaller)
    );
}

#[tokio::test]
async fn test_history_forms_valid_walk() {
    let t = make_engine(&["a", "b"]);
    t.engine.ingest(make_order("ord-1")).await.unwrap();

    let path = [
        Disposition::NoAnswer,
        Disposition::LineBusy,
        Disposition::NoAnswer,
        Disposition::Confirmed,
    ];
    for to in path {
        let holder = t
            .engine
            .get_order("ord-1")
            .await
            .unwrap()
            .assigned_caller
            .unwrap();
        t.engine
            .update_disposition(
                DispositionUpdate::new("ord-1", &holder, to).with_note(format!("moved to {}", to)),
            )
            .await
            .unwrap();
    }

    let history = t.engine.get_history("ord-1").await.unwrap();
    assert_eq!(history.len(), 4);
    let mut walk = vec![history[0].from];
    walk.extend(history.iter().map(|e| e.to));
    assert_eq!(walk[0], Disposition::New);
    assert!(t.engine.graph().is_valid_walk(&walk));

    let sequences: Vec<u64> = history.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);
    assert!(history.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));
}

#[tokio::test]
async fn test_inactive_caller_keeps_queue_but_gets_nothing_new() {
    let t = make_engine(&["a", "b"]);
    t.engine.ingest(make_order("ord-1")).await.unwrap();
    set_status(&t.roster, &["a"], CallerStatus::Inactive);

    for id in ["ord-2", "ord-3"] {
        let outcome = t.engine.ingest(make_order(id)).await.unwrap();
        assert_eq!(outcome.assigned_to.as_deref(), Some("b"));
    }
    assert_eq!(t.engine.get_queue("a").await.unwrap().len(), 1);

    // The inactive holder can still work what they have
    let order = t
        .engine
        .update_disposition(DispositionUpdate::new("ord-1", "a", Disposition::Confirmed))
        .await
        .unwrap();
    assert!(order.is_closed());
}

#[tokio::test]
async fn test_follow_up_uses_explicit_time() {
    let t = make_engine(&["a", "b"]);
    t.engine.ingest(make_order("ord-1")).await.unwrap();
    let at = Utc::now() + Duration::days(1);

    let order = t
        .engine
        .update_disposition(
            DispositionUpdate::new("ord-1", "a", Disposition::Rescheduled).with_follow_up_at(at),
        )
        .await
        .unwrap();

    assert_eq!(order.follow_up_at, Some(at));
    let open = t.store.open_orders().await.unwrap();
    assert_eq!(open.len(), 1);
}

#[tokio::test]
async fn test_manual_reassign_moves_order() {
    let t = make_engine(&["a", "b"]);
    t.engine.ingest(make_order("ord-1")).await.unwrap();

    let moved = t.engine.reassign("ord-1").await.unwrap().unwrap();
    assert_eq!(moved.assigned_caller.as_deref(), Some("b"));
    assert!(t.engine.get_queue("a").await.unwrap().is_empty());

    let err = t.engine.assign("ord-1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyAssigned);
}
