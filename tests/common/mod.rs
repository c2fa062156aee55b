//! Shared test utilities for dispatch integration tests.
//!
//! Builders for orders, rosters and engines so each test file only spells
//! out what it is actually checking.

#![allow(dead_code)]

use dispatch::allocation::AllocationConfig;
use dispatch::disposition::TransitionGraph;
use dispatch::engine::DispositionEngine;
use dispatch::order::{CustomerContact, LineItem, NewOrder, OrderKind};
use dispatch::roster::{Caller, CallerStatus, Roster};
use dispatch::store::InMemoryStore;
use std::sync::Arc;

// =============================================================================
// Order Builders
// =============================================================================

/// Create a COD order with one line item.
pub fn make_order(id: &str) -> NewOrder {
    NewOrder {
        order_id: id.to_string(),
        source_id: "store-a".to_string(),
        kind: OrderKind::CashOnDelivery,
        customer: CustomerContact {
            name: format!("Customer {}", id),
            phone: "+919800000000".to_string(),
            address: Some("12 MG Road".to_string()),
            postal_code: Some("560001".to_string()),
        },
        line_items: vec![LineItem {
            name: "Cotton Kurta".to_string(),
            sku: Some("KRT-01".to_string()),
            quantity: 2,
            unit_price: 24_950,
        }],
        total: 49_900,
        currency: Some("INR".to_string()),
        placed_at: None,
    }
}

/// Serialize an order as one JSON line (no trailing newline).
pub fn order_json_line(id: &str) -> String {
    serde_json::to_string(&make_order(id)).unwrap()
}

// =============================================================================
// Engine Builders
// =============================================================================

/// Handles to everything a test may want to poke at directly.
pub struct TestEngine {
    pub engine: Arc<DispositionEngine>,
    pub roster: Arc<Roster>,
    pub store: Arc<InMemoryStore>,
}

/// Create a roster with the given active callers.
pub fn make_roster(ids: &[&str]) -> Arc<Roster> {
    let roster = Arc::new(Roster::new());
    for id in ids {
        roster
            .add_caller(Caller::new(id.to_string(), id.to_uppercase()))
            .unwrap();
    }
    roster
}

/// Create an engine over a fresh in-memory store with the standard graph.
pub fn make_engine(callers: &[&str]) -> TestEngine {
    make_engine_with(callers, AllocationConfig::default())
}

pub fn make_engine_with(callers: &[&str], config: AllocationConfig) -> TestEngine {
    let store = Arc::new(InMemoryStore::new());
    let roster = make_roster(callers);
    let engine = Arc::new(DispositionEngine::new(
        store.clone(),
        roster.clone(),
        TransitionGraph::standard(),
        config,
    ));
    TestEngine {
        engine,
        roster,
        store,
    }
}

/// Set every caller in `ids` to `status`.
pub fn set_status(roster: &Roster, ids: &[&str], status: CallerStatus) {
    for id in ids {
        roster.set_status(id, status).unwrap();
    }
}
