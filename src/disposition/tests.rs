use super::*;
use crate::order::{CustomerContact, NewOrder, Order, OrderKind};
use chrono::Utc;
use std::collections::BTreeMap;

fn order_in(state: Disposition) -> Order {
    let mut order = Order::from_new(
        NewOrder {
            order_id: "ord-1".to_string(),
            source_id: "store-a".to_string(),
            kind: OrderKind::CashOnDelivery,
            customer: CustomerContact::default(),
            line_items: vec![],
            total: 0,
            currency: None,
            placed_at: None,
        },
        Utc::now(),
    );
    order.disposition = state;
    order
}

#[test]
fn test_closed_set_has_seventeen_states() {
    assert_eq!(Disposition::ALL.len(), 17);
    for (i, state) in Disposition::ALL.iter().enumerate() {
        assert_eq!(state.index(), i);
    }
}

#[test]
fn test_standard_categories() {
    let graph = TransitionGraph::standard();
    let count = |c: Category| {
        Disposition::ALL
            .iter()
            .filter(|d| graph.category(**d) == c)
            .count()
    };

    assert_eq!(count(Category::Active), 9);
    assert_eq!(count(Category::PendingAction), 3);
    assert_eq!(count(Category::Terminal), 5);
    assert_eq!(graph.category(Disposition::Callback), Category::PendingAction);
    assert!(graph.is_terminal(Disposition::InvalidNumber));
}

#[test]
fn test_standard_graph_is_valid() {
    let graph = TransitionGraph::standard();
    assert!(graph.validate().is_ok());

    for from in Disposition::ALL {
        assert!(!graph.allows(from, Disposition::New));
    }
    assert!(graph.successors(Disposition::Confirmed).is_empty());
    assert!(graph.allows(Disposition::NoAnswer, Disposition::NoAnswer));
    assert!(graph.allows(Disposition::New, Disposition::Callback));
}

#[test]
fn test_fraud_suspected_only_resolves() {
    let graph = TransitionGraph::standard();
    assert_eq!(
        graph.successors(Disposition::FraudSuspected),
        vec![
            Disposition::Confirmed,
            Disposition::Cancelled,
            Disposition::InvalidNumber
        ]
    );
}

#[test]
fn test_transition_accepts_edge() {
    let graph = TransitionGraph::standard();
    let outcome = graph
        .transition(&order_in(Disposition::New), Disposition::Callback, "a")
        .unwrap();

    assert_eq!(outcome.from, Disposition::New);
    assert_eq!(outcome.to, Disposition::Callback);
    assert_eq!(outcome.category, Category::PendingAction);
    assert_eq!(outcome.actor, "a");
}

#[test]
fn test_transition_rejects_missing_edge() {
    let graph = TransitionGraph::standard();
    let err = graph
        .transition(&order_in(Disposition::NoAnswer), Disposition::New, "a")
        .unwrap_err();

    assert_eq!(
        err,
        TransitionError::InvalidTransition {
            order_id: "ord-1".to_string(),
            from: Disposition::NoAnswer,
            to: Disposition::New,
        }
    );
}

#[test]
fn test_closed_check_precedes_edge_check() {
    let graph = TransitionGraph::standard();
    // CONFIRMED -> NEW is also not an edge; closed must still win.
    for requested in [Disposition::NoAnswer, Disposition::New] {
        let err = graph
            .transition(&order_in(Disposition::Confirmed), requested, "a")
            .unwrap_err();
        assert!(matches!(err, TransitionError::OrderClosed { .. }));
    }
}

#[test]
fn test_disposition_from_str_is_lenient() {
    assert_eq!(
        "no answer".parse::<Disposition>().unwrap(),
        Disposition::NoAnswer
    );
    assert_eq!(
        "Line-Busy".parse::<Disposition>().unwrap(),
        Disposition::LineBusy
    );
    assert_eq!(
        "CONFIRMED_ON_WHATSAPP".parse::<Disposition>().unwrap(),
        Disposition::ConfirmedOnWhatsapp
    );
    assert!("SHIPPED".parse::<Disposition>().is_err());
}

#[test]
fn test_disposition_serde_uses_canonical_names() {
    let json = serde_json::to_string(&Disposition::SeenNoReply).unwrap();
    assert_eq!(json, r#""SEEN_NO_REPLY""#);
    for state in Disposition::ALL {
        assert_eq!(
            serde_json::to_string(&state).unwrap(),
            format!("\"{}\"", state.as_str())
        );
    }
}

#[test]
fn test_category_from_str() {
    assert_eq!(
        "pending action".parse::<Category>().unwrap(),
        Category::PendingAction
    );
    assert!("closed".parse::<Category>().is_err());
}

#[test]
fn test_valid_walk_must_start_at_new() {
    let graph = TransitionGraph::standard();
    assert!(graph.is_valid_walk(&[
        Disposition::New,
        Disposition::NoAnswer,
        Disposition::NoAnswer,
        Disposition::Callback,
        Disposition::Confirmed,
    ]));
    assert!(!graph.is_valid_walk(&[Disposition::NoAnswer, Disposition::Confirmed]));
    assert!(!graph.is_valid_walk(&[
        Disposition::New,
        Disposition::Confirmed,
        Disposition::Cancelled
    ]));
    assert!(!graph.is_valid_walk(&[]));
}

#[test]
fn test_config_category_override_drops_terminal_exits() {
    let config = DispositionConfig {
        categories: BTreeMap::from([("SEEN_NO_REPLY".to_string(), Category::Terminal)]),
        transitions: None,
    };
    let graph = TransitionGraph::from_config(&config).unwrap();

    assert!(graph.is_terminal(Disposition::SeenNoReply));
    assert!(graph.successors(Disposition::SeenNoReply).is_empty());
    assert!(graph.allows(Disposition::New, Disposition::SeenNoReply));
}

#[test]
fn test_config_transitions_replace_edges() {
    let config = DispositionConfig {
        categories: BTreeMap::new(),
        transitions: Some(BTreeMap::from([
            (
                "NEW".to_string(),
                vec!["no_answer".to_string(), "CONFIRMED".to_string()],
            ),
            ("NO_ANSWER".to_string(), vec!["CONFIRMED".to_string()]),
        ])),
    };
    let graph = TransitionGraph::from_config(&config).unwrap();

    assert_eq!(
        graph.successors(Disposition::New),
        vec![Disposition::NoAnswer, Disposition::Confirmed]
    );
    assert!(!graph.allows(Disposition::NoAnswer, Disposition::NoAnswer));
    assert!(graph.successors(Disposition::Callback).is_empty());
}

#[test]
fn test_config_rejects_unknown_state() {
    let config = DispositionConfig {
        categories: BTreeMap::from([("SHIPPED".to_string(), Category::Terminal)]),
        transitions: None,
    };
    assert_eq!(
        TransitionGraph::from_config(&config),
        Err(GraphError::UnknownDisposition("SHIPPED".to_string()))
    );
}

#[test]
fn test_config_rejects_structural_violations() {
    let initial_not_active = DispositionConfig {
        categories: BTreeMap::from([("NEW".to_string(), Category::PendingAction)]),
        transitions: None,
    };
    assert_eq!(
        TransitionGraph::from_config(&initial_not_active),
        Err(GraphError::InitialNotActive)
    );

    let edge_into_new = DispositionConfig {
        categories: BTreeMap::new(),
        transitions: Some(BTreeMap::from([(
            "NO_ANSWER".to_string(),
            vec!["NEW".to_string()],
        )])),
    };
    assert_eq!(
        TransitionGraph::from_config(&edge_into_new),
        Err(GraphError::EdgeIntoInitial(Disposition::NoAnswer))
    );

    let terminal_exit = DispositionConfig {
        categories: BTreeMap::new(),
        transitions: Some(BTreeMap::from([(
            "CONFIRMED".to_string(),
            vec!["CANCELLED".to_string()],
        )])),
    };
    assert_eq!(
        TransitionGraph::from_config(&terminal_exit),
        Err(GraphError::TerminalHasExits(Disposition::Confirmed))
    );

    let no_terminal = DispositionConfig {
        categories: [
            "CONFIRMED",
            "CONFIRMED_ON_WHATSAPP",
            "CANCELLED",
            "CANCELLED_ON_WHATSAPP",
            "INVALID_NUMBER",
        ]
        .into_iter()
        .map(|s| (s.to_string(), Category::Active))
        .collect(),
        transitions: None,
    };
    assert_eq!(
        TransitionGraph::from_config(&no_terminal),
        Err(GraphError::NoTerminalState)
    );
}

#[test]
fn test_config_deserializes_from_toml() {
    let toml_str = r#"
        [categories]
        RESCHEDULED = "ACTIVE"
    "#;
    let config: DispositionConfig = toml::from_str(toml_str).unwrap();
    let graph = TransitionGraph::from_config(&config).unwrap();

    assert_eq!(graph.category(Disposition::Rescheduled), Category::Active);
    assert!(config.transitions.is_none());
}
