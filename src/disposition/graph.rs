//! Transition graph over the disposition set.

use super::{
    Category, Disposition, DispositionConfig, GraphError, TransitionError, TransitionOutcome,
    DISPOSITION_COUNT,
};
use crate::order::Order;

/// Built-in category for each disposition.
pub fn default_category(state: Disposition) -> Category {
    match state {
        Disposition::New
        | Disposition::NoAnswer
        | Disposition::LineBusy
        | Disposition::CallDeclined
        | Disposition::CallNotConnected
        | Disposition::NotReachable
        | Disposition::CallForwarded
        | Disposition::LanguageBarrier
        | Disposition::SeenNoReply => Category::Active,
        Disposition::Callback | Disposition::Rescheduled | Disposition::FraudSuspected => {
            Category::PendingAction
        }
        Disposition::Confirmed
        | Disposition::ConfirmedOnWhatsapp
        | Disposition::Cancelled
        | Disposition::CancelledOnWhatsapp
        | Disposition::InvalidNumber => Category::Terminal,
    }
}

/// Category tags plus an adjacency table of allowed `(from, to)` pairs.
///
/// Construct with [`TransitionGraph::standard`] or
/// [`TransitionGraph::from_config`]; both return a graph that satisfies the
/// structural rules checked by [`TransitionGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionGraph {
    categories: [Category; DISPOSITION_COUNT],
    edges: [[bool; DISPOSITION_COUNT]; DISPOSITION_COUNT],
}

impl TransitionGraph {
    /// The built-in graph.
    ///
    /// Every non-terminal state may move to any state except NEW, except that
    /// FRAUD_SUSPECTED can only be resolved to CONFIRMED, CANCELLED or
    /// INVALID_NUMBER.
    pub fn standard() -> Self {
        let categories = Disposition::ALL.map(default_category);
        let mut graph = Self {
            categories,
            edges: [[false; DISPOSITION_COUNT]; DISPOSITION_COUNT],
        };

        for from in Disposition::ALL {
            if graph.category(from) == Category::Terminal {
                continue;
            }
            for to in Disposition::ALL {
                if to == Disposition::New {
                    continue;
                }
                let allowed = match from {
                    Disposition::FraudSuspected => matches!(
                        to,
                        Disposition::Confirmed | Disposition::Cancelled | Disposition::InvalidNumber
                    ),
                    _ => true,
                };
                graph.edges[from.index()][to.index()] = allowed;
            }
        }

        graph
    }

    /// Build a graph from deployment configuration, falling back to the
    /// built-in categories and edges for anything not overridden.
    pub fn from_config(config: &DispositionConfig) -> Result<Self, GraphError> {
        let mut graph = Self::standard();

        for (name, category) in &config.categories {
            let state = parse_state(name)?;
            graph.categories[state.index()] = *category;
        }

        match &config.transitions {
            Some(transitions) => {
                graph.edges = [[false; DISPOSITION_COUNT]; DISPOSITION_COUNT];
                for (from, targets) in transitions {
                    let from = parse_state(from)?;
                    for to in targets {
                        let to = parse_state(to)?;
                        graph.edges[from.index()][to.index()] = true;
                    }
                }
            }
            None => {
                // Category overrides may turn a state terminal; drop its exits.
                for state in Disposition::ALL {
                    if graph.category(state) == Category::Terminal {
                        graph.edges[state.index()] = [false; DISPOSITION_COUNT];
                    }
                }
            }
        }

        graph.validate()?;
        Ok(graph)
    }

    /// Check the structural rules every graph must satisfy.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.category(Disposition::New) != Category::Active {
            return Err(GraphError::InitialNotActive);
        }

        if !Disposition::ALL
            .iter()
            .any(|d| self.category(*d) == Category::Terminal)
        {
            return Err(GraphError::NoTerminalState);
        }

        for from in Disposition::ALL {
            if self.allows(from, Disposition::New) {
                return Err(GraphError::EdgeIntoInitial(from));
            }
            if self.category(from) == Category::Terminal && !self.successors(from).is_empty() {
                return Err(GraphError::TerminalHasExits(from));
            }
        }

        Ok(())
    }

    /// Category of a state.
    pub fn category(&self, state: Disposition) -> Category {
        self.categories[state.index()]
    }

    pub fn is_terminal(&self, state: Disposition) -> bool {
        self.category(state) == Category::Terminal
    }

    /// Whether `from -> to` is an edge of the graph.
    pub fn allows(&self, from: Disposition, to: Disposition) -> bool {
        self.edges[from.index()][to.index()]
    }

    /// States reachable in one step from `from`, in declaration order.
    pub fn successors(&self, from: Disposition) -> Vec<Disposition> {
        Disposition::ALL
            .iter()
            .copied()
            .filter(|to| self.allows(from, *to))
            .collect()
    }

    /// Validate a requested disposition change for `order`.
    ///
    /// Closed orders are rejected before the edge is looked up, so a terminal
    /// order always reports `OrderClosed` regardless of the requested state.
    pub fn transition(
        &self,
        order: &Order,
        requested: Disposition,
        actor: &str,
    ) -> Result<TransitionOutcome, TransitionError> {
        let current = order.disposition;

        if self.is_terminal(current) {
            return Err(TransitionError::OrderClosed {
                order_id: order.id.clone(),
                state: current,
            });
        }

        if !self.allows(current, requested) {
            return Err(TransitionError::InvalidTransition {
                order_id: order.id.clone(),
                from: current,
                to: requested,
            });
        }

        Ok(TransitionOutcome {
            from: current,
            to: requested,
            category: self.category(requested),
            actor: actor.to_string(),
        })
    }

    /// Check that `states` is a walk of the graph starting at NEW.
    pub fn is_valid_walk(&self, states: &[Disposition]) -> bool {
        match states.first() {
            Some(Disposition::New) => states.windows(2).all(|w| self.allows(w[0], w[1])),
            _ => false,
        }
    }
}

impl Default for TransitionGraph {
    fn default() -> Self {
        Self::standard()
    }
}

fn parse_state(name: &str) -> Result<Disposition, GraphError> {
    name.parse()
        .map_err(|_| GraphError::UnknownDisposition(name.to_string()))
}
