use super::Disposition;

/// Errors returned when a requested disposition change is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("order {order_id} is closed ({state})")]
    OrderClosed { order_id: String, state: Disposition },

    #[error("invalid transition for order {order_id}: {from} -> {to}")]
    InvalidTransition {
        order_id: String,
        from: Disposition,
        to: Disposition,
    },
}

/// Errors found while building a transition graph from configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("unknown disposition '{0}'")]
    UnknownDisposition(String),

    #[error("NEW must be in the ACTIVE category")]
    InitialNotActive,

    #[error("no transition may enter NEW (found {0} -> NEW)")]
    EdgeIntoInitial(Disposition),

    #[error("terminal state {0} has outgoing transitions")]
    TerminalHasExits(Disposition),

    #[error("at least one TERMINAL state is required")]
    NoTerminalState,
}
