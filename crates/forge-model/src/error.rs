//! Model-level errors

/// Errors raised while building or parsing model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Role string outside the closed role set
    #[error("unknown role: '{0}'")]
    UnknownRole(String),

    /// Status string outside the lifecycle's state set
    #[error("unknown status: '{0}'")]
    UnknownStatus(String),

    /// Transition rejected by a lifecycle state machine
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Illegal state transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition: {from} -> {to}")]
pub struct TransitionError {
    /// Current state
    pub from: String,
    /// Requested state
    pub to: String,
}
