//! Lifecycle state machines
//!
//! Each status enum lists its legal successor states; everything else is an
//! illegal transition.

use crate::error::TransitionError;
use std::fmt::{Debug, Display};

/// A status enum with a fixed transition table
pub trait Lifecycle: Copy + Eq + Debug + Display + 'static {
    /// States reachable in one step from `self`
    fn allowed_transitions(self) -> &'static [Self];

    /// Whether no further transitions are possible
    #[inline]
    fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Whether `self -> to` is in the table
    #[inline]
    fn can_transition_to(self, to: Self) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

/// Validates a state transition.
pub fn validate_transition<S: Lifecycle>(from: S, to: S) -> Result<(), TransitionError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TransitionError {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Successor states of `from`, as an owned list.
pub fn allowed_transitions<S: Lifecycle>(from: S) -> Vec<S> {
    from.allowed_transitions().to_vec()
}
