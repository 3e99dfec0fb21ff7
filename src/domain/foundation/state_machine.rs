//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions across the Session and Case lifecycle statuses.

use std::fmt;

use super::DomainError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
pub trait StateMachine: Sized + Copy + PartialEq + fmt::Debug + fmt::Display {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    ///
    /// This is the only sanctioned way to change status; the error
    /// carries the current status so callers can surface it.
    fn transition_to(&self, target: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else if self.is_terminal() {
            Err(DomainError::invalid_transition(
                self,
                format!("Cannot transition out of terminal state '{}'", self),
            ))
        } else {
            Err(DomainError::invalid_transition(
                self,
                format!("Cannot transition from '{}' to '{}'", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
