//! Error types for session operations.

use thiserror::Error;

use super::SessionMode;
use crate::domain::foundation::ValidationError;

/// Errors raised by session state-machine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The session has been closed or evicted; no further operations accepted.
    #[error("Session is closed")]
    Closed,

    /// The operation is not legal in the session's current mode.
    #[error("Operation '{operation}' is not allowed while the session is {mode}")]
    InvalidState {
        operation: &'static str,
        mode: SessionMode,
    },

    /// A lead has already been captured for this session.
    #[error("A lead has already been captured for this session")]
    AlreadyCaptured,

    /// Input failed value-object validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl SessionError {
    /// Creates an invalid-state error for the given operation.
    pub fn invalid_state(operation: &'static str, mode: SessionMode) -> Self {
        SessionError::InvalidState { operation, mode }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_names_operation_and_mode() {
        let err = SessionError::invalid_state("take_over", SessionMode::Initializing);
        assert_eq!(
            err.to_string(),
            "Operation 'take_over' is not allowed while the session is initializing"
        );
    }

    #[test]
    fn validation_errors_convert_transparently() {
        let err: SessionError = ValidationError::empty_field("text").into();
        assert_eq!(err.to_string(), "Field 'text' cannot be empty");
    }
}
