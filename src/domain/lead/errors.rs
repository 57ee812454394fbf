//! Error types for lead capture.

use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Buyer contact failed validation; lists every offending field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid buyer contact: {}", .errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct ContactValidation {
    pub errors: Vec<ValidationError>,
}

impl ContactValidation {
    /// Names of the fields that failed, in declaration order.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field()).collect()
    }
}
