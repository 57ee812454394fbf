//! Lead store port - Durable persistence for captured leads.
//!
//! A lead is the one artifact of a session that must outlive it. The store
//! is written exactly once per session, outside the session lock; a failed
//! write is surfaced to the caller so the buyer can be asked to retry, and
//! the session stays in the capture state.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::LeadId;
use crate::domain::lead::Lead;

/// Port for persisting captured leads.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persists a lead, returning its id on success.
    async fn persist(&self, lead: &Lead) -> Result<LeadId, LeadStoreError>;
}

/// Errors from the lead store.
#[derive(Debug, Clone, Error)]
pub enum LeadStoreError {
    /// Store is unreachable or failing; the write may be retried.
    #[error("lead store unavailable: {0}")]
    Unavailable(String),

    /// Store rejected the record.
    #[error("lead store rejected the record: {0}")]
    Rejected(String),
}

impl LeadStoreError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a rejected error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}
