//! In-memory implementation of LeadStore.
//!
//! Used in keyless development mode and in tests; captured leads live only
//! as long as the process.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::foundation::LeadId;
use crate::domain::lead::Lead;
use crate::ports::{LeadStore, LeadStoreError};

/// In-memory lead store.
#[derive(Debug, Default)]
pub struct InMemoryLeadStore {
    leads: Mutex<Vec<Lead>>,
}

impl InMemoryLeadStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every captured lead, oldest first.
    pub fn all(&self) -> Vec<Lead> {
        self.leads.lock().expect("lead store lock poisoned").clone()
    }

    /// Returns the number of captured leads.
    pub fn len(&self) -> usize {
        self.leads.lock().expect("lead store lock poisoned").len()
    }

    /// True when no lead has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn persist(&self, lead: &Lead) -> Result<LeadId, LeadStoreError> {
        self.leads
            .lock()
            .expect("lead store lock poisoned")
            .push(lead.clone());
        Ok(lead.id())
    }
}
