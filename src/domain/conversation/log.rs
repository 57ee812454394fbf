//! Append-only message log.
//!
//! Insertion order is the authoritative conversation order. The log is
//! owned exclusively by its session; nothing outside the session mutates
//! it, and lead capture reads a snapshot copy rather than a live view.

use serde::{Deserialize, Serialize};

use super::{Message, Sender};
use crate::domain::foundation::ValidationError;

/// Ordered, append-only store of one session's dialogue turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self { messages: Vec::new() }
    }

    /// Appends a message, stamping it with the next log position.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if text is empty or whitespace
    pub fn append(&mut self, sender: Sender, text: impl Into<String>) -> Result<&Message, ValidationError> {
        let sequence = self.messages.len() as u64;
        let message = Message::new(sender, text, sequence)?;
        self.messages.push(message);
        Ok(self.messages.last().unwrap())
    }

    /// Returns the number of messages appended so far.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns all messages in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the most recently appended message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the last `n` messages in insertion order (oldest first).
    ///
    /// This is the bounded window handed to the inference collaborator.
    pub fn last_turns(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Returns an owned copy of the full log.
    ///
    /// Later appends never alter the returned snapshot.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }
}
