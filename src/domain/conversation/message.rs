//! Message entity for deal-closing dialogues.
//!
//! Messages are immutable records of buyer/agent exchanges within a session.
//! Each message carries the sender, text, its position in the log, and a
//! creation timestamp.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, Timestamp, ValidationError};

/// Who produced a dialogue message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The buyer browsing the listing.
    Buyer,
    /// The language-model agent, while the session is in autopilot.
    AutopilotAgent,
    /// A human agent who has taken over the session.
    HumanAgent,
    /// Session-generated notice (takeover, lead confirmation).
    System,
}

impl Sender {
    /// Returns true for the two agent-side senders.
    pub fn is_agent_side(&self) -> bool {
        matches!(self, Sender::AutopilotAgent | Sender::HumanAgent)
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sender::Buyer => "buyer",
            Sender::AutopilotAgent => "autopilot_agent",
            Sender::HumanAgent => "human_agent",
            Sender::System => "system",
        };
        write!(f, "{}", s)
    }
}

/// An immutable message within a session's log.
///
/// # Invariants
///
/// - `id` is globally unique
/// - `text` is non-empty (validated at construction)
/// - `sequence` is the message's position in the log and never changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    sender: Sender,
    text: String,
    sequence: u64,
    created_at: Timestamp,
}

impl Message {
    /// Creates a new message at the given log position.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if text is empty or whitespace
    pub fn new(sender: Sender, text: impl Into<String>, sequence: u64) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::empty_field("text"));
        }
        Ok(Self {
            id: MessageId::new(),
            sender,
            text,
            sequence,
            created_at: Timestamp::now(),
        })
    }

    /// Returns the message identifier.
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns the sender.
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the message's position in the log.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns when the message was appended.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }
}
