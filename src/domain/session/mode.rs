//! Session control modes and the transitions between them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Control mode of a deal-closing session.
///
/// `Initializing` lasts until the opening pitch (or its fallback) is
/// appended. `Autopilot` and `HumanControlled` are the two message-producing
/// modes; `AwaitingLeadCapture` parks the dialogue while the buyer fills in
/// contact details; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Initializing,
    Autopilot,
    HumanControlled,
    AwaitingLeadCapture,
    Closed,
}

impl SessionMode {
    /// Returns true unless the session has been closed or evicted.
    pub fn is_live(&self) -> bool {
        !matches!(self, SessionMode::Closed)
    }
}

impl StateMachine for SessionMode {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionMode::*;
        matches!(
            (self, target),
            (Initializing, Autopilot)
                | (Autopilot, HumanControlled)
                | (Autopilot, AwaitingLeadCapture)
                | (HumanControlled, Autopilot)
                | (HumanControlled, AwaitingLeadCapture)
                | (AwaitingLeadCapture, Autopilot)
                | (AwaitingLeadCapture, HumanControlled)
                | (Initializing, Closed)
                | (Autopilot, Closed)
                | (HumanControlled, Closed)
                | (AwaitingLeadCapture, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionMode::*;
        match self {
            Initializing => vec![Autopilot, Closed],
            Autopilot => vec![HumanControlled, AwaitingLeadCapture, Closed],
            HumanControlled => vec![Autopilot, AwaitingLeadCapture, Closed],
            AwaitingLeadCapture => vec![Autopilot, HumanControlled, Closed],
            Closed => vec![],
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionMode::Initializing => "initializing",
            SessionMode::Autopilot => "autopilot",
            SessionMode::HumanControlled => "human_controlled",
            SessionMode::AwaitingLeadCapture => "awaiting_lead_capture",
            SessionMode::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// The two modes that actually produce replies.
///
/// Remembered across `AwaitingLeadCapture` so cancel and resume return the
/// dialogue to whichever producer held it before capture was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    Autopilot,
    HumanControlled,
}

impl ControlMode {
    /// Widens back into the full mode enum.
    pub fn as_session_mode(&self) -> SessionMode {
        match self {
            ControlMode::Autopilot => SessionMode::Autopilot,
            ControlMode::HumanControlled => SessionMode::HumanControlled,
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_session_mode())
    }
}

/// What happens to a session once its lead has been captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterCapturePolicy {
    /// Return to the control mode held before capture was requested.
    #[default]
    Resume,
    /// Close the session.
    Close,
}
