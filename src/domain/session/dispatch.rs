//! Dispatch tag carried by in-flight inference calls.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token stamped onto every dispatched inference call.
///
/// Captures the turn sequence and epoch current at dispatch time; results
/// are applied only while both still match the session, which is how stale
/// autopilot output is kept out of the log after a takeover or a newer turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTag {
    turn: u64,
    epoch: u64,
}

impl DispatchTag {
    /// Creates a tag for the given turn and epoch.
    pub fn new(turn: u64, epoch: u64) -> Self {
        Self { turn, epoch }
    }

    /// Returns the turn sequence the call was dispatched for.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Returns the epoch the call was dispatched under.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl fmt::Display for DispatchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn={} epoch={}", self.turn, self.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_exposes_turn_and_epoch() {
        let tag = DispatchTag::new(4, 2);
        assert_eq!(tag.turn(), 4);
        assert_eq!(tag.epoch(), 2);
    }

    #[test]
    fn tags_compare_by_value() {
        assert_eq!(DispatchTag::new(1, 1), DispatchTag::new(1, 1));
        assert_ne!(DispatchTag::new(1, 1), DispatchTag::new(1, 2));
        assert_ne!(DispatchTag::new(1, 1), DispatchTag::new(2, 1));
    }

    #[test]
    fn tag_displays_for_logs() {
        assert_eq!(DispatchTag::new(3, 1).to_string(), "turn=3 epoch=1");
    }
}
