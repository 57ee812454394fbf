//! Deal commitment signals produced by the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of transaction the buyer has committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealKind {
    Viewing,
    Rental,
    Purchase,
}

impl fmt::Display for DealKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DealKind::Viewing => "viewing",
            DealKind::Rental => "rental",
            DealKind::Purchase => "purchase",
        };
        write!(f, "{}", s)
    }
}

/// Classifier output for one exchange.
///
/// `confidence` is clamped to [0, 1] at construction; classifier output is
/// untrusted. A signal with no kind always carries confidence 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DealSignal {
    kind: Option<DealKind>,
    confidence: f32,
}

impl DealSignal {
    /// The no-commitment signal, also used when classification fails.
    pub fn none() -> Self {
        Self {
            kind: None,
            confidence: 0.0,
        }
    }

    /// A detected commitment of the given kind.
    pub fn detected(kind: DealKind, confidence: f32) -> Self {
        Self {
            kind: Some(kind),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Returns the detected kind, if any.
    pub fn kind(&self) -> Option<DealKind> {
        self.kind
    }

    /// Returns the classifier confidence.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// True when a kind was detected at or above the given threshold.
    pub fn qualifies(&self, threshold: f32) -> bool {
        self.kind.is_some() && self.confidence >= threshold
    }
}

impl Default for DealSignal {
    fn default() -> Self {
        Self::none()
    }
}

/// The deal commitment a session has recorded so far.
///
/// Folded in from accepted signals; cleared when the buyer cancels lead
/// capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DealStatus {
    pub kind: DealKind,
    pub confidence: f32,
}

impl DealStatus {
    /// Records a detected signal. Returns None for signals without a kind.
    pub fn from_signal(signal: &DealSignal) -> Option<Self> {
        signal.kind().map(|kind| Self {
            kind,
            confidence: signal.confidence(),
        })
    }

    /// Records an explicit human-agent deal marking.
    pub fn marked(kind: DealKind) -> Self {
        Self {
            kind,
            confidence: 1.0,
        }
    }
}
