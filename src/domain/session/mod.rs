//! Session domain module.
//!
//! The deal-closing state machine for one (buyer, listing) dialogue:
//! control modes, turn/epoch dispatch tagging, deal signals, and the
//! session aggregate itself.

mod aggregate;
mod deal;
mod dispatch;
mod errors;
mod mode;

pub use aggregate::{
    ApplyOutcome, CaptureOutcome, Session, StaleReason, SubmitOutcome, FALLBACK_REPLY,
};
pub use deal::{DealKind, DealSignal, DealStatus};
pub use dispatch::DispatchTag;
pub use errors::SessionError;
pub use mode::{AfterCapturePolicy, ControlMode, SessionMode};
