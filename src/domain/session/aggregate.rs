//! Session aggregate entity.
//!
//! A session is the state machine for one (buyer, listing) dialogue. It owns
//! the message log, the control mode, the turn sequence and epoch counters,
//! and the recorded deal status.
//!
//! # Ownership
//!
//! The session owns its log exclusively; all mutation goes through the
//! session under its critical section. The catalog snapshot is immutable
//! input, and a captured lead receives a copy of the log, never a live
//! reference.

use serde::{Deserialize, Serialize};

use super::{
    AfterCapturePolicy, ControlMode, DealKind, DealSignal, DealStatus, DispatchTag,
    SessionError, SessionMode,
};
use crate::domain::conversation::{Message, MessageLog, Sender};
use crate::domain::foundation::{AgentId, LeadId, SessionKey, StateMachine, Timestamp};
use crate::domain::listing::ListingRef;

/// Deterministic reply used when generation fails or times out.
pub const FALLBACK_REPLY: &str =
    "I apologize, I'm having trouble responding right now. Please try again.";

/// Outcome of a buyer submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// The appended buyer message.
    pub message: Message,
    /// Tag for the autopilot dispatch this turn requires, if any.
    pub dispatch: Option<DispatchTag>,
}

/// Why an inference result was discarded instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// The session left autopilot (takeover, lead capture, or close).
    ModeChanged(SessionMode),
    /// A control-mode change superseded the dispatch epoch.
    EpochSuperseded,
    /// A newer buyer turn superseded the dispatch.
    TurnSuperseded,
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleReason::ModeChanged(mode) => write!(f, "mode changed to {}", mode),
            StaleReason::EpochSuperseded => write!(f, "epoch superseded"),
            StaleReason::TurnSuperseded => write!(f, "turn superseded"),
        }
    }
}

/// Outcome of applying an inference result.
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    /// The reply was appended.
    Applied {
        message: Message,
        /// True when the folded signal moved the session to lead capture.
        capture_requested: bool,
    },
    /// The result was stale and discarded; the log is unchanged.
    Stale(StaleReason),
}

/// Outcome of a completed lead capture.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    /// The appended confirmation message.
    pub confirmation: Message,
    /// The mode the session moved to afterwards.
    pub mode: SessionMode,
}

/// Session aggregate - the deal-closing state machine for one buyer and
/// one listing.
///
/// # Invariants
///
/// - `turn_sequence` only grows; every buyer submission increments it
/// - at most one dispatch tag is live; a result is applied only while its
///   tag's turn and epoch both still match and the mode is `Autopilot`
/// - `HumanControlled` is left only by explicit release, capture, or close
/// - the log is append-only; stale results never reach it
/// - at most one lead is ever recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Identifies the (buyer, listing) pair.
    key: SessionKey,

    /// Catalog snapshot captured at open.
    listing: ListingRef,

    /// Current control mode.
    mode: SessionMode,

    /// Producer to return to after lead capture ends.
    resume_mode: ControlMode,

    /// Buyer turn counter; grows on every submission.
    turn_sequence: u64,

    /// Control-mode change counter; grows on every transition.
    epoch: u64,

    /// Tag of the latest unresolved autopilot dispatch.
    in_flight: Option<DispatchTag>,

    /// The dialogue so far.
    log: MessageLog,

    /// Deal commitment recorded from accepted signals.
    deal_status: Option<DealStatus>,

    /// Set once a lead has been captured.
    lead_ref: Option<LeadId>,

    /// The human agent holding the session, while human controlled.
    controlling_agent: Option<AgentId>,

    /// When the session was created.
    created_at: Timestamp,

    /// Last buyer/agent activity, for idle eviction.
    last_activity: Timestamp,
}

impl Session {
    /// Creates a new session in `Initializing` mode with an empty log.
    pub fn new(key: SessionKey, listing: ListingRef) -> Self {
        let now = Timestamp::now();
        Self {
            key,
            listing,
            mode: SessionMode::Initializing,
            resume_mode: ControlMode::Autopilot,
            turn_sequence: 0,
            epoch: 0,
            in_flight: None,
            log: MessageLog::new(),
            deal_status: None,
            lead_ref: None,
            controlling_agent: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Deterministic greeting used when pitch generation fails.
    pub fn fallback_pitch(listing: &ListingRef) -> String {
        format!(
            "Welcome! I'm excited to tell you about {}. What would you like to know?",
            listing.title()
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the session key.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Returns the catalog snapshot.
    pub fn listing(&self) -> &ListingRef {
        &self.listing
    }

    /// Returns the current control mode.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Returns the current turn sequence.
    pub fn turn_sequence(&self) -> u64 {
        self.turn_sequence
    }

    /// Returns the current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns the tag of the latest unresolved dispatch, if any.
    pub fn in_flight(&self) -> Option<DispatchTag> {
        self.in_flight
    }

    /// Returns the message log.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Returns the recorded deal status.
    pub fn deal_status(&self) -> Option<DealStatus> {
        self.deal_status
    }

    /// Returns the captured lead id, if any.
    pub fn lead_ref(&self) -> Option<LeadId> {
        self.lead_ref
    }

    /// Returns the controlling human agent, while human controlled.
    pub fn controlling_agent(&self) -> Option<&AgentId> {
        self.controlling_agent.as_ref()
    }

    /// Returns when the session was created.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns the last activity timestamp.
    pub fn last_activity(&self) -> &Timestamp {
        &self.last_activity
    }

    /// True once the session has been idle longer than `idle_secs`.
    pub fn is_idle(&self, now: &Timestamp, idle_secs: u64) -> bool {
        now.is_after(&self.last_activity.plus_secs(idle_secs))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Opening
    // ─────────────────────────────────────────────────────────────────────────

    /// Appends the opening pitch and moves the session into autopilot.
    ///
    /// Called with generated text or with [`Session::fallback_pitch`]; either
    /// way the session leaves `Initializing`.
    ///
    /// # Errors
    ///
    /// - `Closed` if the session was evicted before the pitch arrived
    /// - `InvalidState` if the session already opened
    pub fn open_with_pitch(&mut self, pitch: &str) -> Result<Message, SessionError> {
        self.ensure_open()?;
        if self.mode != SessionMode::Initializing {
            return Err(SessionError::invalid_state("open_with_pitch", self.mode));
        }

        let message = self.log.append(Sender::AutopilotAgent, pitch)?.clone();
        self.set_mode(SessionMode::Autopilot);
        self.touch();
        Ok(message)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Buyer turns and inference results
    // ─────────────────────────────────────────────────────────────────────────

    /// Appends a buyer message and advances the turn sequence.
    ///
    /// In autopilot the returned tag must be handed to the dispatcher; in any
    /// other live mode the message is appended without a dispatch.
    ///
    /// # Errors
    ///
    /// - `Closed` if the session is closed
    /// - `Validation` if the text is empty (log and sequence unchanged)
    pub fn submit_buyer_message(&mut self, text: &str) -> Result<SubmitOutcome, SessionError> {
        self.ensure_open()?;

        let message = self.log.append(Sender::Buyer, text)?.clone();
        self.turn_sequence += 1;
        self.touch();

        let dispatch = if self.mode == SessionMode::Autopilot {
            let tag = DispatchTag::new(self.turn_sequence, self.epoch);
            self.in_flight = Some(tag);
            Some(tag)
        } else {
            None
        };

        Ok(SubmitOutcome { message, dispatch })
    }

    /// Applies an inference result, or discards it as stale.
    ///
    /// The tag must match the session's current turn sequence and epoch and
    /// the session must still be in autopilot; anything else is reported as
    /// [`ApplyOutcome::Stale`] and leaves the log untouched. On acceptance
    /// the reply is appended, the signal folded into the deal status, and a
    /// qualifying signal (threshold reached, no lead captured yet) moves the
    /// session to `AwaitingLeadCapture`.
    ///
    /// # Errors
    ///
    /// - `Validation` if the reply text is empty
    pub fn apply_inference_result(
        &mut self,
        tag: DispatchTag,
        reply: &str,
        signal: DealSignal,
        threshold: f32,
    ) -> Result<ApplyOutcome, SessionError> {
        if self.mode != SessionMode::Autopilot {
            return Ok(ApplyOutcome::Stale(StaleReason::ModeChanged(self.mode)));
        }
        if tag.epoch() != self.epoch {
            return Ok(ApplyOutcome::Stale(StaleReason::EpochSuperseded));
        }
        if tag.turn() != self.turn_sequence {
            return Ok(ApplyOutcome::Stale(StaleReason::TurnSuperseded));
        }

        let message = self.log.append(Sender::AutopilotAgent, reply)?.clone();
        self.in_flight = None;
        self.touch();

        if let Some(status) = DealStatus::from_signal(&signal) {
            self.deal_status = Some(status);
        }

        let capture_requested = signal.qualifies(threshold) && self.lead_ref.is_none();
        if capture_requested {
            self.resume_mode = ControlMode::Autopilot;
            self.set_mode(SessionMode::AwaitingLeadCapture);
        }

        Ok(ApplyOutcome::Applied {
            message,
            capture_requested,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Human control
    // ─────────────────────────────────────────────────────────────────────────

    /// Hands the session to a human agent.
    ///
    /// Bumps the epoch so any in-flight autopilot result is discarded on
    /// arrival, and appends a `System` notice naming the agent.
    ///
    /// # Errors
    ///
    /// - `Closed` if the session is closed
    /// - `InvalidState` unless the session is in autopilot
    pub fn take_over(
        &mut self,
        agent: AgentId,
        agent_name: &str,
    ) -> Result<Message, SessionError> {
        self.ensure_open()?;
        if self.mode != SessionMode::Autopilot {
            return Err(SessionError::invalid_state("take_over", self.mode));
        }

        let label = if agent_name.trim().is_empty() {
            agent.as_str().to_string()
        } else {
            agent_name.trim().to_string()
        };
        let notice = self
            .log
            .append(Sender::System, format!("{} has joined the chat.", label))?
            .clone();

        self.set_mode(SessionMode::HumanControlled);
        self.resume_mode = ControlMode::HumanControlled;
        self.controlling_agent = Some(agent);
        self.touch();
        Ok(notice)
    }

    /// Returns the session to autopilot.
    ///
    /// # Errors
    ///
    /// - `Closed` if the session is closed
    /// - `InvalidState` unless the session is human controlled
    pub fn release_control(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.mode != SessionMode::HumanControlled {
            return Err(SessionError::invalid_state("release_control", self.mode));
        }

        self.set_mode(SessionMode::Autopilot);
        self.resume_mode = ControlMode::Autopilot;
        self.controlling_agent = None;
        self.touch();
        Ok(())
    }

    /// Appends a reply authored by the controlling human agent.
    ///
    /// # Errors
    ///
    /// - `Closed` if the session is closed
    /// - `InvalidState` unless the session is human controlled
    /// - `Validation` if the text is empty
    pub fn post_agent_message(&mut self, text: &str) -> Result<Message, SessionError> {
        self.ensure_open()?;
        if self.mode != SessionMode::HumanControlled {
            return Err(SessionError::invalid_state("post_agent_message", self.mode));
        }

        let message = self.log.append(Sender::HumanAgent, text)?.clone();
        self.touch();
        Ok(message)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lead capture
    // ─────────────────────────────────────────────────────────────────────────

    /// Marks the deal explicitly, moving a human-controlled session to
    /// lead capture with full confidence.
    ///
    /// # Errors
    ///
    /// - `Closed` if the session is closed
    /// - `AlreadyCaptured` if a lead exists for this session
    /// - `InvalidState` unless the session is human controlled
    pub fn mark_deal(&mut self, kind: DealKind) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.lead_ref.is_some() {
            return Err(SessionError::AlreadyCaptured);
        }
        if self.mode != SessionMode::HumanControlled {
            return Err(SessionError::invalid_state("mark_deal", self.mode));
        }

        self.deal_status = Some(DealStatus::marked(kind));
        self.resume_mode = ControlMode::HumanControlled;
        self.set_mode(SessionMode::AwaitingLeadCapture);
        self.touch();
        Ok(())
    }

    /// Checks that a lead capture may start now.
    ///
    /// # Errors
    ///
    /// - `Closed` if the session is closed
    /// - `AlreadyCaptured` if a lead exists for this session
    /// - `InvalidState` unless the session is awaiting lead capture
    pub fn ensure_capture_allowed(&self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.lead_ref.is_some() {
            return Err(SessionError::AlreadyCaptured);
        }
        if self.mode != SessionMode::AwaitingLeadCapture {
            return Err(SessionError::invalid_state("capture_lead", self.mode));
        }
        Ok(())
    }

    /// Records a persisted lead, appends the confirmation notice, and moves
    /// the session onward per policy.
    ///
    /// Re-validates the capture preconditions; the session lock is not held
    /// while the lead store runs, so the session may have closed in between.
    ///
    /// # Errors
    ///
    /// Same as [`Session::ensure_capture_allowed`], plus `Validation` if the
    /// confirmation text is empty.
    pub fn complete_lead_capture(
        &mut self,
        lead_id: LeadId,
        confirmation: &str,
        policy: AfterCapturePolicy,
    ) -> Result<CaptureOutcome, SessionError> {
        self.ensure_capture_allowed()?;

        let message = self.log.append(Sender::System, confirmation)?.clone();
        self.lead_ref = Some(lead_id);

        let next = match policy {
            AfterCapturePolicy::Resume => self.resume_mode.as_session_mode(),
            AfterCapturePolicy::Close => SessionMode::Closed,
        };
        self.set_mode(next);
        if next != SessionMode::HumanControlled {
            self.controlling_agent = None;
        }
        self.touch();
        Ok(CaptureOutcome {
            confirmation: message,
            mode: self.mode,
        })
    }

    /// Abandons lead capture and resumes the prior control mode.
    ///
    /// Clears the recorded deal status; the classifier may raise it again on
    /// a later turn.
    ///
    /// # Errors
    ///
    /// - `Closed` if the session is closed
    /// - `InvalidState` unless the session is awaiting lead capture
    pub fn cancel_lead_capture(&mut self) -> Result<SessionMode, SessionError> {
        self.ensure_open()?;
        if self.mode != SessionMode::AwaitingLeadCapture {
            return Err(SessionError::invalid_state("cancel_lead_capture", self.mode));
        }

        self.deal_status = None;
        self.set_mode(self.resume_mode.as_session_mode());
        self.touch();
        Ok(self.mode)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Closing
    // ─────────────────────────────────────────────────────────────────────────

    /// Closes the session. Idempotent; eviction and explicit close may race.
    pub fn close(&mut self) {
        if self.mode == SessionMode::Closed {
            return;
        }
        self.set_mode(SessionMode::Closed);
        self.controlling_agent = None;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Rejects any operation on a closed session.
    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.mode == SessionMode::Closed {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    /// Performs a mode transition, bumping the epoch and condemning any
    /// in-flight dispatch.
    fn set_mode(&mut self, target: SessionMode) {
        debug_assert!(
            self.mode.can_transition_to(&target),
            "invalid mode transition {:?} -> {:?}",
            self.mode,
            target
        );
        self.mode = target;
        self.epoch += 1;
        self.in_flight = None;
    }

    fn touch(&mut self) {
        self.last_activity = Timestamp::now();
    }
}
