//! Autopilot dispatcher - runs inference turns against live sessions.
//!
//! Each buyer turn submitted while a session is in autopilot produces a
//! dispatch: generate a reply, classify the deal signal it completes, and
//! apply both back to the session. The dispatch runs outside the session
//! lock so a slow provider never blocks takeover, further submissions, or
//! lead capture. Whatever happened in the meantime is settled at apply
//! time by the turn and epoch checks; a superseded result is dropped and
//! the buyer sees the human's message, a newer reply, or silence, never a
//! raw error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::application::registry::SessionCell;
use crate::domain::session::{
    ApplyOutcome, DealSignal, DispatchTag, Session, SessionMode, FALLBACK_REPLY,
};
use crate::ports::{InferenceClient, InferenceError, SessionEvent, SessionEventPublisher};

/// Tuning for autopilot dispatches.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Upper bound for each inference call.
    pub request_timeout_secs: u64,
    /// How many trailing messages the provider sees.
    pub transcript_window: usize,
    /// Classifier confidence at which a deal signal requests lead capture.
    pub deal_confidence_threshold: f32,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            transcript_window: 6,
            deal_confidence_threshold: 0.6,
        }
    }
}

/// Dispatches autopilot work for sessions.
pub struct AutopilotDispatcher {
    inference: Arc<dyn InferenceClient>,
    events: Arc<dyn SessionEventPublisher>,
    settings: DispatchSettings,
}

impl AutopilotDispatcher {
    pub fn new(
        inference: Arc<dyn InferenceClient>,
        events: Arc<dyn SessionEventPublisher>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            inference,
            events,
            settings,
        }
    }

    /// Spawns the opening-pitch dispatch for a freshly created session.
    pub fn spawn_pitch(self: &Arc<Self>, cell: Arc<SessionCell>) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.run_pitch(&cell).await })
    }

    /// Spawns the reply dispatch for a tagged buyer turn.
    pub fn spawn_reply(self: &Arc<Self>, cell: Arc<SessionCell>, tag: DispatchTag) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.run_reply(&cell, tag).await })
    }

    /// Generates the opening pitch and opens the session with it.
    ///
    /// A failed or empty generation falls back to a canned greeting naming
    /// the listing; the session still opens in autopilot either way. If the
    /// session was evicted in the meantime the pitch is dropped.
    pub async fn run_pitch(&self, cell: &SessionCell) {
        let (key, listing) = {
            let session = cell.session().lock().await;
            (session.key().clone(), session.listing().clone())
        };

        let pitch = match self.timed(self.inference.generate_pitch(&listing)).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!(session = %key, "empty pitch from provider, using fallback");
                Session::fallback_pitch(&listing)
            }
            Err(err) => {
                tracing::warn!(session = %key, error = %err, "pitch generation failed, using fallback");
                Session::fallback_pitch(&listing)
            }
        };

        let mut session = cell.session().lock().await;
        match session.open_with_pitch(&pitch) {
            Ok(message) => {
                let mode = session.mode();
                drop(session);
                self.events.publish(SessionEvent::MessageAppended {
                    session: key.clone(),
                    message,
                });
                self.events.publish(SessionEvent::ModeChanged { session: key, mode });
            }
            Err(err) => {
                tracing::warn!(session = %key, error = %err, "pitch dropped");
            }
        }
    }

    /// Runs one reply dispatch to completion.
    ///
    /// Dispatches for the same session serialize on the dispatch gate, so a
    /// burst of buyer turns is worked one at a time and each apply sees the
    /// log in submission order. The tag is re-checked after the gate is
    /// acquired; a dispatch superseded while queued skips the provider call
    /// entirely.
    pub async fn run_reply(&self, cell: &SessionCell, tag: DispatchTag) {
        let _gate = cell.dispatch_gate().lock().await;

        let (key, listing, transcript) = {
            let session = cell.session().lock().await;
            if session.mode() != SessionMode::Autopilot
                || session.epoch() != tag.epoch()
                || session.turn_sequence() != tag.turn()
            {
                tracing::debug!(session = %session.key(), %tag, "dispatch superseded while queued");
                return;
            }
            (
                session.key().clone(),
                session.listing().clone(),
                session
                    .log()
                    .last_turns(self.settings.transcript_window)
                    .to_vec(),
            )
        };

        let (reply, signal) = match self
            .timed(self.inference.generate_reply(&transcript, &listing))
            .await
        {
            Ok(text) if !text.trim().is_empty() => {
                let signal = match self
                    .timed(self.inference.classify_deal_signal(&transcript, &text))
                    .await
                {
                    Ok(signal) => signal,
                    Err(err) => {
                        tracing::warn!(
                            session = %key,
                            error = %err,
                            "deal classification failed, treating as no signal"
                        );
                        DealSignal::none()
                    }
                };
                (text, signal)
            }
            Ok(_) => {
                tracing::warn!(session = %key, "empty reply from provider, using fallback");
                (FALLBACK_REPLY.to_string(), DealSignal::none())
            }
            Err(err) => {
                tracing::warn!(session = %key, error = %err, "reply generation failed, using fallback");
                (FALLBACK_REPLY.to_string(), DealSignal::none())
            }
        };

        let mut session = cell.session().lock().await;
        match session.apply_inference_result(
            tag,
            &reply,
            signal,
            self.settings.deal_confidence_threshold,
        ) {
            Ok(ApplyOutcome::Applied {
                message,
                capture_requested,
            }) => {
                let mode = session.mode();
                drop(session);
                self.events.publish(SessionEvent::MessageAppended {
                    session: key.clone(),
                    message,
                });
                if capture_requested {
                    self.events.publish(SessionEvent::ModeChanged { session: key, mode });
                }
            }
            Ok(ApplyOutcome::Stale(reason)) => {
                tracing::debug!(session = %key, %tag, %reason, "stale inference result dropped");
            }
            Err(err) => {
                tracing::debug!(session = %key, %tag, error = %err, "inference result discarded");
            }
        }
    }

    /// Applies the request timeout to one provider call.
    async fn timed<T>(
        &self,
        call: impl Future<Output = Result<T, InferenceError>>,
    ) -> Result<T, InferenceError> {
        let timeout_secs = self.settings.request_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(timeout_secs), call).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::timeout(timeout_secs)),
        }
    }
}
