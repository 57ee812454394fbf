//! Mock inference client for testing and keyless development.
//!
//! Configurable to return canned pitches, replies, and deal signals,
//! simulate provider latency, or inject errors.
//!
//! # Example
//!
//! ```ignore
//! let client = MockInferenceClient::new()
//!     .with_reply("Shall I book a viewing for you this Tuesday?")
//!     .with_signal(DealSignal::detected(DealKind::Viewing, 0.8))
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::conversation::Message;
use crate::domain::listing::ListingRef;
use crate::domain::session::DealSignal;
use crate::ports::{InferenceClient, InferenceError};

/// One recorded call, for verification.
#[derive(Debug, Clone)]
pub enum MockCall {
    Pitch { listing_title: String },
    Reply { transcript_len: usize },
    Classify { candidate_reply: String },
}

/// Mock inference client.
///
/// Responses are consumed in order per operation; when a queue runs dry the
/// client falls back to a friendly default so long conversations keep moving.
#[derive(Debug, Clone)]
pub struct MockInferenceClient {
    pitches: Arc<Mutex<VecDeque<Result<String, InferenceError>>>>,
    replies: Arc<Mutex<VecDeque<Result<String, InferenceError>>>>,
    signals: Arc<Mutex<VecDeque<Result<DealSignal, InferenceError>>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInferenceClient {
    /// Creates a new mock with empty queues and no delay.
    pub fn new() -> Self {
        Self {
            pitches: Arc::new(Mutex::new(VecDeque::new())),
            replies: Arc::new(Mutex::new(VecDeque::new())),
            signals: Arc::new(Mutex::new(VecDeque::new())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a pitch response.
    pub fn with_pitch(self, text: impl Into<String>) -> Self {
        self.pitches.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Queues a pitch failure.
    pub fn with_pitch_error(self, error: InferenceError) -> Self {
        self.pitches.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queues a reply response.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Queues a reply failure.
    pub fn with_reply_error(self, error: InferenceError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queues a classifier verdict.
    pub fn with_signal(self, signal: DealSignal) -> Self {
        self.signals.lock().unwrap().push_back(Ok(signal));
        self
    }

    /// Queues a classifier failure.
    pub fn with_signal_error(self, error: InferenceError) -> Self {
        self.signals.lock().unwrap().push_back(Err(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this client.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn pace(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn generate_pitch(&self, listing: &ListingRef) -> Result<String, InferenceError> {
        self.calls.lock().unwrap().push(MockCall::Pitch {
            listing_title: listing.title().to_string(),
        });
        self.pace().await;

        self.pitches.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(format!(
                "Welcome! {} is a wonderful choice - how does it match what you've been picturing?",
                listing.title()
            ))
        })
    }

    async fn generate_reply(
        &self,
        transcript: &[Message],
        _listing: &ListingRef,
    ) -> Result<String, InferenceError> {
        self.calls.lock().unwrap().push(MockCall::Reply {
            transcript_len: transcript.len(),
        });
        self.pace().await;

        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok("Happy to help with that - shall I book a viewing for you?".to_string())
        })
    }

    async fn classify_deal_signal(
        &self,
        _transcript: &[Message],
        candidate_reply: &str,
    ) -> Result<DealSignal, InferenceError> {
        self.calls.lock().unwrap().push(MockCall::Classify {
            candidate_reply: candidate_reply.to_string(),
        });
        self.pace().await;

        self.signals
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DealSignal::none()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ListingId;
    use crate::domain::session::DealKind;

    fn listing() -> ListingRef {
        ListingRef::new(
            ListingId::new("listing-7").unwrap(),
            "Sunny 2BR Apartment",
            "Riverside District",
            245_000.0,
            "Bright two-bedroom with balcony.",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn returns_queued_replies_in_order() {
        let client = MockInferenceClient::new()
            .with_reply("First")
            .with_reply("Second");

        assert_eq!(client.generate_reply(&[], &listing()).await.unwrap(), "First");
        assert_eq!(client.generate_reply(&[], &listing()).await.unwrap(), "Second");
    }

    #[tokio::test]
    async fn falls_back_to_defaults_when_exhausted() {
        let client = MockInferenceClient::new();

        let pitch = client.generate_pitch(&listing()).await.unwrap();
        assert!(pitch.contains("Sunny 2BR Apartment"));

        let signal = client.classify_deal_signal(&[], "sure").await.unwrap();
        assert_eq!(signal, DealSignal::none());
    }

    #[tokio::test]
    async fn returns_queued_errors() {
        let client = MockInferenceClient::new()
            .with_pitch_error(InferenceError::unavailable("down"));

        let result = client.generate_pitch(&listing()).await;
        assert!(matches!(result, Err(InferenceError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn queued_signals_surface_to_the_caller() {
        let client =
            MockInferenceClient::new().with_signal(DealSignal::detected(DealKind::Viewing, 0.8));

        let signal = client.classify_deal_signal(&[], "reply").await.unwrap();
        assert_eq!(signal.kind(), Some(DealKind::Viewing));
    }

    #[tokio::test]
    async fn tracks_calls_per_operation() {
        let client = MockInferenceClient::new();

        client.generate_pitch(&listing()).await.unwrap();
        client.classify_deal_signal(&[], "reply").await.unwrap();

        assert_eq!(client.call_count(), 2);
        assert!(matches!(client.get_calls()[0], MockCall::Pitch { .. }));
        assert!(matches!(client.get_calls()[1], MockCall::Classify { .. }));
    }

    #[tokio::test]
    async fn respects_delay() {
        let client = MockInferenceClient::new()
            .with_reply("slow")
            .with_delay(Duration::from_millis(50));

        let start = std::time::Instant::now();
        client.generate_reply(&[], &listing()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
