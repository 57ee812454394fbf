//! Inference port - Interface for the language-model collaborator.
//!
//! The session core needs exactly three operations from the completion
//! service: an opening pitch for a listing, a reply to the dialogue so far,
//! and a structured deal-commitment classification of the latest exchange.
//! All three may fail or time out; the dispatcher degrades to deterministic
//! fallbacks and never surfaces these errors to the buyer.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::Message;
use crate::domain::listing::ListingRef;
use crate::domain::session::DealSignal;

/// Port for the external text-completion service.
///
/// Implementations translate between the provider wire format and domain
/// types. The transcript slices handed in are bounded windows (newest last);
/// the core never passes the full log.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Generates the opening pitch for a listing.
    async fn generate_pitch(&self, listing: &ListingRef) -> Result<String, InferenceError>;

    /// Generates the next agent reply for the dialogue window.
    async fn generate_reply(
        &self,
        transcript: &[Message],
        listing: &ListingRef,
    ) -> Result<String, InferenceError>;

    /// Classifies the deal commitment expressed by the latest exchange.
    ///
    /// `candidate_reply` is the just-generated agent reply, which is part of
    /// the exchange being classified even though it is not yet in the log.
    async fn classify_deal_signal(
        &self,
        transcript: &[Message],
        candidate_reply: &str,
    ) -> Result<DealSignal, InferenceError>;
}

/// Errors from the inference collaborator.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl InferenceError {
    /// Creates a timeout error.
    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }

    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn InferenceClient) {}

    #[test]
    fn errors_display_their_context() {
        assert_eq!(
            InferenceError::timeout(12).to_string(),
            "request timed out after 12s"
        );
        assert_eq!(
            InferenceError::unavailable("503").to_string(),
            "provider unavailable: 503"
        );
        assert_eq!(
            InferenceError::parse("bad json").to_string(),
            "parse error: bad json"
        );
    }
}
