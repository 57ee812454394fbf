//! Session lifecycle configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::session::AfterCapturePolicy;

/// Session lifecycle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Seconds of inactivity before a session is evicted
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Seconds between idle sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// How many trailing messages the inference provider sees
    #[serde(default = "default_transcript_window")]
    pub transcript_window: usize,

    /// Classifier confidence at which a deal signal requests lead capture
    #[serde(default = "default_confidence_threshold")]
    pub deal_confidence_threshold: f32,

    /// What happens to a session once its lead is captured
    #[serde(default)]
    pub after_capture: AfterCapturePolicy,
}

impl SessionConfig {
    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.transcript_window == 0 {
            return Err(ValidationError::InvalidTranscriptWindow);
        }
        if !(0.0..=1.0).contains(&self.deal_confidence_threshold) {
            return Err(ValidationError::InvalidConfidenceThreshold);
        }
        if self.idle_timeout_secs <= self.sweep_interval_secs {
            return Err(ValidationError::InvalidIdleTimeout);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            transcript_window: default_transcript_window(),
            deal_confidence_threshold: default_confidence_threshold(),
            after_capture: AfterCapturePolicy::default(),
        }
    }
}

fn default_idle_timeout() -> u64 {
    1800
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_transcript_window() -> usize {
    6
}

fn default_confidence_threshold() -> f32 {
    0.6
}
