//! Inference Adapters.
//!
//! Implementations of the InferenceClient port.
//!
//! ## Available Adapters
//!
//! - `GeminiClient` - Google Gemini models via the generateContent API
//! - `MockInferenceClient` - Configurable mock for testing and keyless development

mod gemini;
mod mock;

pub use gemini::{GeminiClient, GeminiConfig};
pub use mock::{MockCall, MockInferenceClient};
