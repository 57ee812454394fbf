//! Gemini Client - Implementation of InferenceClient for Google's Gemini API.
//!
//! Drives the three session prompts (opening pitch, agent reply, deal
//! classification) through the `generateContent` endpoint. Classification
//! runs in JSON mode with a fixed response shape.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_model("gemini-2.0-flash")
//!     .with_base_url("https://generativelanguage.googleapis.com/v1beta");
//!
//! let client = GeminiClient::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::conversation::{Message, Sender};
use crate::domain::listing::ListingRef;
use crate::domain::session::{DealKind, DealSignal};
use crate::ports::{InferenceClient, InferenceError};

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gemini-2.0-flash").
    pub model: String,
    /// Base URL for the API (default: https://generativelanguage.googleapis.com/v1beta).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API client implementation.
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    /// Creates a new Gemini client with the given configuration.
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Builds the generateContent endpoint URL.
    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    /// Sends a prompt and extracts the text of the first candidate.
    async fn generate(&self, prompt: String, json_mode: bool) -> Result<String, InferenceError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 1.0,
                response_mime_type: json_mode.then(|| "application/json".to_string()),
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::timeout(self.config.timeout.as_secs())
                } else if e.is_connect() {
                    InferenceError::network(format!("Connection failed: {}", e))
                } else {
                    InferenceError::network(e.to_string())
                }
            })?;

        let response = self.handle_response_status(response).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::parse(format!("Failed to parse response: {}", e)))?;

        extract_text(parsed)
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, InferenceError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok());
        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(InferenceError::AuthenticationFailed),
            429 => Err(InferenceError::rate_limited(retry_after.unwrap_or(30))),
            500..=599 => Err(InferenceError::unavailable(format!(
                "Server error {}: {}",
                status,
                error_message(&error_body)
            ))),
            _ => Err(InferenceError::network(format!(
                "Unexpected status {}: {}",
                status,
                error_message(&error_body)
            ))),
        }
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn generate_pitch(&self, listing: &ListingRef) -> Result<String, InferenceError> {
        let text = self.generate(pitch_prompt(listing), false).await?;
        Ok(text.trim().to_string())
    }

    async fn generate_reply(
        &self,
        transcript: &[Message],
        listing: &ListingRef,
    ) -> Result<String, InferenceError> {
        let text = self
            .generate(reply_prompt(transcript, listing), false)
            .await?;
        Ok(text.trim().to_string())
    }

    async fn classify_deal_signal(
        &self,
        transcript: &[Message],
        candidate_reply: &str,
    ) -> Result<DealSignal, InferenceError> {
        let text = self
            .generate(classifier_prompt(transcript, candidate_reply), true)
            .await?;
        parse_signal(&text)
    }
}

/// Renders the listing the way the prompts embed it.
fn listing_details(listing: &ListingRef) -> String {
    serde_json::to_string_pretty(listing).unwrap_or_else(|_| listing.title().to_string())
}

/// Renders one transcript line with the speaker label the prompts use.
fn speaker_label(sender: Sender) -> &'static str {
    match sender {
        Sender::Buyer => "Client",
        Sender::AutopilotAgent | Sender::HumanAgent => "Sales Agent",
        Sender::System => "System",
    }
}

/// Renders a transcript window, newest last.
fn render_transcript(transcript: &[Message]) -> String {
    transcript
        .iter()
        .map(|m| format!("{}: {}", speaker_label(m.sender()), m.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the opening-pitch prompt for a listing.
fn pitch_prompt(listing: &ListingRef) -> String {
    format!(
        r#"You are a TOP-PERFORMING real estate sales expert with a proven track record of closing high-value deals. Your communication style is professional, confident, and persuasive, yet warm and personable.

A potential client has just expressed interest in this premium property:
Property Details: {details}

Your mission is to create a WARM, EMOTIONAL, and VALIDATING opening message that:
1.  Congratulates the client on making an excellent selection (validate their taste).
2.  Evokes the *feeling* of living there (e.g., "Imagine waking up to this view...").
3.  Is friendly and welcoming, NOT pushy or sales-heavy yet.
4.  Ends with a soft, open question to invite their thoughts (e.g., "How does this match what you've been picturing?").

Use emotional words like "breathtaking," "serene," "perfect choice," "home."
Keep it warm, concise (2 sentences), and inviting.

Respond with ONLY the pitch text."#,
        details = listing_details(listing)
    )
}

/// Builds the agent-reply prompt for the dialogue window.
fn reply_prompt(transcript: &[Message], listing: &ListingRef) -> String {
    let (history, latest) = match transcript.split_last() {
        Some((last, rest)) => (render_transcript(rest), last.text().to_string()),
        None => (String::new(), String::new()),
    };

    format!(
        r#"You are a HIGHLY EXPERIENCED REAL ESTATE PROFESSIONAL with over 20 years of track record in closing high-value deals. You are not just an AI; you are a strategic partner to the client.

**YOUR PROFILE:**
- **Experience:** 20+ years in luxury and investment real estate.
- **Style:** Professional, confident, persuasive, yet warm and ethical. You speak with authority but always listen first.
- **Goal:** To guide the client step-by-step towards a decision (viewing, offer, or purchase) by building trust and demonstrating value.

**YOUR METHODOLOGY (The "Closer's Loop"):**
1.  **QUALIFY (The Foundation):** Never assume. Always ask clarifying questions early to understand the "Why".
2.  **VALUE PROPOSITION (The Hook):** Connect property features to the client's specific needs. Don't just list specs; explain benefits.
3.  **OBJECTION HANDLING (The Pivot):** Validate the concern, then reframe it using data or logic ("Feel, Felt, Found").
4.  **URGENCY (The Nudge):** Create ethical urgency based on market reality.
5.  **CLOSE (The Action):** Always end with a clear, low-friction Call to Action (CTA).

**EMOTIONAL INTELLIGENCE:**
-   **Anxious Client:** Be the "Protector". Reassure with facts and safety.
-   **Excited Client:** Be the "Cheerleader". Amplify their excitement but keep them focused on the next step.
-   **Skeptical Client:** Be the "Analyst". Use numbers, trends, and comparisons.

**Property Details:**
{details}

**Conversation History:**
{history}

**Client's latest message:**
"{latest}"

**CRITICAL INSTRUCTIONS:**
-   **Be Concise:** Keep responses to 2-4 powerful sentences.
-   **Be Proactive:** Never leave the conversation hanging. Always lead to the next step.
-   **Be Human:** Use professional warmth. Avoid robotic repetition.
-   **Deal Detection:** If the client says "I want to buy", "Book a viewing", etc., IMMEDIATELY acknowledge it with enthusiasm and ask for the necessary details to finalize it.

Respond with ONLY your message to the client."#,
        details = listing_details(listing),
        history = history,
        latest = latest,
    )
}

/// Builds the deal-classification prompt for the latest exchange.
fn classifier_prompt(transcript: &[Message], candidate_reply: &str) -> String {
    let client_message = transcript
        .iter()
        .rev()
        .find(|m| m.sender() == Sender::Buyer)
        .map(|m| m.text().to_string())
        .unwrap_or_default();

    format!(
        r#"Analyze this real estate conversation and determine if the client has committed to a specific action.

**Client's message:** "{client}"
**Agent's response:** "{agent}"

**Buying Signals to Look For:**
- Purchase commitment: "I'll buy it", "I want to purchase", "Let's proceed with the purchase"
- Rental commitment: "I'll rent it", "I want to rent", "Let's sign the lease"
- Viewing request: "Can I schedule a viewing", "I'd like to see it", "Book a viewing", "When can I visit"

**Response Format (JSON):**
{{
    "dealClosure": boolean,
    "dealType": "purchase" | "rental" | "viewing" | null,
    "confidence": number (0-1)
}}"#,
        client = client_message,
        agent = candidate_reply,
    )
}

/// Parses the classifier's JSON verdict into a domain signal.
///
/// Accepts the verdict bare or wrapped in a Markdown code fence; a verdict
/// without closure or without a kind collapses to the no-commitment signal.
fn parse_signal(text: &str) -> Result<DealSignal, InferenceError> {
    let stripped = strip_code_fence(text.trim());

    let verdict: DealVerdict = serde_json::from_str(stripped)
        .map_err(|e| InferenceError::parse(format!("Bad verdict JSON: {}", e)))?;

    if !verdict.deal_closure {
        return Ok(DealSignal::none());
    }
    match verdict.deal_type {
        Some(kind) => Ok(DealSignal::detected(
            kind,
            verdict.confidence.unwrap_or(0.0),
        )),
        None => Ok(DealSignal::none()),
    }
}

/// Removes a surrounding ```json ... ``` fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").map(str::trim_end).unwrap_or(rest)
}

/// Pulls the Gemini error message out of an error body, if parseable.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|w| w.error.message)
        .unwrap_or_else(|| body.to_string())
}

fn extract_text(response: GenerateContentResponse) -> Result<String, InferenceError> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| InferenceError::parse("Response carried no text candidates"))
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DealVerdict {
    deal_closure: bool,
    deal_type: Option<DealKind>,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::MessageLog;
    use crate::domain::foundation::ListingId;

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

    #[test]
    fn config_builder_works() {
        let config = GeminiConfig::new("test-key")
            .with_model("gemini-1.5-pro")
            .with_base_url("https://custom.api.com/v1beta")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.base_url, "https://custom.api.com/v1beta");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn generate_url_targets_the_model() {
        let client = GeminiClient::new(GeminiConfig::new("k"));
        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn pitch_prompt_embeds_the_listing() {
        let prompt = pitch_prompt(&listing());
        assert!(prompt.contains("Sunny 2BR Apartment"));
        assert!(prompt.contains("Respond with ONLY the pitch text."));
    }

    #[test]
    fn reply_prompt_splits_history_from_latest_message() {
        let mut log = MessageLog::new();
        log.append(Sender::AutopilotAgent, "Welcome!").unwrap();
        log.append(Sender::Buyer, "Does it have parking?").unwrap();

        let prompt = reply_prompt(log.messages(), &listing());
        assert!(prompt.contains("Sales Agent: Welcome!"));
        assert!(prompt.contains("\"Does it have parking?\""));
        assert!(!prompt.contains("Client: Does it have parking?"));
    }

    #[test]
    fn classifier_prompt_quotes_the_last_buyer_message() {
        let mut log = MessageLog::new();
        log.append(Sender::Buyer, "Book a viewing please").unwrap();
        log.append(Sender::System, "Dana has joined the chat.").unwrap();

        let prompt = classifier_prompt(log.messages(), "Absolutely, when suits you?");
        assert!(prompt.contains("\"Book a viewing please\""));
        assert!(prompt.contains("\"Absolutely, when suits you?\""));
    }

    #[test]
    fn parse_signal_reads_a_detected_deal() {
        let signal = parse_signal(
            r#"{"dealClosure": true, "dealType": "viewing", "confidence": 0.8}"#,
        )
        .unwrap();
        assert_eq!(signal.kind(), Some(DealKind::Viewing));
        assert_eq!(signal.confidence(), 0.8);
    }

    #[test]
    fn parse_signal_without_closure_is_none() {
        let signal = parse_signal(
            r#"{"dealClosure": false, "dealType": null, "confidence": 0.2}"#,
        )
        .unwrap();
        assert_eq!(signal, DealSignal::none());
    }

    #[test]
    fn parse_signal_closure_without_kind_is_none() {
        let signal =
            parse_signal(r#"{"dealClosure": true, "dealType": null, "confidence": 0.9}"#).unwrap();
        assert_eq!(signal, DealSignal::none());
    }

    #[test]
    fn parse_signal_accepts_fenced_json() {
        let text = "```json\n{\"dealClosure\": true, \"dealType\": \"purchase\", \"confidence\": 0.95}\n```";
        let signal = parse_signal(text).unwrap();
        assert_eq!(signal.kind(), Some(DealKind::Purchase));
    }

    #[test]
    fn parse_signal_clamps_overconfident_verdicts() {
        let signal = parse_signal(
            r#"{"dealClosure": true, "dealType": "rental", "confidence": 3.5}"#,
        )
        .unwrap();
        assert_eq!(signal.confidence(), 1.0);
    }

    #[test]
    fn parse_signal_rejects_garbage() {
        let result = parse_signal("the client seems interested");
        assert!(matches!(result, Err(InferenceError::Parse(_))));
    }

    #[test]
    fn parse_signal_missing_confidence_defaults_to_zero() {
        let signal =
            parse_signal(r#"{"dealClosure": true, "dealType": "viewing"}"#).unwrap();
        assert_eq!(signal.confidence(), 0.0);
    }

    #[test]
    fn error_message_prefers_the_api_detail() {
        let body = r#"{"error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}}"#;
        assert_eq!(error_message(body), "The model is overloaded.");
        assert_eq!(error_message("plain failure"), "plain failure");
    }
}
