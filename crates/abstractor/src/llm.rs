//! Client for the Google Gemini generative API.
//!
//! The client performs exactly one request/response exchange per [`SummaryClient::call`] and
//! turns whatever happened into either the generated text or a [`CallError`] classification.
//! It never retries and never touches the record store; both are left to the layers above.
//!
//! | What the service did                           | Result                         |
//! |------------------------------------------------|--------------------------------|
//! | Answered with text                             | `Ok(text)`, whitespace trimmed |
//! | Flagged the prompt or the answer as unsafe     | [`CallError::Blocked`]         |
//! | `429` / `RESOURCE_EXHAUSTED`                   | [`CallError::QuotaExceeded`]   |
//! | `400` / `INVALID_ARGUMENT`                     | [`CallError::InvalidInput`]    |
//! | Anything else, including transport failures    | [`CallError::Transient`]       |
//!
//! # Examples
//!
//! ```no_run
//! use abstractor::{
//!   llm::{GeminiClient, SummaryClient},
//!   prompt::Prompt,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new("my-api-key").with_model("gemini-1.5-flash");
//!
//! let summary = client.call(&Prompt::from("What is the capital of France?")).await?;
//! println!("Response: {}", summary);
//! # Ok(())
//! # }
//! ```

use reqwest::StatusCode;

use super::*;
use crate::prompt::Prompt;

/// Result of a single generative call.
pub type CallResult = core::result::Result<String, CallError>;

/// Host serving the Gemini REST API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Per-request timeout for the generative API.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Finish reasons that mean the content filter withheld the answer.
const SAFETY_FINISH_REASONS: [&str; 5] =
  ["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

/// Outbound boundary of the pipeline: one prompt in, one classified result out.
#[async_trait]
pub trait SummaryClient: Send + Sync {
  /// Performs one exchange with the service.
  async fn call(&self, prompt: &Prompt) -> CallResult;

  /// Checks that the service is reachable and accepts our credentials.
  async fn probe(&self) -> core::result::Result<(), CallError> {
    self.call(&Prompt::from("test")).await.map(|_| ())
  }
}

/// [`SummaryClient`] speaking the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
  /// Underlying HTTP client
  http:    reqwest::Client,
  /// Base URL the endpoint path is joined onto
  base:    Url,
  /// Model name, e.g. `gemini-1.5-flash`
  model:   String,
  /// API key, sent in the `x-goog-api-key` header
  api_key: String,
}

impl GeminiClient {
  /// Creates a client for the public Gemini API with the [`DEFAULT_MODEL`].
  pub fn new(api_key: impl Into<String>) -> Self {
    let http = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .unwrap_or_else(|_| reqwest::Client::new());

    Self {
      http,
      base: Url::parse(DEFAULT_API_BASE).expect("default API base is a valid URL"),
      model: DEFAULT_MODEL.to_string(),
      api_key: api_key.into(),
    }
  }

  /// Sets the base URL of the service.
  ///
  /// An unparsable host is ignored with a warning and the current base is kept.
  pub fn with_host(mut self, host: &str) -> Self {
    match Url::parse(host) {
      Ok(mut url) => {
        if !url.path().ends_with('/') {
          let path = format!("{}/", url.path());
          url.set_path(&path);
        }
        self.base = url;
      },
      Err(e) => warn!("Ignoring invalid API host {:?}: {}", host, e),
    }
    self
  }

  /// Sets the model to use.
  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model = model.into();
    self
  }

  /// The model requests are sent to.
  pub fn model(&self) -> &str { &self.model }

  /// Full URL of the `generateContent` endpoint for the configured model.
  pub fn endpoint(&self) -> core::result::Result<Url, CallError> {
    self
      .base
      .join(&format!("v1beta/models/{}:generateContent", self.model))
      .map_err(|e| CallError::InvalidInput(format!("Invalid endpoint for {}: {}", self.model, e)))
  }
}

#[async_trait]
impl SummaryClient for GeminiClient {
  async fn call(&self, prompt: &Prompt) -> CallResult {
    if prompt.is_blank() {
      return Err(CallError::InvalidInput(
        "Invalid prompt: prompt must be a non-empty string".to_string(),
      ));
    }

    let url = self.endpoint()?;
    let parts = vec![RequestPart { text: prompt.as_str() }];
    let request = GenerateContentRequest { contents: vec![RequestContent { role: "user", parts }] };

    trace!("POST {} ({} prompt bytes)", url, prompt.as_str().len());
    let response = self
      .http
      .post(url)
      .header("x-goog-api-key", &self.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| CallError::Transient(format!("Request failed: {e}")))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| CallError::Transient(format!("Failed to read response body: {e}")))?;

    if !status.is_success() {
      return Err(classify_status(status, &body));
    }

    let parsed: GenerateContentResponse = serde_json::from_str(&body)
      .map_err(|e| CallError::Transient(format!("Unexpected response from API: {e}")))?;
    parsed.into_text()
  }
}

/// Maps an unsuccessful HTTP status and its error body to a classification.
pub fn classify_status(status: StatusCode, body: &str) -> CallError {
  let detail = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|envelope| envelope.error);
  let api_status = detail.as_ref().and_then(|d| d.status.clone()).unwrap_or_default();
  let message = detail
    .and_then(|d| d.message)
    .filter(|message| !message.is_empty())
    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

  if status == StatusCode::TOO_MANY_REQUESTS || api_status == "RESOURCE_EXHAUSTED" {
    CallError::QuotaExceeded(format!("Rate limit exceeded: {message}"))
  } else if status == StatusCode::BAD_REQUEST || api_status == "INVALID_ARGUMENT" {
    CallError::InvalidInput(format!("Invalid argument error: {message}"))
  } else {
    CallError::Transient(format!("HTTP {}: {}", status.as_u16(), message))
  }
}

/// Body of a `generateContent` request.
#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
  /// Conversation turns; we always send exactly one
  contents: Vec<RequestContent<'a>>,
}

/// One turn of a request.
#[derive(Debug, Serialize)]
struct RequestContent<'a> {
  /// Speaker of the turn
  role:  &'a str,
  /// Text parts of the turn
  parts: Vec<RequestPart<'a>>,
}

/// One text part of a request turn.
#[derive(Debug, Serialize)]
struct RequestPart<'a> {
  /// The prompt text
  text: &'a str,
}

/// Body of a successful `generateContent` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
  /// Generated alternatives; the first one is used
  #[serde(default)]
  pub candidates:      Vec<Candidate>,
  /// Safety verdict on the prompt itself
  #[serde(default)]
  pub prompt_feedback: Option<PromptFeedback>,
}

/// One generated alternative.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
  /// Generated content, absent when the candidate was withheld
  #[serde(default)]
  pub content:       Option<CandidateContent>,
  /// Why generation stopped, e.g. `STOP` or `SAFETY`
  #[serde(default)]
  pub finish_reason: Option<String>,
}

/// Content of a candidate.
#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
  /// Text parts in order
  #[serde(default)]
  pub parts: Vec<ResponsePart>,
}

/// One part of a candidate's content.
#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
  /// Generated text, absent for non-text parts
  #[serde(default)]
  pub text: Option<String>,
}

/// Safety verdict on a prompt.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
  /// Set when the prompt was blocked
  #[serde(default)]
  pub block_reason: Option<String>,
}

impl GenerateContentResponse {
  /// Extracts the generated text, or classifies why there is none.
  pub fn into_text(self) -> CallResult {
    if let Some(reason) = self.prompt_feedback.and_then(|feedback| feedback.block_reason) {
      return Err(CallError::Blocked(format!("Response blocked: {reason}")));
    }

    let candidate = self
      .candidates
      .into_iter()
      .next()
      .ok_or_else(|| CallError::Transient("Response contained no candidates".to_string()))?;

    let text: String = candidate
      .content
      .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
      .unwrap_or_default();
    let text = text.trim();

    if !text.is_empty() {
      return Ok(text.to_string());
    }

    match candidate.finish_reason {
      Some(reason) if SAFETY_FINISH_REASONS.contains(&reason.as_str()) =>
        Err(CallError::Blocked(format!("Response blocked: {reason}"))),
      reason => Err(CallError::Transient(format!(
        "Response contained no text (finish reason: {})",
        reason.as_deref().unwrap_or("none")
      ))),
    }
  }
}

/// Error body returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  /// The error itself
  error: ErrorDetail,
}

/// Details of an API error.
#[derive(Debug, Deserialize)]
struct ErrorDetail {
  /// Human-readable description
  #[serde(default)]
  message: Option<String>,
  /// Canonical status, e.g. `RESOURCE_EXHAUSTED`
  #[serde(default)]
  status:  Option<String>,
}
