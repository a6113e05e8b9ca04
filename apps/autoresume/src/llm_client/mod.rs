/// LLM Client — the single point of entry for all Gemini API calls in autoresume.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Everything else talks to the `TextGenerator` trait so the pipeline can be driven
/// by a scripted generator in tests.
///
/// Calls are paced: consecutive requests are spaced by `call_spacing` to stay under
/// the free-tier rate limit.
use std::future::Future;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub mod prompts;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// Default model. Override with GEMINI_MODEL.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
const MAX_OUTPUT_TOKENS: u32 = 8192;
/// Retries after the first attempt.
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Whether the model is asked for a JSON document or free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

/// The seam between the pipeline and the model backend.
///
/// Carried in `AppState` as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system: &str,
        format: ResponseFormat,
    ) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: SystemInstruction<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl LlmResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The Gemini-backed `TextGenerator` used outside of tests.
/// Wraps `generateContent` with retry, backoff, and call pacing.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    call_spacing: Duration,
    last_call: Arc<Mutex<Option<Instant>>>,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        call_spacing: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            call_spacing,
            last_call: Arc::new(Mutex::new(None)),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    /// Makes a raw call to the Gemini API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(
        &self,
        prompt: &str,
        system: &str,
        format: ResponseFormat,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: SystemInstruction {
                parts: vec![Part { text: system }],
            },
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: match format {
                    ResponseFormat::Json => Some("application/json"),
                    ResponseFormat::Text => None,
                },
            },
        };

        // Held for the whole call so concurrent callers queue behind the pacing gate.
        let mut last_call = self.last_call.lock().await;
        wait_for_spacing(*last_call, self.call_spacing).await;

        let result = retry_with_backoff(|| self.send_once(&request_body)).await;
        *last_call = Some(Instant::now());
        result
    }

    /// One HTTP round trip, classified for the retry loop.
    async fn send_once(&self, request_body: &GenerateContentRequest<'_>) -> Attempt<LlmResponse> {
        let response = match self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(request_body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Attempt::Retry(LlmError::Http(e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            let error = LlmError::Api {
                status: status.as_u16(),
                message,
            };
            if is_retryable(status) {
                warn!("LLM API returned {status}");
                return Attempt::Retry(error);
            }
            return Attempt::Fail(error);
        }

        match response.json::<LlmResponse>().await {
            Ok(llm_response) => {
                if let Some(usage) = &llm_response.usage_metadata {
                    debug!(
                        "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                        usage.prompt_token_count, usage.candidates_token_count
                    );
                }
                Attempt::Done(llm_response)
            }
            Err(e) => Attempt::Fail(LlmError::Http(e)),
        }
    }
}

/// Result of a single request attempt.
enum Attempt<T> {
    Done(T),
    /// Transport error, 429, or 5xx.
    Retry(LlmError),
    Fail(LlmError),
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Delay before the `retry`-th retry (1-based): 1s, 2s, 4s.
fn backoff_delay(retry: u32) -> Duration {
    Duration::from_secs(1 << (retry - 1))
}

/// Sleeps until `spacing` has passed since `previous`.
async fn wait_for_spacing(previous: Option<Instant>, spacing: Duration) {
    let Some(previous) = previous else {
        return;
    };
    let elapsed = previous.elapsed();
    if elapsed < spacing {
        let wait = spacing - elapsed;
        info!("Pausing {}s for API rate limits...", wait.as_secs_f32().ceil());
        tokio::time::sleep(wait).await;
    }
}

/// Runs `attempt` once, then up to `MAX_RETRIES` more times with exponential backoff
/// while it asks to be retried.
async fn retry_with_backoff<T, F, Fut>(mut attempt: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut last_error: Option<LlmError> = None;

    for retry in 0..=MAX_RETRIES {
        if retry > 0 {
            let delay = backoff_delay(retry);
            warn!(
                "LLM call attempt {} failed, retrying after {}ms...",
                retry,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        match attempt().await {
            Attempt::Done(value) => return Ok(value),
            Attempt::Fail(error) => return Err(error),
            Attempt::Retry(error) => last_error = Some(error),
        }
    }

    Err(match last_error {
        Some(LlmError::Api { status: 429, .. }) | None => LlmError::RateLimited {
            retries: MAX_RETRIES,
        },
        Some(error) => error,
    })
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(
        &self,
        prompt: &str,
        system: &str,
        format: ResponseFormat,
    ) -> Result<String, LlmError> {
        let response = self.call(prompt, system, format).await?;
        if let Some(reason) = response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            if reason != "STOP" {
                warn!("Gemini finished with reason {reason}; output may be truncated");
            }
        }
        response.text().ok_or(LlmError::EmptyContent)
    }
}

/// Calls the generator in JSON mode and deserializes the reply.
/// The prompt must instruct the model to return a JSON object.
pub async fn call_json<T: DeserializeOwned>(
    llm: &dyn TextGenerator,
    prompt: &str,
    system: &str,
) -> Result<T, LlmError> {
    let text = llm.generate(prompt, system, ResponseFormat::Json).await?;
    parse_json_lenient(&text).map_err(LlmError::Parse)
}

/// Parses model output as JSON, tolerating code fences and surrounding prose.
///
/// Tries the text as-is, then with fences stripped, then the outermost `{...}` span.
pub fn parse_json_lenient<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let first_err = match serde_json::from_str(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Ok(value) = serde_json::from_str(strip_json_fences(text)) {
        return Ok(value);
    }

    static OBJECT_SPAN: OnceLock<Regex> = OnceLock::new();
    let span = OBJECT_SPAN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));
    match span.find(text) {
        Some(m) => serde_json::from_str(m.as_str()),
        None => Err(first_err),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_lenient_parse_recovers_object_inside_prose() {
        let input = "Sure! Here is the analysis:\n{\"a\": {\"b\": 1}}\nLet me know.";
        let value: Value = parse_json_lenient(input).unwrap();
        assert_eq!(value["a"]["b"], 1);
    }

    #[test]
    fn test_lenient_parse_fenced() {
        let value: Value = parse_json_lenient("```json\n{\"x\": true}\n```").unwrap();
        assert_eq!(value["x"], true);
    }

    #[test]
    fn test_lenient_parse_fails_without_object() {
        let result: Result<Value, _> = parse_json_lenient("no json here");
        assert!(result.is_err());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Hello, "}, {"text": "world"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 2}
        }"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello, world"));
        assert_eq!(response.usage_metadata.unwrap().prompt_token_count, 10);
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: LlmResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_request_serializes_json_mime_type() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hi" }],
            }],
            system_instruction: SystemInstruction {
                parts: vec![Part { text: "sys" }],
            },
            generation_config: GenerationConfig {
                max_output_tokens: 10,
                response_mime_type: Some("application/json"),
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
    }

    #[test]
    fn test_text_request_omits_mime_type() {
        let config = GenerationConfig {
            max_output_tokens: 10,
            response_mime_type: None,
        };
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("responseMimeType").is_none());
    }

    #[test]
    fn test_endpoint_uses_model_and_trims_base() {
        let client = LlmClient::new(
            "key".to_string(),
            "http://localhost:9999/".to_string(),
            "gemini-test".to_string(),
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
        assert_eq!(client.model(), "gemini-test");
    }

    fn api_error(status: u16) -> LlmError {
        LlmError::Api {
            status,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_backoff_schedule() {
        let delays: Vec<u64> = (1..=MAX_RETRIES).map(|r| backoff_delay(r).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spacing_waits_out_the_remainder() {
        let previous = Instant::now();
        tokio::time::advance(Duration::from_secs(4)).await;

        let before = Instant::now();
        wait_for_spacing(Some(previous), Duration::from_secs(10)).await;
        assert_eq!(before.elapsed().as_secs(), 6);
        assert!(previous.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spacing_skips_first_and_stale_calls() {
        let start = Instant::now();
        wait_for_spacing(None, Duration::from_secs(10)).await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        tokio::time::advance(Duration::from_secs(30)).await;
        let before = Instant::now();
        wait_for_spacing(Some(start), Duration::from_secs(10)).await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_backs_off_then_succeeds() {
        let start = Instant::now();
        let mut calls = 0u32;
        let result = retry_with_backoff(|| {
            calls += 1;
            let n = calls;
            async move {
                if n < 3 {
                    Attempt::Retry(api_error(503))
                } else {
                    Attempt::Done(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        // 1s + 2s
        assert_eq!(start.elapsed().as_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_max_retries_on_429() {
        let start = Instant::now();
        let mut calls = 0u32;
        let result: Result<(), _> = retry_with_backoff(|| {
            calls += 1;
            async { Attempt::Retry(api_error(429)) }
        })
        .await;

        assert!(matches!(result, Err(LlmError::RateLimited { retries: 3 })));
        assert_eq!(calls, MAX_RETRIES + 1);
        assert_eq!(start.elapsed().as_secs(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_keeps_last_server_error() {
        let result: Result<(), _> =
            retry_with_backoff(|| async { Attempt::Retry(api_error(500)) }).await;
        assert!(matches!(result, Err(LlmError::Api { status: 500, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_not_retried() {
        let start = Instant::now();
        let mut calls = 0u32;
        let result: Result<(), _> = retry_with_backoff(|| {
            calls += 1;
            async { Attempt::Fail(api_error(400)) }
        })
        .await;

        assert!(matches!(result, Err(LlmError::Api { status: 400, .. })));
        assert_eq!(calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
