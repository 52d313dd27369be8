/// LLM client: the only place that talks to the Anthropic Messages API.
///
/// Text generation goes through `generation::LlmTextGenerator`, which owns the
/// prompts; this module only knows how to send one prompt and read back text
/// or JSON.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Pinned so generated resume text does not drift between deployments.
pub const MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

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

/// One system + user exchange.
#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
}

impl<'a> Prompt<'a> {
    pub fn new(system: &'a str, user: &'a str) -> Self {
        Self {
            system,
            user,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Text of the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {e}");
                Client::new()
            });
        Self { client, api_key }
    }

    /// Sends one prompt. Retries 429 and 5xx answers with exponential backoff.
    pub async fn call(&self, prompt: Prompt<'_>) -> Result<LlmResponse, LlmError> {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: prompt.max_tokens,
            system: prompt.system,
            messages: [Message {
                role: "user",
                content: prompt.user,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!("LLM API returned {status}: {message}");
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let raw = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
                    .map(|e| e.error.message)
                    .unwrap_or(raw);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: LlmResponse = response.json().await?;
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                parsed.usage.input_tokens, parsed.usage.output_tokens
            );
            return Ok(parsed);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Plain-text answer, trimmed. Blank answers are `EmptyContent`.
    pub async fn call_text(&self, prompt: Prompt<'_>) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;
        response
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    /// JSON answer deserialized into `T`. The prompt must ask for JSON only.
    pub async fn call_json<T: DeserializeOwned>(&self, prompt: Prompt<'_>) -> Result<T, LlmError> {
        let response = self.call(prompt).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        serde_json::from_str(strip_json_fences(text)).map_err(LlmError::Parse)
    }
}

/// Strips ```json ... ``` or ``` ... ``` fences from model output.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let rest = rest.trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}
