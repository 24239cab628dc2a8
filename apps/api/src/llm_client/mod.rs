/// LLM Client: the single point of entry for every generative-AI call in the service.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// All document generation MUST go through this module.
///
/// Each call makes exactly one outbound request. There is no transport retry here;
/// callers degrade to fallback content instead.
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::LlmConfig;

pub mod normalize;
pub mod prompts;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Failure modes of a generation attempt.
///
/// Every variant is recoverable at the HTTP boundary: the generation endpoint turns
/// all of them into a fallback payload.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation is not configured: {0}")]
    Configuration(String),

    #[error("Upstream provider error: {0}")]
    Upstream(String),

    #[error("Model output is not valid JSON for the expected shape: {0}")]
    Parse(String),

    #[error("Model output broke the content contract: {0}")]
    Contract(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),
}

impl GenerationError {
    /// True when the same request might succeed if sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Upstream(_) | GenerationError::Timeout(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Configuration(_) => "configuration",
            GenerationError::Upstream(_) => "upstream",
            GenerationError::Parse(_) => "parse",
            GenerationError::Contract(_) => "contract",
            GenerationError::Timeout(_) => "timeout",
        }
    }
}

/// Supported generative-AI providers, selected with `LLM_PROVIDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAi,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-sonnet-4-5",
            Provider::OpenAi => "gpt-4o-mini",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::OpenAi => "https://api.openai.com",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Anthropic => f.write_str("anthropic"),
            Provider::OpenAi => f.write_str("openai"),
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAi),
            other => anyhow::bail!("Unknown LLM_PROVIDER '{other}' (expected 'anthropic' or 'openai')"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic Messages API wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    /// Extracts the text content from the first text block.
    fn text(self) -> Option<String> {
        self.content
            .into_iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI Chat Completions API wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Both providers wrap failures as `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The single LLM client used by every generator.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends one prompt to the configured provider and returns the raw response text.
    ///
    /// The API key is checked before anything touches the network.
    pub async fn complete(&self, prompt: &str, system: &str) -> Result<String, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::Configuration(format!(
                    "no API key configured for provider '{}'",
                    self.config.provider
                ))
            })?;

        match self.config.provider {
            Provider::Anthropic => self.complete_anthropic(api_key, prompt, system).await,
            Provider::OpenAi => self.complete_openai(api_key, prompt, system).await,
        }
    }

    /// Calls the provider and parses the text response as JSON into `T`.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, GenerationError> {
        let text = self.complete(prompt, system).await?;
        normalize::parse_payload(&text)
    }

    async fn complete_anthropic(
        &self,
        api_key: &str,
        prompt: &str,
        system: &str,
    ) -> Result<String, GenerationError> {
        let body = AnthropicRequest {
            model: &self.config.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.endpoint("/v1/messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Upstream(format!("request failed: {e}")))?;

        let response: AnthropicResponse = decode_success(response).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Anthropic call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        response
            .text()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GenerationError::Upstream("provider returned no content".to_string()))
    }

    async fn complete_openai(
        &self,
        api_key: &str,
        prompt: &str,
        system: &str,
    ) -> Result<String, GenerationError> {
        let body = OpenAiRequest {
            model: &self.config.model,
            max_tokens: MAX_TOKENS,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(self.endpoint("/v1/chat/completions"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Upstream(format!("request failed: {e}")))?;

        let response: OpenAiResponse = decode_success(response).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "OpenAI call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GenerationError::Upstream("provider returned no content".to_string()))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

/// Bounds a whole generation (including any regeneration) by a wall-clock ceiling.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, GenerationError>
where
    F: std::future::Future<Output = Result<T, GenerationError>>,
{
    tokio::time::timeout(deadline, fut)
        .await
        .unwrap_or_else(|_| Err(GenerationError::Timeout(deadline)))
}

/// Maps a non-2xx status to `Upstream` and decodes the provider envelope otherwise.
/// An undecodable envelope is the provider's fault, not the model's, so it is also `Upstream`.
async fn decode_success<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GenerationError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(GenerationError::Upstream(format!(
            "provider returned {status}: {message}"
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GenerationError::Upstream(format!("unreadable provider response: {e}")))
}
