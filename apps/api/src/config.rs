use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::Provider;

/// Application configuration loaded from environment variables.
///
/// Provider API keys are optional here: a missing key is reported per request as a
/// configuration error so the generation endpoints can still degrade to fallback content.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub generation_timeout: Duration,
    pub rate_limit_window: Duration,
    pub rate_limit_max_requests: u32,
    /// Key rate limits on `X-Forwarded-For` / `X-Real-IP` instead of the TCP peer.
    pub trust_proxy_headers: bool,
    pub chrome_bin: String,
    /// Extra browser flags, placed before the generated ones.
    pub chrome_extra_args: Vec<String>,
    pub pdf_render_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

/// Everything the generation client needs to reach a provider.
#[derive(Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

// Keep the key out of logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let provider: Provider = optional_env("LLM_PROVIDER")
            .unwrap_or_else(|| "anthropic".to_string())
            .parse()?;

        let api_key = match provider {
            Provider::Anthropic => optional_env("ANTHROPIC_API_KEY"),
            Provider::OpenAi => optional_env("OPENAI_API_KEY"),
        };

        let llm = LlmConfig {
            provider,
            api_key,
            model: optional_env("LLM_MODEL")
                .unwrap_or_else(|| provider.default_model().to_string()),
            base_url: optional_env("LLM_BASE_URL")
                .unwrap_or_else(|| provider.default_base_url().to_string()),
        };

        let rate_limit_max_requests: u32 = parse_env("RATE_LIMIT_MAX_REQUESTS", 5)?;
        if rate_limit_max_requests == 0 {
            bail!("RATE_LIMIT_MAX_REQUESTS must be at least 1");
        }

        Ok(Config {
            llm,
            generation_timeout: Duration::from_secs(parse_env("GENERATION_TIMEOUT_SECS", 25)?),
            rate_limit_window: Duration::from_secs(parse_env("RATE_LIMIT_WINDOW_SECS", 60)?),
            rate_limit_max_requests,
            trust_proxy_headers: parse_env("TRUST_PROXY_HEADERS", false)?,
            chrome_bin: optional_env("CHROME_BIN").unwrap_or_else(|| "chromium".to_string()),
            chrome_extra_args: optional_env("CHROME_EXTRA_ARGS")
                .map(|v| v.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            pdf_render_timeout: Duration::from_secs(parse_env("PDF_RENDER_TIMEOUT_SECS", 30)?),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads a variable, treating blank values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
