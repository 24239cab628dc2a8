use std::sync::Arc;

use crate::config::Config;
use crate::export::renderer::PdfRenderer;
use crate::llm_client::LlmClient;
use crate::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    pub config: Config,
    /// Pluggable limiter. Default: in-memory FixedWindowLimiter (single instance).
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Pluggable renderer. Default: headless Chromium.
    pub pdf_renderer: Arc<dyn PdfRenderer>,
}
