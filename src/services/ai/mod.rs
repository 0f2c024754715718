//! Generative-AI adapter.
//!
//! One logical capability with one implementation per vendor. The provider is
//! chosen once at startup from [`AiConfig`]; the pipeline only ever sees
//! `Arc<dyn AiAdapter>`.

pub mod gemini;
pub mod groq;
pub mod prompts;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::{AiConfig, AiProviderKind};
use crate::models::analysis::DocumentAnalysis;

pub use gemini::GeminiClient;
pub use groq::GroqClient;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("{0}")]
    MalformedResponse(String),

    #[error("{0}")]
    ProviderUnavailable(String),

    #[error("failed to read source file: {0}")]
    Io(#[from] std::io::Error),
}

pub type AiResult<T> = Result<T, AiError>;

#[async_trait]
pub trait AiAdapter: Send + Sync {
    /// Short provider label used in logs.
    fn name(&self) -> &'static str;

    /// Reads the file at `path` and returns a textual summary of it.
    async fn extract_content(&self, path: &Path, type_hint: &str) -> AiResult<String>;

    /// Turns source text into an SRS draft body (no chat scaffolding).
    async fn generate_srs(&self, source_text: &str) -> AiResult<String>;

    /// Asks for a JSON summary and parses it.
    async fn analyze_document(&self, text: &str) -> AiResult<DocumentAnalysis>;
}

pub fn build_adapter(config: &AiConfig) -> AiResult<Arc<dyn AiAdapter>> {
    if config.api_key.is_none() {
        warn!(
            "No API key configured for {:?} - AI calls will fail with ProviderUnavailable",
            config.provider
        );
    }

    let adapter: Arc<dyn AiAdapter> = match config.provider {
        AiProviderKind::Groq => Arc::new(GroqClient::new(config)?),
        AiProviderKind::Gemini => Arc::new(GeminiClient::new(config)?),
    };
    Ok(adapter)
}

pub(crate) fn http_client(timeout: Duration) -> AiResult<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(AiError::Request)
}

pub(crate) fn map_send_error(provider: &str, e: reqwest::Error, timeout: Duration) -> AiError {
    if e.is_timeout() {
        error!("{} request timed out after {}s", provider, timeout.as_secs());
        AiError::Api(format!(
            "Request timed out after {} seconds",
            timeout.as_secs()
        ))
    } else if e.is_connect() {
        error!("Failed to connect to {}: {}", provider, e);
        AiError::Api(format!("Connection failed: {}", e))
    } else {
        error!("{} request failed: {}", provider, e);
        AiError::Request(e)
    }
}

/// Turns a non-2xx response into an [`AiError::Api`] carrying the body text.
pub(crate) async fn ensure_success(provider: &str, response: reqwest::Response) -> AiResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    error!("{} API error: {} - {}", provider, status, error_text);
    Err(AiError::Api(format!("API returned {}: {}", status, error_text)))
}
