use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::prompts;
use super::{ensure_success, http_client, map_send_error, AiAdapter, AiError, AiResult};
use crate::config::AiConfig;
use crate::models::analysis::DocumentAnalysis;
use crate::utils::text_extractor::{self, MAX_SOURCE_CHARS};

/// Google Gemini `generateContent` API.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> AiResult<Self> {
        Ok(Self {
            client: http_client(config.timeout)?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    fn endpoint(&self, api_key: &str) -> AiResult<Url> {
        let raw = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        Url::parse_with_params(&raw, &[("key", api_key)])
            .map_err(|e| AiError::ProviderUnavailable(format!("Invalid Gemini endpoint: {}", e)))
    }

    async fn generate(&self, parts: Vec<Part>) -> AiResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::ProviderUnavailable("GEMINI_API_KEY is not configured".to_string()))?;

        let request = GenerateRequest {
            contents: vec![Content { parts }],
        };

        info!(
            "Gemini | request model={} timeout={}s",
            self.model,
            self.timeout.as_secs()
        );

        let response = self
            .client
            .post(self.endpoint(api_key)?)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("Gemini", e, self.timeout))?;

        let response = ensure_success("Gemini", response).await?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AiError::MalformedResponse(format!("Invalid Gemini response: {}", e)))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AiError::MalformedResponse("No response from Gemini".to_string()));
        }
        Ok(text)
    }

    async fn generate_text(&self, prompt: String) -> AiResult<String> {
        self.generate(vec![Part::Text { text: prompt }]).await
    }
}

#[async_trait]
impl AiAdapter for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn extract_content(&self, path: &Path, type_hint: &str) -> AiResult<String> {
        let data = tokio::fs::read(path).await?;
        let filename = path.to_string_lossy().into_owned();

        // Gemini reads PDFs natively, so send the file itself instead of extracted text.
        if text_extractor::is_pdf(&filename) {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&data);
            let parts = vec![
                Part::Text {
                    text: prompts::extract_prompt(type_hint, "(attached PDF)"),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: "application/pdf",
                        data: encoded,
                    },
                },
            ];
            return self.generate(parts).await;
        }

        let text = String::from_utf8_lossy(&data);
        let content = text_extractor::truncate_chars(&text, MAX_SOURCE_CHARS);
        self.generate_text(prompts::extract_prompt(type_hint, content))
            .await
    }

    async fn generate_srs(&self, source_text: &str) -> AiResult<String> {
        // No system role on this endpoint; the role goes in front of the prompt.
        let prompt = format!(
            "{}\n\n{}",
            prompts::SYSTEM_ANALYST_ROLE,
            prompts::srs_prompt(source_text)
        );
        let raw = self.generate_text(prompt).await?;
        Ok(prompts::clean_generated_document(&raw))
    }

    async fn analyze_document(&self, text: &str) -> AiResult<DocumentAnalysis> {
        let raw = self.generate_text(prompts::analysis_prompt(text)).await?;
        prompts::parse_analysis(&raw)
    }
}
