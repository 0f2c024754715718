use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::prompts;
use super::{ensure_success, http_client, map_send_error, AiAdapter, AiError, AiResult};
use crate::config::AiConfig;
use crate::models::analysis::DocumentAnalysis;
use crate::utils::text_extractor::{self, MAX_SOURCE_CHARS};

const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.3;

/// Groq's OpenAI-compatible chat-completions API.
pub struct GroqClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    pub fn new(config: &AiConfig) -> AiResult<Self> {
        Ok(Self {
            client: http_client(config.timeout)?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    async fn chat(&self, system: Option<&str>, prompt: &str, json_mode: bool) -> AiResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::ProviderUnavailable("GROQ_API_KEY is not configured".to_string()))?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: prompt });

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        info!(
            "Groq | request model={} prompt_chars={} timeout={}s",
            self.model,
            prompt.chars().count(),
            self.timeout.as_secs()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("Groq", e, self.timeout))?;

        let response = ensure_success("Groq", response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::MalformedResponse(format!("Invalid Groq response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AiError::MalformedResponse("Groq returned no completion".to_string()))
    }
}

#[async_trait]
impl AiAdapter for GroqClient {
    fn name(&self) -> &'static str {
        "groq"
    }

    async fn extract_content(&self, path: &Path, type_hint: &str) -> AiResult<String> {
        let data = tokio::fs::read(path).await?;
        let filename = path.to_string_lossy().into_owned();
        let text = tokio::task::spawn_blocking(move || text_extractor::extract_text(&filename, &data))
            .await
            .map_err(|e| AiError::Api(format!("Text extraction task failed: {}", e)))?;

        let content = text_extractor::truncate_chars(&text, MAX_SOURCE_CHARS);
        self.chat(None, &prompts::extract_prompt(type_hint, content), false)
            .await
    }

    async fn generate_srs(&self, source_text: &str) -> AiResult<String> {
        let raw = self
            .chat(
                Some(prompts::SYSTEM_ANALYST_ROLE),
                &prompts::srs_prompt(source_text),
                false,
            )
            .await?;
        Ok(prompts::clean_generated_document(&raw))
    }

    async fn analyze_document(&self, text: &str) -> AiResult<DocumentAnalysis> {
        let raw = self.chat(None, &prompts::analysis_prompt(text), true).await?;
        prompts::parse_analysis(&raw)
    }
}
