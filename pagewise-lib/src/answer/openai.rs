use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::answer::{ChatMessage, LanguageModel};
use crate::config::LlmConfig;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider exposing `/v1/chat/completions`: OpenAI, Ollama,
/// vLLM, LiteLLM, etc.
pub struct OpenAiModel {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("base_url", &self.base_url())
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiModel {
    /// Create a client from configuration.
    ///
    /// The API key falls back to `OPENAI_API_KEY`. It is only required when
    /// talking to the default OpenAI endpoint.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());

        if api_key.is_none() && config.base_url.is_none() {
            return Err(Error::InvalidConfig(format!(
                "LLM API key not found: set llm.api_key in pagewise.toml or {API_KEY_ENV}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Synthesis(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    fn build_request<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url());
        debug!(%url, model = %self.config.model, "sending chat completion");

        let mut request = self.client.post(&url).json(&self.build_request(messages));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".into());
            return Err(Error::Synthesis(format!("LLM API error {status}: {body}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Synthesis(format!("failed to parse response: {e}")))?;

        extract_content(body)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn extract_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::Synthesis("response contained no message content".into()))
}
