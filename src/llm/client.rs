//! LLM client implementation.
//!
//! Talks to any OpenAI-compatible chat-completion endpoint. Jobs wrap
//! `complete` in their own timeout; the client itself only handles
//! transport and response extraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::{Error, Result};

/// A single-turn completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// LLM client trait for abstraction; jobs and tests depend on this, not on
/// a concrete provider.
#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// HTTP client for an OpenAI-compatible chat API.
#[derive(Clone)]
pub struct HttpLlmClient {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl HttpLlmClient {
    /// Build from settings (endpoint, model, key).
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.llm_api_key.clone(),
            base_url: settings.llm_base_url.trim_end_matches('/').to_string(),
            model: settings.llm_model.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Create with an explicit endpoint (for tests or alternate deployments).
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }
}

// OpenAI-compatible API structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[async_trait]
impl LLMClient for HttpLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = request.system {
            messages.push(Message {
                role: "system".to_string(),
                content: system,
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: request.prompt,
        });

        let chat_request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&chat_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::Llm(format!("Provider error ({status}): {error_text}")));
        }

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Failed to parse response: {e}")))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Llm("No choices in response".to_string()))?
            .message
            .content;

        Ok(content)
    }
}
