use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::application::{ChatClient, WarmUp};
use crate::domain::{render_legacy_prompt, ChatMessage, DomainError};

/// Default target: Ollama running locally on its standard port.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_CHAT_MODEL: &str = "llama3.2";
const CHAT_PATH: &str = "/api/chat";
const GENERATE_PATH: &str = "/api/generate";
/// Large local models can take a while to answer the first request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// HTTP client for the Ollama chat and generate APIs.
///
/// The underlying `reqwest::Client` keeps a connection pool, so instances are
/// meant to be shared through the resource cache rather than rebuilt per call.
pub struct OllamaClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl AsRef<str>, model: impl Into<String>) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DomainError::inference(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            model: model.into(),
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
        })
    }

    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        options: Option<Value>,
    ) -> Result<String, DomainError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options,
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, CHAT_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::inference(format!("OllamaClient: chat request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("OllamaClient: chat returned {}: {}", status, body);
            return Err(DomainError::inference(format!(
                "OllamaClient: chat returned {}",
                status
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            DomainError::inference(format!("OllamaClient: failed to parse chat response: {}", e))
        })?;

        Ok(parsed.message.content)
    }

}

/// Ollama reads a negative `keep_alive` as "never unload".
fn keep_alive_duration(seconds: i64) -> i64 {
    if seconds > 0 {
        seconds
    } else {
        -1
    }
}

#[async_trait]
impl WarmUp for OllamaClient {
    /// One-token chat, enough to get the model loaded into memory.
    async fn warm_up(&self) -> Result<(), DomainError> {
        self.send_chat(
            &[ChatMessage::user("Hi")],
            Some(json!({ "num_predict": 1 })),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, DomainError> {
        self.send_chat(messages, None).await
    }

    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, DomainError> {
        let prompt = render_legacy_prompt(messages);
        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, GENERATE_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                DomainError::inference(format!("OllamaClient: generate request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::inference(format!(
                "OllamaClient: generate returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            DomainError::inference(format!(
                "OllamaClient: failed to parse generate response: {}",
                e
            ))
        })?;

        Ok(parsed.response)
    }

    /// A generate call without a prompt only loads the model and updates
    /// how long it stays resident.
    async fn keep_alive(&self, seconds: i64) -> Result<(), DomainError> {
        let duration = keep_alive_duration(seconds);
        let response = self
            .client
            .post(format!("{}{}", self.base_url, GENERATE_PATH))
            .json(&json!({ "model": self.model, "keep_alive": duration }))
            .send()
            .await
            .map_err(|e| DomainError::inference(format!("OllamaClient: keep-alive failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::inference(format!(
                "OllamaClient: keep-alive returned {}",
                response.status()
            )));
        }

        info!("Model {} keep-alive set to {}s", self.model, duration);
        Ok(())
    }
}
