//! Text-generation backends reachable over HTTP

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Debug;
use tracing::debug;

use crate::core::errors::{Result, TranslationError};
use crate::core::models::{BackendConfig, BackendKind, GenerationParams};

/// A service that turns a prompt into text
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Protocol family
    fn kind(&self) -> BackendKind;

    /// Model identifier sent to the service
    fn model(&self) -> &str;

    /// Run one generation round trip
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}

/// Build the backend described by `config`, sharing `client`
pub fn from_config(config: &BackendConfig, client: reqwest::Client) -> Result<Box<dyn Backend>> {
    let endpoint = config.endpoint.trim_end_matches('/').to_string();
    let backend: Box<dyn Backend> = match config.kind {
        BackendKind::Ollama => Box::new(OllamaBackend::new(client, endpoint, config.model.clone())),
        BackendKind::OpenAi => Box::new(OpenAiBackend::new(
            client,
            endpoint,
            config.model.clone(),
            require_key(config)?,
        )),
        BackendKind::Gemini => Box::new(GeminiBackend::new(
            client,
            endpoint,
            config.model.clone(),
            require_key(config)?,
        )),
    };
    Ok(backend)
}

fn require_key(config: &BackendConfig) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| TranslationError::ConfigError {
            message: format!("{} backend for {} needs an API key", config.kind, config.model),
        })
}

/// Send a JSON request and decode a JSON reply, mapping failures onto
/// [`TranslationError`]
async fn post_json(request: reqwest::RequestBuilder, body: &serde_json::Value) -> Result<serde_json::Value> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| TranslationError::NetworkError {
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(TranslationError::ApiError {
            status: status.as_u16(),
            message: error_text,
        });
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| TranslationError::InvalidResponseError {
            message: e.to_string(),
        })
}

fn decode<T: for<'de> Deserialize<'de>>(json: serde_json::Value) -> Result<T> {
    serde_json::from_value(json).map_err(|e| TranslationError::InvalidResponseError {
        message: e.to_string(),
    })
}

/// Local Ollama server, `/api/generate`
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let mut options = serde_json::Map::new();
        if let Some(temperature) = params.temperature {
            options.insert("temperature".to_string(), serde_json::json!(temperature));
        }
        if let Some(max_tokens) = params.max_tokens {
            options.insert("num_predict".to_string(), serde_json::json!(max_tokens));
        }

        let mut body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });
        if !options.is_empty() {
            body["options"] = serde_json::Value::Object(options);
        }

        debug!("Ollama generate: model={} prompt_chars={}", self.model, prompt.chars().count());
        let url = format!("{}/api/generate", self.endpoint);
        let json = post_json(self.client.post(&url), &body).await?;
        let parsed: OllamaResponse = decode(json)?;
        Ok(parsed.response)
    }
}

/// OpenAI compatible `/v1/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiBackend {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        if let Some(temperature) = params.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = params.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!("OpenAI chat completion: model={}", self.model);
        let url = format!("{}/v1/chat/completions", self.endpoint);
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        let json = post_json(request, &body).await?;
        let parsed: ChatCompletion = decode(json)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TranslationError::InvalidResponseError {
                message: "No content in response".to_string(),
            })
    }
}

/// Google Gemini `generateContent`
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

impl GeminiBackend {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let mut generation_config = serde_json::Map::new();
        if let Some(temperature) = params.temperature {
            generation_config.insert("temperature".to_string(), serde_json::json!(temperature));
        }
        if let Some(max_tokens) = params.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), serde_json::json!(max_tokens));
        }

        let mut body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        if !generation_config.is_empty() {
            body["generationConfig"] = serde_json::Value::Object(generation_config);
        }

        debug!("Gemini generateContent: model={}", self.model);
        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);
        let request = self.client.post(&url).query(&[("key", self.api_key.as_str())]);
        let json = post_json(request, &body).await?;
        let parsed: GeminiResponse = decode(json)?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(TranslationError::InvalidResponseError {
                message: "No candidates in response".to_string(),
            });
        }
        Ok(text)
    }
}
