//! Structured extractor clients
//!
//! Defines the extractor trait and clients for an Ollama endpoint and an
//! OpenAI-compatible chat completions endpoint.

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};

use super::error::ExternalModelError;
use super::prompt::measurement_schema;
use super::types::DrawingMeasurement;

/// Structured extractor trait
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Provider name for logs and health output
    fn name(&self) -> &'static str;

    /// Ask the model for the measurement shown in a PNG crop
    async fn extract(
        &self,
        image_png: &[u8],
        instruction: &str,
    ) -> Result<DrawingMeasurement, ExternalModelError>;
}

/// Ollama multimodal model
pub struct OllamaExtractor {
    client: reqwest::Client,
    /// Ollama API URL
    base_url: String,
    /// Model name (e.g., "llava", "qwen2.5vl")
    model: String,
}

impl OllamaExtractor {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn request_body(&self, image_png: &[u8], instruction: &str) -> Value {
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image_png);
        json!({
            "model": self.model,
            "prompt": instruction,
            "images": [image_base64],
            "format": measurement_schema(),
            "stream": false,
            "options": { "temperature": 0 }
        })
    }
}

#[async_trait]
impl StructuredExtractor for OllamaExtractor {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn extract(
        &self,
        image_png: &[u8],
        instruction: &str,
    ) -> Result<DrawingMeasurement, ExternalModelError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = self.request_body(image_png, instruction);
        let result = post_json(&self.client, self.name(), &url, None, &body).await?;

        let text = result["response"]
            .as_str()
            .ok_or_else(|| ExternalModelError::Decode("response field missing".to_string()))?;

        decode_measurement(text)
    }
}

/// OpenAI-compatible chat completions endpoint
pub struct OpenAiExtractor {
    client: reqwest::Client,
    /// Base URL without the `/v1` suffix
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiExtractor {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    fn request_body(&self, image_png: &[u8], instruction: &str) -> Value {
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image_png);
        json!({
            "model": self.model,
            "temperature": 0,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": instruction },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/png;base64,{}", image_base64) }
                    }
                ]
            }],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "drawing_measurement",
                    "schema": measurement_schema()
                }
            }
        })
    }
}

#[async_trait]
impl StructuredExtractor for OpenAiExtractor {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn extract(
        &self,
        image_png: &[u8],
        instruction: &str,
    ) -> Result<DrawingMeasurement, ExternalModelError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request_body(image_png, instruction);
        let result = post_json(&self.client, self.name(), &url, self.api_key.as_deref(), &body).await?;

        let text = result["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ExternalModelError::Decode("choices[0].message.content missing".to_string()))?;

        decode_measurement(text)
    }
}

async fn post_json(
    client: &reqwest::Client,
    provider: &'static str,
    url: &str,
    bearer: Option<&str>,
    body: &Value,
) -> Result<Value, ExternalModelError> {
    let mut request = client.post(url).json(body);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let response = request.send().await.map_err(|e| ExternalModelError::Transport {
        provider,
        message: e.to_string(),
    })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ExternalModelError::Status {
            provider,
            status,
            body: truncate(&body, 300),
        });
    }

    response
        .json()
        .await
        .map_err(|e| ExternalModelError::Decode(format!("Failed to parse response: {}", e)))
}

/// Parse and validate the model's JSON answer
///
/// Tolerates a surrounding markdown code fence.
pub fn decode_measurement(text: &str) -> Result<DrawingMeasurement, ExternalModelError> {
    let measurement: DrawingMeasurement = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ExternalModelError::Decode(e.to_string()))?;
    measurement.validate()?;
    Ok(measurement)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Mock extractor for testing
#[cfg(test)]
pub(crate) struct MockExtractor {
    pub response: Option<DrawingMeasurement>,
    pub delay: Option<std::time::Duration>,
}

#[cfg(test)]
impl MockExtractor {
    pub fn returning(measurement: DrawingMeasurement) -> Self {
        Self {
            response: Some(measurement),
            delay: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            delay: None,
        }
    }

    pub fn slow(delay: std::time::Duration) -> Self {
        Self {
            response: None,
            delay: Some(delay),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl StructuredExtractor for MockExtractor {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn extract(
        &self,
        _image_png: &[u8],
        _instruction: &str,
    ) -> Result<DrawingMeasurement, ExternalModelError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone().ok_or(ExternalModelError::Transport {
            provider: "mock",
            message: "connection refused".to_string(),
        })
    }
}
