//! Ollama `/api/generate` client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::client::{CompletionClient, LlmConfig, DEFAULT_OLLAMA_HOST};
use crate::LlmError;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http = builder
            .build()
            .map_err(|e| LlmError::Network(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            url: format!("{}/api/generate", normalize_host(&config.base_url)),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else {
            LlmError::Network(format!(
                "failed to reach ollama at {} (is it running?): {err}",
                self.url
            ))
        }
    }
}

/// Accepts `host:port`, bare URLs and trailing slashes.
pub(crate) fn normalize_host(host: &str) -> String {
    let mut host = host.trim().to_string();
    if host.is_empty() {
        host = DEFAULT_OLLAMA_HOST.to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("http://{host}");
    }
    host.trim_end_matches('/').to_string()
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        tracing::debug!(url = %self.url, model = %self.model, "sending completion request");
        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.transport_error(e))?;
        let parsed: GenerateResponse = serde_json::from_slice(&bytes)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(parsed.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
