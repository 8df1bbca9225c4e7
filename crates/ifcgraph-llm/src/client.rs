use async_trait::async_trait;

use crate::LlmError;

pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "llama3.1:latest";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A text completion endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// One non-streamed completion for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    fn model(&self) -> &str;
}

/// Settings for the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Per-request timeout. `0` waits forever.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
