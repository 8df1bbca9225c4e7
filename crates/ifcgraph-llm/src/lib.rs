//! Natural-language questions over the building graph.
//!
//! A question is answered in two LLM round trips: the first turns the
//! question plus the live graph schema into Cypher, the second turns the
//! query's rows back into prose. [`chat::ChatSession`] drives one question at
//! a time and [`chat::ChatSession::run`] wraps it in an interactive loop.

pub mod chat;
pub mod client;
pub mod formatter;
pub mod ollama;
pub mod prompt;
pub mod synthesizer;

pub use chat::{
    is_quit_token, ChatError, ChatEvent, ChatExit, ChatOutput, ChatSession, ChatState, ChatTurn,
    InputEvent, LineSource, PlainOutput, ScriptedInput, TurnOutcome,
};
pub use client::{CompletionClient, LlmConfig};
pub use formatter::{ResponseFormatter, NO_DATA_MESSAGE};
pub use ollama::OllamaClient;
pub use synthesizer::QuerySynthesizer;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
