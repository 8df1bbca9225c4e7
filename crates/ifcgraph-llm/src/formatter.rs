use ifcgraph_graph::Record;

use crate::client::CompletionClient;
use crate::prompt::build_answer_prompt;
use crate::synthesizer::llm_error_message;
use crate::LlmError;

/// Answer given when a query returns no rows.
pub const NO_DATA_MESSAGE: &str = "No data found matching your query.";

/// Narrates query results with one completion call.
pub struct ResponseFormatter<'a> {
    client: &'a dyn CompletionClient,
}

impl<'a> ResponseFormatter<'a> {
    pub fn new(client: &'a dyn CompletionClient) -> Self {
        Self { client }
    }

    /// Empty `records` short-circuit to [`NO_DATA_MESSAGE`] without an LLM call.
    pub async fn format(&self, question: &str, records: &[Record]) -> Result<String, LlmError> {
        if records.is_empty() {
            return Ok(NO_DATA_MESSAGE.to_string());
        }
        let prompt = build_answer_prompt(question, records);
        let answer = self.client.complete(&prompt).await?;
        Ok(answer.trim().to_string())
    }

    /// Like [`Self::format`], with a failed call turned into its error text.
    pub async fn format_answer(&self, question: &str, records: &[Record]) -> String {
        match self.format(question, records).await {
            Ok(answer) => answer,
            Err(err) => llm_error_message(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for CountingClient {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.contains("\"fail\"") {
                return Err(LlmError::Http {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(" There are 12 walls. ".to_string())
        }

        fn model(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_empty_results_skip_llm() {
        let client = CountingClient::default();
        let answer = ResponseFormatter::new(&client)
            .format_answer("How many roofs?", &[])
            .await;
        assert_eq!(answer, NO_DATA_MESSAGE);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rows_are_narrated() {
        let client = CountingClient::default();
        let mut row = Record::new();
        row.insert("walls".into(), json!(12));

        let answer = ResponseFormatter::new(&client)
            .format_answer("How many walls?", &[row])
            .await;
        assert_eq!(answer, "There are 12 walls.");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_message() {
        let client = CountingClient::default();
        let mut row = Record::new();
        row.insert("status".into(), json!("fail"));

        let answer = ResponseFormatter::new(&client)
            .format_answer("status?", &[row])
            .await;
        assert_eq!(answer, "Error calling LLM: HTTP 500: boom");
    }
}
