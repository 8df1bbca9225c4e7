use ifcgraph_graph::GraphSchema;

use crate::client::CompletionClient;
use crate::prompt::build_query_prompt;
use crate::LlmError;

/// Prefix of the text returned in place of a query when the LLM call fails.
pub const LLM_ERROR_PREFIX: &str = "Error calling LLM";

/// Turns a question into Cypher with one completion call.
pub struct QuerySynthesizer<'a> {
    client: &'a dyn CompletionClient,
}

impl<'a> QuerySynthesizer<'a> {
    pub fn new(client: &'a dyn CompletionClient) -> Self {
        Self { client }
    }

    /// The generated query, trimmed of surrounding whitespace.
    pub async fn synthesize(&self, schema: &GraphSchema, question: &str) -> Result<String, LlmError> {
        let prompt = build_query_prompt(schema, question);
        tracing::debug!(model = %self.client.model(), "requesting Cypher query");
        let completion = self.client.complete(&prompt).await?;
        let query = completion.trim().to_string();
        tracing::debug!(query = %query, "generated query");
        Ok(query)
    }

    /// Like [`Self::synthesize`], but a failed call yields
    /// `"Error calling LLM: <reason>"` instead of an error.
    pub async fn generate_query(&self, schema: &GraphSchema, question: &str) -> String {
        match self.synthesize(schema, question).await {
            Ok(query) => query,
            Err(err) => llm_error_message(&err),
        }
    }
}

pub(crate) fn llm_error_message(err: &LlmError) -> String {
    format!("{LLM_ERROR_PREFIX}: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedClient(Result<&'static str, u64>);

    #[async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.0.map(str::to_string).map_err(LlmError::Timeout)
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_trims_completion() {
        let client = FixedClient(Ok("\n  MATCH (e:Element) RETURN count(e)  \n"));
        let query = QuerySynthesizer::new(&client)
            .generate_query(&GraphSchema::default(), "how many?")
            .await;
        assert_eq!(query, "MATCH (e:Element) RETURN count(e)");
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_message() {
        let client = FixedClient(Err(30));
        let synthesizer = QuerySynthesizer::new(&client);

        let text = synthesizer
            .generate_query(&GraphSchema::default(), "how many?")
            .await;
        assert_eq!(text, "Error calling LLM: request timed out after 30s");

        let err = synthesizer
            .synthesize(&GraphSchema::default(), "how many?")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Timeout(30)));
    }
}
