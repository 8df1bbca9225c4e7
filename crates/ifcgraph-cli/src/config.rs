//! Connection settings shared by every subcommand.
//!
//! Each value comes from its flag, then its environment variable (a `.env`
//! file is loaded first), then the default.

use clap::Args;
use ifcgraph_graph::Neo4jConfig;
use ifcgraph_llm::LlmConfig;

#[derive(Debug, Clone, Args)]
pub struct Neo4jArgs {
    /// Bolt URI of the Neo4j server
    #[arg(long, env = "NEO4J_URI", default_value = "bolt://localhost:7687", global = true)]
    pub neo4j_uri: String,

    #[arg(long, env = "NEO4J_USER", default_value = "neo4j", global = true)]
    pub neo4j_user: String,

    #[arg(
        long,
        env = "NEO4J_PASSWORD",
        default_value = "neo4j",
        hide_env_values = true,
        hide_default_value = true,
        global = true
    )]
    pub neo4j_password: String,
}

impl Neo4jArgs {
    pub fn to_config(&self) -> Neo4jConfig {
        Neo4jConfig {
            uri: self.neo4j_uri.clone(),
            user: self.neo4j_user.clone(),
            password: self.neo4j_password.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct LlmArgs {
    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_HOST", default_value = "http://127.0.0.1:11434", global = true)]
    pub llm_url: String,

    #[arg(long, env = "IFCGRAPH_LLM_MODEL", default_value = "llama3.1:latest", global = true)]
    pub llm_model: String,

    /// Per-request timeout in seconds (0 waits forever)
    #[arg(long, env = "IFCGRAPH_LLM_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub llm_timeout_secs: u64,
}

impl LlmArgs {
    pub fn to_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.llm_url.clone(),
            model: self.llm_model.clone(),
            timeout_secs: self.llm_timeout_secs,
        }
    }
}
