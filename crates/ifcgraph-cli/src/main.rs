//! ifcgraph CLI
//!
//! - `ingest`: project the physical elements of an IFC file into Neo4j
//! - `chat`: ask questions about the ingested model in natural language
//! - `ask`: answer one question and exit
//! - `schema`: show what the graph currently contains

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ifcgraph_graph::{
    introspect, write_graph, GraphSchema, IngestSummary, MemoryGraphStore, Neo4jStore,
};
use ifcgraph_ingest_ifc::filter_physical_elements;
use ifcgraph_llm::{ChatSession, OllamaClient, TurnOutcome};

mod config;
mod logging;
mod repl;

use config::{LlmArgs, Neo4jArgs};

#[derive(Parser)]
#[command(name = "ifcgraph")]
#[command(
    author,
    version,
    about = "Load IFC building models into Neo4j and query them in natural language"
)]
struct Cli {
    #[command(flatten)]
    neo4j: Neo4jArgs,

    #[command(flatten)]
    llm: LlmArgs,

    /// Default log filter; RUST_LOG overrides it
    #[arg(long, env = "IFCGRAPH_LOG", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the graph with the physical elements of an IFC file.
    ///
    /// Walls, doors, windows, stairs, slabs, roofs, columns and beams become
    /// Element nodes linked to the project and to their containing spatial
    /// structures.
    Ingest {
        /// IFC (STEP) file to load
        file: PathBuf,

        /// Build the graph in memory and print counts without touching Neo4j
        #[arg(long)]
        dry_run: bool,
    },

    /// Interactive question/answer session.
    Chat,

    /// Answer a single question and exit.
    Ask {
        /// The question; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Print node labels, relationship types and element counts.
    Schema {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // `.env` must be loaded before clap reads env fallbacks.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    match dotenv {
        Ok(path) => tracing::debug!("loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "failed to load .env"),
    }

    match &cli.command {
        Commands::Ingest { file, dry_run } => cmd_ingest(file, *dry_run, &cli.neo4j).await,
        Commands::Chat => cmd_chat(&cli.neo4j, &cli.llm).await,
        Commands::Ask { question } => cmd_ask(&question.join(" "), &cli.neo4j, &cli.llm).await,
        Commands::Schema { json } => cmd_schema(*json, &cli.neo4j).await,
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_ingest(file: &Path, dry_run: bool, neo4j: &Neo4jArgs) -> Result<()> {
    let (filtered, model) = filter_physical_elements(file)
        .with_context(|| format!("failed to load IFC model {}", file.display()))?;

    if filtered.is_empty() {
        tracing::warn!("no physical elements found in {}", file.display());
    }

    if dry_run {
        let store = MemoryGraphStore::new();
        let summary = write_graph(&store, &filtered, &model)
            .await
            .context("failed to build graph")?;
        print_summary(&summary, "in-memory graph (dry run)");
        println!(
            "  nodes: {} Project, {} Element, {} Structure, {} Metadata",
            store.project_count(),
            store.element_count(),
            store.structure_count(),
            store.metadata_count()
        );
        println!(
            "  edges: {} Project CONTAINS, {} Structure CONTAINS",
            store.project_edge_count(),
            store.structure_edge_count()
        );
        return Ok(());
    }

    let store = connect(neo4j).await?;
    let summary = write_graph(&store, &filtered, &model)
        .await
        .context("failed to write graph")?;
    print_summary(&summary, store.uri());
    Ok(())
}

async fn cmd_chat(neo4j: &Neo4jArgs, llm: &LlmArgs) -> Result<()> {
    let store = connect(neo4j).await?;
    let client = OllamaClient::new(&llm.to_config())?;
    let session = ChatSession::new(&store, &client);

    println!("{}", "IFC Graph Database Chatbot initialized!".green().bold());
    println!("Ask questions about your building model. Type 'quit' to exit.\n");

    let mut input = repl::RustylineInput::new()?;
    let mut output = repl::ColoredOutput::new(std::io::stdout());
    let exit = session.run(&mut input, &mut output).await?;
    tracing::debug!(?exit, "chat ended");
    Ok(())
}

async fn cmd_ask(question: &str, neo4j: &Neo4jArgs, llm: &LlmArgs) -> Result<()> {
    let store = connect(neo4j).await?;
    let client = OllamaClient::new(&llm.to_config())?;
    let turn = ChatSession::new(&store, &client).ask(question).await;

    if let Some(query) = &turn.query {
        eprintln!("{} {}", "query:".dimmed(), query);
    }
    match turn.outcome {
        TurnOutcome::Failed(message) => Err(anyhow!(message)),
        outcome => {
            println!("{}", outcome.message());
            Ok(())
        }
    }
}

async fn cmd_schema(json: bool, neo4j: &Neo4jArgs) -> Result<()> {
    let store = connect(neo4j).await?;
    let schema = introspect(&store)
        .await
        .context("failed to read graph schema")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
    } else {
        print_schema(&schema);
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

async fn connect(neo4j: &Neo4jArgs) -> Result<Neo4jStore> {
    Neo4jStore::connect(&neo4j.to_config())
        .await
        .with_context(|| format!("failed to connect to Neo4j at {}", neo4j.neo4j_uri))
}

fn print_summary(summary: &IngestSummary, target: &str) {
    println!(
        "{} {} elements into {} in {:.2}s",
        "ingested".green().bold(),
        summary.element_count,
        target,
        summary.elapsed.as_secs_f64()
    );
    println!("  project: {}", summary.project_id);
    println!("  types: {}", summary.types.join(", "));
    println!(
        "  structures: {} ({} links)",
        summary.structure_count, summary.structure_links
    );
    if summary.skipped_relationships > 0 {
        println!(
            "  {} relationship data skipped for {} elements (see log)",
            "warning:".yellow().bold(),
            summary.skipped_relationships
        );
    }
}

fn print_schema(schema: &GraphSchema) {
    println!("{}", "Node labels".bold());
    for label in &schema.labels {
        println!("  {label}");
    }
    println!("{}", "Relationship types".bold());
    for rel in &schema.relationship_types {
        println!("  {rel}");
    }
    println!("{}", "Element types".bold());
    for t in &schema.element_types {
        println!("  {:<16} {}", t.element_type, t.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_joins_words() {
        let cli = Cli::try_parse_from(["ifcgraph", "ask", "How", "many", "walls?"]).unwrap();
        match cli.command {
            Commands::Ask { question } => assert_eq!(question.join(" "), "How many walls?"),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ifcgraph",
            "ingest",
            "model.ifc",
            "--dry-run",
            "--neo4j-uri",
            "bolt://db:7687",
            "--llm-timeout-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.neo4j.neo4j_uri, "bolt://db:7687");
        assert_eq!(cli.llm.to_config().timeout_secs, 5);
        assert!(matches!(
            cli.command,
            Commands::Ingest { dry_run: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_dry_run_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.ifc");
        std::fs::write(
            &path,
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n\
             #1=IFCPROJECT('p',$,'Tiny',$,$,$,$,(),$);\n\
             #2=IFCBEAM('b',$,'B1',$,$,$,$,$);\n\
             ENDSEC;\nEND-ISO-10303-21;\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from(["ifcgraph", "ingest", "x.ifc"]).unwrap();
        cmd_ingest(&path, true, &cli.neo4j).await.unwrap();
    }

    #[tokio::test]
    async fn test_ingest_missing_file() {
        let cli = Cli::try_parse_from(["ifcgraph", "ingest", "x.ifc"]).unwrap();
        let err = cmd_ingest(Path::new("/nonexistent/model.ifc"), true, &cli.neo4j)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to load IFC model"));
    }
}
