//! Prompt templates.
//!
//! Both prompts are pure functions of their inputs so the same schema and
//! question always produce the same text.

use ifcgraph_graph::{GraphSchema, Record};

/// Prompt asking for a single Cypher query answering `question`.
pub fn build_query_prompt(schema: &GraphSchema, question: &str) -> String {
    let element_types: Vec<String> = schema
        .element_types
        .iter()
        .map(|t| format!("{} ({} items)", t.element_type, t.count))
        .collect();

    format!(
        r#"You are a Cypher query generator for a Neo4j database containing IFC building model data.

Database Schema:
- Node types: {labels}
- Relationship types: {relationships}
- Element types available: {element_types}

Node structure:
- Project: id, name, type
- Element: id, name, guid, type, objectType
- Structure: id, name, type
- Metadata: timestamp, element_count, filtered_types

Relationships:
- (Project)-[:CONTAINS]->(Element)
- (Structure)-[:CONTAINS]->(Element)

User question: "{question}"

Generate ONLY a Cypher query that answers this question. Return just the query without explanation or formatting."#,
        labels = bracket_list(&schema.labels),
        relationships = bracket_list(&schema.relationship_types),
        element_types = bracket_list(&element_types),
    )
}

/// Prompt asking for a prose answer grounded in `records`.
pub fn build_answer_prompt(question: &str, records: &[Record]) -> String {
    let results = serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"Based on the following database query results, provide a clear and concise answer to the user's question.

User question: "{question}"

Query results:
{results}

Provide a natural language response that directly answers the question. Be specific with numbers and details from the data."#
    )
}

/// `['a', 'b']`
fn bracket_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("'{}'", s.as_ref())).collect();
    format!("[{}]", quoted.join(", "))
}
