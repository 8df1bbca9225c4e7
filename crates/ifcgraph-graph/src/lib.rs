//! Property-graph projection of IFC building models.
//!
//! The graph has a fixed shape:
//!
//! ```text
//! (:Project)-[:CONTAINS]->(:Element)<-[:CONTAINS]-(:Structure)
//! (:Metadata)
//! ```
//!
//! Everything that talks to the database goes through [`GraphStore`], which
//! has a Neo4j implementation ([`Neo4jStore`]) and an in-memory one
//! ([`MemoryGraphStore`]) for dry runs and tests.

pub mod executor;
pub mod memory;
pub mod model;
pub mod neo4j;
pub mod schema;
pub mod store;
pub mod writer;

pub use executor::execute_query;
pub use memory::MemoryGraphStore;
pub use model::{
    ElementNode, ElementTypeCount, MetadataNode, ProjectNode, Record, StructureNode,
    ELEMENT_LABEL, METADATA_LABEL, PROJECT_LABEL, REL_CONTAINS, STRUCTURE_LABEL,
};
pub use neo4j::{Neo4jConfig, Neo4jStore};
pub use schema::{introspect, GraphSchema};
pub use store::GraphStore;
pub use writer::{write_graph, IngestSummary, WriteError};

/// Errors raised by a graph store.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("failed to connect to graph database: {0}")]
    Connection(String),

    #[error("{0}")]
    Query(String),

    #[error("failed to decode query result: {0}")]
    Decode(String),
}
