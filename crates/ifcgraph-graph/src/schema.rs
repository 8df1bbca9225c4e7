//! Graph schema introspection.

use serde::Serialize;

use crate::model::ElementTypeCount;
use crate::store::GraphStore;
use crate::GraphError;

/// Labels, relationship types and element type counts of the current graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSchema {
    pub labels: Vec<String>,
    pub relationship_types: Vec<String>,
    pub element_types: Vec<ElementTypeCount>,
}

/// Read the schema. Issues three read-only queries each call; nothing is
/// cached, so a re-ingested graph is seen on the next question.
pub async fn introspect<S: GraphStore + ?Sized>(store: &S) -> Result<GraphSchema, GraphError> {
    let labels = store.labels().await?;
    let relationship_types = store.relationship_types().await?;
    let element_types = store.element_type_counts().await?;

    tracing::debug!(
        labels = labels.len(),
        relationship_types = relationship_types.len(),
        element_types = element_types.len(),
        "introspected graph schema"
    );

    Ok(GraphSchema {
        labels,
        relationship_types,
        element_types,
    })
}
