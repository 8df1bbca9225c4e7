use async_trait::async_trait;

use crate::model::{
    ElementNode, ElementTypeCount, MetadataNode, ProjectNode, Record, StructureNode,
};
use crate::GraphError;

/// Graph database seam.
///
/// Write operations mirror the statements an ingestion run issues, one call
/// per statement. Link operations only create an edge when both endpoints
/// exist; that matches `MATCH ... MATCH ... CREATE` semantics.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Remove every node and relationship.
    async fn clear_all(&self) -> Result<(), GraphError>;

    async fn create_project(&self, project: &ProjectNode) -> Result<(), GraphError>;

    /// Create an Element node. `object_type` on the node is ignored here;
    /// it is written by [`GraphStore::set_element_object_type`].
    async fn create_element(&self, element: &ElementNode) -> Result<(), GraphError>;

    async fn link_project_element(
        &self,
        project_id: &str,
        element_id: &str,
    ) -> Result<(), GraphError>;

    async fn set_element_object_type(
        &self,
        element_id: &str,
        object_type: &str,
    ) -> Result<(), GraphError>;

    /// Create the Structure node unless one with the same id exists.
    /// An existing node keeps its name and type.
    async fn merge_structure(&self, structure: &StructureNode) -> Result<(), GraphError>;

    async fn link_structure_element(
        &self,
        structure_id: &str,
        element_id: &str,
    ) -> Result<(), GraphError>;

    async fn create_metadata(&self, metadata: &MetadataNode) -> Result<(), GraphError>;

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    async fn labels(&self) -> Result<Vec<String>, GraphError>;

    async fn relationship_types(&self) -> Result<Vec<String>, GraphError>;

    /// Distinct Element `type` values with counts, most frequent first.
    async fn element_type_counts(&self) -> Result<Vec<ElementTypeCount>, GraphError>;

    /// Run arbitrary query text and return every row.
    async fn execute(&self, cypher: &str) -> Result<Vec<Record>, GraphError>;
}
