//! In-memory graph store.
//!
//! Used for `ingest --dry-run` and for tests. Writes follow the same
//! semantics as the Cypher statements of [`crate::Neo4jStore`]; raw
//! [`GraphStore::execute`] only answers query texts registered up front.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::model::{
    ElementNode, ElementTypeCount, MetadataNode, ProjectNode, Record, StructureNode,
    ELEMENT_LABEL, METADATA_LABEL, PROJECT_LABEL, REL_CONTAINS, STRUCTURE_LABEL,
};
use crate::store::GraphStore;
use crate::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Project,
    Structure,
}

#[derive(Debug, Default)]
struct MemoryGraph {
    projects: Vec<ProjectNode>,
    elements: Vec<ElementNode>,
    structures: Vec<StructureNode>,
    metadata: Vec<MetadataNode>,
    /// (container kind, container id, element id)
    contains: Vec<(Container, String, String)>,
}

impl MemoryGraph {
    fn has_element(&self, id: &str) -> bool {
        self.elements.iter().any(|e| e.id == id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graph: RwLock<MemoryGraph>,
    canned: RwLock<HashMap<String, Vec<Record>>>,
    executed: RwLock<Vec<String>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `cypher` with `rows` from [`GraphStore::execute`].
    pub fn with_query_result(self, cypher: &str, rows: Vec<Record>) -> Self {
        self.set_query_result(cypher, rows);
        self
    }

    pub fn set_query_result(&self, cypher: &str, rows: Vec<Record>) {
        self.canned.write().insert(cypher.trim().to_string(), rows);
    }

    /// Query texts passed to [`GraphStore::execute`], in order.
    pub fn executed_queries(&self) -> Vec<String> {
        self.executed.read().clone()
    }

    pub fn project_count(&self) -> usize {
        self.graph.read().projects.len()
    }

    pub fn element_count(&self) -> usize {
        self.graph.read().elements.len()
    }

    pub fn structure_count(&self) -> usize {
        self.graph.read().structures.len()
    }

    pub fn metadata_count(&self) -> usize {
        self.graph.read().metadata.len()
    }

    pub fn project_edge_count(&self) -> usize {
        self.edge_count(Container::Project)
    }

    pub fn structure_edge_count(&self) -> usize {
        self.edge_count(Container::Structure)
    }

    fn edge_count(&self, kind: Container) -> usize {
        self.graph
            .read()
            .contains
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .count()
    }

    pub fn projects(&self) -> Vec<ProjectNode> {
        self.graph.read().projects.clone()
    }

    pub fn element(&self, id: &str) -> Option<ElementNode> {
        self.graph.read().elements.iter().find(|e| e.id == id).cloned()
    }

    pub fn structure(&self, id: &str) -> Option<StructureNode> {
        self.graph
            .read()
            .structures
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn metadata(&self) -> Vec<MetadataNode> {
        self.graph.read().metadata.clone()
    }

    /// Ids of the elements a structure contains, in link order.
    pub fn structure_members(&self, structure_id: &str) -> Vec<String> {
        self.graph
            .read()
            .contains
            .iter()
            .filter(|(k, id, _)| *k == Container::Structure && id == structure_id)
            .map(|(_, _, element)| element.clone())
            .collect()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn clear_all(&self) -> Result<(), GraphError> {
        *self.graph.write() = MemoryGraph::default();
        Ok(())
    }

    async fn create_project(&self, project: &ProjectNode) -> Result<(), GraphError> {
        self.graph.write().projects.push(project.clone());
        Ok(())
    }

    async fn create_element(&self, element: &ElementNode) -> Result<(), GraphError> {
        let node = ElementNode {
            object_type: None,
            ..element.clone()
        };
        self.graph.write().elements.push(node);
        Ok(())
    }

    async fn link_project_element(
        &self,
        project_id: &str,
        element_id: &str,
    ) -> Result<(), GraphError> {
        let mut graph = self.graph.write();
        if graph.projects.iter().any(|p| p.id == project_id) && graph.has_element(element_id) {
            graph.contains.push((
                Container::Project,
                project_id.to_string(),
                element_id.to_string(),
            ));
        }
        Ok(())
    }

    async fn set_element_object_type(
        &self,
        element_id: &str,
        object_type: &str,
    ) -> Result<(), GraphError> {
        let mut graph = self.graph.write();
        for element in graph.elements.iter_mut().filter(|e| e.id == element_id) {
            element.object_type = Some(object_type.to_string());
        }
        Ok(())
    }

    async fn merge_structure(&self, structure: &StructureNode) -> Result<(), GraphError> {
        let mut graph = self.graph.write();
        if !graph.structures.iter().any(|s| s.id == structure.id) {
            graph.structures.push(structure.clone());
        }
        Ok(())
    }

    async fn link_structure_element(
        &self,
        structure_id: &str,
        element_id: &str,
    ) -> Result<(), GraphError> {
        let mut graph = self.graph.write();
        if graph.structures.iter().any(|s| s.id == structure_id) && graph.has_element(element_id)
        {
            graph.contains.push((
                Container::Structure,
                structure_id.to_string(),
                element_id.to_string(),
            ));
        }
        Ok(())
    }

    async fn create_metadata(&self, metadata: &MetadataNode) -> Result<(), GraphError> {
        self.graph.write().metadata.push(metadata.clone());
        Ok(())
    }

    async fn labels(&self) -> Result<Vec<String>, GraphError> {
        let graph = self.graph.read();
        let present = [
            (PROJECT_LABEL, !graph.projects.is_empty()),
            (ELEMENT_LABEL, !graph.elements.is_empty()),
            (STRUCTURE_LABEL, !graph.structures.is_empty()),
            (METADATA_LABEL, !graph.metadata.is_empty()),
        ];
        Ok(present
            .into_iter()
            .filter(|(_, present)| *present)
            .map(|(label, _)| label.to_string())
            .collect())
    }

    async fn relationship_types(&self) -> Result<Vec<String>, GraphError> {
        if self.graph.read().contains.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![REL_CONTAINS.to_string()])
        }
    }

    async fn element_type_counts(&self) -> Result<Vec<ElementTypeCount>, GraphError> {
        let graph = self.graph.read();
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for element in &graph.elements {
            *counts.entry(element.element_type.as_str()).or_default() += 1;
        }

        let mut counts: Vec<ElementTypeCount> = counts
            .into_iter()
            .map(|(element_type, count)| ElementTypeCount {
                element_type: element_type.to_string(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.element_type.cmp(&b.element_type))
        });
        Ok(counts)
    }

    async fn execute(&self, cypher: &str) -> Result<Vec<Record>, GraphError> {
        self.executed.write().push(cypher.to_string());
        self.canned
            .read()
            .get(cypher.trim())
            .cloned()
            .ok_or_else(|| {
                GraphError::Query(format!(
                    "in-memory graph cannot evaluate query: {}",
                    cypher.trim()
                ))
            })
    }
}
