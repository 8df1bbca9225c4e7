//! Projects filtered IFC elements into the graph.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use ifcgraph_ingest_ifc::{ElementRecord, FilteredElements, ModelError, SourceModel};

use crate::model::{ElementNode, MetadataNode, ProjectNode, StructureNode};
use crate::store::GraphStore;
use crate::GraphError;

const UNNAMED_PROJECT: &str = "Unnamed Project";
const UNNAMED: &str = "Unnamed";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// What an ingestion run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub project_id: String,
    pub element_count: usize,
    /// Distinct Structure nodes touched.
    pub structure_count: usize,
    /// Structure CONTAINS edges created.
    pub structure_links: usize,
    /// Elements whose objectType or containment could not be written.
    pub skipped_relationships: usize,
    pub types: Vec<String>,
    pub elapsed: Duration,
}

/// Replace the graph content with the given elements.
///
/// The project is read before anything is deleted, so a model without one
/// leaves the existing graph untouched. Every element gets its node and
/// Project edge; objectType and containment failures are logged per element
/// and do not stop the run.
pub async fn write_graph<S, M>(
    store: &S,
    filtered: &FilteredElements,
    model: &M,
) -> Result<IngestSummary, WriteError>
where
    S: GraphStore + ?Sized,
    M: SourceModel + ?Sized,
{
    let start = Instant::now();
    let project = model.project()?;

    store.clear_all().await?;

    let project_node = ProjectNode {
        id: project.id,
        name: project.name.unwrap_or_else(|| UNNAMED_PROJECT.to_string()),
    };
    store.create_project(&project_node).await?;

    let mut element_count = 0usize;
    let mut structures = HashSet::new();
    let mut structure_links = 0usize;
    let mut skipped = 0usize;

    for group in filtered.groups() {
        tracing::info!(
            "Processing {} {} elements...",
            group.elements.len(),
            group.type_name
        );

        for element in &group.elements {
            let node = element_node(element);
            store.create_element(&node).await?;
            store.link_project_element(&project_node.id, &node.id).await?;

            match write_relationships(store, model, element).await {
                Ok(touched) => {
                    structure_links += touched.len();
                    structures.extend(touched);
                }
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(
                        element_type = %element.type_name,
                        element_id = %element.id,
                        error = %err,
                        "skipping relationships for element"
                    );
                }
            }

            element_count += 1;
        }
    }

    let types: Vec<String> = filtered.type_names().map(str::to_string).collect();
    store
        .create_metadata(&MetadataNode {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            element_count: element_count as i64,
            filtered_types: types.join(", "),
        })
        .await?;

    let elapsed = start.elapsed();
    tracing::info!(
        "Saved {} elements to graph in {:.2} seconds",
        element_count,
        elapsed.as_secs_f64()
    );

    Ok(IngestSummary {
        project_id: project_node.id,
        element_count,
        structure_count: structures.len(),
        structure_links,
        skipped_relationships: skipped,
        types,
        elapsed,
    })
}

fn element_node(element: &ElementRecord) -> ElementNode {
    ElementNode {
        id: element.id.clone(),
        name: element.name.clone().unwrap_or_else(|| UNNAMED.to_string()),
        guid: element.guid.clone().unwrap_or_default(),
        element_type: element.type_name.clone(),
        object_type: element.object_type.clone(),
    }
}

/// objectType and containment for one element. Returns the ids of the
/// structures linked to it.
async fn write_relationships<S, M>(
    store: &S,
    model: &M,
    element: &ElementRecord,
) -> Result<Vec<String>, WriteError>
where
    S: GraphStore + ?Sized,
    M: SourceModel + ?Sized,
{
    if let Some(object_type) = &element.object_type {
        store.set_element_object_type(&element.id, object_type).await?;
    }

    let mut linked = Vec::new();
    for structure in model.containing_structures(&element.id)? {
        let node = StructureNode {
            id: structure.id,
            name: structure.name.unwrap_or_else(|| UNNAMED.to_string()),
            structure_type: structure.type_name,
        };
        store.merge_structure(&node).await?;
        store.link_structure_element(&node.id, &element.id).await?;
        linked.push(node.id);
    }
    Ok(linked)
}
