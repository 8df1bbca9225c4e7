//! Neo4j-backed graph store over Bolt.

use async_trait::async_trait;
use neo4rs::{query, Graph, Query};

use crate::model::{
    ElementNode, ElementTypeCount, MetadataNode, ProjectNode, Record, StructureNode,
    PROJECT_TYPE,
};
use crate::store::GraphStore;
use crate::GraphError;

/// Connection settings for [`Neo4jStore`].
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
        }
    }
}

/// Owns the single database connection of a run or chat session.
pub struct Neo4jStore {
    graph: Graph,
    uri: String,
}

impl Neo4jStore {
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, GraphError> {
        tracing::info!("Connecting to Neo4j at {}", config.uri);
        let graph = Graph::new(&config.uri, &config.user, &config.password)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;
        Ok(Self {
            graph,
            uri: config.uri.clone(),
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    async fn run(&self, q: Query) -> Result<(), GraphError> {
        self.graph
            .run(q)
            .await
            .map_err(|e| GraphError::Query(e.to_string()))
    }

    async fn fetch(&self, q: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self
            .graph
            .execute(q)
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?;
        let mut rows = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?
        {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn string_column(&self, cypher: &str, column: &str) -> Result<Vec<String>, GraphError> {
        self.fetch(query(cypher))
            .await?
            .iter()
            .map(|row| {
                row.get::<String>(column)
                    .map_err(|e| GraphError::Decode(e.to_string()))
            })
            .collect()
    }
}

impl Drop for Neo4jStore {
    fn drop(&mut self) {
        tracing::debug!(uri = %self.uri, "releasing Neo4j connection");
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn clear_all(&self) -> Result<(), GraphError> {
        self.run(query("MATCH (n) DETACH DELETE n")).await
    }

    async fn create_project(&self, project: &ProjectNode) -> Result<(), GraphError> {
        let q = query("CREATE (p:Project {id: $id, name: $name, type: $type})")
            .param("id", project.id.clone())
            .param("name", project.name.clone())
            .param("type", PROJECT_TYPE);
        self.run(q).await
    }

    async fn create_element(&self, element: &ElementNode) -> Result<(), GraphError> {
        let q = query(
            r#"
            CREATE (e:Element {
                id: $id,
                name: $name,
                guid: $guid,
                type: $type
            })
            "#,
        )
        .param("id", element.id.clone())
        .param("name", element.name.clone())
        .param("guid", element.guid.clone())
        .param("type", element.element_type.clone());
        self.run(q).await
    }

    async fn link_project_element(
        &self,
        project_id: &str,
        element_id: &str,
    ) -> Result<(), GraphError> {
        let q = query(
            r#"
            MATCH (p:Project {id: $project_id})
            MATCH (e:Element {id: $element_id})
            CREATE (p)-[:CONTAINS]->(e)
            "#,
        )
        .param("project_id", project_id)
        .param("element_id", element_id);
        self.run(q).await
    }

    async fn set_element_object_type(
        &self,
        element_id: &str,
        object_type: &str,
    ) -> Result<(), GraphError> {
        let q = query("MATCH (e:Element {id: $id}) SET e.objectType = $object_type")
            .param("id", element_id)
            .param("object_type", object_type);
        self.run(q).await
    }

    async fn merge_structure(&self, structure: &StructureNode) -> Result<(), GraphError> {
        let q = query(
            r#"
            MERGE (s:Structure {id: $id})
            ON CREATE SET s.name = $name, s.type = $type
            "#,
        )
        .param("id", structure.id.clone())
        .param("name", structure.name.clone())
        .param("type", structure.structure_type.clone());
        self.run(q).await
    }

    async fn link_structure_element(
        &self,
        structure_id: &str,
        element_id: &str,
    ) -> Result<(), GraphError> {
        let q = query(
            r#"
            MATCH (e:Element {id: $element_id})
            MATCH (s:Structure {id: $structure_id})
            CREATE (s)-[:CONTAINS]->(e)
            "#,
        )
        .param("element_id", element_id)
        .param("structure_id", structure_id);
        self.run(q).await
    }

    async fn create_metadata(&self, metadata: &MetadataNode) -> Result<(), GraphError> {
        let q = query(
            r#"
            CREATE (m:Metadata {
                timestamp: $timestamp,
                element_count: $count,
                filtered_types: $types
            })
            "#,
        )
        .param("timestamp", metadata.timestamp.clone())
        .param("count", metadata.element_count)
        .param("types", metadata.filtered_types.clone());
        self.run(q).await
    }

    async fn labels(&self) -> Result<Vec<String>, GraphError> {
        self.string_column("CALL db.labels() YIELD label RETURN label", "label")
            .await
    }

    async fn relationship_types(&self) -> Result<Vec<String>, GraphError> {
        self.string_column(
            "CALL db.relationshipTypes() YIELD relationshipType RETURN relationshipType",
            "relationshipType",
        )
        .await
    }

    async fn element_type_counts(&self) -> Result<Vec<ElementTypeCount>, GraphError> {
        let rows = self
            .fetch(query(
                r#"
                MATCH (e:Element)
                RETURN DISTINCT e.type AS element_type, COUNT(*) AS count
                ORDER BY count DESC
                "#,
            ))
            .await?;

        rows.iter()
            .map(|row| {
                let element_type = row
                    .get::<String>("element_type")
                    .map_err(|e| GraphError::Decode(e.to_string()))?;
                let count = row
                    .get::<i64>("count")
                    .map_err(|e| GraphError::Decode(e.to_string()))?;
                Ok(ElementTypeCount {
                    element_type,
                    count,
                })
            })
            .collect()
    }

    async fn execute(&self, cypher: &str) -> Result<Vec<Record>, GraphError> {
        let rows = self.fetch(query(cypher)).await?;
        rows.iter()
            .map(|row| {
                row.to::<Record>()
                    .map_err(|e| GraphError::Decode(e.to_string()))
            })
            .collect()
    }
}
