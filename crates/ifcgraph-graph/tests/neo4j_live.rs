//! Round trip against a running Neo4j instance.
//!
//! Run with `NEO4J_URI=bolt://localhost:7687 cargo test -p ifcgraph-graph -- --ignored`.
//! The test clears the target database.

use ifcgraph_graph::{
    execute_query, introspect, write_graph, GraphStore, Neo4jConfig, Neo4jStore,
};
use ifcgraph_ingest_ifc::{filter_elements, IfcModel, PHYSICAL_ELEMENT_TYPES};

const MODEL: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0001',$,'Live',$,$,$,$,(),$);
#10=IFCBUILDINGSTOREY('0010',$,'Ground',$,$,$,$,$,.ELEMENT.,0.);
#20=IFCWALL('0020',$,'W1',$,$,$,$,$);
#21=IFCWALL('0021',$,'W2',$,$,$,$,$);
#30=IFCRELCONTAINEDINSPATIALSTRUCTURE('0030',$,$,$,(#20,#21),#10);
ENDSEC;
END-ISO-10303-21;
"#;

fn config_from_env() -> Neo4jConfig {
    let defaults = Neo4jConfig::default();
    Neo4jConfig {
        uri: std::env::var("NEO4J_URI").unwrap_or(defaults.uri),
        user: std::env::var("NEO4J_USER").unwrap_or(defaults.user),
        password: std::env::var("NEO4J_PASSWORD").unwrap_or(defaults.password),
    }
}

#[tokio::test]
#[ignore = "requires a running Neo4j instance"]
async fn test_ingest_and_query_live() {
    let store = Neo4jStore::connect(&config_from_env()).await.unwrap();
    let model = IfcModel::from_text(MODEL).unwrap();
    let filtered = filter_elements(&model, &PHYSICAL_ELEMENT_TYPES);

    let summary = write_graph(&store, &filtered, &model).await.unwrap();
    assert_eq!(summary.element_count, 2);
    assert_eq!(summary.structure_count, 1);

    let schema = introspect(&store).await.unwrap();
    assert!(schema.labels.iter().any(|l| l == "Element"));
    assert_eq!(schema.relationship_types, ["CONTAINS"]);
    assert_eq!(schema.element_types[0].count, 2);

    let rows = execute_query(
        &store,
        "MATCH (s:Structure)-[:CONTAINS]->(e:Element) RETURN s.name AS storey, count(e) AS walls",
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["storey"], "Ground");
    assert_eq!(rows[0]["walls"], 2);

    assert!(store.execute("THIS IS NOT CYPHER").await.is_err());
}
