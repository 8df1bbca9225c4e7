//! Integration tests for the complete ifcgraph pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - IFC file → element filter → graph writer → in-memory graph
//! - graph → schema introspection → query synthesis → execution → answer
//!
//! Run with: cargo test --test integration_tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ifcgraph_graph::{introspect, write_graph, MemoryGraphStore, Record};
use ifcgraph_ingest_ifc::{filter_physical_elements, IfcModel, ModelError, PHYSICAL_ELEMENT_TYPES};
use ifcgraph_llm::{
    ChatExit, ChatSession, CompletionClient, LlmError, PlainOutput, ScriptedInput, TurnOutcome,
};
use tempfile::tempdir;

const HEADER: &str = "ISO-10303-21;\nHEADER;\n\
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');\n\
FILE_NAME('model.ifc','2024-03-01T10:00:00',('architect'),('office'),'exporter','app','');\n\
FILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n";
const FOOTER: &str = "ENDSEC;\nEND-ISO-10303-21;\n";

fn ifc(data: &str) -> String {
    format!("{HEADER}{data}{FOOTER}")
}

fn walls_and_doors() -> String {
    ifc("#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'Office',$,$,$,$,(),$);\n\
#11=IFCWALL('1a',$,'Wall A',$,$,$,$,$);\n\
#12=IFCWALL('1b',$,'Wall B',$,$,$,$,$);\n\
#13=IFCWALL('1c',$,'Wall C',$,$,$,$,$);\n\
#21=IFCDOOR('2a',$,'Door A',$,$,$,$,$,2.1,0.9);\n\
#22=IFCDOOR('2b',$,'Door B',$,$,$,$,$,2.1,0.9);\n")
}

fn shared_storey(n: usize) -> String {
    let mut data = String::from(
        "#1=IFCPROJECT('p',$,'Tower',$,$,$,$,(),$);\n\
         #5=IFCBUILDINGSTOREY('s',$,'Level 3',$,$,$,$,$,.ELEMENT.,9.);\n",
    );
    let mut refs = Vec::new();
    for i in 0..n {
        let id = 100 + i;
        data.push_str(&format!("#{id}=IFCCOLUMN('c{id}',$,'Column {i}',$,'Steel',$,$,$);\n"));
        refs.push(format!("#{id}"));
    }
    data.push_str(&format!(
        "#900=IFCRELCONTAINEDINSPATIALSTRUCTURE('r',$,$,$,({}),#5);\n",
        refs.join(",")
    ));
    ifc(&data)
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

// ============================================================================
// Ingestion
// ============================================================================

#[tokio::test]
async fn test_walls_and_doors_end_to_end() {
    let dir = tempdir().unwrap();
    let path = write_fixture(&dir, "office.ifc", &walls_and_doors());

    let (filtered, model) = filter_physical_elements(&path).unwrap();
    assert_eq!(filtered.type_names().collect::<Vec<_>>(), ["IfcWall", "IfcDoor"]);
    assert_eq!(filtered.get("IfcWall").map(<[_]>::len), Some(3));
    assert_eq!(filtered.get("IfcDoor").map(<[_]>::len), Some(2));

    let store = MemoryGraphStore::new();
    let summary = write_graph(&store, &filtered, &model).await.unwrap();

    assert_eq!(store.project_count(), 1);
    assert_eq!(store.element_count(), 5);
    assert_eq!(store.project_edge_count(), 5);
    assert_eq!(store.structure_count(), 0);
    assert_eq!(store.structure_edge_count(), 0);

    let metadata = store.metadata();
    assert_eq!(metadata.len(), 1);
    assert_eq!(metadata[0].element_count, 5);
    assert_eq!(metadata[0].filtered_types, "IfcWall, IfcDoor");

    assert_eq!(summary.element_count, 5);
    assert_eq!(summary.skipped_relationships, 0);
}

#[tokio::test]
async fn test_reingest_is_idempotent() {
    let text = shared_storey(4);
    let model = IfcModel::from_text(&text).unwrap();
    let filtered = ifcgraph_ingest_ifc::filter_elements(&model, &PHYSICAL_ELEMENT_TYPES);
    let store = MemoryGraphStore::new();

    write_graph(&store, &filtered, &model).await.unwrap();
    let first = (
        store.project_count(),
        store.element_count(),
        store.structure_count(),
        store.metadata_count(),
        store.project_edge_count(),
        store.structure_edge_count(),
    );

    write_graph(&store, &filtered, &model).await.unwrap();
    let second = (
        store.project_count(),
        store.element_count(),
        store.structure_count(),
        store.metadata_count(),
        store.project_edge_count(),
        store.structure_edge_count(),
    );

    assert_eq!(first, second);
    assert_eq!(first, (1, 4, 1, 1, 4, 4));
}

#[tokio::test]
async fn test_structure_shared_by_many_elements() {
    let model = IfcModel::from_text(&shared_storey(7)).unwrap();
    let filtered = ifcgraph_ingest_ifc::filter_elements(&model, &PHYSICAL_ELEMENT_TYPES);
    let store = MemoryGraphStore::new();
    let summary = write_graph(&store, &filtered, &model).await.unwrap();

    assert_eq!(store.structure_count(), 1);
    assert_eq!(store.structure_edge_count(), 7);
    assert_eq!(store.structure_members("5").len(), 7);
    assert_eq!(summary.structure_links, 7);

    let storey = store.structure("5").unwrap();
    assert_eq!(storey.name, "Level 3");
    assert_eq!(storey.structure_type, "IfcBuildingStorey");
    assert_eq!(
        store.element("100").unwrap().object_type.as_deref(),
        Some("Steel")
    );
}

#[test]
fn test_malformed_file_reports_line() {
    let dir = tempdir().unwrap();
    let broken = walls_and_doors().replace("#12=IFCWALL('1b'", "#12=IFCWALL('1b");
    let path = write_fixture(&dir, "broken.ifc", &broken);

    match filter_physical_elements(&path) {
        Err(ModelError::Parse { line, .. }) => assert!(line >= 8, "line {line}"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

// ============================================================================
// Chat over an ingested graph
// ============================================================================

struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("exhausted".into())))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

const COUNT_DOORS: &str = "MATCH (e:Element {type: 'IfcDoor'}) RETURN count(e) AS doors";

async fn ingested_store() -> MemoryGraphStore {
    let model = IfcModel::from_text(&walls_and_doors()).unwrap();
    let filtered = ifcgraph_ingest_ifc::filter_elements(&model, &PHYSICAL_ELEMENT_TYPES);
    let store = MemoryGraphStore::new();
    write_graph(&store, &filtered, &model).await.unwrap();

    let mut row = Record::new();
    row.insert("doors".into(), serde_json::json!(2));
    store.set_query_result(COUNT_DOORS, vec![row]);
    store
}

#[tokio::test]
async fn test_question_uses_live_schema() {
    let store = ingested_store().await;
    let schema = introspect(&store).await.unwrap();
    assert_eq!(schema.element_types[0].element_type, "IfcWall");
    assert_eq!(schema.element_types[0].count, 3);

    let llm = ScriptedLlm::new(vec![
        Ok(format!("  {COUNT_DOORS}\n")),
        Ok("The model has 2 doors.".into()),
    ]);
    let turn = ChatSession::new(&store, &llm).ask("How many doors?").await;

    assert_eq!(turn.outcome, TurnOutcome::Answer("The model has 2 doors.".into()));
    assert_eq!(store.executed_queries(), [COUNT_DOORS]);

    let prompts = llm.prompts.lock().unwrap();
    assert!(prompts[0].contains("'IfcWall (3 items)', 'IfcDoor (2 items)'"));
    assert!(prompts[0].contains("- Node types: ['Project', 'Element', 'Metadata']"));
    assert!(prompts[1].contains("\"doors\": 2"));
}

#[tokio::test]
async fn test_chat_survives_timeout_and_bad_query() {
    let store = ingested_store().await;
    let llm = ScriptedLlm::new(vec![
        Err(LlmError::Timeout(30)),
        Ok("MATCH (x:Nothing) RETURN x".into()),
        Ok(COUNT_DOORS.into()),
        Ok("Two doors.".into()),
    ]);
    let session = ChatSession::new(&store, &llm);

    let mut input = ScriptedInput::lines(["doors?", "doors??", "doors!"]);
    let mut out = PlainOutput::new(Vec::new());
    let exit = session.run(&mut input, &mut out).await.unwrap();

    assert_eq!(exit, ChatExit::EndOfInput);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 4);

    let transcript = String::from_utf8(out.into_inner()).unwrap();
    assert!(transcript.contains("Bot: Error calling LLM: request timed out after 30s"));
    assert!(transcript.contains("Bot: Error executing query: "));
    assert!(transcript.contains("Bot: Two doors.\nGoodbye!\n"));
}
