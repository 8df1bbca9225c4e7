//! Node and record types of the building graph.

use serde::{Deserialize, Serialize};

pub const PROJECT_LABEL: &str = "Project";
pub const ELEMENT_LABEL: &str = "Element";
pub const STRUCTURE_LABEL: &str = "Structure";
pub const METADATA_LABEL: &str = "Metadata";

/// The only relationship type in the graph.
pub const REL_CONTAINS: &str = "CONTAINS";

/// Value of the fixed `type` property on the Project node.
pub const PROJECT_TYPE: &str = "Project";

/// One result row of a raw query, field name to value.
pub type Record = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNode {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementNode {
    pub id: String,
    pub name: String,
    pub guid: String,
    /// Allow-list category, stored as the `type` property.
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(rename = "objectType", skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub structure_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataNode {
    pub timestamp: String,
    pub element_count: i64,
    pub filtered_types: String,
}

/// Element count for one `type` value, as reported by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementTypeCount {
    pub element_type: String,
    pub count: i64,
}
