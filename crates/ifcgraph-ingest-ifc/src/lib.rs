//! IFC ingestion for ifcgraph
//!
//! This crate reads IFC building models (ISO-10303-21 STEP physical files)
//! and exposes the small surface the graph pipeline needs:
//! - the project entity,
//! - all elements of a given IFC class, resolved into plain records,
//! - spatial containment links for an element,
//! - the physical element filter that groups allow-listed classes.
//!
//! Geometry, property sets and the EXPRESS schema are not interpreted.

pub mod filter;
pub mod model;
pub mod parser;

use std::path::PathBuf;

pub use filter::{
    filter_elements, filter_physical_elements, ElementGroup, FilteredElements,
    PHYSICAL_ELEMENT_TYPES,
};
pub use model::{canonical_class_name, IfcModel};
pub use parser::{parse_step, StepEntity, StepFile, StepHeader, StepValue};

// ============================================================================
// Source model surface
// ============================================================================

/// Read access to an opened building model.
///
/// Attribute lookups are resolved once into plain records; only containment,
/// which needs a walk over relationship entities, stays on the model handle.
pub trait SourceModel {
    /// The model's project entity. Every valid model has exactly one.
    fn project(&self) -> Result<ProjectRecord, ModelError>;

    /// All elements whose class is exactly `type_name`, in file order.
    fn elements_of_type(&self, type_name: &str) -> Vec<ElementRecord>;

    /// Spatial structures the element is contained in.
    fn containing_structures(&self, element_id: &str) -> Result<Vec<StructureRef>, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: String,
    pub name: Option<String>,
}

/// A physical element with its optional attributes made explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    pub id: String,
    /// The allow-listed class this element was selected under.
    pub type_name: String,
    pub name: Option<String>,
    pub guid: Option<String>,
    pub object_type: Option<String>,
}

/// A spatial structure (storey, building, site, space) holding an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureRef {
    pub id: String,
    pub name: Option<String>,
    /// The source model's own class name, e.g. `IfcBuildingStorey`.
    pub type_name: String,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("STEP syntax error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("model has no IfcProject entity")]
    MissingProject,

    #[error("unknown entity #{0}")]
    UnknownEntity(String),

    #[error("#{from} references #{to}, which does not exist")]
    DanglingReference { from: u64, to: u64 },

    #[error("#{entity}: attribute {attribute} has an unexpected value")]
    UnexpectedAttribute { entity: u64, attribute: &'static str },
}
