//! IFC semantics over parsed STEP entities.

use std::collections::HashMap;
use std::path::Path;

use crate::parser::{parse_step, StepEntity, StepFile, StepHeader, StepValue};
use crate::{ElementRecord, ModelError, ProjectRecord, SourceModel, StructureRef};

// IfcRoot / IfcObject attribute positions shared by every IfcProduct and IfcProject.
const ATTR_GLOBAL_ID: usize = 0;
const ATTR_NAME: usize = 2;
const ATTR_OBJECT_TYPE: usize = 4;

// IfcRelContainedInSpatialStructure
const REL_CONTAINED_IN_SPATIAL_STRUCTURE: &str = "IFCRELCONTAINEDINSPATIALSTRUCTURE";
const ATTR_RELATED_ELEMENTS: usize = 4;
const ATTR_RELATING_STRUCTURE: usize = 5;

const PROJECT: &str = "IFCPROJECT";

/// IFC class names as the schema spells them. STEP writers upper-case entity
/// keywords; these are mapped back for anything stored in the graph.
const KNOWN_CLASSES: &[&str] = &[
    "IfcProject",
    "IfcSite",
    "IfcBuilding",
    "IfcBuildingStorey",
    "IfcSpace",
    "IfcFacility",
    "IfcFacilityPart",
    "IfcBridge",
    "IfcRoad",
    "IfcRailway",
    "IfcExternalSpatialElement",
    "IfcWall",
    "IfcWallStandardCase",
    "IfcDoor",
    "IfcWindow",
    "IfcStair",
    "IfcStairFlight",
    "IfcSlab",
    "IfcRoof",
    "IfcColumn",
    "IfcBeam",
    "IfcRelContainedInSpatialStructure",
    "IfcRelAggregates",
];

/// Canonical spelling of an IFC class keyword (`IFCBUILDINGSTOREY` →
/// `IfcBuildingStorey`). Unknown keywords are returned unchanged.
pub fn canonical_class_name(raw: &str) -> String {
    KNOWN_CLASSES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(raw))
        .map(|known| known.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// An opened IFC model.
#[derive(Debug, Clone)]
pub struct IfcModel {
    header: StepHeader,
    entities: Vec<StepEntity>,
    index: HashMap<u64, usize>,
    /// element id -> IfcRelContainedInSpatialStructure ids listing it
    containment: HashMap<u64, Vec<u64>>,
}

impl IfcModel {
    /// Read and parse an IFC file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text)
    }

    pub fn from_text(text: &str) -> Result<Self, ModelError> {
        Ok(Self::from_step(parse_step(text)?))
    }

    pub fn from_step(file: StepFile) -> Self {
        let StepFile { header, entities } = file;

        let mut index = HashMap::with_capacity(entities.len());
        for (pos, entity) in entities.iter().enumerate() {
            if index.insert(entity.id, pos).is_some() {
                tracing::warn!(entity = entity.id, "duplicate entity instance name; keeping the last one");
            }
        }

        let mut containment: HashMap<u64, Vec<u64>> = HashMap::new();
        for rel in entities
            .iter()
            .filter(|e| e.type_name == REL_CONTAINED_IN_SPATIAL_STRUCTURE)
        {
            let Some(related) = rel.attributes.get(ATTR_RELATED_ELEMENTS).and_then(StepValue::as_list)
            else {
                tracing::warn!(entity = rel.id, "containment relationship without RelatedElements list");
                continue;
            };
            for element in related.iter().filter_map(StepValue::as_reference) {
                containment.entry(element).or_default().push(rel.id);
            }
        }

        Self {
            header,
            entities,
            index,
            containment,
        }
    }

    /// Schema identifiers from the header, e.g. `["IFC4"]`.
    pub fn schema(&self) -> &[String] {
        &self.header.file_schema
    }

    pub fn header(&self) -> &StepHeader {
        &self.header
    }

    pub fn entity(&self, id: u64) -> Option<&StepEntity> {
        self.index.get(&id).map(|&pos| &self.entities[pos])
    }

    /// Entities of exactly this class (case-insensitive), in file order.
    pub fn by_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a StepEntity> + 'a {
        self.entities
            .iter()
            .filter(move |e| e.type_name.eq_ignore_ascii_case(type_name))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn structure_ref(&self, rel: &StepEntity) -> Result<Option<StructureRef>, ModelError> {
        let structure_id = match rel.attributes.get(ATTR_RELATING_STRUCTURE) {
            None => {
                return Err(ModelError::UnexpectedAttribute {
                    entity: rel.id,
                    attribute: "RelatingStructure",
                })
            }
            Some(value) if value.is_unset() => return Ok(None),
            Some(value) => value.as_reference().ok_or(ModelError::UnexpectedAttribute {
                entity: rel.id,
                attribute: "RelatingStructure",
            })?,
        };

        let structure = self.entity(structure_id).ok_or(ModelError::DanglingReference {
            from: rel.id,
            to: structure_id,
        })?;

        Ok(Some(StructureRef {
            id: structure.id.to_string(),
            name: text_attribute(structure, ATTR_NAME),
            type_name: canonical_class_name(&structure.type_name),
        }))
    }
}

/// Non-empty string attribute.
fn text_attribute(entity: &StepEntity, position: usize) -> Option<String> {
    entity
        .attributes
        .get(position)
        .and_then(StepValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl SourceModel for IfcModel {
    fn project(&self) -> Result<ProjectRecord, ModelError> {
        let project = self.by_type(PROJECT).next().ok_or(ModelError::MissingProject)?;
        Ok(ProjectRecord {
            id: project.id.to_string(),
            name: text_attribute(project, ATTR_NAME),
        })
    }

    fn elements_of_type(&self, type_name: &str) -> Vec<ElementRecord> {
        self.by_type(type_name)
            .map(|entity| ElementRecord {
                id: entity.id.to_string(),
                type_name: type_name.to_string(),
                name: text_attribute(entity, ATTR_NAME),
                guid: entity
                    .attributes
                    .get(ATTR_GLOBAL_ID)
                    .and_then(StepValue::as_str)
                    .map(str::to_string),
                object_type: text_attribute(entity, ATTR_OBJECT_TYPE),
            })
            .collect()
    }

    fn containing_structures(&self, element_id: &str) -> Result<Vec<StructureRef>, ModelError> {
        let id: u64 = element_id
            .parse()
            .map_err(|_| ModelError::UnknownEntity(element_id.to_string()))?;

        let Some(rels) = self.containment.get(&id) else {
            return Ok(Vec::new());
        };

        let mut structures = Vec::with_capacity(rels.len());
        for rel_id in rels {
            let rel = self.entity(*rel_id).ok_or(ModelError::UnknownEntity(rel_id.to_string()))?;
            if let Some(structure) = self.structure_ref(rel)? {
                structures.push(structure);
            }
        }
        Ok(structures)
    }
}

// ============================================================================
// Tests
// ============================================================================
