//! Physical element filter.
//!
//! Selects the allow-listed physical IFC classes from a model and groups the
//! elements by class.

use std::path::Path;
use std::time::Instant;

use crate::model::IfcModel;
use crate::{ElementRecord, ModelError, SourceModel};

/// The physical element classes projected into the graph, in processing order.
pub const PHYSICAL_ELEMENT_TYPES: [&str; 8] = [
    "IfcWall",
    "IfcDoor",
    "IfcWindow",
    "IfcStair",
    "IfcSlab",
    "IfcRoof",
    "IfcColumn",
    "IfcBeam",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementGroup {
    pub type_name: String,
    pub elements: Vec<ElementRecord>,
}

/// Elements grouped by class. Only classes with at least one element have a
/// group; groups keep the order of the requested type list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredElements {
    groups: Vec<ElementGroup>,
}

impl FilteredElements {
    pub fn groups(&self) -> &[ElementGroup] {
        &self.groups
    }

    pub fn get(&self, type_name: &str) -> Option<&[ElementRecord]> {
        self.groups
            .iter()
            .find(|g| g.type_name == type_name)
            .map(|g| g.elements.as_slice())
    }

    pub fn contains_type(&self, type_name: &str) -> bool {
        self.get(type_name).is_some()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.type_name.as_str())
    }

    /// Number of classes present.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_elements(&self) -> usize {
        self.groups.iter().map(|g| g.elements.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementRecord> {
        self.groups.iter().flat_map(|g| g.elements.iter())
    }
}

/// Group the model's elements of each listed class.
pub fn filter_elements<M: SourceModel + ?Sized>(model: &M, types: &[&str]) -> FilteredElements {
    let mut groups = Vec::new();
    for type_name in types {
        let elements = model.elements_of_type(type_name);
        if elements.is_empty() {
            continue;
        }
        tracing::info!("Found {} {} elements", elements.len(), type_name);
        groups.push(ElementGroup {
            type_name: type_name.to_string(),
            elements,
        });
    }
    FilteredElements { groups }
}

/// Open an IFC file and filter its physical elements.
///
/// The model is returned alongside the groups; the graph writer needs it for
/// the project entity and containment lookups.
pub fn filter_physical_elements(
    path: impl AsRef<Path>,
) -> Result<(FilteredElements, IfcModel), ModelError> {
    let path = path.as_ref();
    tracing::info!("Loading IFC file: {}", path.display());
    let start = Instant::now();

    let model = IfcModel::open(path)?;
    let filtered = filter_elements(&model, &PHYSICAL_ELEMENT_TYPES);

    tracing::info!(
        "Filtered IFC data loaded in {:.2} seconds",
        start.elapsed().as_secs_f64()
    );
    Ok((filtered, model))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    /// A minimal IFC file with `counts[i]` instances of `PHYSICAL_ELEMENT_TYPES[i]`.
    fn ifc_with_counts(counts: &[usize]) -> String {
        let mut data = String::from("#1=IFCPROJECT('0001',$,'P',$,$,$,$,(),$);\n");
        let mut next_id = 100;
        for (type_name, count) in PHYSICAL_ELEMENT_TYPES.iter().zip(counts) {
            for _ in 0..*count {
                data.push_str(&format!(
                    "#{next_id}={}('g{next_id}',$,'e{next_id}',$,$,$,$,$);\n",
                    type_name.to_ascii_uppercase()
                ));
                next_id += 1;
            }
        }
        format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n{data}ENDSEC;\nEND-ISO-10303-21;\n"
        )
    }

    #[test]
    fn test_walls_and_doors() {
        let model = IfcModel::from_text(&ifc_with_counts(&[3, 2])).unwrap();
        let filtered = filter_elements(&model, &PHYSICAL_ELEMENT_TYPES);

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.get("IfcWall").map(<[_]>::len), Some(3));
        assert_eq!(filtered.get("IfcDoor").map(<[_]>::len), Some(2));
        assert!(!filtered.contains_type("IfcWindow"));
        assert_eq!(filtered.total_elements(), 5);
        assert_eq!(filtered.type_names().collect::<Vec<_>>(), ["IfcWall", "IfcDoor"]);
    }

    #[test]
    fn test_groups_follow_requested_order() {
        let model = IfcModel::from_text(&ifc_with_counts(&[1, 0, 0, 0, 0, 0, 1, 1])).unwrap();
        let filtered = filter_elements(&model, &["IfcBeam", "IfcWall", "IfcColumn"]);
        assert_eq!(
            filtered.type_names().collect::<Vec<_>>(),
            ["IfcBeam", "IfcWall", "IfcColumn"]
        );
    }

    #[test]
    fn test_filter_physical_elements_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ifc_with_counts(&[0, 0, 4]).as_bytes()).unwrap();

        let (filtered, model) = filter_physical_elements(file.path()).unwrap();
        assert_eq!(filtered.get("IfcWindow").map(<[_]>::len), Some(4));
        assert_eq!(model.project().unwrap().id, "1");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = filter_physical_elements(dir.path().join("absent.ifc"));
        assert!(matches!(result, Err(ModelError::Io { .. })));
    }

    proptest! {
        #[test]
        fn prop_empty_types_are_omitted(counts in proptest::collection::vec(0usize..4, 8)) {
            let model = IfcModel::from_text(&ifc_with_counts(&counts)).unwrap();
            let filtered = filter_elements(&model, &PHYSICAL_ELEMENT_TYPES);

            for (type_name, count) in PHYSICAL_ELEMENT_TYPES.iter().zip(&counts) {
                match filtered.get(type_name) {
                    None => prop_assert_eq!(*count, 0),
                    Some(elements) => {
                        prop_assert!(*count > 0);
                        prop_assert_eq!(elements.len(), *count);
                    }
                }
            }
            prop_assert_eq!(filtered.total_elements(), counts.iter().sum::<usize>());
        }
    }
}
