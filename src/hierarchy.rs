//! Region → Prefecture → Area tree built from the JMA area catalog.
//!
//! References to ids the catalog does not define are skipped, not reported
//! as errors: JMA occasionally lists children before publishing them.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

use crate::jma::models::{AreaCatalog, OfficeRecord};

/// How deep to build the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyDepth {
    /// Regions and prefectures only.
    Prefectures,
    /// Also join each prefecture's class10 areas.
    Areas,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub prefectures: Vec<Prefecture>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Prefecture {
    pub id: String,
    pub name: String,
    pub region_id: String,
    /// Empty unless built with [`HierarchyDepth::Areas`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub areas: Vec<Area>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Area {
    pub id: String,
    pub name: String,
    pub prefecture_id: String,
}

/// Regions keyed by id, in catalog order.
pub type Hierarchy = IndexMap<String, Region>;

/// Build the region tree from a parsed catalog.
///
/// A prefecture is attached to the first center that lists it, provided its
/// own `parent` (when present) names that center. Anything else is dropped
/// with a debug event.
#[must_use]
pub fn build_hierarchy(catalog: &AreaCatalog, depth: HierarchyDepth) -> Hierarchy {
    let mut hierarchy = Hierarchy::with_capacity(catalog.centers.len());
    let mut attached: HashSet<&str> = HashSet::new();
    let mut skipped = 0usize;

    for (center_id, center) in &catalog.centers {
        let mut region = Region {
            id: center_id.clone(),
            name: center.name.clone(),
            prefectures: Vec::with_capacity(center.children.len()),
        };

        for office_id in &center.children {
            let Some(office) = catalog.offices.get(office_id) else {
                tracing::debug!(center = %center_id, office = %office_id, "Office not in catalog, skipping");
                skipped += 1;
                continue;
            };

            if let Some(parent) = office.parent.as_deref()
                && parent != center_id
            {
                tracing::debug!(
                    center = %center_id,
                    office = %office_id,
                    parent,
                    "Office belongs to another center, skipping"
                );
                skipped += 1;
                continue;
            }

            if !attached.insert(office_id.as_str()) {
                tracing::debug!(center = %center_id, office = %office_id, "Office already attached, skipping");
                skipped += 1;
                continue;
            }

            let areas = match depth {
                HierarchyDepth::Prefectures => Vec::new(),
                HierarchyDepth::Areas => join_areas(catalog, office_id, office),
            };

            region.prefectures.push(Prefecture {
                id: office_id.clone(),
                name: office.name.clone(),
                region_id: center_id.clone(),
                areas,
            });
        }

        hierarchy.insert(center_id.clone(), region);
    }

    tracing::debug!(
        regions = hierarchy.len(),
        prefectures = attached.len(),
        skipped,
        "Built area hierarchy"
    );

    hierarchy
}

fn join_areas(catalog: &AreaCatalog, office_id: &str, office: &OfficeRecord) -> Vec<Area> {
    office
        .children
        .iter()
        .filter_map(|area_id| {
            let Some(class10) = catalog.class10s.get(area_id) else {
                tracing::debug!(office = %office_id, area = %area_id, "Area not in catalog, skipping");
                return None;
            };
            Some(Area {
                id: area_id.clone(),
                name: class10.name.clone(),
                prefecture_id: office_id.to_string(),
            })
        })
        .collect()
}

/// Find a prefecture anywhere in the tree.
#[must_use]
pub fn find_prefecture<'a>(hierarchy: &'a Hierarchy, prefecture_id: &str) -> Option<&'a Prefecture> {
    hierarchy
        .values()
        .flat_map(|region| region.prefectures.iter())
        .find(|p| p.id == prefecture_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog(value: serde_json::Value) -> AreaCatalog {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn single_region_with_one_prefecture() {
        let catalog = catalog(json!({
            "centers": {"R1": {"name": "Kanto", "children": ["O1"]}},
            "offices": {"O1": {"name": "Tokyo"}}
        }));

        let hierarchy = build_hierarchy(&catalog, HierarchyDepth::Prefectures);

        assert_eq!(hierarchy.len(), 1);
        let region = &hierarchy["R1"];
        assert_eq!(region.name, "Kanto");
        assert_eq!(
            region.prefectures,
            vec![Prefecture {
                id: "O1".into(),
                name: "Tokyo".into(),
                region_id: "R1".into(),
                areas: vec![],
            }]
        );
        assert_eq!(
            serde_json::to_value(&region.prefectures[0]).unwrap(),
            json!({"id": "O1", "name": "Tokyo", "region_id": "R1"})
        );
    }

    #[test]
    fn children_missing_from_offices_are_skipped() {
        let catalog = catalog(json!({
            "centers": {"R1": {"name": "Kanto", "children": ["O1", "GONE", "O2"]}},
            "offices": {
                "O1": {"name": "Tokyo", "parent": "R1"},
                "O2": {"name": "Chiba", "parent": "R1"}
            }
        }));

        let hierarchy = build_hierarchy(&catalog, HierarchyDepth::Prefectures);
        let ids: Vec<&str> = hierarchy["R1"].prefectures.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["O1", "O2"]);
    }

    #[test]
    fn office_with_unknown_parent_is_excluded() {
        let catalog = catalog(json!({
            "centers": {"R1": {"name": "Kanto", "children": ["O1", "O2"]}},
            "offices": {
                "O1": {"name": "Tokyo", "parent": "R1"},
                "O2": {"name": "Orphan", "parent": "NOPE"}
            }
        }));

        let hierarchy = build_hierarchy(&catalog, HierarchyDepth::Prefectures);
        assert!(find_prefecture(&hierarchy, "O2").is_none());
        assert!(find_prefecture(&hierarchy, "O1").is_some());
    }

    #[test]
    fn every_prefecture_sits_under_its_parent_exactly_once() {
        let catalog = catalog(json!({
            "centers": {
                "R1": {"name": "Kanto", "children": ["O1", "O2"]},
                "R2": {"name": "Kinki", "children": ["O3", "O1"]}
            },
            "offices": {
                "O1": {"name": "Tokyo", "parent": "R1"},
                "O2": {"name": "Chiba", "parent": "R1"},
                "O3": {"name": "Osaka", "parent": "R2"}
            }
        }));

        let hierarchy = build_hierarchy(&catalog, HierarchyDepth::Prefectures);

        for (office_id, office) in &catalog.offices {
            let holders: Vec<&Region> = hierarchy
                .values()
                .filter(|r| r.prefectures.iter().any(|p| &p.id == office_id))
                .collect();
            assert_eq!(holders.len(), 1, "{office_id}");
            assert_eq!(Some(&holders[0].id), office.parent.as_ref());
        }
    }

    #[test]
    fn regions_keep_catalog_order() {
        // Parsed from text: a `json!` object would already be key-sorted
        let catalog: AreaCatalog = serde_json::from_str(
            r#"{
                "centers": {
                    "Z": {"name": "Last alphabetically", "children": []},
                    "A": {"name": "First alphabetically", "children": []}
                },
                "offices": {}
            }"#,
        )
        .unwrap();

        let hierarchy = build_hierarchy(&catalog, HierarchyDepth::Prefectures);
        let ids: Vec<&str> = hierarchy.keys().map(String::as_str).collect();
        assert_eq!(ids, ["Z", "A"]);
    }

    #[test]
    fn areas_are_joined_only_when_requested() {
        let catalog = catalog(json!({
            "centers": {"010300": {"name": "関東甲信地方", "children": ["130000"]}},
            "offices": {"130000": {"name": "東京都", "parent": "010300", "children": ["130010", "130099", "130020"]}},
            "class10s": {
                "130010": {"name": "東京地方", "parent": "130000"},
                "130020": {"name": "伊豆諸島北部", "parent": "130000"}
            }
        }));

        let shallow = build_hierarchy(&catalog, HierarchyDepth::Prefectures);
        assert!(shallow["010300"].prefectures[0].areas.is_empty());

        let deep = build_hierarchy(&catalog, HierarchyDepth::Areas);
        let areas = &deep["010300"].prefectures[0].areas;
        let names: Vec<&str> = areas.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["東京地方", "伊豆諸島北部"]);
        assert!(areas.iter().all(|a| a.prefecture_id == "130000"));
    }
}
