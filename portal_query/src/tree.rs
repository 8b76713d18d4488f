//! The browsable catalog tree built from fetched cancer types and studies.
//!
//! The store rebuilds this index whenever the catalog resources or the
//! priority-study hint map change; it only ever reads the lookups back.
//! List filtering and ranking on top of the tree belong to the UI layer.

use crate::api::{CancerStudy, CancerType};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

/// Hint map promoting chosen studies into synthetic top-level categories,
/// keyed by category label.
pub type PriorityStudies = IndexMap<String, Vec<String>>;

/// One cancer type with its place in the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct CancerTypeNode {
    /// The type record itself.
    pub cancer_type: CancerType,
    /// Child cancer-type ids, in catalog order.
    pub child_type_ids: Vec<String>,
    /// Ids of studies attached directly to this type.
    pub study_ids: Vec<String>,
}

/// Index over the fetched catalog: cancer types as a tree, studies by id.
///
/// Construction tolerates inconsistent input: a study pointing at an unknown
/// cancer type is still indexed by id (it just hangs off no node), and a
/// priority category only lists studies that actually exist.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CancerStudyTree {
    nodes: FxHashMap<String, CancerTypeNode>,
    studies: FxHashMap<String, CancerStudy>,
    root_ids: Vec<String>,
}

impl CancerStudyTree {
    /// Builds the tree from raw catalog lists and the priority hint map.
    pub fn build(
        cancer_types: &[CancerType],
        studies: &[CancerStudy],
        priority_studies: &PriorityStudies,
    ) -> Self {
        let mut nodes: FxHashMap<String, CancerTypeNode> = cancer_types
            .iter()
            .map(|ct| {
                (
                    ct.cancer_type_id.clone(),
                    CancerTypeNode {
                        cancer_type: ct.clone(),
                        child_type_ids: Vec::new(),
                        study_ids: Vec::new(),
                    },
                )
            })
            .collect();

        let mut root_ids = Vec::new();
        for ct in cancer_types {
            let id = &ct.cancer_type_id;
            match ct.parent.as_deref() {
                Some(parent)
                    if parent != id.as_str()
                        && nodes.contains_key(parent) =>
                {
                    if let Some(node) = nodes.get_mut(parent) {
                        node.child_type_ids.push(id.clone());
                    }
                }
                _ => root_ids.push(id.clone()),
            }
        }

        let mut study_index = FxHashMap::default();
        for study in studies {
            if let Some(node) = nodes.get_mut(&study.cancer_type_id) {
                node.study_ids.push(study.study_id.clone());
            }
            study_index.insert(study.study_id.clone(), study.clone());
        }

        // priority categories become synthetic roots, listed first
        let mut roots = Vec::new();
        for (category, ids) in priority_studies {
            let listed: Vec<String> = ids
                .iter()
                .filter(|id| study_index.contains_key(*id))
                .cloned()
                .collect();
            if listed.is_empty() {
                continue;
            }
            nodes.insert(
                category.clone(),
                CancerTypeNode {
                    cancer_type: CancerType {
                        cancer_type_id: category.clone(),
                        name: category.clone(),
                        parent: None,
                    },
                    child_type_ids: Vec::new(),
                    study_ids: listed,
                },
            );
            roots.push(category.clone());
        }
        roots.append(&mut root_ids);

        Self {
            nodes,
            studies: study_index,
            root_ids: roots,
        }
    }

    /// Looks up a study record by id.
    pub fn study(&self, study_id: &str) -> Option<&CancerStudy> {
        self.studies.get(study_id)
    }

    /// Looks up the tree node for a cancer type (or priority category) id.
    pub fn node(&self, cancer_type_id: &str) -> Option<&CancerTypeNode> {
        self.nodes.get(cancer_type_id)
    }

    /// Ids of the top-level nodes, priority categories first.
    pub fn root_ids(&self) -> &[String] {
        &self.root_ids
    }

    /// All studies in the subtree rooted at the given node.
    pub fn studies_in_subtree(
        &self,
        cancer_type_id: &str,
    ) -> Vec<&CancerStudy> {
        let mut found = Vec::new();
        let mut visited = FxHashSet::default();
        let mut queue = vec![cancer_type_id];
        while let Some(id) = queue.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(id) {
                found.extend(
                    node.study_ids.iter().filter_map(|id| self.study(id)),
                );
                queue.extend(node.child_type_ids.iter().map(String::as_str));
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cancer_type(id: &str, parent: Option<&str>) -> CancerType {
        CancerType {
            cancer_type_id: id.to_owned(),
            name: id.to_uppercase(),
            parent: parent.map(ToOwned::to_owned),
        }
    }

    fn study(id: &str, cancer_type_id: &str, samples: u64) -> CancerStudy {
        CancerStudy {
            study_id: id.to_owned(),
            name: id.to_uppercase(),
            cancer_type_id: cancer_type_id.to_owned(),
            all_sample_count: samples,
        }
    }

    #[test]
    fn indexes_types_and_studies() {
        let types =
            vec![cancer_type("breast", None), cancer_type("brca", Some("breast"))];
        let studies = vec![study("brca_tcga", "brca", 1098)];
        let tree =
            CancerStudyTree::build(&types, &studies, &PriorityStudies::new());

        assert_eq!(tree.root_ids(), ["breast".to_owned()]);
        assert_eq!(
            tree.node("breast").unwrap().child_type_ids,
            ["brca".to_owned()]
        );
        assert_eq!(tree.study("brca_tcga").unwrap().all_sample_count, 1098);
        let in_subtree = tree.studies_in_subtree("breast");
        assert_eq!(in_subtree.len(), 1);
        assert_eq!(in_subtree[0].study_id, "brca_tcga");
    }

    #[test]
    fn priority_categories_become_roots() {
        let types = vec![cancer_type("breast", None)];
        let studies = vec![study("brca_tcga", "breast", 1098)];
        let mut priority = PriorityStudies::new();
        priority.insert(
            "Priority Studies".to_owned(),
            vec!["brca_tcga".to_owned(), "missing_study".to_owned()],
        );
        let tree = CancerStudyTree::build(&types, &studies, &priority);

        assert_eq!(
            tree.root_ids(),
            ["Priority Studies".to_owned(), "breast".to_owned()]
        );
        // only studies that exist are listed under the category
        assert_eq!(
            tree.node("Priority Studies").unwrap().study_ids,
            ["brca_tcga".to_owned()]
        );
    }

    #[test]
    fn tolerates_unknown_references() {
        let types = vec![cancer_type("brca", Some("no_such_parent"))];
        let studies = vec![study("orphan", "no_such_type", 5)];
        let tree =
            CancerStudyTree::build(&types, &studies, &PriorityStudies::new());

        // a dangling parent makes the type a root; the study is still
        // reachable by id
        assert_eq!(tree.root_ids(), ["brca".to_owned()]);
        assert!(tree.study("orphan").is_some());
        assert!(tree.studies_in_subtree("brca").is_empty());
    }
}
