//! The query-session store.
//!
//! One instance lives for the whole application session, constructed by the
//! top-level wiring with an injected backend client. All primitive state is
//! written exclusively through the action methods; everything else the UI
//! needs is a derived view over that state and the catalog resources.

use crate::{
    api::{
        CancerStudy, CancerType, GeneticAlterationType, GeneticProfile,
        PortalApi, SampleList,
    },
    snapshot::QuerySnapshot,
    tree::{CancerStudyTree, PriorityStudies},
};
use indexmap::{IndexMap, IndexSet};
use reactive_cells::{
    computed::Memo, effect::Effect, prelude::*, resource::Resource,
    signal::RwSignal,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Alteration types that are selected by default when a study's profile list
/// arrives.
pub const DEFAULT_SELECTED_ALTERATION_TYPES: [GeneticAlterationType; 2] = [
    GeneticAlterationType::MutationExtended,
    GeneticAlterationType::CopyNumberAlteration,
];

/// Whether custom case ids name samples or patients.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CaseIdsMode {
    /// Ids are sample ids.
    #[default]
    Sample,
    /// Ids are patient ids.
    Patient,
}

/// Which data types participate in case-set prioritization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypePriority {
    /// Consider mutation data.
    pub mutation: bool,
    /// Consider copy-number data.
    pub cna: bool,
}

impl Default for DataTypePriority {
    fn default() -> Self {
        Self {
            mutation: true,
            cna: true,
        }
    }
}

/// Initial values for the store's presentation defaults.
#[derive(Clone, Debug)]
pub struct QueryStoreDefaults {
    /// Initial z-score threshold literal.
    pub z_score_threshold: String,
    /// How deep the cancer-type tree renders.
    pub max_tree_depth: u32,
    /// Whether clicking the single selected type again deselects it.
    pub click_again_to_deselect_single: bool,
    /// Canned search expressions offered in the search box.
    pub search_text_presets: Vec<String>,
    /// Studies promoted into synthetic top-level categories.
    pub priority_studies: PriorityStudies,
}

impl Default for QueryStoreDefaults {
    fn default() -> Self {
        Self {
            z_score_threshold: "2.0".to_owned(),
            max_tree_depth: 9,
            click_again_to_deselect_single: true,
            search_text_presets: [
                "tcga",
                "tcga -provisional",
                "tcga -moratorium",
                "tcga OR icgc",
                "-\"cell line\"",
                "prostate mskcc",
                "esophageal OR stomach",
                "serous",
                "breast",
            ]
            .map(ToOwned::to_owned)
            .to_vec(),
            priority_studies: IndexMap::from_iter([
                (
                    "Shared institutional Data Sets".to_owned(),
                    vec!["mskimpact".to_owned(), "cellline_mskcc".to_owned()],
                ),
                (
                    "Priority Studies".to_owned(),
                    vec![
                        "blca_tcga_pub".to_owned(),
                        "coadread_tcga_pub".to_owned(),
                        "brca_tcga_pub2015".to_owned(),
                    ],
                ),
            ]),
        }
    }
}

/// Reactive state behind the query-configuration screen.
///
/// Construction spawns the catalog fetches and the default-profile reaction
/// on the ambient executor, so a store must be created inside an executor
/// context (in tests, a `LocalSet`).
pub struct QueryStore {
    // query parameters
    search_text: RwSignal<String>,
    selected_study_ids: RwSignal<IndexSet<String>>,
    data_type_priority: RwSignal<DataTypePriority>,
    selected_profile_ids: RwSignal<IndexSet<String>>,
    z_score_threshold: RwSignal<String>,
    selected_sample_list_id: RwSignal<String>,
    case_ids: RwSignal<String>,
    case_ids_mode: RwSignal<CaseIdsMode>,
    gene_set: RwSignal<String>,

    // visual options
    search_text_presets: RwSignal<Vec<String>>,
    priority_studies: RwSignal<PriorityStudies>,
    show_selected_studies_only: RwSignal<bool>,
    selected_cancer_type_ids: RwSignal<IndexSet<String>>,
    max_tree_depth: RwSignal<u32>,
    click_again_to_deselect_single: RwSignal<bool>,

    // remote data
    cancer_types: Resource<Vec<CancerType>>,
    cancer_studies: Resource<Vec<CancerStudy>>,
    genetic_profiles: Resource<Vec<GeneticProfile>>,
    sample_lists: Resource<Vec<SampleList>>,

    // derived views
    single_selected_study_id: Memo<Option<String>>,
    profiles_by_id: Memo<FxHashMap<String, GeneticProfile>>,
    selected_profiles: Memo<Vec<Option<GeneticProfile>>>,
    tree_data: Memo<CancerStudyTree>,
    selected_studies: Memo<Vec<Option<CancerStudy>>>,
    total_selected_sample_count: Memo<u64>,
    serializable_state: Memo<QuerySnapshot>,

    _default_profile_reaction: Effect<()>,
}

impl QueryStore {
    /// Creates a store with the stock presentation defaults.
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self::with_defaults(api, QueryStoreDefaults::default())
    }

    /// Creates a store with explicit presentation defaults.
    pub fn with_defaults(
        api: Arc<dyn PortalApi>,
        defaults: QueryStoreDefaults,
    ) -> Self {
        let search_text = RwSignal::new(String::new());
        let selected_study_ids = RwSignal::new(IndexSet::new());
        let data_type_priority = RwSignal::new(DataTypePriority::default());
        let selected_profile_ids = RwSignal::new(IndexSet::new());
        let z_score_threshold = RwSignal::new(defaults.z_score_threshold);
        let selected_sample_list_id = RwSignal::new(String::new());
        let case_ids = RwSignal::new(String::new());
        let case_ids_mode = RwSignal::new(CaseIdsMode::default());
        let gene_set = RwSignal::new(String::new());

        let search_text_presets =
            RwSignal::new(defaults.search_text_presets);
        let priority_studies = RwSignal::new(defaults.priority_studies);
        let show_selected_studies_only = RwSignal::new(false);
        let selected_cancer_type_ids = RwSignal::new(IndexSet::new());
        let max_tree_depth = RwSignal::new(defaults.max_tree_depth);
        let click_again_to_deselect_single =
            RwSignal::new(defaults.click_again_to_deselect_single);

        let single_selected_study_id = Memo::new({
            let selected_study_ids = selected_study_ids.clone();
            move |_| {
                selected_study_ids.with(|ids| {
                    if ids.len() == 1 {
                        ids.first().cloned()
                    } else {
                        None
                    }
                })
            }
        });

        let cancer_types = Resource::new(
            || (),
            {
                let api = Arc::clone(&api);
                move |_: &()| {
                    let api = Arc::clone(&api);
                    Some(async move { api.all_cancer_types().await })
                }
            },
            Vec::new(),
        );

        let cancer_studies = Resource::new(
            || (),
            {
                let api = Arc::clone(&api);
                move |_: &()| {
                    let api = Arc::clone(&api);
                    Some(async move { api.all_studies().await })
                }
            },
            Vec::new(),
        );

        let genetic_profiles = Resource::new(
            {
                let single_selected_study_id =
                    single_selected_study_id.clone();
                move || single_selected_study_id.get()
            },
            {
                let api = Arc::clone(&api);
                move |study_id: &Option<String>| {
                    let study_id = study_id.clone()?;
                    let api = Arc::clone(&api);
                    Some(async move {
                        api.genetic_profiles_in_study(&study_id).await
                    })
                }
            },
            Vec::new(),
        );

        let sample_lists = Resource::new(
            {
                let single_selected_study_id =
                    single_selected_study_id.clone();
                move || single_selected_study_id.get()
            },
            {
                let api = Arc::clone(&api);
                move |study_id: &Option<String>| {
                    let study_id = study_id.clone()?;
                    let api = Arc::clone(&api);
                    Some(async move {
                        api.sample_lists_in_study(&study_id).await.map(
                            |mut lists| {
                                lists.sort_by(|a, b| a.name.cmp(&b.name));
                                lists
                            },
                        )
                    })
                }
            },
            Vec::new(),
        );

        let profiles_by_id = Memo::new({
            let genetic_profiles = genetic_profiles.clone();
            move |_| {
                genetic_profiles.with_value(|profiles| {
                    profiles
                        .iter()
                        .map(|p| (p.genetic_profile_id.clone(), p.clone()))
                        .collect::<FxHashMap<_, _>>()
                })
            }
        });

        let selected_profiles = Memo::new({
            let selected_profile_ids = selected_profile_ids.clone();
            let profiles_by_id = profiles_by_id.clone();
            move |_| {
                profiles_by_id.with(|index| {
                    selected_profile_ids.with(|ids| {
                        ids.iter().map(|id| index.get(id).cloned()).collect()
                    })
                })
            }
        });

        let tree_data = Memo::new({
            let cancer_types = cancer_types.clone();
            let cancer_studies = cancer_studies.clone();
            let priority_studies = priority_studies.clone();
            move |_| {
                cancer_types.with_value(|types| {
                    cancer_studies.with_value(|studies| {
                        priority_studies.with(|priority| {
                            CancerStudyTree::build(types, studies, priority)
                        })
                    })
                })
            }
        });

        let selected_studies = Memo::new({
            let selected_study_ids = selected_study_ids.clone();
            let tree_data = tree_data.clone();
            move |_| {
                tree_data.with(|tree| {
                    selected_study_ids.with(|ids| {
                        ids.iter()
                            .map(|id| tree.study(id).cloned())
                            .collect::<Vec<Option<CancerStudy>>>()
                    })
                })
            }
        });

        let total_selected_sample_count = Memo::new({
            let selected_studies = selected_studies.clone();
            move |_| {
                // stale ids show up as None and contribute nothing
                selected_studies.with(|studies| {
                    studies
                        .iter()
                        .flatten()
                        .map(|study| study.all_sample_count)
                        .sum()
                })
            }
        });

        let serializable_state = Memo::new({
            let search_text = search_text.clone();
            let selected_study_ids = selected_study_ids.clone();
            let data_type_priority = data_type_priority.clone();
            let selected_profile_ids = selected_profile_ids.clone();
            let z_score_threshold = z_score_threshold.clone();
            let selected_sample_list_id = selected_sample_list_id.clone();
            let case_ids = case_ids.clone();
            let case_ids_mode = case_ids_mode.clone();
            let gene_set = gene_set.clone();
            move |_| QuerySnapshot {
                search_text: search_text.get(),
                selected_study_ids: selected_study_ids
                    .with(|ids| ids.iter().cloned().collect()),
                data_type_priority: data_type_priority.get(),
                selected_profile_ids: selected_profile_ids
                    .with(|ids| ids.iter().cloned().collect()),
                z_score_threshold: z_score_threshold.get(),
                selected_sample_list_id: selected_sample_list_id.get(),
                case_ids: case_ids.get(),
                case_ids_mode: case_ids_mode.get(),
                gene_set: gene_set.get(),
            }
        });

        // whenever the fetched profile list changes, reset the profile
        // selection to the priority alteration types; a manual selection
        // from the previous study does not survive a switch
        let default_profile_reaction = Effect::watch(
            {
                let genetic_profiles = genetic_profiles.clone();
                move || genetic_profiles.value()
            },
            {
                let selected_profile_ids = selected_profile_ids.clone();
                move |profiles: &Vec<GeneticProfile>, _, _| {
                    let defaults: IndexSet<String> = profiles
                        .iter()
                        .filter(|p| {
                            DEFAULT_SELECTED_ALTERATION_TYPES
                                .contains(&p.genetic_alteration_type)
                        })
                        .map(|p| p.genetic_profile_id.clone())
                        .collect();
                    tracing::debug!(
                        count = defaults.len(),
                        "selecting default genetic profiles"
                    );
                    selected_profile_ids.set(defaults);
                }
            },
            true,
        );

        Self {
            search_text,
            selected_study_ids,
            data_type_priority,
            selected_profile_ids,
            z_score_threshold,
            selected_sample_list_id,
            case_ids,
            case_ids_mode,
            gene_set,
            search_text_presets,
            priority_studies,
            show_selected_studies_only,
            selected_cancer_type_ids,
            max_tree_depth,
            click_again_to_deselect_single,
            cancer_types,
            cancer_studies,
            genetic_profiles,
            sample_lists,
            single_selected_study_id,
            profiles_by_id,
            selected_profiles,
            tree_data,
            selected_studies,
            total_selected_sample_count,
            serializable_state,
            _default_profile_reaction: default_profile_reaction,
        }
    }

    // ---- actions -------------------------------------------------------

    /// Handles a click on a cancer type in the tree.
    ///
    /// With `multi_select`, the type toggles in and out of the selection.
    /// Otherwise the selection is replaced by the clicked type, except that
    /// re-clicking the sole selected type clears the selection when
    /// `click_again_to_deselect_single` is on.
    ///
    /// Panics on a cancer-type record without an id; that is a caller bug,
    /// not a runtime condition.
    pub fn select_cancer_type(
        &self,
        cancer_type: &CancerType,
        multi_select: bool,
    ) {
        let clicked = cancer_type.cancer_type_id.as_str();
        assert!(
            !clicked.is_empty(),
            "cancer type record has an empty cancerTypeId"
        );

        if multi_select {
            self.selected_cancer_type_ids.update(|ids| {
                if !ids.shift_remove(clicked) {
                    ids.insert(clicked.to_owned());
                }
            });
        } else if self.click_again_to_deselect_single.get_untracked()
            && self.selected_cancer_type_ids.with_untracked(|ids| {
                ids.len() == 1 && ids.contains(clicked)
            })
        {
            self.selected_cancer_type_ids.set(IndexSet::new());
        } else {
            self.selected_cancer_type_ids
                .set(IndexSet::from([clicked.to_owned()]));
        }
    }

    /// Replaces the study selection.
    pub fn set_selected_study_ids(
        &self,
        ids: impl IntoIterator<Item = String>,
    ) {
        self.selected_study_ids.set(ids.into_iter().collect());
    }

    /// Replaces the profile selection (e.g. from the profile checkboxes).
    pub fn set_selected_profile_ids(
        &self,
        ids: impl IntoIterator<Item = String>,
    ) {
        self.selected_profile_ids.set(ids.into_iter().collect());
    }

    /// Sets the free-text study filter.
    pub fn set_search_text(&self, text: impl Into<String>) {
        self.search_text.set(text.into());
    }

    /// Sets the selected sample list.
    pub fn set_selected_sample_list_id(&self, id: impl Into<String>) {
        self.selected_sample_list_id.set(id.into());
    }

    /// Sets the custom case-id text.
    pub fn set_case_ids(&self, ids: impl Into<String>) {
        self.case_ids.set(ids.into());
    }

    /// Sets how custom case ids are interpreted.
    pub fn set_case_ids_mode(&self, mode: CaseIdsMode) {
        self.case_ids_mode.set(mode);
    }

    /// Sets the z-score threshold literal.
    pub fn set_z_score_threshold(&self, threshold: impl Into<String>) {
        self.z_score_threshold.set(threshold.into());
    }

    /// Sets the data-type priority flags.
    pub fn set_data_type_priority(&self, priority: DataTypePriority) {
        self.data_type_priority.set(priority);
    }

    /// Sets the gene set the query runs over.
    pub fn set_gene_set(&self, gene_set: impl Into<String>) {
        self.gene_set.set(gene_set.into());
    }

    /// Shows or hides unselected studies in the list.
    pub fn set_show_selected_studies_only(&self, show: bool) {
        self.show_selected_studies_only.set(show);
    }

    /// Sets how deep the cancer-type tree renders.
    pub fn set_max_tree_depth(&self, depth: u32) {
        self.max_tree_depth.set(depth);
    }

    /// Enables or disables click-again-to-deselect for single selection.
    pub fn set_click_again_to_deselect_single(&self, enabled: bool) {
        self.click_again_to_deselect_single.set(enabled);
    }

    /// Restores the nine serialized query parameters from a snapshot.
    pub fn apply_snapshot(&self, snapshot: &QuerySnapshot) {
        self.search_text.set(snapshot.search_text.clone());
        self.selected_study_ids
            .set(snapshot.selected_study_ids.iter().cloned().collect());
        self.data_type_priority.set(snapshot.data_type_priority);
        self.selected_profile_ids
            .set(snapshot.selected_profile_ids.iter().cloned().collect());
        self.z_score_threshold
            .set(snapshot.z_score_threshold.clone());
        self.selected_sample_list_id
            .set(snapshot.selected_sample_list_id.clone());
        self.case_ids.set(snapshot.case_ids.clone());
        self.case_ids_mode.set(snapshot.case_ids_mode);
        self.gene_set.set(snapshot.gene_set.clone());
    }

    // ---- primitive state, tracked reads --------------------------------

    /// The free-text study filter.
    pub fn search_text(&self) -> String {
        self.search_text.get()
    }

    /// Selected study ids, in selection order.
    pub fn selected_study_ids(&self) -> IndexSet<String> {
        self.selected_study_ids.get()
    }

    /// Selected cancer-type ids, in selection order.
    pub fn selected_cancer_type_ids(&self) -> IndexSet<String> {
        self.selected_cancer_type_ids.get()
    }

    /// Selected profile ids, in selection order.
    pub fn selected_profile_ids(&self) -> IndexSet<String> {
        self.selected_profile_ids.get()
    }

    /// The selected sample list id.
    pub fn selected_sample_list_id(&self) -> String {
        self.selected_sample_list_id.get()
    }

    /// Custom case ids, newline separated.
    pub fn case_ids(&self) -> String {
        self.case_ids.get()
    }

    /// How custom case ids are interpreted.
    pub fn case_ids_mode(&self) -> CaseIdsMode {
        self.case_ids_mode.get()
    }

    /// The z-score threshold literal.
    pub fn z_score_threshold(&self) -> String {
        self.z_score_threshold.get()
    }

    /// The data-type priority flags.
    pub fn data_type_priority(&self) -> DataTypePriority {
        self.data_type_priority.get()
    }

    /// The gene set the query runs over.
    pub fn gene_set(&self) -> String {
        self.gene_set.get()
    }

    /// Canned search expressions offered in the search box.
    pub fn search_text_presets(&self) -> Vec<String> {
        self.search_text_presets.get()
    }

    /// Studies promoted into synthetic top-level categories.
    pub fn priority_studies(&self) -> PriorityStudies {
        self.priority_studies.get()
    }

    /// Whether the list shows only selected studies.
    pub fn show_selected_studies_only(&self) -> bool {
        self.show_selected_studies_only.get()
    }

    /// How deep the cancer-type tree renders.
    pub fn max_tree_depth(&self) -> u32 {
        self.max_tree_depth.get()
    }

    /// Whether clicking the single selected type again deselects it.
    pub fn click_again_to_deselect_single(&self) -> bool {
        self.click_again_to_deselect_single.get()
    }

    // ---- remote data ---------------------------------------------------

    /// The cancer-type taxonomy.
    pub fn cancer_types(&self) -> &Resource<Vec<CancerType>> {
        &self.cancer_types
    }

    /// The study catalog.
    pub fn cancer_studies(&self) -> &Resource<Vec<CancerStudy>> {
        &self.cancer_studies
    }

    /// Genetic profiles of the single selected study, empty otherwise.
    pub fn genetic_profiles(&self) -> &Resource<Vec<GeneticProfile>> {
        &self.genetic_profiles
    }

    /// Sample lists of the single selected study, sorted by name.
    pub fn sample_lists(&self) -> &Resource<Vec<SampleList>> {
        &self.sample_lists
    }

    // ---- derived views -------------------------------------------------

    /// The sole selected study id, if exactly one study is selected.
    pub fn single_selected_study_id(&self) -> Option<String> {
        self.single_selected_study_id.get()
    }

    /// Fetched profiles indexed by profile id.
    pub fn profiles_by_id(&self) -> Memo<FxHashMap<String, GeneticProfile>> {
        self.profiles_by_id.clone()
    }

    /// Selected profiles in selection order; `None` for ids not in the
    /// currently fetched list.
    pub fn selected_profiles(&self) -> Vec<Option<GeneticProfile>> {
        self.selected_profiles.get()
    }

    /// The catalog tree.
    pub fn tree_data(&self) -> Memo<CancerStudyTree> {
        self.tree_data.clone()
    }

    /// Selected studies in selection order; `None` for ids not in the
    /// currently loaded catalog.
    pub fn selected_studies(&self) -> Vec<Option<CancerStudy>> {
        self.selected_studies.get()
    }

    /// Total sample count across resolved selected studies.
    pub fn total_selected_sample_count(&self) -> u64 {
        self.total_selected_sample_count.get()
    }

    /// The nine-field snapshot of the current query parameters.
    pub fn serializable_state(&self) -> QuerySnapshot {
        self.serializable_state.get()
    }
}
