#![allow(dead_code)]

//! Shared fixtures: an in-memory backend and the catalog the tests query.

use async_trait::async_trait;
use futures::channel::oneshot;
use portal_query::api::{
    ApiError, CancerStudy, CancerType, GeneticAlterationType, GeneticProfile,
    PortalApi, SampleList,
};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

pub async fn settle() {
    for _ in 0..10 {
        any_spawner::Executor::tick().await;
    }
}

pub fn cancer_type(id: &str, parent: Option<&str>) -> CancerType {
    CancerType {
        cancer_type_id: id.to_owned(),
        name: id.to_uppercase(),
        parent: parent.map(ToOwned::to_owned),
    }
}

pub fn study(id: &str, cancer_type_id: &str, samples: u64) -> CancerStudy {
    CancerStudy {
        study_id: id.to_owned(),
        name: id.to_uppercase(),
        cancer_type_id: cancer_type_id.to_owned(),
        all_sample_count: samples,
    }
}

pub fn profile(
    id: &str,
    study_id: &str,
    alteration: GeneticAlterationType,
) -> GeneticProfile {
    GeneticProfile {
        genetic_profile_id: id.to_owned(),
        study_id: study_id.to_owned(),
        name: id.to_uppercase(),
        genetic_alteration_type: alteration,
    }
}

pub fn sample_list(id: &str, study_id: &str, name: &str) -> SampleList {
    SampleList {
        sample_list_id: id.to_owned(),
        study_id: study_id.to_owned(),
        name: name.to_owned(),
        category: Some("all_cases_in_study".to_owned()),
        sample_count: 3,
        sample_ids: vec!["s1".into(), "s2".into(), "s3".into()],
    }
}

/// In-memory backend. Single-threaded like the store itself.
///
/// Per-study profile fetches can be gated on a oneshot so tests control the
/// order in which "network" responses land.
#[derive(Default)]
pub struct FakeApi {
    pub cancer_types: Vec<CancerType>,
    pub studies: Vec<CancerStudy>,
    pub profiles: HashMap<String, Vec<GeneticProfile>>,
    pub sample_lists: HashMap<String, Vec<SampleList>>,
    pub profile_calls: Cell<usize>,
    pub sample_list_calls: Cell<usize>,
    pub fail_profiles: Cell<bool>,
    profile_gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
}

impl FakeApi {
    /// Two breast studies with distinct default profiles, per the portal's
    /// usual shape: `brca_tcga` carries a mutation and a protein profile,
    /// `brca_pub` carries mutation and copy-number profiles.
    pub fn with_catalog() -> Self {
        let mut api = Self {
            cancer_types: vec![
                cancer_type("breast", None),
                cancer_type("brca", Some("breast")),
            ],
            studies: vec![
                study("brca_tcga", "brca", 1098),
                study("brca_pub", "brca", 500),
            ],
            ..Self::default()
        };
        api.profiles.insert(
            "brca_tcga".to_owned(),
            vec![
                profile(
                    "brca_mutations",
                    "brca_tcga",
                    GeneticAlterationType::MutationExtended,
                ),
                profile(
                    "brca_rppa",
                    "brca_tcga",
                    GeneticAlterationType::ProteinLevel,
                ),
            ],
        );
        api.profiles.insert(
            "brca_pub".to_owned(),
            vec![
                profile(
                    "pub_mutations",
                    "brca_pub",
                    GeneticAlterationType::MutationExtended,
                ),
                profile(
                    "pub_gistic",
                    "brca_pub",
                    GeneticAlterationType::CopyNumberAlteration,
                ),
            ],
        );
        api.sample_lists.insert(
            "brca_tcga".to_owned(),
            vec![
                sample_list("brca_tcga_seq", "brca_tcga", "Sequenced Tumors"),
                sample_list("brca_tcga_all", "brca_tcga", "All Tumors"),
            ],
        );
        api
    }

    /// Holds the next profile fetch for `study_id` until the returned sender
    /// fires.
    pub fn gate_profiles(&self, study_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.profile_gates
            .borrow_mut()
            .insert(study_id.to_owned(), rx);
        tx
    }
}

#[async_trait(?Send)]
impl PortalApi for FakeApi {
    async fn all_cancer_types(&self) -> Result<Vec<CancerType>, ApiError> {
        Ok(self.cancer_types.clone())
    }

    async fn all_studies(&self) -> Result<Vec<CancerStudy>, ApiError> {
        Ok(self.studies.clone())
    }

    async fn genetic_profiles_in_study(
        &self,
        study_id: &str,
    ) -> Result<Vec<GeneticProfile>, ApiError> {
        self.profile_calls.set(self.profile_calls.get() + 1);
        let gate = self.profile_gates.borrow_mut().remove(study_id);
        if let Some(gate) = gate {
            _ = gate.await;
        }
        if self.fail_profiles.get() {
            return Err(ApiError::Transport(format!(
                "profiles for {study_id} unavailable"
            )));
        }
        Ok(self.profiles.get(study_id).cloned().unwrap_or_default())
    }

    async fn sample_lists_in_study(
        &self,
        study_id: &str,
    ) -> Result<Vec<SampleList>, ApiError> {
        self.sample_list_calls.set(self.sample_list_calls.get() + 1);
        Ok(self.sample_lists.get(study_id).cloned().unwrap_or_default())
    }
}
