//! The read-only backend interface the store fetches catalog data through.
//!
//! The concrete HTTP client lives elsewhere; the store only sees this trait
//! and the plain records it returns. Record field names mirror the backend's
//! camelCase wire format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure reported by the backend client.
///
/// Fetch failures surface on the owning resource cell as `is_error`; they are
/// never propagated as panics.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be completed.
    #[error("backend request failed: {0}")]
    Transport(String),
    /// The response body could not be decoded.
    #[error("backend returned malformed data: {0}")]
    Decode(String),
}

/// A node in the cancer-type taxonomy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancerType {
    /// Stable identifier, e.g. `"brca"`.
    pub cancer_type_id: String,
    /// Display name.
    pub name: String,
    /// Parent cancer-type id; `None` for a top-level tissue type.
    #[serde(default)]
    pub parent: Option<String>,
}

/// A cancer study in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancerStudy {
    /// Stable identifier, e.g. `"brca_tcga"`.
    pub study_id: String,
    /// Display name.
    pub name: String,
    /// The cancer type this study belongs to.
    pub cancer_type_id: String,
    /// Number of samples across the whole study.
    pub all_sample_count: u64,
}

/// The kind of alteration a genetic profile measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeneticAlterationType {
    MutationExtended,
    CopyNumberAlteration,
    MrnaExpression,
    ProteinLevel,
    Methylation,
    StructuralVariant,
}

/// A genetic profile available within a study.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneticProfile {
    /// Stable identifier, e.g. `"brca_tcga_mutations"`.
    pub genetic_profile_id: String,
    /// The study this profile belongs to.
    pub study_id: String,
    /// Display name.
    pub name: String,
    /// What the profile measures.
    pub genetic_alteration_type: GeneticAlterationType,
}

/// A named list of samples within a study (detailed projection).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleList {
    /// Stable identifier, e.g. `"brca_tcga_all"`.
    pub sample_list_id: String,
    /// The study this list belongs to.
    pub study_id: String,
    /// Display name.
    pub name: String,
    /// Backend category, e.g. `"all_cases_in_study"`.
    #[serde(default)]
    pub category: Option<String>,
    /// Number of samples in the list.
    #[serde(default)]
    pub sample_count: u64,
    /// Sample ids, present in the detailed projection.
    #[serde(default)]
    pub sample_ids: Vec<String>,
}

/// The four catalog reads the store consumes.
///
/// Implementations are expected to be cheap to call concurrently from
/// multiple resource cells; the store never writes through this interface.
/// Futures run on the single-threaded UI executor, so `Send` is not
/// required.
#[async_trait(?Send)]
pub trait PortalApi {
    /// Lists every cancer type in the taxonomy.
    async fn all_cancer_types(&self) -> Result<Vec<CancerType>, ApiError>;

    /// Lists every study in the catalog.
    async fn all_studies(&self) -> Result<Vec<CancerStudy>, ApiError>;

    /// Lists the genetic profiles available in one study.
    async fn genetic_profiles_in_study(
        &self,
        study_id: &str,
    ) -> Result<Vec<GeneticProfile>, ApiError>;

    /// Lists the sample lists of one study, detailed projection.
    async fn sample_lists_in_study(
        &self,
        study_id: &str,
    ) -> Result<Vec<SampleList>, ApiError>;
}
