//! The serialized projection of a query.
//!
//! This is the only externally persisted shape: exactly the primitive query
//! parameters, in the backend's camelCase naming, and nothing derived from
//! resources. Consumers encode it into URLs and saved queries, so the field
//! set is a compatibility contract.

use crate::store::{CaseIdsMode, DataTypePriority};
use serde::{Deserialize, Serialize};

/// A saved query: the nine primitive parameter fields.
///
/// Round-trips losslessly through [`QueryStore::serializable_state`] and
/// [`QueryStore::apply_snapshot`](crate::store::QueryStore::apply_snapshot).
///
/// [`QueryStore::serializable_state`]: crate::store::QueryStore::serializable_state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySnapshot {
    /// Free-text study filter.
    pub search_text: String,
    /// Selected study ids, in selection order.
    pub selected_study_ids: Vec<String>,
    /// Which data types drive case-set priority.
    pub data_type_priority: DataTypePriority,
    /// Selected genetic profile ids, in selection order.
    pub selected_profile_ids: Vec<String>,
    /// z-score threshold, kept as the literal the user typed.
    pub z_score_threshold: String,
    /// Selected sample list id, empty when using custom case ids.
    pub selected_sample_list_id: String,
    /// Custom case ids, newline separated.
    pub case_ids: String,
    /// Whether `case_ids` name samples or patients.
    pub case_ids_mode: CaseIdsMode,
    /// Gene symbols / OQL the query runs over.
    pub gene_set: String,
}
