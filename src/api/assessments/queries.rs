use serde::Deserialize;

use crate::db::types::AssessmentKind;

#[derive(Debug, Deserialize)]
pub(super) struct ListAssessmentsQuery {
    #[serde(default)]
    pub(super) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(super) limit: i64,
    #[serde(default)]
    pub(super) kind: Option<AssessmentKind>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListResultsQuery {
    #[serde(default)]
    pub(super) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(super) limit: i64,
}
