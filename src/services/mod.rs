pub(crate) mod eligibility;
pub(crate) mod exam_policy;
pub(crate) mod scoring;
pub(crate) mod sessions;
pub(crate) mod statistics;
