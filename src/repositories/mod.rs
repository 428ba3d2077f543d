pub(crate) mod answers;
pub(crate) mod assessments;
pub(crate) mod questions;
pub(crate) mod results;
pub(crate) mod sessions;
