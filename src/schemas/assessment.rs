use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::AssessmentKind;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssessmentQuestionCreate {
    #[serde(alias = "questionId")]
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub(crate) question_id: String,
    #[serde(alias = "questionOrder")]
    #[validate(range(min = 1, message = "question_order must be positive"))]
    pub(crate) question_order: i32,
    #[serde(default = "default_points")]
    pub(crate) points: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssessmentCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub(crate) description: Option<String>,
    #[serde(default = "default_kind")]
    pub(crate) kind: AssessmentKind,
    #[serde(default, alias = "timeLimitMinutes")]
    pub(crate) time_limit_minutes: Option<i32>,
    #[serde(default, alias = "passingScorePercentage")]
    pub(crate) passing_score_percentage: Option<i32>,
    #[serde(default, alias = "allowRetries")]
    pub(crate) allow_retries: Option<bool>,
    #[serde(default, alias = "showResultsImmediately")]
    pub(crate) show_results_immediately: Option<bool>,
    #[serde(default, alias = "isPublished")]
    pub(crate) is_published: bool,
    #[validate(nested)]
    pub(crate) questions: Vec<AssessmentQuestionCreate>,
}

/// Absent fields stay untouched; `questions` replaces the whole list when
/// present.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssessmentUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub(crate) description: Option<String>,
    #[serde(default, alias = "timeLimitMinutes")]
    pub(crate) time_limit_minutes: Option<i32>,
    #[serde(default, alias = "passingScorePercentage")]
    pub(crate) passing_score_percentage: Option<i32>,
    #[serde(default, alias = "allowRetries")]
    pub(crate) allow_retries: Option<bool>,
    #[serde(default, alias = "showResultsImmediately")]
    pub(crate) show_results_immediately: Option<bool>,
    #[serde(default, alias = "isPublished")]
    pub(crate) is_published: Option<bool>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Option<Vec<AssessmentQuestionCreate>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentQuestionResponse {
    pub(crate) question_id: String,
    pub(crate) question_order: i32,
    pub(crate) points: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) kind: AssessmentKind,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) passing_score_percentage: i32,
    pub(crate) allow_retries: bool,
    pub(crate) show_results_immediately: bool,
    pub(crate) is_published: bool,
    pub(crate) question_count: i64,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    /// Plan rows (ids, order, weights) for admins; never question content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) questions: Option<Vec<AssessmentQuestionResponse>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentSummaryResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) kind: AssessmentKind,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) passing_score_percentage: i32,
    pub(crate) allow_retries: bool,
    pub(crate) is_published: bool,
    pub(crate) question_count: i64,
    pub(crate) created_at: String,
}

fn default_points() -> i32 {
    1
}

fn default_kind() -> AssessmentKind {
    AssessmentKind::Practice
}
