use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::SessionStatus;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerCreate {
    #[serde(alias = "selectedOptionId")]
    #[validate(length(min = 1, message = "selected_option_id must not be empty"))]
    pub(crate) selected_option_id: String,
    #[serde(default, alias = "timeSpentSeconds")]
    #[validate(range(min = 0, message = "time_spent_seconds must be non-negative"))]
    pub(crate) time_spent_seconds: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) status: SessionStatus,
    pub(crate) started_at: String,
    pub(crate) completed_at: Option<String>,
    pub(crate) expires_at: Option<String>,
    pub(crate) current_question_index: i32,
    pub(crate) total_questions: i32,
    pub(crate) time_spent_seconds: i32,
    /// Absent for untimed sessions and after the session stops ticking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) time_remaining_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionOptionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CurrentQuestionResponse {
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) options: Vec<QuestionOptionResponse>,
    pub(crate) question_number: i32,
    pub(crate) total_questions: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) time_remaining_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerReceiptResponse {
    pub(crate) is_last_question: bool,
    pub(crate) next_question_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) result: Option<ResultResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerBreakdownResponse {
    pub(crate) question_id: String,
    pub(crate) question_order: i32,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultResponse {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) assessment_id: String,
    pub(crate) owner_id: String,
    pub(crate) total_questions: i32,
    pub(crate) correct_answers: i32,
    pub(crate) incorrect_answers: i32,
    pub(crate) unanswered_questions: i32,
    pub(crate) total_points: i32,
    pub(crate) earned_points: i32,
    pub(crate) score_percentage: f64,
    pub(crate) is_passed: bool,
    pub(crate) time_spent_seconds: i32,
    pub(crate) completed_at: String,
    /// Per-question breakdown; omitted from listings and hidden from owners
    /// when the definition defers result details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) answers: Option<Vec<AnswerBreakdownResponse>>,
}
