use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AssessmentKind, SessionStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) explanation: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionOption {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Assessment {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) kind: AssessmentKind,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) passing_score_percentage: i32,
    pub(crate) allow_retries: bool,
    pub(crate) show_results_immediately: bool,
    pub(crate) is_published: bool,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AssessmentQuestion {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) question_id: String,
    pub(crate) question_order: i32,
    pub(crate) points: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

/// One position of the question list captured into a session at start time.
/// Definition edits after start never reach a live session through this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub(crate) struct PlanEntry {
    pub(crate) question_id: String,
    pub(crate) question_order: i32,
    pub(crate) points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AssessmentSession {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) owner_id: String,
    pub(crate) status: SessionStatus,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) expires_at: Option<PrimitiveDateTime>,
    pub(crate) current_question_index: i32,
    pub(crate) time_spent_seconds: i32,
    pub(crate) question_plan: Json<Vec<PlanEntry>>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl AssessmentSession {
    pub(crate) fn total_questions(&self) -> i32 {
        self.question_plan.0.len() as i32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SessionAnswer {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) question_id: String,
    pub(crate) question_order: i32,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
    pub(crate) time_spent_seconds: Option<i32>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AssessmentResult {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) owner_id: String,
    pub(crate) assessment_id: String,
    pub(crate) total_questions: i32,
    pub(crate) correct_answers: i32,
    pub(crate) incorrect_answers: i32,
    pub(crate) unanswered_questions: i32,
    pub(crate) total_points: i32,
    pub(crate) earned_points: i32,
    pub(crate) score_percentage: f64,
    pub(crate) is_passed: bool,
    pub(crate) time_spent_seconds: i32,
    pub(crate) completed_at: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
}
