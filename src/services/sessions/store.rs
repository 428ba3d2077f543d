use async_trait::async_trait;
use time::PrimitiveDateTime;

use crate::db::models::{
    Assessment, AssessmentResult, AssessmentSession, PlanEntry, Question, QuestionOption,
    SessionAnswer,
};

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Row to insert when a session starts. The store assigns `in_progress`
/// status and zeroed progress counters.
#[derive(Debug, Clone)]
pub(crate) struct NewSession {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) owner_id: String,
    pub(crate) question_plan: Vec<PlanEntry>,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) expires_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewAnswer {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) question_id: String,
    pub(crate) question_order: i32,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
    pub(crate) time_spent_seconds: Option<i32>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewResult {
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
}

/// Outcome of a guarded answer write. `Conflict` means the session moved
/// on while this request was in flight: either the same question was
/// answered twice or the progress check failed.
#[derive(Debug)]
pub(crate) enum AnswerWrite {
    Recorded(AssessmentSession),
    Conflict,
}

/// Outcome of the completion flip. `NotInProgress` is returned when the
/// status check fails, which covers the lost half of a completion race.
#[derive(Debug)]
pub(crate) enum CompleteWrite {
    Completed(AssessmentResult),
    NotInProgress,
}

/// Read side of the catalog an attempt runs against.
#[async_trait]
pub(crate) trait DefinitionProvider: Send + Sync {
    async fn definition(&self, assessment_id: &str) -> Result<Option<Assessment>, StoreError>;

    /// Ordered question list with per-question points, ready to snapshot.
    async fn question_plan(&self, assessment_id: &str) -> Result<Vec<PlanEntry>, StoreError>;

    /// Question text plus its options in display order.
    async fn question_with_options(
        &self,
        question_id: &str,
    ) -> Result<Option<(Question, Vec<QuestionOption>)>, StoreError>;
}

/// Persistence seam for attempt state. Every mutating method is a single
/// atomic step; the lifecycle logic layers its checks on top of these.
#[async_trait]
pub(crate) trait SessionStore: Send + Sync {
    async fn find_active_session(
        &self,
        owner_id: &str,
        assessment_id: &str,
    ) -> Result<Option<AssessmentSession>, StoreError>;

    async fn find_session(&self, session_id: &str)
        -> Result<Option<AssessmentSession>, StoreError>;

    /// Insert honoring the one-active-session rule. Returns `None` when an
    /// in-progress row for the same owner and assessment already exists.
    async fn insert_session(
        &self,
        session: NewSession,
    ) -> Result<Option<AssessmentSession>, StoreError>;

    async fn has_result(&self, owner_id: &str, assessment_id: &str) -> Result<bool, StoreError>;

    /// Flip an in-progress session to expired. Returns `false` when the
    /// session was not in progress anymore, so racing sweeps stay idempotent.
    async fn mark_expired(
        &self,
        session_id: &str,
        now: PrimitiveDateTime,
    ) -> Result<bool, StoreError>;

    /// Record one answer and advance the cursor in the same step. The write
    /// only lands if the session is still in progress at `expected_index`.
    async fn record_answer(
        &self,
        answer: NewAnswer,
        expected_index: i32,
        now: PrimitiveDateTime,
    ) -> Result<AnswerWrite, StoreError>;

    async fn list_answers(&self, session_id: &str) -> Result<Vec<SessionAnswer>, StoreError>;

    /// Flip an in-progress session to completed and persist its result in
    /// one atomic step.
    async fn complete_session(
        &self,
        session_id: &str,
        result: NewResult,
        now: PrimitiveDateTime,
    ) -> Result<CompleteWrite, StoreError>;
}
