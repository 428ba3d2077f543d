use async_trait::async_trait;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{
    Assessment, AssessmentResult, AssessmentSession, PlanEntry, Question, QuestionOption,
    SessionAnswer,
};
use crate::repositories;

use super::store::{
    AnswerWrite, CompleteWrite, DefinitionProvider, NewAnswer, NewResult, NewSession, SessionStore,
    StoreError,
};

/// Production store; atomicity comes from the constraints and conditional
/// updates in the repositories layer.
#[derive(Clone)]
pub(crate) struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DefinitionProvider for PgStore {
    async fn definition(&self, assessment_id: &str) -> Result<Option<Assessment>, StoreError> {
        Ok(repositories::assessments::find_by_id(&self.pool, assessment_id).await?)
    }

    async fn question_plan(&self, assessment_id: &str) -> Result<Vec<PlanEntry>, StoreError> {
        Ok(repositories::assessments::question_plan(&self.pool, assessment_id).await?)
    }

    async fn question_with_options(
        &self,
        question_id: &str,
    ) -> Result<Option<(Question, Vec<QuestionOption>)>, StoreError> {
        let Some(question) = repositories::questions::find_by_id(&self.pool, question_id).await?
        else {
            return Ok(None);
        };
        let options =
            repositories::questions::options_for_question(&self.pool, question_id).await?;
        Ok(Some((question, options)))
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn find_active_session(
        &self,
        owner_id: &str,
        assessment_id: &str,
    ) -> Result<Option<AssessmentSession>, StoreError> {
        Ok(repositories::sessions::find_active(&self.pool, owner_id, assessment_id).await?)
    }

    async fn find_session(
        &self,
        session_id: &str,
    ) -> Result<Option<AssessmentSession>, StoreError> {
        Ok(repositories::sessions::find_by_id(&self.pool, session_id).await?)
    }

    async fn insert_session(
        &self,
        session: NewSession,
    ) -> Result<Option<AssessmentSession>, StoreError> {
        Ok(repositories::sessions::insert_active(
            &self.pool,
            repositories::sessions::CreateSession {
                id: &session.id,
                assessment_id: &session.assessment_id,
                owner_id: &session.owner_id,
                question_plan: &session.question_plan,
                started_at: session.started_at,
                expires_at: session.expires_at,
            },
        )
        .await?)
    }

    async fn has_result(&self, owner_id: &str, assessment_id: &str) -> Result<bool, StoreError> {
        Ok(repositories::results::exists_for(&self.pool, owner_id, assessment_id).await?)
    }

    async fn mark_expired(
        &self,
        session_id: &str,
        now: PrimitiveDateTime,
    ) -> Result<bool, StoreError> {
        Ok(repositories::sessions::mark_expired(&self.pool, session_id, now).await?)
    }

    async fn record_answer(
        &self,
        answer: NewAnswer,
        expected_index: i32,
        now: PrimitiveDateTime,
    ) -> Result<AnswerWrite, StoreError> {
        let written = repositories::sessions::record_answer_and_advance(
            &self.pool,
            repositories::answers::CreateAnswer {
                id: &answer.id,
                session_id: &answer.session_id,
                question_id: &answer.question_id,
                question_order: answer.question_order,
                selected_option_id: answer.selected_option_id.as_deref(),
                is_correct: answer.is_correct,
                points_earned: answer.points_earned,
                time_spent_seconds: answer.time_spent_seconds,
            },
            expected_index,
            now,
        )
        .await?;

        Ok(match written {
            Some(session) => AnswerWrite::Recorded(session),
            None => AnswerWrite::Conflict,
        })
    }

    async fn list_answers(&self, session_id: &str) -> Result<Vec<SessionAnswer>, StoreError> {
        Ok(repositories::answers::list_for_session(&self.pool, session_id).await?)
    }

    async fn complete_session(
        &self,
        session_id: &str,
        result: NewResult,
        now: PrimitiveDateTime,
    ) -> Result<CompleteWrite, StoreError> {
        let written = repositories::sessions::complete_with_result(
            &self.pool,
            session_id,
            repositories::results::CreateResult {
                id: &result.id,
                session_id: &result.session_id,
                owner_id: &result.owner_id,
                assessment_id: &result.assessment_id,
                total_questions: result.total_questions,
                correct_answers: result.correct_answers,
                incorrect_answers: result.incorrect_answers,
                unanswered_questions: result.unanswered_questions,
                total_points: result.total_points,
                earned_points: result.earned_points,
                score_percentage: result.score_percentage,
                is_passed: result.is_passed,
                time_spent_seconds: result.time_spent_seconds,
                completed_at: result.completed_at,
            },
            now,
        )
        .await?;

        Ok(match written {
            Some(result) => CompleteWrite::Completed(result),
            None => CompleteWrite::NotInProgress,
        })
    }
}
