use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::types::Json;
use time::PrimitiveDateTime;

use crate::db::models::{
    Assessment, AssessmentResult, AssessmentSession, PlanEntry, Question, QuestionOption,
    SessionAnswer,
};
use crate::db::types::SessionStatus;

use super::store::{
    AnswerWrite, CompleteWrite, DefinitionProvider, NewAnswer, NewResult, NewSession, SessionStore,
    StoreError,
};

/// In-memory store with the same atomicity guarantees as the Postgres one,
/// provided by a single mutex instead of row-level constraints. Serves the
/// lifecycle and race tests.
#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    assessments: HashMap<String, Assessment>,
    plans: HashMap<String, Vec<PlanEntry>>,
    questions: HashMap<String, (Question, Vec<QuestionOption>)>,
    sessions: HashMap<String, AssessmentSession>,
    answers: Vec<SessionAnswer>,
    results: Vec<AssessmentResult>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put_assessment(&self, assessment: Assessment) {
        let mut inner = self.lock();
        inner.assessments.insert(assessment.id.clone(), assessment);
    }

    pub(crate) fn put_question(&self, question: Question, options: Vec<QuestionOption>) {
        let mut inner = self.lock();
        inner.questions.insert(question.id.clone(), (question, options));
    }

    pub(crate) fn put_plan(&self, assessment_id: &str, plan: Vec<PlanEntry>) {
        let mut inner = self.lock();
        inner.plans.insert(assessment_id.to_string(), plan);
    }

    pub(crate) fn session(&self, session_id: &str) -> Option<AssessmentSession> {
        self.lock().sessions.get(session_id).cloned()
    }

    pub(crate) fn results_for(&self, session_id: &str) -> Vec<AssessmentResult> {
        self.lock()
            .results
            .iter()
            .filter(|result| result.session_id == session_id)
            .cloned()
            .collect()
    }

    pub(crate) fn answers_for(&self, session_id: &str) -> Vec<SessionAnswer> {
        let mut answers: Vec<_> = self
            .lock()
            .answers
            .iter()
            .filter(|answer| answer.session_id == session_id)
            .cloned()
            .collect();
        answers.sort_by_key(|answer| answer.question_order);
        answers
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }
}

#[async_trait]
impl DefinitionProvider for MemoryStore {
    async fn definition(&self, assessment_id: &str) -> Result<Option<Assessment>, StoreError> {
        Ok(self.lock().assessments.get(assessment_id).cloned())
    }

    async fn question_plan(&self, assessment_id: &str) -> Result<Vec<PlanEntry>, StoreError> {
        let mut plan = self.lock().plans.get(assessment_id).cloned().unwrap_or_default();
        plan.sort_by_key(|entry| entry.question_order);
        Ok(plan)
    }

    async fn question_with_options(
        &self,
        question_id: &str,
    ) -> Result<Option<(Question, Vec<QuestionOption>)>, StoreError> {
        let found = self.lock().questions.get(question_id).cloned();
        Ok(found.map(|(question, mut options)| {
            options.sort_by_key(|option| option.order_index);
            (question, options)
        }))
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_active_session(
        &self,
        owner_id: &str,
        assessment_id: &str,
    ) -> Result<Option<AssessmentSession>, StoreError> {
        Ok(self
            .lock()
            .sessions
            .values()
            .find(|session| {
                session.owner_id == owner_id
                    && session.assessment_id == assessment_id
                    && session.status == SessionStatus::InProgress
            })
            .cloned())
    }

    async fn find_session(
        &self,
        session_id: &str,
    ) -> Result<Option<AssessmentSession>, StoreError> {
        Ok(self.lock().sessions.get(session_id).cloned())
    }

    async fn insert_session(
        &self,
        session: NewSession,
    ) -> Result<Option<AssessmentSession>, StoreError> {
        let mut inner = self.lock();
        let already_active = inner.sessions.values().any(|existing| {
            existing.owner_id == session.owner_id
                && existing.assessment_id == session.assessment_id
                && existing.status == SessionStatus::InProgress
        });
        if already_active {
            return Ok(None);
        }

        let row = AssessmentSession {
            id: session.id.clone(),
            assessment_id: session.assessment_id,
            owner_id: session.owner_id,
            status: SessionStatus::InProgress,
            started_at: session.started_at,
            completed_at: None,
            expires_at: session.expires_at,
            current_question_index: 0,
            time_spent_seconds: 0,
            question_plan: Json(session.question_plan),
            created_at: session.started_at,
            updated_at: session.started_at,
        };
        inner.sessions.insert(session.id, row.clone());
        Ok(Some(row))
    }

    async fn has_result(&self, owner_id: &str, assessment_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .results
            .iter()
            .any(|result| result.owner_id == owner_id && result.assessment_id == assessment_id))
    }

    async fn mark_expired(
        &self,
        session_id: &str,
        now: PrimitiveDateTime,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        match inner.sessions.get_mut(session_id) {
            Some(session) if session.status == SessionStatus::InProgress => {
                session.status = SessionStatus::Expired;
                session.completed_at = Some(now);
                session.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_answer(
        &self,
        answer: NewAnswer,
        expected_index: i32,
        now: PrimitiveDateTime,
    ) -> Result<AnswerWrite, StoreError> {
        let mut inner = self.lock();

        let duplicate = inner.answers.iter().any(|existing| {
            existing.session_id == answer.session_id
                && (existing.question_order == answer.question_order
                    || existing.question_id == answer.question_id)
        });
        if duplicate {
            return Ok(AnswerWrite::Conflict);
        }

        let Some(session) = inner.sessions.get_mut(&answer.session_id) else {
            return Ok(AnswerWrite::Conflict);
        };
        if session.status != SessionStatus::InProgress
            || session.current_question_index != expected_index
        {
            return Ok(AnswerWrite::Conflict);
        }

        session.current_question_index += 1;
        session.time_spent_seconds += answer.time_spent_seconds.unwrap_or(0);
        session.updated_at = now;
        let updated = session.clone();

        inner.answers.push(SessionAnswer {
            id: answer.id,
            session_id: answer.session_id,
            question_id: answer.question_id,
            question_order: answer.question_order,
            selected_option_id: answer.selected_option_id,
            is_correct: answer.is_correct,
            points_earned: answer.points_earned,
            time_spent_seconds: answer.time_spent_seconds,
            created_at: now,
        });

        Ok(AnswerWrite::Recorded(updated))
    }

    async fn list_answers(&self, session_id: &str) -> Result<Vec<SessionAnswer>, StoreError> {
        let mut answers: Vec<_> = self
            .lock()
            .answers
            .iter()
            .filter(|answer| answer.session_id == session_id)
            .cloned()
            .collect();
        answers.sort_by_key(|answer| answer.question_order);
        Ok(answers)
    }

    async fn complete_session(
        &self,
        session_id: &str,
        result: NewResult,
        now: PrimitiveDateTime,
    ) -> Result<CompleteWrite, StoreError> {
        let mut inner = self.lock();

        let Some(session) = inner.sessions.get_mut(session_id) else {
            return Ok(CompleteWrite::NotInProgress);
        };
        if session.status != SessionStatus::InProgress {
            return Ok(CompleteWrite::NotInProgress);
        }

        session.status = SessionStatus::Completed;
        session.completed_at = Some(now);
        session.updated_at = now;

        let row = AssessmentResult {
            id: result.id,
            session_id: result.session_id,
            owner_id: result.owner_id,
            assessment_id: result.assessment_id,
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
            created_at: now,
        };
        inner.results.push(row.clone());

        Ok(CompleteWrite::Completed(row))
    }
}
