use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::time::Clock;
use crate::db::models::{AssessmentResult, AssessmentSession, QuestionOption};
use crate::db::types::SessionStatus;
use crate::services::eligibility::{can_start, StartDecision};
use crate::services::scoring::score_session;

pub(crate) mod pg;
pub(crate) mod store;

#[cfg(test)]
pub(crate) mod memory;

use store::{
    AnswerWrite, CompleteWrite, DefinitionProvider, NewAnswer, NewResult, NewSession, SessionStore,
    StoreError,
};

#[derive(Debug, thiserror::Error)]
pub(crate) enum SessionError {
    #[error("Assessment not found")]
    AssessmentNotFound,
    #[error("Assessment is not available")]
    NotPublished,
    #[error("You already have an active session for this assessment")]
    ActiveSessionExists,
    #[error("Retries are not allowed for this assessment")]
    RetriesNotAllowed,
    #[error("Assessment has no questions")]
    NoQuestions,
    #[error("No active session for this assessment")]
    NoActiveSession,
    #[error("Session not found")]
    SessionNotFound,
    #[error("Session has expired")]
    Expired,
    #[error("Session is not in progress")]
    NotInProgress,
    #[error("All questions have been answered")]
    AllAnswered,
    #[error("Selected option does not belong to the current question")]
    OptionMismatch,
    #[error("Answer already submitted for this question")]
    SubmissionConflict,
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An option as shown to the person taking the test. Correctness never
/// crosses this boundary while the session is live.
#[derive(Debug, Clone)]
pub(crate) struct PublicOption {
    pub(crate) id: String,
    pub(crate) text: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CurrentQuestion {
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) options: Vec<PublicOption>,
    /// 1-based position for display.
    pub(crate) question_number: i32,
    pub(crate) total_questions: i32,
    pub(crate) time_remaining_seconds: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct AnswerSubmission {
    pub(crate) selected_option_id: String,
    pub(crate) time_spent_seconds: Option<i32>,
}

#[derive(Debug)]
pub(crate) struct AnswerReceipt {
    pub(crate) is_last_question: bool,
    pub(crate) next_question_available: bool,
    /// Present when this answer closed out the session.
    pub(crate) result: Option<AssessmentResult>,
}

/// Starts an attempt at a published assessment. The uniqueness of the live
/// session is enforced twice: the eligibility check gives a friendly answer
/// for the common case, and the store insert fails closed when two starts
/// race past it.
pub(crate) async fn start_session<S>(
    store: &S,
    clock: &dyn Clock,
    owner_id: &str,
    assessment_id: &str,
) -> Result<AssessmentSession, SessionError>
where
    S: DefinitionProvider + SessionStore,
{
    let assessment = store
        .definition(assessment_id)
        .await?
        .ok_or(SessionError::AssessmentNotFound)?;

    let active = live_session(store, clock, owner_id, assessment_id).await?;
    let has_active = active.as_ref().is_some_and(|s| s.status == SessionStatus::InProgress);
    let has_prior = store.has_result(owner_id, assessment_id).await?;

    match can_start(&assessment, has_active, has_prior) {
        StartDecision::Allow => {}
        StartDecision::NotPublished => return Err(SessionError::NotPublished),
        StartDecision::ActiveSessionExists => return Err(SessionError::ActiveSessionExists),
        StartDecision::RetriesNotAllowed => return Err(SessionError::RetriesNotAllowed),
    }

    let plan = store.question_plan(assessment_id).await?;
    if plan.is_empty() {
        return Err(SessionError::NoQuestions);
    }

    let now = clock.now();
    let expires_at = assessment
        .time_limit_minutes
        .map(|minutes| now + time::Duration::minutes(i64::from(minutes)));

    let inserted = store
        .insert_session(NewSession {
            id: Uuid::new_v4().to_string(),
            assessment_id: assessment_id.to_string(),
            owner_id: owner_id.to_string(),
            question_plan: plan,
            started_at: now,
            expires_at,
        })
        .await?;

    match inserted {
        Some(session) => {
            metrics::counter!("assessment_sessions_started_total").increment(1);
            tracing::info!(
                session_id = %session.id,
                assessment_id = %assessment_id,
                owner_id = %owner_id,
                "Started assessment session"
            );
            Ok(session)
        }
        None => Err(SessionError::ActiveSessionExists),
    }
}

/// The caller's session for this assessment with lazy expiry applied. A
/// session that expired on this very access is returned once in its
/// terminal state so the client can see what happened to it.
pub(crate) async fn active_session<S>(
    store: &S,
    clock: &dyn Clock,
    owner_id: &str,
    assessment_id: &str,
) -> Result<AssessmentSession, SessionError>
where
    S: DefinitionProvider + SessionStore,
{
    if store.definition(assessment_id).await?.is_none() {
        return Err(SessionError::AssessmentNotFound);
    }

    live_session(store, clock, owner_id, assessment_id)
        .await?
        .ok_or(SessionError::NoActiveSession)
}

pub(crate) async fn current_question<S>(
    store: &S,
    clock: &dyn Clock,
    owner_id: &str,
    assessment_id: &str,
) -> Result<CurrentQuestion, SessionError>
where
    S: DefinitionProvider + SessionStore,
{
    let session = in_progress_session(store, clock, owner_id, assessment_id).await?;

    let index = session.current_question_index;
    let total = session.total_questions();
    if index >= total {
        return Err(SessionError::AllAnswered);
    }

    let entry = &session.question_plan.0[index as usize];
    let (question, options) = store
        .question_with_options(&entry.question_id)
        .await?
        .ok_or_else(|| {
            SessionError::Invalid(format!("Question {} missing from the bank", entry.question_id))
        })?;

    Ok(CurrentQuestion {
        question_id: question.id,
        text: question.text,
        options: options.into_iter().map(public_option).collect(),
        question_number: index + 1,
        total_questions: total,
        time_remaining_seconds: time_remaining(&session, clock.now()),
    })
}

/// Records the answer for the question at the server-side cursor and
/// advances it by one. The position is never taken from the client, so a
/// stale tab can neither skip ahead nor overwrite an earlier answer. When
/// the advanced cursor reaches the end of the plan the session is completed
/// in the same call.
pub(crate) async fn submit_answer<S>(
    store: &S,
    clock: &dyn Clock,
    owner_id: &str,
    assessment_id: &str,
    submission: AnswerSubmission,
) -> Result<AnswerReceipt, SessionError>
where
    S: DefinitionProvider + SessionStore,
{
    let session = in_progress_session(store, clock, owner_id, assessment_id).await?;

    let index = session.current_question_index;
    let total = session.total_questions();
    if index >= total {
        return Err(SessionError::AllAnswered);
    }

    let entry = session.question_plan.0[index as usize].clone();
    let (_, options) = store
        .question_with_options(&entry.question_id)
        .await?
        .ok_or_else(|| {
            SessionError::Invalid(format!("Question {} missing from the bank", entry.question_id))
        })?;

    let selected = options
        .iter()
        .find(|option| option.id == submission.selected_option_id)
        .ok_or(SessionError::OptionMismatch)?;

    let points_earned = if selected.is_correct { entry.points } else { 0 };
    let answer = NewAnswer {
        id: Uuid::new_v4().to_string(),
        session_id: session.id.clone(),
        question_id: entry.question_id,
        question_order: entry.question_order,
        selected_option_id: Some(submission.selected_option_id),
        is_correct: selected.is_correct,
        points_earned,
        time_spent_seconds: submission.time_spent_seconds,
    };

    let now = clock.now();
    // One bounded retry absorbs transient store conflicts; a conflict that
    // persists means this position was already answered.
    let mut updated = None;
    for _ in 0..2 {
        match store.record_answer(answer.clone(), index, now).await? {
            AnswerWrite::Recorded(session) => {
                updated = Some(session);
                break;
            }
            AnswerWrite::Conflict => {}
        }
    }
    let updated = updated.ok_or(SessionError::SubmissionConflict)?;

    let is_last = updated.current_question_index >= total;
    let mut result = None;
    if is_last {
        match finalize(store, &updated, clock.now()).await? {
            CompleteWrite::Completed(r) => result = Some(r),
            CompleteWrite::NotInProgress => {
                tracing::warn!(
                    session_id = %updated.id,
                    "Session was completed concurrently; keeping the existing result"
                );
            }
        }
    }

    Ok(AnswerReceipt {
        is_last_question: is_last,
        next_question_available: !is_last,
        result,
    })
}

/// Explicit completion of a session by its owner. Works on overdue sessions
/// too: force-completing scores partial credit for what was answered instead
/// of discarding the attempt.
pub(crate) async fn complete_session<S>(
    store: &S,
    clock: &dyn Clock,
    owner_id: &str,
    session_id: &str,
) -> Result<AssessmentResult, SessionError>
where
    S: DefinitionProvider + SessionStore,
{
    let session = store
        .find_session(session_id)
        .await?
        .ok_or(SessionError::SessionNotFound)?;
    if session.owner_id != owner_id {
        // Foreign sessions are indistinguishable from absent ones.
        return Err(SessionError::SessionNotFound);
    }
    if session.status != SessionStatus::InProgress {
        return Err(SessionError::NotInProgress);
    }

    match finalize(store, &session, clock.now()).await? {
        CompleteWrite::Completed(result) => Ok(result),
        CompleteWrite::NotInProgress => Err(SessionError::NotInProgress),
    }
}

/// Scores the session and flips it to completed. The status check inside the
/// store decides the winner when the auto-complete path and a manual call
/// race; exactly one of them persists a result.
async fn finalize<S>(
    store: &S,
    session: &AssessmentSession,
    now: PrimitiveDateTime,
) -> Result<CompleteWrite, SessionError>
where
    S: DefinitionProvider + SessionStore,
{
    let assessment = store.definition(&session.assessment_id).await?.ok_or_else(|| {
        SessionError::Invalid(format!(
            "Assessment {} vanished before completion",
            session.assessment_id
        ))
    })?;

    let answers = store.list_answers(&session.id).await?;
    let breakdown = score_session(
        &session.question_plan.0,
        assessment.passing_score_percentage,
        &answers,
    );

    let write = store
        .complete_session(
            &session.id,
            NewResult {
                id: Uuid::new_v4().to_string(),
                session_id: session.id.clone(),
                owner_id: session.owner_id.clone(),
                assessment_id: session.assessment_id.clone(),
                total_questions: breakdown.total_questions,
                correct_answers: breakdown.correct_answers,
                incorrect_answers: breakdown.incorrect_answers,
                unanswered_questions: breakdown.unanswered_questions,
                total_points: breakdown.total_points,
                earned_points: breakdown.earned_points,
                score_percentage: breakdown.score_percentage,
                is_passed: breakdown.is_passed,
                time_spent_seconds: session.time_spent_seconds,
                completed_at: now,
            },
            now,
        )
        .await?;

    if let CompleteWrite::Completed(result) = &write {
        metrics::counter!("assessment_sessions_completed_total").increment(1);
        if result.is_passed {
            metrics::counter!("assessment_results_passed_total").increment(1);
        }
        tracing::info!(
            session_id = %session.id,
            score = result.score_percentage,
            passed = result.is_passed,
            "Completed assessment session"
        );
    }

    Ok(write)
}

/// Owner's session for an assessment after lazy expiry. `None` when no
/// in-progress row exists at all.
async fn live_session<S>(
    store: &S,
    clock: &dyn Clock,
    owner_id: &str,
    assessment_id: &str,
) -> Result<Option<AssessmentSession>, SessionError>
where
    S: SessionStore,
{
    match store.find_active_session(owner_id, assessment_id).await? {
        Some(session) => Ok(Some(refresh_expiry(store, clock, session).await?)),
        None => Ok(None),
    }
}

/// Like `live_session` but demands a session that is still running.
async fn in_progress_session<S>(
    store: &S,
    clock: &dyn Clock,
    owner_id: &str,
    assessment_id: &str,
) -> Result<AssessmentSession, SessionError>
where
    S: SessionStore,
{
    let session = live_session(store, clock, owner_id, assessment_id)
        .await?
        .ok_or(SessionError::NoActiveSession)?;
    if session.status != SessionStatus::InProgress {
        return Err(SessionError::Expired);
    }
    Ok(session)
}

/// Flips an overdue in-progress session to expired before anyone acts on it.
/// Losing the flip to a concurrent completion is fine; the re-read then
/// reports whatever terminal state won.
async fn refresh_expiry<S>(
    store: &S,
    clock: &dyn Clock,
    session: AssessmentSession,
) -> Result<AssessmentSession, SessionError>
where
    S: SessionStore,
{
    let now = clock.now();
    let overdue = session.status == SessionStatus::InProgress
        && session.expires_at.is_some_and(|expires_at| now > expires_at);
    if !overdue {
        return Ok(session);
    }

    if store.mark_expired(&session.id, now).await? {
        metrics::counter!("assessment_sessions_expired_total").increment(1);
        tracing::info!(session_id = %session.id, "Session expired");
        let mut expired = session;
        expired.status = SessionStatus::Expired;
        expired.completed_at = Some(now);
        expired.updated_at = now;
        Ok(expired)
    } else {
        store
            .find_session(&session.id)
            .await?
            .ok_or(SessionError::SessionNotFound)
    }
}

/// Whole seconds until the deadline, floored at zero. `None` for untimed
/// sessions and for sessions that already stopped ticking.
pub(crate) fn time_remaining(session: &AssessmentSession, now: PrimitiveDateTime) -> Option<i64> {
    if session.status.is_terminal() {
        return None;
    }
    session.expires_at.map(|expires_at| (expires_at - now).whole_seconds().max(0))
}

fn public_option(option: QuestionOption) -> PublicOption {
    PublicOption { id: option.id, text: option.text }
}
