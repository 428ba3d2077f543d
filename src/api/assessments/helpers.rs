use std::collections::HashSet;

use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{Assessment, AssessmentResult, AssessmentSession, PlanEntry, SessionAnswer};
use crate::db::types::AssessmentKind;
use crate::repositories;
use crate::schemas::assessment::{
    AssessmentCreate, AssessmentQuestionCreate, AssessmentQuestionResponse, AssessmentResponse,
    AssessmentSummaryResponse,
};
use crate::schemas::session::{
    AnswerBreakdownResponse, AnswerReceiptResponse, CurrentQuestionResponse,
    QuestionOptionResponse, ResultResponse, SessionResponse,
};
use crate::services::exam_policy::AssessmentPolicy;
use crate::services::sessions::{self, AnswerReceipt, CurrentQuestion};

pub(crate) fn assessment_to_response(
    assessment: Assessment,
    question_count: i64,
    plan: Option<Vec<PlanEntry>>,
) -> AssessmentResponse {
    AssessmentResponse {
        id: assessment.id,
        title: assessment.title,
        description: assessment.description,
        kind: assessment.kind,
        time_limit_minutes: assessment.time_limit_minutes,
        passing_score_percentage: assessment.passing_score_percentage,
        allow_retries: assessment.allow_retries,
        show_results_immediately: assessment.show_results_immediately,
        is_published: assessment.is_published,
        question_count,
        created_by: assessment.created_by,
        created_at: format_primitive(assessment.created_at),
        updated_at: format_primitive(assessment.updated_at),
        questions: plan.map(|entries| {
            entries
                .into_iter()
                .map(|entry| AssessmentQuestionResponse {
                    question_id: entry.question_id,
                    question_order: entry.question_order,
                    points: entry.points,
                })
                .collect()
        }),
    }
}

pub(crate) fn assessment_to_summary(
    assessment: Assessment,
    question_count: i64,
) -> AssessmentSummaryResponse {
    AssessmentSummaryResponse {
        id: assessment.id,
        title: assessment.title,
        kind: assessment.kind,
        time_limit_minutes: assessment.time_limit_minutes,
        passing_score_percentage: assessment.passing_score_percentage,
        allow_retries: assessment.allow_retries,
        is_published: assessment.is_published,
        question_count,
        created_at: format_primitive(assessment.created_at),
    }
}

pub(crate) fn session_to_response(
    session: &AssessmentSession,
    now: PrimitiveDateTime,
) -> SessionResponse {
    SessionResponse {
        id: session.id.clone(),
        assessment_id: session.assessment_id.clone(),
        status: session.status,
        started_at: format_primitive(session.started_at),
        completed_at: session.completed_at.map(format_primitive),
        expires_at: session.expires_at.map(format_primitive),
        current_question_index: session.current_question_index,
        total_questions: session.total_questions(),
        time_spent_seconds: session.time_spent_seconds,
        time_remaining_seconds: sessions::time_remaining(session, now),
    }
}

pub(crate) fn current_question_to_response(question: CurrentQuestion) -> CurrentQuestionResponse {
    CurrentQuestionResponse {
        question_id: question.question_id,
        text: question.text,
        options: question
            .options
            .into_iter()
            .map(|option| QuestionOptionResponse { id: option.id, text: option.text })
            .collect(),
        question_number: question.question_number,
        total_questions: question.total_questions,
        time_remaining_seconds: question.time_remaining_seconds,
    }
}

/// The receipt carries a result summary only; the per-question breakdown is
/// served by the results endpoints where visibility rules apply.
pub(crate) fn receipt_to_response(receipt: AnswerReceipt) -> AnswerReceiptResponse {
    AnswerReceiptResponse {
        is_last_question: receipt.is_last_question,
        next_question_available: receipt.next_question_available,
        result: receipt.result.map(|result| result_to_response(result, None)),
    }
}

pub(crate) fn result_to_response(
    result: AssessmentResult,
    answers: Option<Vec<SessionAnswer>>,
) -> ResultResponse {
    ResultResponse {
        id: result.id,
        session_id: result.session_id,
        assessment_id: result.assessment_id,
        owner_id: result.owner_id,
        total_questions: result.total_questions,
        correct_answers: result.correct_answers,
        incorrect_answers: result.incorrect_answers,
        unanswered_questions: result.unanswered_questions,
        total_points: result.total_points,
        earned_points: result.earned_points,
        score_percentage: result.score_percentage,
        is_passed: result.is_passed,
        time_spent_seconds: result.time_spent_seconds,
        completed_at: format_primitive(result.completed_at),
        answers: answers.map(|rows| {
            rows.into_iter()
                .map(|answer| AnswerBreakdownResponse {
                    question_id: answer.question_id,
                    question_order: answer.question_order,
                    selected_option_id: answer.selected_option_id,
                    is_correct: answer.is_correct,
                    points_earned: answer.points_earned,
                })
                .collect()
        }),
    }
}

/// Creates a definition together with its question plan in one transaction.
/// Shared by generic authoring and the exam endpoint, which pins the kind.
pub(crate) async fn create_definition(
    state: &AppState,
    created_by: &str,
    kind: AssessmentKind,
    payload: AssessmentCreate,
) -> Result<AssessmentResponse, ApiError> {
    let policy = AssessmentPolicy::for_kind(kind);
    validate_plan_rules(&policy, &payload.questions)?;
    policy.validate_time_limit(payload.time_limit_minutes).map_err(ApiError::BadRequest)?;

    let passing_score = payload
        .passing_score_percentage
        .unwrap_or_else(|| policy.default_passing_score());
    policy.validate_passing_score(passing_score).map_err(ApiError::BadRequest)?;

    ensure_questions_exist(state, &payload.questions).await?;

    let now = primitive_now_utc();
    let assessment_id = Uuid::new_v4().to_string();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let assessment = repositories::assessments::create(
        &mut *tx,
        repositories::assessments::CreateAssessment {
            id: &assessment_id,
            title: &payload.title,
            description: payload.description.as_deref(),
            kind,
            time_limit_minutes: payload.time_limit_minutes,
            passing_score_percentage: passing_score,
            allow_retries: payload
                .allow_retries
                .unwrap_or_else(|| policy.default_allow_retries()),
            show_results_immediately: payload
                .show_results_immediately
                .unwrap_or_else(|| policy.default_show_results()),
            is_published: payload.is_published,
            created_by,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assessment"))?;

    link_plan(&mut tx, &assessment.id, &payload.questions, now).await?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        admin_id = %created_by,
        assessment_id = %assessment.id,
        kind = ?kind,
        action = "assessment_create",
        "Assessment created"
    );

    let question_count = payload.questions.len() as i64;
    Ok(assessment_to_response(assessment, question_count, Some(to_plan_rows(payload.questions))))
}

/// Paginated summary listing; students only see published definitions.
pub(crate) async fn list_definitions(
    state: &AppState,
    kind: Option<AssessmentKind>,
    is_admin: bool,
    skip: i64,
    limit: i64,
) -> Result<PaginatedResponse<AssessmentSummaryResponse>, ApiError> {
    let skip = skip.max(0);
    let limit = limit.clamp(1, 100);
    let published_only = !is_admin;

    let assessments =
        repositories::assessments::list(state.db(), kind, published_only, skip, limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list assessments"))?;
    let total_count = repositories::assessments::count(state.db(), kind, published_only)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count assessments"))?;

    let mut items = Vec::with_capacity(assessments.len());
    for assessment in assessments {
        let question_count = repositories::assessments::question_count(state.db(), &assessment.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
        items.push(assessment_to_summary(assessment, question_count));
    }

    Ok(PaginatedResponse { items, total_count, skip, limit })
}

pub(crate) fn validate_plan_rules(
    policy: &AssessmentPolicy,
    questions: &[AssessmentQuestionCreate],
) -> Result<(), ApiError> {
    policy.validate_question_count(questions.len()).map_err(ApiError::BadRequest)?;

    let mut orders = HashSet::new();
    let mut ids = HashSet::new();
    for question in questions {
        policy.validate_points(question.points).map_err(ApiError::BadRequest)?;
        if !orders.insert(question.question_order) {
            return Err(ApiError::BadRequest(format!(
                "Duplicate question order {}",
                question.question_order
            )));
        }
        if !ids.insert(question.question_id.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Duplicate question id {}",
                question.question_id
            )));
        }
    }

    Ok(())
}

pub(crate) async fn ensure_questions_exist(
    state: &AppState,
    questions: &[AssessmentQuestionCreate],
) -> Result<(), ApiError> {
    let ids: Vec<String> = questions.iter().map(|q| q.question_id.clone()).collect();
    let existing = repositories::questions::count_existing(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to verify questions"))?;

    if existing != ids.len() as i64 {
        return Err(ApiError::BadRequest(
            "One or more questions do not exist in the question bank".to_string(),
        ));
    }

    Ok(())
}

pub(crate) async fn link_plan(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    assessment_id: &str,
    questions: &[AssessmentQuestionCreate],
    now: PrimitiveDateTime,
) -> Result<(), ApiError> {
    for question in questions {
        let link_id = Uuid::new_v4().to_string();
        repositories::assessments::link_question(
            &mut **tx,
            repositories::assessments::LinkQuestion {
                id: &link_id,
                assessment_id,
                question_id: &question.question_id,
                question_order: question.question_order,
                points: question.points,
                now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to attach question"))?;
    }

    Ok(())
}

fn to_plan_rows(questions: Vec<AssessmentQuestionCreate>) -> Vec<PlanEntry> {
    let mut rows: Vec<PlanEntry> = questions
        .into_iter()
        .map(|question| PlanEntry {
            question_id: question.question_id,
            question_order: question.question_order,
            points: question.points,
        })
        .collect();
    rows.sort_by_key(|row| row.question_order);
    rows
}
