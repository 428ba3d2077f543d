use axum::{extract::Query, Json};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::assessment::{AssessmentCreate, AssessmentResponse, AssessmentUpdate};
use crate::schemas::session::ResultResponse;
use crate::services::exam_policy::AssessmentPolicy;

use super::helpers;
use super::queries::{ListAssessmentsQuery, ListResultsQuery};

pub(super) async fn create_assessment(
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AssessmentCreate>,
) -> Result<(axum::http::StatusCode, Json<AssessmentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let kind = payload.kind;
    let response = helpers::create_definition(&state, &admin.sub, kind, payload).await?;

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

pub(super) async fn list_assessments(
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Query(params): Query<ListAssessmentsQuery>,
) -> Result<Json<PaginatedResponse<crate::schemas::assessment::AssessmentSummaryResponse>>, ApiError>
{
    let page =
        helpers::list_definitions(&state, params.kind, user.is_admin(), params.skip, params.limit)
            .await?;

    Ok(Json(page))
}

pub(super) async fn get_assessment(
    axum::extract::Path(assessment_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    let assessment = repositories::assessments::find_by_id(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?;

    let Some(assessment) = assessment else {
        return Err(ApiError::NotFound("Assessment not found".to_string()));
    };

    if !assessment.is_published && !user.is_admin() {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    let question_count = repositories::assessments::question_count(state.db(), &assessment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    let plan = if user.is_admin() {
        let entries = repositories::assessments::question_plan(state.db(), &assessment.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch question plan"))?;
        Some(entries)
    } else {
        None
    };

    Ok(Json(helpers::assessment_to_response(assessment, question_count, plan)))
}

pub(super) async fn update_assessment(
    axum::extract::Path(assessment_id): axum::extract::Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AssessmentUpdate>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let assessment = repositories::assessments::find_by_id(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?;

    let Some(mut assessment) = assessment else {
        return Err(ApiError::NotFound("Assessment not found".to_string()));
    };

    let busy = repositories::assessments::has_in_progress_sessions(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check live sessions"))?;
    if busy {
        return Err(ApiError::Conflict(
            "Assessment has in-progress sessions and cannot be modified".to_string(),
        ));
    }

    if let Some(title) = payload.title {
        assessment.title = title;
    }
    if let Some(description) = payload.description {
        assessment.description = Some(description);
    }
    if let Some(limit) = payload.time_limit_minutes {
        assessment.time_limit_minutes = Some(limit);
    }
    if let Some(score) = payload.passing_score_percentage {
        assessment.passing_score_percentage = score;
    }
    if let Some(allow) = payload.allow_retries {
        assessment.allow_retries = allow;
    }
    if let Some(show) = payload.show_results_immediately {
        assessment.show_results_immediately = show;
    }
    if let Some(published) = payload.is_published {
        assessment.is_published = published;
    }

    // The kind never changes, so the merged row is re-checked against the
    // same policy that admitted it.
    let policy = AssessmentPolicy::for_kind(assessment.kind);
    policy.validate_time_limit(assessment.time_limit_minutes).map_err(ApiError::BadRequest)?;
    policy
        .validate_passing_score(assessment.passing_score_percentage)
        .map_err(ApiError::BadRequest)?;

    if let Some(questions) = &payload.questions {
        helpers::validate_plan_rules(&policy, questions)?;
        helpers::ensure_questions_exist(&state, questions).await?;
    }

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let updated = repositories::assessments::update(&mut *tx, &assessment, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update assessment"))?;

    if let Some(questions) = &payload.questions {
        repositories::assessments::unlink_questions(&mut *tx, &assessment_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to detach questions"))?;
        helpers::link_plan(&mut tx, &assessment_id, questions, now).await?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        admin_id = %admin.sub,
        assessment_id = %updated.id,
        action = "assessment_update",
        "Assessment updated"
    );

    let question_count = repositories::assessments::question_count(state.db(), &updated.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
    let plan = repositories::assessments::question_plan(state.db(), &updated.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question plan"))?;

    Ok(Json(helpers::assessment_to_response(updated, question_count, Some(plan))))
}

pub(super) async fn delete_assessment(
    axum::extract::Path(assessment_id): axum::extract::Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let assessment = repositories::assessments::find_by_id(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?;

    if assessment.is_none() {
        return Err(ApiError::NotFound("Assessment not found".to_string()));
    }

    let referenced = repositories::assessments::has_sessions(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check sessions"))?;
    if referenced {
        return Err(ApiError::Conflict(
            "Assessment has recorded sessions and cannot be deleted".to_string(),
        ));
    }

    let deleted = repositories::assessments::delete(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete assessment"))?;
    if !deleted {
        return Err(ApiError::NotFound("Assessment not found".to_string()));
    }

    tracing::info!(
        admin_id = %admin.sub,
        assessment_id = %assessment_id,
        action = "assessment_delete",
        "Assessment deleted"
    );

    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub(super) async fn list_assessment_results(
    axum::extract::Path(assessment_id): axum::extract::Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Query(params): Query<ListResultsQuery>,
) -> Result<Json<PaginatedResponse<ResultResponse>>, ApiError> {
    let assessment = repositories::assessments::find_by_id(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?;

    if assessment.is_none() {
        return Err(ApiError::NotFound("Assessment not found".to_string()));
    }

    let skip = params.skip.max(0);
    let limit = params.limit.clamp(1, 100);

    let results =
        repositories::results::list_by_assessment(state.db(), &assessment_id, skip, limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list results"))?;
    let total_count = repositories::results::count_by_assessment(state.db(), &assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count results"))?;

    let items =
        results.into_iter().map(|result| helpers::result_to_response(result, None)).collect();

    Ok(Json(PaginatedResponse { items, total_count, skip, limit }))
}
