use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::assessments::helpers;
use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::db::types::AssessmentKind;
use crate::repositories;
use crate::schemas::assessment::{AssessmentCreate, AssessmentResponse, AssessmentSummaryResponse};
use crate::services::statistics::{self, AssessmentStatistics};

#[derive(Debug, Deserialize)]
struct ListExamsQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_exam).get(list_exams))
        .route("/:exam_id/statistics", get(exam_statistics))
}

/// Exam authoring is regular assessment authoring with the kind pinned, so
/// the stricter exam policy is applied no matter what the payload claims.
async fn create_exam(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AssessmentCreate>,
) -> Result<(StatusCode, Json<AssessmentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let response =
        helpers::create_definition(&state, &admin.sub, AssessmentKind::Exam, payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListExamsQuery>,
) -> Result<Json<PaginatedResponse<AssessmentSummaryResponse>>, ApiError> {
    let page = helpers::list_definitions(
        &state,
        Some(AssessmentKind::Exam),
        user.is_admin(),
        params.skip,
        params.limit,
    )
    .await?;

    Ok(Json(page))
}

async fn exam_statistics(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<AssessmentStatistics>, ApiError> {
    let assessment = repositories::assessments::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

    let is_exam = assessment.map(|a| a.kind == AssessmentKind::Exam).unwrap_or(false);
    if !is_exam {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    let stats = statistics::assessment_statistics(&state, &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute statistics"))?;

    Ok(Json(stats))
}
