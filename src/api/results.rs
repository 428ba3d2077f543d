use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::assessments::helpers;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::session::ResultResponse;

#[derive(Debug, Deserialize)]
struct ListMyResultsQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/me", get(my_results)).route("/:result_id", get(get_result))
}

async fn my_results(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListMyResultsQuery>,
) -> Result<Json<PaginatedResponse<ResultResponse>>, ApiError> {
    let skip = params.skip.max(0);
    let limit = params.limit.clamp(1, 100);

    let results = repositories::results::list_by_owner(state.db(), &user.sub, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;
    let total_count = repositories::results::count_by_owner(state.db(), &user.sub)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count results"))?;

    let items =
        results.into_iter().map(|result| helpers::result_to_response(result, None)).collect();

    Ok(Json(PaginatedResponse { items, total_count, skip, limit }))
}

async fn get_result(
    Path(result_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ResultResponse>, ApiError> {
    let result = repositories::results::find_by_id(state.db(), &result_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch result"))?;

    let Some(result) = result else {
        return Err(ApiError::NotFound("Result not found".to_string()));
    };

    let is_admin = user.is_admin();
    // Foreign results read as absent, same as foreign sessions.
    if !is_admin && result.owner_id != user.sub {
        return Err(ApiError::NotFound("Result not found".to_string()));
    }

    let assessment = repositories::assessments::find_by_id(state.db(), &result.assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?;
    let breakdown_visible =
        is_admin || assessment.map(|a| a.show_results_immediately).unwrap_or(false);

    let answers = if breakdown_visible {
        let rows = repositories::answers::list_for_session(state.db(), &result.session_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch answers"))?;
        Some(rows)
    } else {
        None
    };

    Ok(Json(helpers::result_to_response(result, answers)))
}
