use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};

use crate::api::assessments::helpers;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::SystemClock;
use crate::schemas::session::ResultResponse;
use crate::services;
use crate::services::sessions::pg::PgStore;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:session_id/complete", post(complete_session))
}

/// Explicit completion. Works on overdue sessions too, trading the remaining
/// questions for partial credit instead of an expiry wipe.
async fn complete_session(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ResultResponse>, ApiError> {
    let store = PgStore::new(state.db().clone());

    let result =
        services::sessions::complete_session(&store, &SystemClock, &user.sub, &session_id).await?;

    services::statistics::on_session_completed(&state, &result.assessment_id).await;

    Ok(Json(helpers::result_to_response(result, None)))
}
