use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::{Clock, SystemClock};
use crate::schemas::session::{AnswerCreate, AnswerReceiptResponse, CurrentQuestionResponse, SessionResponse};
use crate::services;
use crate::services::sessions::pg::PgStore;
use crate::services::sessions::AnswerSubmission;

use super::helpers;

pub(super) async fn start_session(
    axum::extract::Path(assessment_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let store = PgStore::new(state.db().clone());
    let clock = SystemClock;

    let session =
        services::sessions::start_session(&store, &clock, &user.sub, &assessment_id).await?;

    Ok(Json(helpers::session_to_response(&session, clock.now())))
}

pub(super) async fn get_active_session(
    axum::extract::Path(assessment_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let store = PgStore::new(state.db().clone());
    let clock = SystemClock;

    let session =
        services::sessions::active_session(&store, &clock, &user.sub, &assessment_id).await?;

    Ok(Json(helpers::session_to_response(&session, clock.now())))
}

pub(super) async fn get_current_question(
    axum::extract::Path(assessment_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<CurrentQuestionResponse>, ApiError> {
    let store = PgStore::new(state.db().clone());

    let question =
        services::sessions::current_question(&store, &SystemClock, &user.sub, &assessment_id)
            .await?;

    Ok(Json(helpers::current_question_to_response(question)))
}

pub(super) async fn submit_answer(
    axum::extract::Path(assessment_id): axum::extract::Path<String>,
    CurrentUser(user): CurrentUser,
    state: axum::extract::State<AppState>,
    Json(payload): Json<AnswerCreate>,
) -> Result<Json<AnswerReceiptResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let store = PgStore::new(state.db().clone());
    let submission = AnswerSubmission {
        selected_option_id: payload.selected_option_id,
        time_spent_seconds: payload.time_spent_seconds,
    };

    let receipt =
        services::sessions::submit_answer(&store, &SystemClock, &user.sub, &assessment_id, submission)
            .await?;

    if receipt.result.is_some() {
        services::statistics::on_session_completed(&state, &assessment_id).await;
    }

    Ok(Json(helpers::receipt_to_response(receipt)))
}
