pub(crate) mod helpers;

mod definitions;
mod queries;
mod taking;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(definitions::create_assessment).get(definitions::list_assessments))
        .route(
            "/:assessment_id",
            get(definitions::get_assessment)
                .patch(definitions::update_assessment)
                .delete(definitions::delete_assessment),
        )
        .route("/:assessment_id/start", post(taking::start_session))
        .route("/:assessment_id/session", get(taking::get_active_session))
        .route("/:assessment_id/current-question", get(taking::get_current_question))
        .route("/:assessment_id/answer", post(taking::submit_answer))
        .route("/:assessment_id/results", get(definitions::list_assessment_results))
}
