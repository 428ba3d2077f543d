use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::sessions::SessionError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::AssessmentNotFound
            | SessionError::NoActiveSession
            | SessionError::SessionNotFound => ApiError::NotFound(err.to_string()),
            SessionError::NotPublished
            | SessionError::RetriesNotAllowed
            | SessionError::Expired => ApiError::Forbidden(err.to_string()),
            SessionError::ActiveSessionExists | SessionError::SubmissionConflict => {
                ApiError::Conflict(err.to_string())
            }
            SessionError::NoQuestions
            | SessionError::AllAnswered
            | SessionError::OptionMismatch
            | SessionError::NotInProgress => ApiError::BadRequest(err.to_string()),
            SessionError::Invalid(_) => ApiError::internal(&err, "Session state is inconsistent"),
            SessionError::Store(_) => ApiError::internal(&err, "Session storage failed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let status = StatusCode::UNAUTHORIZED;
                let mut response = (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail: message.to_string() }),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                let status = StatusCode::FORBIDDEN;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_map_to_http_statuses() {
        let cases = [
            (SessionError::AssessmentNotFound, StatusCode::NOT_FOUND),
            (SessionError::NoActiveSession, StatusCode::NOT_FOUND),
            (SessionError::SessionNotFound, StatusCode::NOT_FOUND),
            (SessionError::NotPublished, StatusCode::FORBIDDEN),
            (SessionError::RetriesNotAllowed, StatusCode::FORBIDDEN),
            (SessionError::Expired, StatusCode::FORBIDDEN),
            (SessionError::ActiveSessionExists, StatusCode::CONFLICT),
            (SessionError::SubmissionConflict, StatusCode::CONFLICT),
            (SessionError::NoQuestions, StatusCode::BAD_REQUEST),
            (SessionError::AllAnswered, StatusCode::BAD_REQUEST),
            (SessionError::OptionMismatch, StatusCode::BAD_REQUEST),
            (SessionError::NotInProgress, StatusCode::BAD_REQUEST),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn conflict_keeps_the_engine_message() {
        let api_err = ApiError::from(SessionError::ActiveSessionExists);
        match api_err {
            ApiError::Conflict(detail) => {
                assert_eq!(detail, "You already have an active session for this assessment")
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
