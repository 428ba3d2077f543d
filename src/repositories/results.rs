use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::AssessmentResult;

pub(crate) const COLUMNS: &str = "\
    id, session_id, owner_id, assessment_id, total_questions, correct_answers, \
    incorrect_answers, unanswered_questions, total_points, earned_points, \
    score_percentage, is_passed, time_spent_seconds, completed_at, created_at";

pub(crate) struct CreateResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) session_id: &'a str,
    pub(crate) owner_id: &'a str,
    pub(crate) assessment_id: &'a str,
    pub(crate) total_questions: i32,
    pub(crate) correct_answers: i32,
    pub(crate) incorrect_answers: i32,
    pub(crate) unanswered_questions: i32,
    pub(crate) total_points: i32,
    pub(crate) earned_points: i32,
    pub(crate) score_percentage: f64,
    pub(crate) is_passed: bool,
    pub(crate) time_spent_seconds: i32,
    pub(crate) completed_at: PrimitiveDateTime,
}

pub(crate) async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateResult<'_>,
) -> Result<AssessmentResult, sqlx::Error> {
    sqlx::query_as::<_, AssessmentResult>(&format!(
        "INSERT INTO assessment_results (
            id, session_id, owner_id, assessment_id, total_questions, correct_answers,
            incorrect_answers, unanswered_questions, total_points, earned_points,
            score_percentage, is_passed, time_spent_seconds, completed_at, created_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.session_id)
    .bind(params.owner_id)
    .bind(params.assessment_id)
    .bind(params.total_questions)
    .bind(params.correct_answers)
    .bind(params.incorrect_answers)
    .bind(params.unanswered_questions)
    .bind(params.total_points)
    .bind(params.earned_points)
    .bind(params.score_percentage)
    .bind(params.is_passed)
    .bind(params.time_spent_seconds)
    .bind(params.completed_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<AssessmentResult>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentResult>(&format!(
        "SELECT {COLUMNS} FROM assessment_results WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn exists_for(
    executor: impl sqlx::PgExecutor<'_>,
    owner_id: &str,
    assessment_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM assessment_results \
         WHERE owner_id = $1 AND assessment_id = $2)",
    )
    .bind(owner_id)
    .bind(assessment_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_owner(
    pool: &PgPool,
    owner_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<AssessmentResult>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentResult>(&format!(
        "SELECT {COLUMNS} FROM assessment_results \
         WHERE owner_id = $1 ORDER BY completed_at DESC OFFSET $2 LIMIT $3"
    ))
    .bind(owner_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 100))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_owner(pool: &PgPool, owner_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM assessment_results WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_by_assessment(
    pool: &PgPool,
    assessment_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<AssessmentResult>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentResult>(&format!(
        "SELECT {COLUMNS} FROM assessment_results \
         WHERE assessment_id = $1 ORDER BY completed_at DESC OFFSET $2 LIMIT $3"
    ))
    .bind(assessment_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 100))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_assessment(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM assessment_results WHERE assessment_id = $1")
        .bind(assessment_id)
        .fetch_one(pool)
        .await
}

/// Raw aggregates for one assessment, averaged over every recorded result.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ResultAggregates {
    pub(crate) total_attempts: i64,
    pub(crate) passed_attempts: i64,
    pub(crate) average_score: Option<f64>,
    pub(crate) average_time_seconds: Option<f64>,
}

pub(crate) async fn aggregates_for_assessment(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<ResultAggregates, sqlx::Error> {
    sqlx::query_as::<_, ResultAggregates>(
        "SELECT
            COUNT(*) AS total_attempts,
            COUNT(*) FILTER (WHERE is_passed) AS passed_attempts,
            AVG(score_percentage) AS average_score,
            AVG(time_spent_seconds::DOUBLE PRECISION) AS average_time_seconds
         FROM assessment_results
         WHERE assessment_id = $1",
    )
    .bind(assessment_id)
    .fetch_one(pool)
    .await
}
