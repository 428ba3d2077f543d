use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{Assessment, PlanEntry};
use crate::db::types::{AssessmentKind, SessionStatus};

pub(crate) const COLUMNS: &str = "\
    id, title, description, kind, time_limit_minutes, passing_score_percentage, \
    allow_retries, show_results_immediately, is_published, created_by, \
    created_at, updated_at";

pub(crate) struct CreateAssessment<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) kind: AssessmentKind,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) passing_score_percentage: i32,
    pub(crate) allow_retries: bool,
    pub(crate) show_results_immediately: bool,
    pub(crate) is_published: bool,
    pub(crate) created_by: &'a str,
    pub(crate) now: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAssessment<'_>,
) -> Result<Assessment, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!(
        "INSERT INTO assessments (
            id, title, description, kind, time_limit_minutes, passing_score_percentage,
            allow_retries, show_results_immediately, is_published, created_by,
            created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.kind)
    .bind(params.time_limit_minutes)
    .bind(params.passing_score_percentage)
    .bind(params.allow_retries)
    .bind(params.show_results_immediately)
    .bind(params.is_published)
    .bind(params.created_by)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Assessment>, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!("SELECT {COLUMNS} FROM assessments WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    kind: Option<AssessmentKind>,
    published_only: bool,
    skip: i64,
    limit: i64,
) -> Result<Vec<Assessment>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM assessments WHERE TRUE"));

    if published_only {
        builder.push(" AND is_published");
    }
    if let Some(kind) = kind {
        builder.push(" AND kind = ");
        builder.push_bind(kind);
    }

    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 100));

    builder.build_query_as::<Assessment>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    kind: Option<AssessmentKind>,
    published_only: bool,
) -> Result<i64, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM assessments WHERE TRUE");

    if published_only {
        builder.push(" AND is_published");
    }
    if let Some(kind) = kind {
        builder.push(" AND kind = ");
        builder.push_bind(kind);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Full-row update; callers load the row, apply their changes, and save.
pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    assessment: &Assessment,
    now: time::PrimitiveDateTime,
) -> Result<Assessment, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!(
        "UPDATE assessments SET
            title = $2, description = $3, kind = $4, time_limit_minutes = $5,
            passing_score_percentage = $6, allow_retries = $7,
            show_results_immediately = $8, is_published = $9, updated_at = $10
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(&assessment.id)
    .bind(&assessment.title)
    .bind(&assessment.description)
    .bind(assessment.kind)
    .bind(assessment.time_limit_minutes)
    .bind(assessment.passing_score_percentage)
    .bind(assessment.allow_retries)
    .bind(assessment.show_results_immediately)
    .bind(assessment.is_published)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn delete(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assessments WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) struct LinkQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) assessment_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) question_order: i32,
    pub(crate) points: i32,
    pub(crate) now: time::PrimitiveDateTime,
}

pub(crate) async fn link_question(
    executor: impl sqlx::PgExecutor<'_>,
    params: LinkQuestion<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO assessment_questions (
            id, assessment_id, question_id, question_order, points, created_at
         ) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(params.id)
    .bind(params.assessment_id)
    .bind(params.question_id)
    .bind(params.question_order)
    .bind(params.points)
    .bind(params.now)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn unlink_questions(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM assessment_questions WHERE assessment_id = $1")
        .bind(assessment_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Ordered question list with weights, the shape captured into sessions.
pub(crate) async fn question_plan(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<Vec<PlanEntry>, sqlx::Error> {
    sqlx::query_as::<_, PlanEntry>(
        "SELECT question_id, question_order, points FROM assessment_questions \
         WHERE assessment_id = $1 ORDER BY question_order",
    )
    .bind(assessment_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn question_count(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM assessment_questions WHERE assessment_id = $1")
        .bind(assessment_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn has_sessions(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM assessment_sessions WHERE assessment_id = $1)")
        .bind(assessment_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn has_in_progress_sessions(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM assessment_sessions \
         WHERE assessment_id = $1 AND status = $2)",
    )
    .bind(assessment_id)
    .bind(SessionStatus::InProgress)
    .fetch_one(executor)
    .await
}
