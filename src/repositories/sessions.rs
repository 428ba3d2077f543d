use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{AssessmentResult, AssessmentSession, PlanEntry};
use crate::db::types::SessionStatus;

pub(crate) const COLUMNS: &str = "\
    id, assessment_id, owner_id, status, started_at, completed_at, expires_at, \
    current_question_index, time_spent_seconds, question_plan, created_at, updated_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) assessment_id: &'a str,
    pub(crate) owner_id: &'a str,
    pub(crate) question_plan: &'a [PlanEntry],
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) expires_at: Option<PrimitiveDateTime>,
}

/// Insert guarded by the partial unique index on live sessions. `None` means
/// another in-progress row for the same owner and assessment got there first.
pub(crate) async fn insert_active(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateSession<'_>,
) -> Result<Option<AssessmentSession>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentSession>(&format!(
        "INSERT INTO assessment_sessions (
            id, assessment_id, owner_id, status, started_at, expires_at,
            current_question_index, time_spent_seconds, question_plan,
            created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6, 0, 0, $7, $5, $5)
         ON CONFLICT (owner_id, assessment_id) WHERE status = 'in_progress' DO NOTHING
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.assessment_id)
    .bind(params.owner_id)
    .bind(SessionStatus::InProgress)
    .bind(params.started_at)
    .bind(params.expires_at)
    .bind(sqlx::types::Json(params.question_plan))
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_active(
    executor: impl sqlx::PgExecutor<'_>,
    owner_id: &str,
    assessment_id: &str,
) -> Result<Option<AssessmentSession>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentSession>(&format!(
        "SELECT {COLUMNS} FROM assessment_sessions \
         WHERE owner_id = $1 AND assessment_id = $2 AND status = $3"
    ))
    .bind(owner_id)
    .bind(assessment_id)
    .bind(SessionStatus::InProgress)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<AssessmentSession>, sqlx::Error> {
    sqlx::query_as::<_, AssessmentSession>(&format!(
        "SELECT {COLUMNS} FROM assessment_sessions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Conditional flip to expired; the status check keeps racing observers and
/// the sweep from clobbering a completed session.
pub(crate) async fn mark_expired(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE assessment_sessions SET status = $2, completed_at = $3, updated_at = $3 \
         WHERE id = $1 AND status = $4",
    )
    .bind(session_id)
    .bind(SessionStatus::Expired)
    .bind(now)
    .bind(SessionStatus::InProgress)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Answer insert plus cursor advance as one transaction. Either write
/// failing rolls the other back and reports `None`: the unique answer
/// constraints catch double submissions, the index equality check catches
/// a cursor that moved under this request.
pub(crate) async fn record_answer_and_advance(
    pool: &PgPool,
    answer: super::answers::CreateAnswer<'_>,
    expected_index: i32,
    now: PrimitiveDateTime,
) -> Result<Option<AssessmentSession>, sqlx::Error> {
    let session_id = answer.session_id;
    let time_delta = answer.time_spent_seconds.unwrap_or(0);

    let mut tx = pool.begin().await?;

    if !super::answers::insert_if_absent(&mut *tx, answer, now).await? {
        return Ok(None);
    }

    let advanced = sqlx::query_as::<_, AssessmentSession>(&format!(
        "UPDATE assessment_sessions SET
            current_question_index = current_question_index + 1,
            time_spent_seconds = time_spent_seconds + $3,
            updated_at = $4
         WHERE id = $1 AND status = $2 AND current_question_index = $5
         RETURNING {COLUMNS}"
    ))
    .bind(session_id)
    .bind(SessionStatus::InProgress)
    .bind(time_delta)
    .bind(now)
    .bind(expected_index)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(session) = advanced else {
        return Ok(None);
    };

    tx.commit().await?;
    Ok(Some(session))
}

/// Completion flip plus result insert as one transaction, so a session is
/// never observed completed without its result. `None` when the session was
/// no longer in progress.
pub(crate) async fn complete_with_result(
    pool: &PgPool,
    session_id: &str,
    result: super::results::CreateResult<'_>,
    now: PrimitiveDateTime,
) -> Result<Option<AssessmentResult>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let flipped = sqlx::query(
        "UPDATE assessment_sessions SET status = $2, completed_at = $3, updated_at = $3 \
         WHERE id = $1 AND status = $4",
    )
    .bind(session_id)
    .bind(SessionStatus::Completed)
    .bind(now)
    .bind(SessionStatus::InProgress)
    .execute(&mut *tx)
    .await?;
    if flipped.rows_affected() == 0 {
        return Ok(None);
    }

    let row = super::results::insert(&mut *tx, result).await?;
    tx.commit().await?;
    Ok(Some(row))
}

/// Batch form of `mark_expired` for the sweep worker.
pub(crate) async fn expire_overdue(
    pool: &PgPool,
    now: PrimitiveDateTime,
    limit: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE assessment_sessions SET status = $2, completed_at = $1, updated_at = $1 \
         WHERE status = $3 AND id IN (
            SELECT id FROM assessment_sessions \
            WHERE status = $3 AND expires_at IS NOT NULL AND expires_at < $1 \
            ORDER BY expires_at \
            LIMIT $4
         )",
    )
    .bind(now)
    .bind(SessionStatus::Expired)
    .bind(SessionStatus::InProgress)
    .bind(limit.max(1))
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
