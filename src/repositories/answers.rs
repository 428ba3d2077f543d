use time::PrimitiveDateTime;

use crate::db::models::SessionAnswer;

pub(crate) const COLUMNS: &str = "\
    id, session_id, question_id, question_order, selected_option_id, \
    is_correct, points_earned, time_spent_seconds, created_at";

pub(crate) struct CreateAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) session_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) question_order: i32,
    pub(crate) selected_option_id: Option<&'a str>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
    pub(crate) time_spent_seconds: Option<i32>,
}

/// Returns `false` when this position or question already has an answer;
/// the unique constraints are the arbiter, not a prior read.
pub(crate) async fn insert_if_absent(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAnswer<'_>,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO session_answers (
            id, session_id, question_id, question_order, selected_option_id,
            is_correct, points_earned, time_spent_seconds, created_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT DO NOTHING",
    )
    .bind(params.id)
    .bind(params.session_id)
    .bind(params.question_id)
    .bind(params.question_order)
    .bind(params.selected_option_id)
    .bind(params.is_correct)
    .bind(params.points_earned)
    .bind(params.time_spent_seconds)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_for_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Vec<SessionAnswer>, sqlx::Error> {
    sqlx::query_as::<_, SessionAnswer>(&format!(
        "SELECT {COLUMNS} FROM session_answers \
         WHERE session_id = $1 ORDER BY question_order"
    ))
    .bind(session_id)
    .fetch_all(executor)
    .await
}
