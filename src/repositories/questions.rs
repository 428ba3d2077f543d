use sqlx::PgPool;

use crate::db::models::{Question, QuestionOption};

pub(crate) const COLUMNS: &str = "id, text, explanation, created_at, updated_at";

pub(crate) const OPTION_COLUMNS: &str =
    "id, question_id, text, is_correct, order_index, created_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn options_for_question(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options \
         WHERE question_id = $1 ORDER BY order_index"
    ))
    .bind(question_id)
    .fetch_all(executor)
    .await
}

/// How many of the given ids exist in the bank. Authoring compares this
/// against the requested list to reject unknown questions.
pub(crate) async fn count_existing(
    pool: &PgPool,
    ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(pool)
        .await
}
