//! Aggregated pass/score statistics for an assessment, cached in Redis.

use serde::{Deserialize, Serialize};

use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::results::ResultAggregates;
use crate::services::scoring::round2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AssessmentStatistics {
    pub(crate) assessment_id: String,
    pub(crate) total_attempts: i64,
    pub(crate) passed_attempts: i64,
    pub(crate) pass_rate: f64,
    pub(crate) average_score: f64,
    pub(crate) average_time_minutes: f64,
}

/// Shapes raw result aggregates into the reported figures. Percentages and
/// averages are rounded to two decimals like session scores.
pub(crate) fn shape_statistics(
    assessment_id: &str,
    aggregates: &ResultAggregates,
) -> AssessmentStatistics {
    let pass_rate = if aggregates.total_attempts > 0 {
        round2(100.0 * aggregates.passed_attempts as f64 / aggregates.total_attempts as f64)
    } else {
        0.0
    };

    AssessmentStatistics {
        assessment_id: assessment_id.to_string(),
        total_attempts: aggregates.total_attempts,
        passed_attempts: aggregates.passed_attempts,
        pass_rate,
        average_score: round2(aggregates.average_score.unwrap_or(0.0)),
        average_time_minutes: round2(aggregates.average_time_seconds.unwrap_or(0.0) / 60.0),
    }
}

fn cache_key(assessment_id: &str) -> String {
    format!("stats:assessment:{assessment_id}")
}

/// Loads statistics through the Redis cache. Cache trouble degrades to a
/// direct aggregate query.
pub(crate) async fn assessment_statistics(
    state: &AppState,
    assessment_id: &str,
) -> Result<AssessmentStatistics, sqlx::Error> {
    let key = cache_key(assessment_id);
    if let Some(cached) = state.redis().cache_get(&key).await {
        match serde_json::from_str::<AssessmentStatistics>(&cached) {
            Ok(stats) => return Ok(stats),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "Discarding unreadable cached statistics");
            }
        }
    }

    let aggregates =
        repositories::results::aggregates_for_assessment(state.db(), assessment_id).await?;
    let stats = shape_statistics(assessment_id, &aggregates);

    if let Ok(payload) = serde_json::to_string(&stats) {
        let ttl = state.settings().assessment().stats_cache_ttl_seconds;
        state.redis().cache_set(&key, &payload, ttl).await;
    }

    Ok(stats)
}

/// Invalidates the cached statistics after a new result lands. Best-effort:
/// completion already succeeded and must not be failed retroactively.
pub(crate) async fn on_session_completed(state: &AppState, assessment_id: &str) {
    state.redis().cache_delete(&cache_key(assessment_id)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregates(
        total: i64,
        passed: i64,
        avg_score: Option<f64>,
        avg_seconds: Option<f64>,
    ) -> ResultAggregates {
        ResultAggregates {
            total_attempts: total,
            passed_attempts: passed,
            average_score: avg_score,
            average_time_seconds: avg_seconds,
        }
    }

    #[test]
    fn shapes_rounded_figures() {
        let stats = shape_statistics("a-1", &aggregates(3, 2, Some(71.666), Some(754.0)));

        assert_eq!(stats.assessment_id, "a-1");
        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.passed_attempts, 2);
        assert_eq!(stats.pass_rate, 66.67);
        assert_eq!(stats.average_score, 71.67);
        assert_eq!(stats.average_time_minutes, 12.57);
    }

    #[test]
    fn empty_aggregates_report_zeroes() {
        let stats = shape_statistics("a-1", &aggregates(0, 0, None, None));

        assert_eq!(stats.total_attempts, 0);
        assert_eq!(stats.pass_rate, 0.0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.average_time_minutes, 0.0);
    }

    #[test]
    fn cache_keys_are_scoped_per_assessment() {
        assert_eq!(cache_key("a-1"), "stats:assessment:a-1");
        assert_ne!(cache_key("a-1"), cache_key("a-2"));
    }
}
