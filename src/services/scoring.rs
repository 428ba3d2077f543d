use crate::db::models::{PlanEntry, SessionAnswer};

/// Scored outcome of one attempt, computed from the question plan captured at
/// session start and the answers persisted so far. Unanswered positions earn
/// nothing but still count toward the totals, so force-completing an expired
/// session yields partial credit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreBreakdown {
    pub(crate) total_questions: i32,
    pub(crate) correct_answers: i32,
    pub(crate) incorrect_answers: i32,
    pub(crate) unanswered_questions: i32,
    pub(crate) total_points: i32,
    pub(crate) earned_points: i32,
    pub(crate) score_percentage: f64,
    pub(crate) is_passed: bool,
}

pub(crate) fn score_session(
    plan: &[PlanEntry],
    passing_score_percentage: i32,
    answers: &[SessionAnswer],
) -> ScoreBreakdown {
    let total_questions = plan.len() as i32;
    let total_points: i32 = plan.iter().map(|entry| entry.points).sum();

    let correct_answers = answers.iter().filter(|answer| answer.is_correct).count() as i32;
    let incorrect_answers = answers.len() as i32 - correct_answers;
    let unanswered_questions = total_questions - answers.len() as i32;
    let earned_points: i32 = answers.iter().map(|answer| answer.points_earned).sum();

    let score_percentage = if total_points > 0 {
        round2(100.0 * f64::from(earned_points) / f64::from(total_points))
    } else {
        0.0
    };
    let is_passed = score_percentage >= f64::from(passing_score_percentage);

    ScoreBreakdown {
        total_questions,
        correct_answers,
        incorrect_answers,
        unanswered_questions,
        total_points,
        earned_points,
        score_percentage,
        is_passed,
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{answer, plan_entry};

    #[test]
    fn half_correct_meets_fifty_percent_threshold() {
        let plan = vec![plan_entry("q1", 1, 1), plan_entry("q2", 2, 1)];
        let answers = vec![answer("s1", "q1", 1, true, 1), answer("s1", "q2", 2, false, 0)];

        let breakdown = score_session(&plan, 50, &answers);

        assert_eq!(breakdown.earned_points, 1);
        assert_eq!(breakdown.total_points, 2);
        assert_eq!(breakdown.score_percentage, 50.0);
        assert!(breakdown.is_passed);
        assert_eq!(breakdown.correct_answers, 1);
        assert_eq!(breakdown.incorrect_answers, 1);
        assert_eq!(breakdown.unanswered_questions, 0);
    }

    #[test]
    fn unanswered_positions_score_partial_credit() {
        let plan: Vec<_> = (1..=5).map(|n| plan_entry(&format!("q{n}"), n, 2)).collect();
        let answers = vec![answer("s1", "q1", 1, true, 2), answer("s1", "q2", 2, true, 2)];

        let breakdown = score_session(&plan, 70, &answers);

        assert_eq!(breakdown.total_questions, 5);
        assert_eq!(breakdown.unanswered_questions, 3);
        assert_eq!(breakdown.earned_points, 4);
        assert_eq!(breakdown.total_points, 10);
        assert_eq!(breakdown.score_percentage, 40.0);
        assert!(!breakdown.is_passed);
    }

    #[test]
    fn no_answers_scores_zero() {
        let plan = vec![plan_entry("q1", 1, 3)];
        let breakdown = score_session(&plan, 70, &[]);

        assert_eq!(breakdown.earned_points, 0);
        assert_eq!(breakdown.score_percentage, 0.0);
        assert_eq!(breakdown.unanswered_questions, 1);
        assert!(!breakdown.is_passed);
    }

    #[test]
    fn empty_plan_scores_zero_without_division() {
        let breakdown = score_session(&[], 70, &[]);

        assert_eq!(breakdown.total_points, 0);
        assert_eq!(breakdown.score_percentage, 0.0);
        assert!(!breakdown.is_passed);
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        let plan = vec![plan_entry("q1", 1, 1), plan_entry("q2", 2, 1), plan_entry("q3", 3, 1)];
        let answers = vec![answer("s1", "q1", 1, true, 1)];

        let breakdown = score_session(&plan, 70, &answers);

        assert_eq!(breakdown.score_percentage, 33.33);
    }

    #[test]
    fn weighted_points_drive_the_percentage() {
        let plan = vec![plan_entry("q1", 1, 5), plan_entry("q2", 2, 1)];
        let answers = vec![answer("s1", "q1", 1, true, 5), answer("s1", "q2", 2, false, 0)];

        let breakdown = score_session(&plan, 80, &answers);

        assert_eq!(breakdown.earned_points, 5);
        assert_eq!(breakdown.total_points, 6);
        assert_eq!(breakdown.score_percentage, 83.33);
        assert!(breakdown.is_passed);
    }

    #[test]
    fn earned_points_never_exceed_plan_ceiling() {
        for answered in 0..=4 {
            let plan: Vec<_> = (1..=4).map(|n| plan_entry(&format!("q{n}"), n, 3)).collect();
            let answers: Vec<_> = (1..=answered)
                .map(|n| answer("s1", &format!("q{n}"), n, true, 3))
                .collect();

            let breakdown = score_session(&plan, 70, &answers);
            assert!(breakdown.earned_points <= breakdown.total_points);
            assert!(breakdown.score_percentage <= 100.0);
        }
    }

    #[test]
    fn percentage_is_monotonic_in_earned_points() {
        let plan: Vec<_> = (1..=10).map(|n| plan_entry(&format!("q{n}"), n, 1)).collect();

        let mut previous = -1.0;
        for correct in 0..=10 {
            let answers: Vec<_> = (1..=10)
                .map(|n| {
                    let is_correct = n <= correct;
                    answer("s1", &format!("q{n}"), n, is_correct, i32::from(is_correct))
                })
                .collect();

            let breakdown = score_session(&plan, 70, &answers);
            assert!(breakdown.score_percentage > previous);
            previous = breakdown.score_percentage;
        }
    }

    #[test]
    fn passing_is_inclusive_at_the_threshold() {
        let plan = vec![plan_entry("q1", 1, 1), plan_entry("q2", 2, 1)];
        let answers = vec![answer("s1", "q1", 1, true, 1), answer("s1", "q2", 2, false, 0)];

        assert!(score_session(&plan, 50, &answers).is_passed);
        assert!(!score_session(&plan, 51, &answers).is_passed);
    }
}
