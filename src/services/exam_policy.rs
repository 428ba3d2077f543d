use crate::db::types::AssessmentKind;

pub(crate) const EXAM_MIN_QUESTIONS: usize = 10;
pub(crate) const EXAM_MAX_QUESTIONS: usize = 40;
pub(crate) const EXAM_MIN_TIME_LIMIT_MINUTES: i32 = 10;
pub(crate) const MAX_TIME_LIMIT_MINUTES: i32 = 180;
pub(crate) const MAX_QUESTION_POINTS: i32 = 10;

/// Authoring rules and defaults for one assessment kind. Exams carry the
/// strict ruleset; practice and thematic tests share the permissive one.
/// Session state transitions never consult this, only precondition checks do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AssessmentPolicy {
    kind: AssessmentKind,
}

impl AssessmentPolicy {
    pub(crate) fn for_kind(kind: AssessmentKind) -> Self {
        Self { kind }
    }

    fn is_exam(self) -> bool {
        matches!(self.kind, AssessmentKind::Exam)
    }

    pub(crate) fn default_passing_score(self) -> i32 {
        if self.is_exam() {
            75
        } else {
            70
        }
    }

    pub(crate) fn default_allow_retries(self) -> bool {
        !self.is_exam()
    }

    pub(crate) fn default_show_results(self) -> bool {
        !self.is_exam()
    }

    pub(crate) fn validate_question_count(self, count: usize) -> Result<(), String> {
        if self.is_exam() {
            if count < EXAM_MIN_QUESTIONS {
                return Err(format!("Exam must have at least {EXAM_MIN_QUESTIONS} questions"));
            }
            if count > EXAM_MAX_QUESTIONS {
                return Err(format!("Exam cannot have more than {EXAM_MAX_QUESTIONS} questions"));
            }
            return Ok(());
        }

        if count == 0 {
            return Err("Assessment must include at least one question".to_string());
        }
        Ok(())
    }

    pub(crate) fn validate_time_limit(self, time_limit_minutes: Option<i32>) -> Result<(), String> {
        match time_limit_minutes {
            Some(minutes) => {
                let min = if self.is_exam() { EXAM_MIN_TIME_LIMIT_MINUTES } else { 1 };
                if minutes < min || minutes > MAX_TIME_LIMIT_MINUTES {
                    return Err(format!(
                        "Time limit must be between {min} and {MAX_TIME_LIMIT_MINUTES} minutes"
                    ));
                }
                Ok(())
            }
            None if self.is_exam() => Err("Time limit is required for exams".to_string()),
            None => Ok(()),
        }
    }

    pub(crate) fn validate_passing_score(self, passing_score_percentage: i32) -> Result<(), String> {
        let min = if self.is_exam() { 50 } else { 1 };
        if passing_score_percentage < min || passing_score_percentage > 100 {
            return Err(format!("Passing score must be between {min} and 100"));
        }
        Ok(())
    }

    pub(crate) fn validate_points(self, points: i32) -> Result<(), String> {
        if !(1..=MAX_QUESTION_POINTS).contains(&points) {
            return Err(format!("Question points must be between 1 and {MAX_QUESTION_POINTS}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_question_count_bounds() {
        let policy = AssessmentPolicy::for_kind(AssessmentKind::Exam);
        assert!(policy.validate_question_count(9).is_err());
        assert!(policy.validate_question_count(10).is_ok());
        assert!(policy.validate_question_count(40).is_ok());
        assert!(policy.validate_question_count(41).is_err());
    }

    #[test]
    fn generic_tests_need_only_one_question() {
        let policy = AssessmentPolicy::for_kind(AssessmentKind::Practice);
        assert!(policy.validate_question_count(0).is_err());
        assert!(policy.validate_question_count(1).is_ok());
        assert!(policy.validate_question_count(100).is_ok());
    }

    #[test]
    fn exams_may_not_be_untimed() {
        let policy = AssessmentPolicy::for_kind(AssessmentKind::Exam);
        assert!(policy.validate_time_limit(None).is_err());
        assert!(policy.validate_time_limit(Some(9)).is_err());
        assert!(policy.validate_time_limit(Some(10)).is_ok());
        assert!(policy.validate_time_limit(Some(180)).is_ok());
        assert!(policy.validate_time_limit(Some(181)).is_err());
    }

    #[test]
    fn generic_time_limit_is_optional() {
        let policy = AssessmentPolicy::for_kind(AssessmentKind::Thematic);
        assert!(policy.validate_time_limit(None).is_ok());
        assert!(policy.validate_time_limit(Some(1)).is_ok());
        assert!(policy.validate_time_limit(Some(0)).is_err());
        assert!(policy.validate_time_limit(Some(181)).is_err());
    }

    #[test]
    fn exam_passing_score_floor_is_raised() {
        let exam = AssessmentPolicy::for_kind(AssessmentKind::Exam);
        assert!(exam.validate_passing_score(49).is_err());
        assert!(exam.validate_passing_score(50).is_ok());
        assert!(exam.validate_passing_score(100).is_ok());
        assert!(exam.validate_passing_score(101).is_err());

        let practice = AssessmentPolicy::for_kind(AssessmentKind::Practice);
        assert!(practice.validate_passing_score(1).is_ok());
        assert!(practice.validate_passing_score(0).is_err());
    }

    #[test]
    fn exam_defaults_are_strict() {
        let exam = AssessmentPolicy::for_kind(AssessmentKind::Exam);
        assert_eq!(exam.default_passing_score(), 75);
        assert!(!exam.default_allow_retries());
        assert!(!exam.default_show_results());

        let thematic = AssessmentPolicy::for_kind(AssessmentKind::Thematic);
        assert_eq!(thematic.default_passing_score(), 70);
        assert!(thematic.default_allow_retries());
        assert!(thematic.default_show_results());
    }

    #[test]
    fn points_are_bounded() {
        let policy = AssessmentPolicy::for_kind(AssessmentKind::Practice);
        assert!(policy.validate_points(0).is_err());
        assert!(policy.validate_points(1).is_ok());
        assert!(policy.validate_points(10).is_ok());
        assert!(policy.validate_points(11).is_err());
    }
}
