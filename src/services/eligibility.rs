use crate::db::models::Assessment;

/// Outcome of the start-eligibility check. `ActiveSessionExists` outranks
/// the retry check so a user retrying in a second tab is pointed at the
/// live session instead of a retries refusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartDecision {
    Allow,
    NotPublished,
    ActiveSessionExists,
    RetriesNotAllowed,
}

pub(crate) fn can_start(
    assessment: &Assessment,
    has_active_session: bool,
    has_prior_result: bool,
) -> StartDecision {
    if !assessment.is_published {
        return StartDecision::NotPublished;
    }

    if has_active_session {
        return StartDecision::ActiveSessionExists;
    }

    if !assessment.allow_retries && has_prior_result {
        return StartDecision::RetriesNotAllowed;
    }

    StartDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::assessment_fixture;

    #[test]
    fn published_assessment_without_history_is_allowed() {
        let assessment = assessment_fixture(|_| {});
        assert_eq!(can_start(&assessment, false, false), StartDecision::Allow);
    }

    #[test]
    fn unpublished_assessment_is_refused() {
        let assessment = assessment_fixture(|a| a.is_published = false);
        assert_eq!(can_start(&assessment, false, false), StartDecision::NotPublished);
    }

    #[test]
    fn active_session_wins_over_retry_check() {
        let assessment = assessment_fixture(|a| a.allow_retries = false);
        assert_eq!(can_start(&assessment, true, true), StartDecision::ActiveSessionExists);
    }

    #[test]
    fn prior_result_blocks_start_when_retries_disabled() {
        let assessment = assessment_fixture(|a| a.allow_retries = false);
        assert_eq!(can_start(&assessment, false, true), StartDecision::RetriesNotAllowed);
    }

    #[test]
    fn prior_result_is_ignored_when_retries_allowed() {
        let assessment = assessment_fixture(|a| a.allow_retries = true);
        assert_eq!(can_start(&assessment, false, true), StartDecision::Allow);
    }

    #[test]
    fn retries_disabled_without_result_is_allowed() {
        let assessment = assessment_fixture(|a| a.allow_retries = false);
        assert_eq!(can_start(&assessment, false, false), StartDecision::Allow);
    }
}
