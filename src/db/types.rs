use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "assessmentkind", rename_all = "lowercase")]
pub(crate) enum AssessmentKind {
    Practice,
    Thematic,
    Exam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "sessionstatus", rename_all = "snake_case")]
pub(crate) enum SessionStatus {
    InProgress,
    Completed,
    Expired,
    Abandoned,
}

impl SessionStatus {
    pub(crate) fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&SessionStatus::InProgress).unwrap(), "\"in_progress\"");
        assert_eq!(serde_json::to_string(&SessionStatus::Expired).unwrap(), "\"expired\"");
    }

    #[test]
    fn only_in_progress_is_live() {
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Expired.is_terminal());
        assert!(SessionStatus::Abandoned.is_terminal());
    }
}
