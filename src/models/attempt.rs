use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::percentage;

/// Who is taking the quiz. Supplied from outside the session core and never validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub uid: String,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    UserSubmitted,
    TimeExpired,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::UserSubmitted => write!(f, "submitted"),
            FinishReason::TimeExpired => write!(f, "time expired"),
        }
    }
}

/// Immutable snapshot of a finished session, handed to an attempt sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: Uuid,
    pub quiz_id: String,
    pub subject: String,
    pub user_name: String,
    pub email: String,
    pub uid: String,
    /// Aligned with the quiz's question order; `None` is unanswered.
    pub answers: Vec<Option<usize>>,
    pub score: usize,
    pub total: usize,
    pub percentage: u8,
    pub time_taken_seconds: u32,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub reason: FinishReason,
}

impl AttemptRecord {
    /// Percentage derived again from `score` and `total`.
    pub fn derived_percentage(&self) -> u8 {
        percentage(self.score, self.total)
    }

    pub fn belongs_to(&self, email: &str) -> bool {
        self.email == email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_reason_display() {
        assert_eq!(FinishReason::UserSubmitted.to_string(), "submitted");
        assert_eq!(FinishReason::TimeExpired.to_string(), "time expired");
    }

    #[test]
    fn test_attempt_serializes_camel_case() {
        let record = AttemptRecord {
            id: Uuid::nil(),
            quiz_id: "q1".into(),
            subject: "Math".into(),
            user_name: "Asha".into(),
            email: "asha@example.com".into(),
            uid: "u1".into(),
            answers: vec![Some(0), None],
            score: 1,
            total: 2,
            percentage: 50,
            time_taken_seconds: 12,
            started_at: DateTime::UNIX_EPOCH,
            submitted_at: DateTime::UNIX_EPOCH,
            reason: FinishReason::TimeExpired,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"quizId\":\"q1\""));
        assert!(json.contains("\"timeTakenSeconds\":12"));
        assert!(json.contains("\"answers\":[0,null]"));
        assert!(json.contains("\"reason\":\"TimeExpired\""));
    }
}
