//! Error types for quiz sessions and the stores around them.

use thiserror::Error;

/// Errors raised by the session core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The quiz definition breaks one of its invariants.
    #[error("invalid quiz: {0}")]
    InvalidQuiz(String),

    /// A question or option index outside the quiz.
    #[error("{what} index {index} out of range (0..{len})")]
    OutOfRange {
        /// Which index was rejected ("question" or "option")
        what: &'static str,
        /// The rejected index
        index: usize,
        /// Number of valid positions
        len: usize,
    },

    /// Scoring was requested before the session ended.
    #[error("session has not been finalized")]
    NotFinalized,

    /// The session already ended; the first finalize won.
    #[error("session already finalized")]
    AlreadyFinalized,
}

impl SessionError {
    /// Expected outcome of a submit/expiry race, safe to log and drop.
    pub fn is_benign(&self) -> bool {
        matches!(self, SessionError::AlreadyFinalized)
    }
}

/// Errors from quiz sources and attempt sinks.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No quiz with this id
    #[error("quiz not found: {0}")]
    QuizNotFound(String),

    /// The backend could not be reached or refused the request
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_already_finalized_is_benign() {
        assert!(SessionError::AlreadyFinalized.is_benign());
        assert!(!SessionError::NotFinalized.is_benign());
        assert!(!SessionError::InvalidQuiz("x".into()).is_benign());
    }

    #[test]
    fn out_of_range_message_names_the_index() {
        let err = SessionError::OutOfRange {
            what: "option",
            index: 7,
            len: 4,
        };
        assert_eq!(err.to_string(), "option index 7 out of range (0..4)");
    }
}
