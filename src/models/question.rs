use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Number of options every question carries.
pub const NUM_OPTIONS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(alias = "question")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    pub fn new(text: &str, options: [&str; NUM_OPTIONS], correct_answer: usize) -> Self {
        Self {
            text: text.to_string(),
            code: None,
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer,
            explanation: String::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: &str) -> Self {
        self.explanation = explanation.to_string();
        self
    }

    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_answer)
    }

    /// `position` is 0-based and only used to build the error message.
    pub fn validate(&self, position: usize) -> Result<(), SessionError> {
        let number = position + 1;
        if self.text.trim().is_empty() {
            return Err(SessionError::InvalidQuiz(format!(
                "question {number}: text is required"
            )));
        }
        if self.options.len() != NUM_OPTIONS {
            return Err(SessionError::InvalidQuiz(format!(
                "question {number}: must have exactly {NUM_OPTIONS} options, found {}",
                self.options.len()
            )));
        }
        if self.correct_answer >= NUM_OPTIONS {
            return Err(SessionError::InvalidQuiz(format!(
                "question {number}: correct answer {} is not in 0..{NUM_OPTIONS}",
                self.correct_answer
            )));
        }
        if self.explanation.trim().is_empty() {
            tracing::warn!("question {} has no explanation", number);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_well_formed_question() {
        let q = Question::new("2 + 2?", ["3", "4", "5", "6"], 1);
        assert!(q.validate(0).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_option_count() {
        let mut q = Question::new("2 + 2?", ["3", "4", "5", "6"], 1);
        q.options.pop();
        let err = q.validate(2).unwrap_err();
        assert!(matches!(err, SessionError::InvalidQuiz(ref m) if m.starts_with("question 3")));
    }

    #[test]
    fn test_validate_rejects_correct_answer_out_of_range() {
        let q = Question::new("2 + 2?", ["3", "4", "5", "6"], 4);
        assert!(q.validate(0).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_text() {
        let q = Question::new("   ", ["3", "4", "5", "6"], 0);
        assert!(q.validate(0).is_err());
    }

    #[test]
    fn test_deserializes_portal_field_names() {
        let json = r#"{
            "question": "Capital of France?",
            "options": ["Paris", "Rome", "Madrid", "Berlin"],
            "correctAnswer": 0,
            "explanation": "Paris has been the capital since 987."
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.text, "Capital of France?");
        assert_eq!(q.correct_answer, 0);
        assert!(q.code.is_none());
    }

    #[test]
    fn test_is_correct_treats_unanswered_as_wrong() {
        let q = Question::new("x", ["a", "b", "c", "d"], 2);
        assert!(q.is_correct(Some(2)));
        assert!(!q.is_correct(Some(1)));
        assert!(!q.is_correct(None));
    }
}
