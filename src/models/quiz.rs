use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Question;
use crate::error::SessionError;

/// A dated, subject-tagged set of questions with a time budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[serde(alias = "quizId")]
    pub id: String,
    pub subject: String,
    pub date: NaiveDate,
    pub questions: Vec<Question>,
    #[serde(alias = "timeLimit")]
    pub time_limit_seconds: u32,
    /// Count reported by whoever authored the quiz; must match `questions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<usize>,
}

impl Quiz {
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Whole minutes, rounded up.
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_seconds.div_ceil(60)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.id.trim().is_empty() {
            return Err(SessionError::InvalidQuiz("quiz id is required".into()));
        }
        if self.subject.trim().is_empty() {
            return Err(SessionError::InvalidQuiz(format!(
                "quiz {}: subject is required",
                self.id
            )));
        }
        if self.questions.is_empty() {
            return Err(SessionError::InvalidQuiz(format!(
                "quiz {}: at least one question is required",
                self.id
            )));
        }
        if self.time_limit_seconds == 0 {
            return Err(SessionError::InvalidQuiz(format!(
                "quiz {}: time limit must be positive",
                self.id
            )));
        }
        if let Some(reported) = self.total_questions {
            if reported != self.questions.len() {
                return Err(SessionError::InvalidQuiz(format!(
                    "quiz {}: reports {} questions but has {}",
                    self.id,
                    reported,
                    self.questions.len()
                )));
            }
        }
        for (i, question) in self.questions.iter().enumerate() {
            question
                .validate(i)
                .map_err(|e| match e {
                    SessionError::InvalidQuiz(msg) => {
                        SessionError::InvalidQuiz(format!("quiz {}: {}", self.id, msg))
                    }
                    other => other,
                })?;
        }
        Ok(())
    }
}

/// Exact-match filters for browsing quizzes. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizFilter {
    pub date: Option<NaiveDate>,
    pub subject: Option<String>,
}

impl QuizFilter {
    pub fn matches(&self, quiz: &Quiz) -> bool {
        self.date.is_none_or(|d| quiz.date == d)
            && self.subject.as_deref().is_none_or(|s| quiz.subject == s)
    }

    /// Filter and order quizzes for listing: newest date first, then subject, then id.
    pub fn apply<'a, I>(&self, quizzes: I) -> Vec<Quiz>
    where
        I: IntoIterator<Item = &'a Quiz>,
    {
        let mut selected: Vec<Quiz> = quizzes
            .into_iter()
            .filter(|q| self.matches(q))
            .cloned()
            .collect();
        selected.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.subject.cmp(&b.subject))
                .then_with(|| a.id.cmp(&b.id))
        });
        selected
    }
}
