use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::Clock;
use crate::error::SessionError;
use crate::models::{FinishReason, Question, Quiz, NUM_OPTIONS};

/// Where a session is in its lifecycle. `Finalized` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Created,
    InProgress,
    Finalized(FinishReason),
}

/// One user's pass through a quiz.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub(super) quiz: Arc<Quiz>,
    pub(super) current_index: usize,
    pub(super) answers: Vec<Option<usize>>,
    pub(super) remaining_seconds: u32,
    pub(super) started_at: DateTime<Utc>,
    pub(super) ended_at: Option<DateTime<Utc>>,
    pub(super) phase: SessionPhase,
}

/// Owned, read-only view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub quiz_id: String,
    pub current_index: usize,
    pub total: usize,
    pub answers: Vec<Option<usize>>,
    pub remaining_seconds: u32,
    pub phase: SessionPhase,
}

impl SessionState {
    /// Begin a session. Fails when the quiz breaks its invariants.
    pub fn new(quiz: Arc<Quiz>, clock: &dyn Clock) -> Result<Self, SessionError> {
        quiz.validate()?;
        let total = quiz.total_questions();
        tracing::info!("session started for quiz {} ({} questions)", quiz.id, total);
        Ok(Self {
            current_index: 0,
            answers: vec![None; total],
            remaining_seconds: quiz.time_limit_seconds,
            started_at: clock.now(),
            ended_at: None,
            phase: SessionPhase::Created,
            quiz,
        })
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.quiz.questions[self.current_index]
    }

    pub fn total_questions(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn answer(&self, question_index: usize) -> Option<usize> {
        self.answers.get(question_index).copied().flatten()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finalized(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            quiz_id: self.quiz.id.clone(),
            current_index: self.current_index,
            total: self.total_questions(),
            answers: self.answers.clone(),
            remaining_seconds: self.remaining_seconds,
            phase: self.phase,
        }
    }

    /// Select `option_index` for `question_index`, replacing any earlier choice.
    pub fn record_answer(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), SessionError> {
        self.ensure_active()?;
        let total = self.total_questions();
        if question_index >= total {
            return Err(SessionError::OutOfRange {
                what: "question",
                index: question_index,
                len: total,
            });
        }
        if option_index >= NUM_OPTIONS {
            return Err(SessionError::OutOfRange {
                what: "option",
                index: option_index,
                len: NUM_OPTIONS,
            });
        }

        self.answers[question_index] = Some(option_index);
        self.touch();
        tracing::debug!("answer {} recorded for question {}", option_index, question_index);
        Ok(())
    }

    /// Apply a countdown tick. Remaining time only ever goes down.
    pub fn apply_tick(&mut self, remaining_seconds: u32) -> Result<(), SessionError> {
        self.ensure_active()?;
        if remaining_seconds < self.remaining_seconds {
            self.remaining_seconds = remaining_seconds;
        }
        self.touch();
        Ok(())
    }

    pub(super) fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_finalized() {
            Err(SessionError::AlreadyFinalized)
        } else {
            Ok(())
        }
    }

    pub(super) fn touch(&mut self) {
        if self.phase == SessionPhase::Created {
            self.phase = SessionPhase::InProgress;
        }
    }
}
