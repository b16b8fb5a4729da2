use super::SessionState;
use crate::error::SessionError;
use crate::models::Question;

/// Outcome of scoring a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreReport {
    pub correct: usize,
    pub total: usize,
    pub percentage: u8,
    pub per_question: Vec<bool>,
}

/// `round(100 * correct / total)` with halves rounded up, in integer arithmetic.
pub fn percentage(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    // (100c / t + 1/2) floored, scaled by 2t to stay exact
    let rounded = (200 * correct + total) / (2 * total);
    rounded as u8
}

/// Score answers against questions position by position. Missing answers are wrong.
pub fn score_answers(questions: &[Question], answers: &[Option<usize>]) -> ScoreReport {
    let per_question: Vec<bool> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| q.is_correct(answers.get(i).copied().flatten()))
        .collect();
    let correct = per_question.iter().filter(|ok| **ok).count();
    let total = questions.len();

    ScoreReport {
        correct,
        total,
        percentage: percentage(correct, total),
        per_question,
    }
}

/// Score a finalized session.
pub fn score(session: &SessionState) -> Result<ScoreReport, SessionError> {
    if !session.is_finalized() {
        return Err(SessionError::NotFinalized);
    }
    Ok(score_answers(&session.quiz().questions, session.answers()))
}
