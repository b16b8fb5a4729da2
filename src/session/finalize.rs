use uuid::Uuid;

use super::scorer::{score, ScoreReport};
use super::{Clock, SessionPhase, SessionState};
use crate::error::SessionError;
use crate::models::{AttemptRecord, FinishReason, Identity};

impl SessionState {
    /// End the session once and produce the attempt record.
    ///
    /// The first call wins; later calls fail with
    /// [`SessionError::AlreadyFinalized`] and change nothing.
    pub fn finalize(
        &mut self,
        reason: FinishReason,
        identity: &Identity,
        clock: &dyn Clock,
    ) -> Result<AttemptRecord, SessionError> {
        self.ensure_active()?;

        self.ended_at = Some(clock.now());
        self.phase = SessionPhase::Finalized(reason);

        let report = score(self)?;
        let record = build_attempt(self, &report, identity, reason);
        tracing::info!(
            "quiz {} finalized ({}): {}/{} ({}%) in {}s",
            record.quiz_id,
            reason,
            record.score,
            record.total,
            record.percentage,
            record.time_taken_seconds
        );
        Ok(record)
    }

    /// Seconds used so far, never negative.
    pub fn time_taken_seconds(&self) -> u32 {
        self.quiz.time_limit_seconds.saturating_sub(self.remaining_seconds)
    }
}

/// Assemble the persistable record for a finalized session.
pub fn build_attempt(
    session: &SessionState,
    report: &ScoreReport,
    identity: &Identity,
    reason: FinishReason,
) -> AttemptRecord {
    let quiz = session.quiz();
    AttemptRecord {
        id: Uuid::new_v4(),
        quiz_id: quiz.id.clone(),
        subject: quiz.subject.clone(),
        user_name: identity.name.clone(),
        email: identity.email.clone(),
        uid: identity.uid.clone(),
        answers: session.answers().to_vec(),
        score: report.correct,
        total: report.total,
        percentage: report.percentage,
        time_taken_seconds: session.time_taken_seconds(),
        started_at: session.started_at(),
        submitted_at: session.ended_at().unwrap_or_else(|| session.started_at()),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::fixtures::three_question_quiz;
    use crate::session::ManualClock;

    fn identity() -> Identity {
        Identity {
            name: "Ravi".into(),
            email: "ravi@example.com".into(),
            uid: "u-7".into(),
        }
    }

    #[test]
    fn finalize_builds_record_from_session() {
        let clock = ManualClock::default();
        let mut s = SessionState::new(Arc::new(three_question_quiz()), &clock).unwrap();
        s.record_answer(0, 0).unwrap();
        s.record_answer(1, 2).unwrap();
        s.record_answer(2, 3).unwrap();
        s.apply_tick(50).unwrap();
        clock.advance_secs(40);

        let record = s.finalize(FinishReason::UserSubmitted, &identity(), &clock).unwrap();

        assert_eq!(record.quiz_id, "math-1");
        assert_eq!(record.user_name, "Ravi");
        assert_eq!(record.uid, "u-7");
        assert_eq!(record.answers, vec![Some(0), Some(2), Some(3)]);
        assert_eq!(record.score, 2);
        assert_eq!(record.total, 3);
        assert_eq!(record.percentage, 67);
        assert_eq!(record.time_taken_seconds, 40);
        assert_eq!(record.submitted_at, clock.now());
        assert_eq!(record.reason, FinishReason::UserSubmitted);
        assert_eq!(s.phase(), SessionPhase::Finalized(FinishReason::UserSubmitted));
    }

    #[test]
    fn second_finalize_is_rejected_and_changes_nothing() {
        let clock = ManualClock::default();
        let mut s = SessionState::new(Arc::new(three_question_quiz()), &clock).unwrap();
        let first = s.finalize(FinishReason::UserSubmitted, &identity(), &clock).unwrap();
        let ended_at = s.ended_at();

        clock.advance_secs(5);
        let second = s.finalize(FinishReason::TimeExpired, &identity(), &clock);

        assert_eq!(second, Err(SessionError::AlreadyFinalized));
        assert_eq!(s.ended_at(), ended_at);
        assert_eq!(s.phase(), SessionPhase::Finalized(FinishReason::UserSubmitted));
        assert_eq!(first.reason, FinishReason::UserSubmitted);
    }

    #[test]
    fn finalized_session_rejects_mutation() {
        let clock = ManualClock::default();
        let mut s = SessionState::new(Arc::new(three_question_quiz()), &clock).unwrap();
        s.finalize(FinishReason::TimeExpired, &identity(), &clock).unwrap();

        assert_eq!(s.record_answer(0, 1), Err(SessionError::AlreadyFinalized));
        assert_eq!(s.go_to(1), Err(SessionError::AlreadyFinalized));
        assert_eq!(s.apply_tick(0), Err(SessionError::AlreadyFinalized));
        assert_eq!(s.answers(), &[None, None, None]);
    }

    #[test]
    fn time_taken_uses_remaining_at_finalize() {
        let clock = ManualClock::default();
        let mut s = SessionState::new(Arc::new(three_question_quiz()), &clock).unwrap();
        s.apply_tick(0).unwrap();
        let record = s.finalize(FinishReason::TimeExpired, &identity(), &clock).unwrap();
        assert_eq!(record.time_taken_seconds, 90);
    }

    #[test]
    fn stored_percentage_matches_rederived() {
        let clock = ManualClock::default();
        let mut s = SessionState::new(Arc::new(three_question_quiz()), &clock).unwrap();
        s.record_answer(0, 0).unwrap();
        let record = s.finalize(FinishReason::UserSubmitted, &identity(), &clock).unwrap();
        assert_eq!(record.percentage, record.derived_percentage());
    }
}
