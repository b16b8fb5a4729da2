use super::SessionState;
use crate::error::SessionError;

impl SessionState {
    /// Move to `index`, clamped into the quiz. Returns the index landed on.
    pub fn go_to(&mut self, index: isize) -> Result<usize, SessionError> {
        self.ensure_active()?;
        let last = self.total_questions() - 1;
        let target = usize::try_from(index).unwrap_or(0).min(last);
        if target != self.current_index {
            tracing::debug!("navigated from question {} to {}", self.current_index, target);
        }
        self.current_index = target;
        self.touch();
        Ok(target)
    }

    pub fn next(&mut self) -> Result<usize, SessionError> {
        self.go_to(self.current_index as isize + 1)
    }

    pub fn previous(&mut self) -> Result<usize, SessionError> {
        self.go_to(self.current_index as isize - 1)
    }

    pub fn is_first(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 == self.total_questions()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::models::fixtures::three_question_quiz;
    use crate::session::{ManualClock, SessionState};

    fn session() -> SessionState {
        SessionState::new(Arc::new(three_question_quiz()), &ManualClock::default()).unwrap()
    }

    #[test]
    fn go_to_clamps_both_ends() {
        let mut s = session();
        assert_eq!(s.go_to(-1), Ok(0));
        assert_eq!(s.go_to(3), Ok(2));
        assert_eq!(s.go_to(isize::MAX), Ok(2));
        assert_eq!(s.go_to(isize::MIN), Ok(0));
    }

    #[test]
    fn next_and_previous_stop_at_bounds() {
        let mut s = session();
        assert_eq!(s.previous(), Ok(0));
        assert!(s.is_first());
        s.next().unwrap();
        s.next().unwrap();
        assert_eq!(s.next(), Ok(2));
        assert!(s.is_last());
        assert_eq!(s.previous(), Ok(1));
    }

    #[test]
    fn navigation_leaves_answers_alone() {
        let mut s = session();
        s.record_answer(0, 2).unwrap();
        s.go_to(2).unwrap();
        s.previous().unwrap();
        assert_eq!(s.answers(), &[Some(2), None, None]);
    }
}
