use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::SessionError;
use crate::leaderboard::{leaderboard, summarize, AttemptSummary, LeaderboardEntry};
use crate::models::{AppState, AttemptRecord, FinishReason, Identity, Question, Quiz, NUM_OPTIONS};
use crate::session::{score, Clock, ScoreReport, SessionState, Timer};
use crate::store::{IdentitySource, PersistenceHandle, SaveOutcome};

const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// Messages from the countdown callbacks to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    Tick(u32),
    Expired,
}

/// Where the last finished attempt is in the save pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Pending,
    Saved,
    Failed(String),
    NotStored,
}

pub struct App {
    pub state: AppState,
    quizzes: Vec<Arc<Quiz>>,
    attempts: Vec<AttemptRecord>,
    identity: Identity,
    clock: Arc<dyn Clock>,
    timer: Timer,
    timer_tx: mpsc::UnboundedSender<TimerEvent>,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    persistence: Option<PersistenceHandle>,
    session: Option<SessionState>,
    last_attempt: Option<AttemptRecord>,
    last_report: Option<ScoreReport>,
    save_status: Option<SaveStatus>,
    selected_quiz: usize,
    selected_option: usize,
    result_scroll: usize,
    status: Option<String>,
    leaderboard_size: usize,
}

impl App {
    pub fn new(
        quizzes: Vec<Quiz>,
        attempts: Vec<AttemptRecord>,
        identity: impl IdentitySource,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::Browse,
            quizzes: quizzes.into_iter().map(Arc::new).collect(),
            attempts,
            identity: identity.current_identity(),
            timer: Timer::new(Arc::clone(&clock)),
            clock,
            timer_tx,
            timer_rx,
            persistence: None,
            session: None,
            last_attempt: None,
            last_report: None,
            save_status: None,
            selected_quiz: 0,
            selected_option: 0,
            result_scroll: 0,
            status: None,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }

    pub fn with_persistence(mut self, persistence: PersistenceHandle) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size;
        self
    }

    pub fn take_persistence(&mut self) -> Option<PersistenceHandle> {
        self.persistence.take()
    }

    // Browse

    pub fn quizzes(&self) -> &[Arc<Quiz>] {
        &self.quizzes
    }

    pub fn selected_quiz_index(&self) -> usize {
        self.selected_quiz
    }

    pub fn selected_quiz(&self) -> Option<&Quiz> {
        self.quizzes.get(self.selected_quiz).map(|q| q.as_ref())
    }

    pub fn select_next_quiz(&mut self) {
        if !self.quizzes.is_empty() {
            self.selected_quiz = (self.selected_quiz + 1) % self.quizzes.len();
        }
    }

    pub fn select_previous_quiz(&mut self) {
        if !self.quizzes.is_empty() {
            let len = self.quizzes.len();
            self.selected_quiz = (self.selected_quiz + len - 1) % len;
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn summary_for(&self, quiz_id: &str) -> AttemptSummary<'_> {
        summarize(&self.attempts, &self.identity.email, quiz_id)
    }

    /// Begin a session on the highlighted quiz and start its countdown.
    pub fn start_quiz(&mut self) {
        let Some(quiz) = self.quizzes.get(self.selected_quiz).cloned() else {
            self.status = Some("No quiz selected".to_string());
            return;
        };

        let session = match SessionState::new(Arc::clone(&quiz), self.clock.as_ref()) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("cannot start quiz {}: {}", quiz.id, e);
                self.status = Some(e.to_string());
                return;
            }
        };

        while self.timer_rx.try_recv().is_ok() {}
        let tick_tx = self.timer_tx.clone();
        let expire_tx = self.timer_tx.clone();
        self.timer.start(
            quiz.time_limit_seconds,
            move |remaining| {
                let _ = tick_tx.send(TimerEvent::Tick(remaining));
            },
            move || {
                let _ = expire_tx.send(TimerEvent::Expired);
            },
        );

        self.session = Some(session);
        self.selected_option = 0;
        self.last_attempt = None;
        self.last_report = None;
        self.save_status = None;
        self.status = None;
        self.state = AppState::Quiz;
    }

    /// Leave the running quiz without recording an attempt.
    pub fn abandon_quiz(&mut self) {
        self.timer.stop();
        if let Some(session) = self.session.take() {
            tracing::info!("quiz {} abandoned", session.quiz().id);
        }
        self.state = AppState::Browse;
    }

    // Quiz

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref().map(SessionState::current_question)
    }

    pub fn selected_option(&self) -> usize {
        self.selected_option
    }

    pub fn select_next_option(&mut self) {
        self.selected_option = (self.selected_option + 1) % NUM_OPTIONS;
    }

    pub fn select_previous_option(&mut self) {
        self.selected_option = (self.selected_option + NUM_OPTIONS - 1) % NUM_OPTIONS;
    }

    /// Record the highlighted option for the current question, then move on.
    pub fn choose_option(&mut self) {
        let option = self.selected_option;
        let result = self.session.as_mut().map(|session| {
            let index = session.current_index();
            session.record_answer(index, option)?;
            session.next()
        });
        if let Some(Err(e)) = result {
            self.report(e);
        } else {
            self.sync_cursor();
        }
    }

    pub fn next_question(&mut self) {
        self.navigate(|s| s.next());
    }

    pub fn previous_question(&mut self) {
        self.navigate(|s| s.previous());
    }

    fn navigate<F>(&mut self, step: F)
    where
        F: FnOnce(&mut SessionState) -> Result<usize, SessionError>,
    {
        if let Some(Err(e)) = self.session.as_mut().map(step) {
            self.report(e);
        } else {
            self.sync_cursor();
        }
    }

    /// Put the option cursor on the stored answer for the question shown.
    fn sync_cursor(&mut self) {
        if let Some(session) = &self.session {
            self.selected_option = session.answer(session.current_index()).unwrap_or(0);
        }
    }

    pub fn submit(&mut self) {
        self.finish(FinishReason::UserSubmitted);
    }

    /// Finalize the running session. The first caller wins.
    ///
    /// Timer events owed up to now are applied first, so the recorded time is
    /// current. If the countdown already ran out, the attempt is `TimeExpired`.
    pub fn finish(&mut self, reason: FinishReason) {
        let reason = if self.pump_timer() {
            FinishReason::TimeExpired
        } else {
            reason
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let record = match session.finalize(reason, &self.identity, self.clock.as_ref()) {
            Ok(record) => record,
            Err(e) => {
                self.report(e);
                return;
            }
        };
        self.timer.stop();

        self.last_report = score(session).ok();
        self.attempts.push(record.clone());
        self.save_status = Some(match &self.persistence {
            Some(persistence) if persistence.submit(record.clone()) => SaveStatus::Pending,
            Some(_) => SaveStatus::Failed("persistence worker stopped".to_string()),
            None => SaveStatus::NotStored,
        });
        self.last_attempt = Some(record);
        self.result_scroll = 0;
        self.state = AppState::Result;
    }

    /// Advance background work: timer callbacks and save results.
    pub fn on_frame(&mut self) {
        if self.pump_timer() {
            self.finish(FinishReason::TimeExpired);
        }

        let outcomes = self
            .persistence
            .as_mut()
            .map(PersistenceHandle::drain_outcomes)
            .unwrap_or_default();
        for outcome in outcomes {
            self.apply_save_outcome(outcome);
        }
    }

    /// Poll the countdown and apply its ticks. Returns true if it expired.
    fn pump_timer(&mut self) -> bool {
        self.timer.poll();
        let mut expired = false;
        while let Ok(event) = self.timer_rx.try_recv() {
            match event {
                TimerEvent::Tick(remaining) => {
                    if let Some(Err(e)) = self.session.as_mut().map(|s| s.apply_tick(remaining)) {
                        self.report(e);
                    }
                }
                TimerEvent::Expired => {
                    tracing::info!("time is up");
                    expired = true;
                }
            }
        }
        expired
    }

    fn apply_save_outcome(&mut self, outcome: SaveOutcome) {
        let last_id = self.last_attempt.as_ref().map(|a| a.id);
        match outcome {
            SaveOutcome::Saved(id) if Some(id) == last_id => {
                self.save_status = Some(SaveStatus::Saved);
            }
            SaveOutcome::Failed { id, reason } if Some(id) == last_id => {
                self.save_status = Some(SaveStatus::Failed(reason));
            }
            _ => {}
        }
    }

    fn report(&mut self, err: SessionError) {
        if err.is_benign() {
            tracing::info!("ignored: {}", err);
        } else {
            tracing::warn!("session error: {}", err);
            self.status = Some(err.to_string());
        }
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.session.as_ref().map_or(0, SessionState::remaining_seconds)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    // Result

    pub fn last_attempt(&self) -> Option<&AttemptRecord> {
        self.last_attempt.as_ref()
    }

    pub fn last_report(&self) -> Option<&ScoreReport> {
        self.last_report.as_ref()
    }

    pub fn save_status(&self) -> Option<&SaveStatus> {
        self.save_status.as_ref()
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let quiz_id = self.last_attempt.as_ref().map(|a| a.quiz_id.as_str());
        leaderboard(&self.attempts, quiz_id, self.leaderboard_size, Some(&self.identity.email))
    }

    pub fn result_scroll(&self) -> usize {
        self.result_scroll
    }

    pub fn scroll_results_down(&mut self) {
        let rows = self.last_report.as_ref().map_or(0, |r| r.total);
        if self.result_scroll + 1 < rows {
            self.result_scroll += 1;
        }
    }

    pub fn scroll_results_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(1);
    }

    pub fn back_to_browse(&mut self) {
        self.session = None;
        self.state = AppState::Browse;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::fixtures::three_question_quiz;
    use crate::session::ManualClock;

    fn identity() -> Identity {
        Identity {
            name: "Zoe".into(),
            email: "zoe@example.com".into(),
            uid: "z".into(),
        }
    }

    fn app_with(quizzes: Vec<Quiz>) -> (App, ManualClock) {
        let clock = ManualClock::default();
        let app = App::new(quizzes, Vec::new(), identity(), Arc::new(clock.clone()));
        (app, clock)
    }

    fn two_question_quiz() -> Quiz {
        Quiz {
            id: "duo".into(),
            subject: "Science".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            questions: vec![
                Question::new("H2O is?", ["water", "salt", "air", "gold"], 0),
                Question::new("Sun is a?", ["planet", "moon", "star", "comet"], 2),
            ],
            time_limit_seconds: 60,
            total_questions: Some(2),
        }
    }

    #[test]
    fn test_browse_selection_wraps() {
        let mut other = three_question_quiz();
        other.id = "math-2".into();
        let (mut app, _) = app_with(vec![three_question_quiz(), other]);
        app.select_previous_quiz();
        assert_eq!(app.selected_quiz_index(), 1);
        app.select_next_quiz();
        assert_eq!(app.selected_quiz_index(), 0);
    }

    #[test]
    fn test_start_quiz_enters_quiz_state() {
        let (mut app, _) = app_with(vec![three_question_quiz()]);
        app.start_quiz();
        assert_eq!(app.state, AppState::Quiz);
        assert_eq!(app.remaining_seconds(), 90);
        assert_eq!(app.current_question().map(|q| q.text.as_str()), Some("1 + 1?"));
    }

    #[test]
    fn test_start_invalid_quiz_reports_status() {
        let mut broken = three_question_quiz();
        broken.time_limit_seconds = 0;
        let (mut app, _) = app_with(vec![broken]);
        app.start_quiz();
        assert_eq!(app.state, AppState::Browse);
        assert!(app.status().unwrap_or_default().contains("time limit"));
    }

    #[test]
    fn test_choose_option_records_and_advances() {
        let (mut app, _) = app_with(vec![three_question_quiz()]);
        app.start_quiz();
        app.select_next_option();
        app.choose_option();

        let session = app.session().unwrap();
        assert_eq!(session.answer(0), Some(1));
        assert_eq!(session.current_index(), 1);
        assert_eq!(app.selected_option(), 0);

        app.previous_question();
        assert_eq!(app.selected_option(), 1);
    }

    #[test]
    fn test_two_question_submit_at_forty_seconds() {
        let (mut app, clock) = app_with(vec![two_question_quiz()]);
        app.start_quiz();
        app.choose_option();
        app.select_next_option();
        app.select_next_option();
        app.choose_option();

        clock.advance_secs(20);
        app.on_frame();
        assert_eq!(app.remaining_seconds(), 40);

        app.submit();
        let record = app.last_attempt().unwrap();
        assert_eq!(record.score, 2);
        assert_eq!(record.percentage, 100);
        assert_eq!(record.time_taken_seconds, 20);
        assert_eq!(app.state, AppState::Result);
        assert_eq!(app.save_status(), Some(&SaveStatus::NotStored));
    }

    #[test]
    fn test_timer_expiry_finalizes_once() {
        let (mut app, clock) = app_with(vec![three_question_quiz()]);
        app.start_quiz();
        app.choose_option();

        clock.advance_secs(500);
        app.on_frame();
        app.on_frame();

        let record = app.last_attempt().unwrap().clone();
        assert_eq!(record.reason, FinishReason::TimeExpired);
        assert_eq!(record.time_taken_seconds, 90);
        assert_eq!(record.score, 1);

        app.submit();
        assert_eq!(app.last_attempt(), Some(&record));
        assert_eq!(app.status(), None);
        assert_eq!(app.summary_for("math-1").attempts, 1);
    }

    #[test]
    fn test_submit_counts_time_not_yet_polled() {
        let (mut app, clock) = app_with(vec![three_question_quiz()]);
        app.start_quiz();
        clock.advance_secs(20);
        app.submit();

        let record = app.last_attempt().unwrap();
        assert_eq!(record.time_taken_seconds, 20);
        assert_eq!(record.reason, FinishReason::UserSubmitted);
    }

    #[test]
    fn test_submit_after_unpolled_expiry_is_time_expired() {
        let (mut app, clock) = app_with(vec![three_question_quiz()]);
        app.start_quiz();
        clock.advance_secs(500);
        app.submit();

        let record = app.last_attempt().unwrap();
        assert_eq!(record.reason, FinishReason::TimeExpired);
        assert_eq!(record.time_taken_seconds, 90);
        assert_eq!(app.status(), None);
    }

    #[test]
    fn test_submit_stops_timer() {
        let (mut app, clock) = app_with(vec![three_question_quiz()]);
        app.start_quiz();
        app.submit();
        let first = app.last_attempt().cloned();

        clock.advance_secs(500);
        app.on_frame();
        assert_eq!(app.last_attempt().cloned(), first);
        assert_eq!(first.map(|r| r.reason), Some(FinishReason::UserSubmitted));
    }

    #[test]
    fn test_leaderboard_marks_current_user() {
        let (mut app, _) = app_with(vec![three_question_quiz()]);
        app.start_quiz();
        app.submit();
        let board = app.leaderboard();
        assert_eq!(board.len(), 1);
        assert!(board[0].is_you);
    }

    #[test]
    fn test_abandon_returns_to_browse_without_attempt() {
        let (mut app, clock) = app_with(vec![three_question_quiz()]);
        app.start_quiz();
        app.abandon_quiz();
        clock.advance_secs(500);
        app.on_frame();
        assert_eq!(app.state, AppState::Browse);
        assert!(app.last_attempt().is_none());
        assert_eq!(app.summary_for("math-1").attempts, 0);
    }

    #[test]
    fn test_result_scroll_is_bounded() {
        let (mut app, _) = app_with(vec![three_question_quiz()]);
        app.start_quiz();
        app.submit();
        for _ in 0..10 {
            app.scroll_results_down();
        }
        assert_eq!(app.result_scroll(), 2);
        app.scroll_results_up();
        assert_eq!(app.result_scroll(), 1);
    }

    #[tokio::test]
    async fn test_save_outcome_updates_status() {
        let store = Arc::new(crate::store::InMemoryStore::default());
        let (app, _) = app_with(vec![three_question_quiz()]);
        let mut app = app.with_persistence(PersistenceHandle::spawn(store.clone()));
        app.start_quiz();
        app.submit();
        assert_eq!(app.save_status(), Some(&SaveStatus::Pending));

        let handle = app.take_persistence().unwrap();
        handle.shutdown().await;
        assert_eq!(store.attempts().len(), 1);
    }
}
