//! # quiz-portal
//!
//! Timed multiple-choice quizzes in the terminal.
//!
//! The session core ([`session`]) is synchronous and clock-injected: it owns
//! question delivery, the countdown, answer capture, scoring and the one-time
//! finalize that produces an [`AttemptRecord`]. Everything around it (where
//! quizzes come from, where attempts go, who the user is) sits behind the
//! traits in [`store`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use quiz_portal::session::{ManualClock, SessionState};
//! use quiz_portal::{load_quizzes_from_json, FinishReason, Identity};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let clock = ManualClock::default();
//!     let quiz = load_quizzes_from_json("quizzes.json")?.remove(0);
//!     let mut session = SessionState::new(Arc::new(quiz), &clock)?;
//!
//!     session.record_answer(0, 2)?;
//!     let record = session.finalize(FinishReason::UserSubmitted, &Identity::default(), &clock)?;
//!     println!("{}/{} ({}%)", record.score, record.total, record.percentage);
//!     Ok(())
//! }
//! ```

mod app;
pub mod config;
mod data;
pub mod error;
pub mod leaderboard;
mod models;
pub mod session;
pub mod store;
pub mod terminal;
mod ui;

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use thiserror::Error;

pub use app::{App, SaveStatus};
pub use config::Config;
pub use data::{load_attempts_from_json, load_quizzes_from_json, LoadError};
pub use error::{SessionError, StoreError};
pub use models::{AppState, AttemptRecord, FinishReason, Identity, Question, Quiz, QuizFilter};
pub use ui::format_time;

const FRAME_POLL: Duration = Duration::from_millis(50);

/// Error type for running the portal.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Error loading quizzes from file.
    #[error("Failed to load quizzes: {0}")]
    Load(#[from] LoadError),
    /// Error talking to a quiz source or attempt sink.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    /// IO error during quiz execution.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The terminal front end around an [`App`].
pub struct Portal {
    app: App,
}

impl Portal {
    pub fn new(app: App) -> Self {
        Self { app }
    }

    /// Run the portal in the terminal until the user quits.
    ///
    /// Any attempt still queued for saving is flushed before returning.
    pub async fn run(mut self) -> Result<(), QuizError> {
        let result = {
            let mut term = terminal::TerminalGuard::enter()?;
            run_event_loop(&mut term, &mut self.app)
        };

        if let Some(persistence) = self.app.take_persistence() {
            persistence.shutdown().await;
        }
        result
    }
}

fn run_event_loop(terminal: &mut terminal::AppTerminal, app: &mut App) -> Result<(), QuizError> {
    loop {
        app.on_frame();
        terminal.draw(|frame| ui::render(frame, app))?;

        if !event::poll(FRAME_POLL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if handle_input(app, key.code) {
                break;
            }
        }
    }

    Ok(())
}

/// Returns true if the app should exit.
fn handle_input(app: &mut App, key: KeyCode) -> bool {
    match app.state {
        AppState::Browse => handle_browse_input(app, key),
        AppState::Quiz => handle_quiz_input(app, key),
        AppState::Result => handle_result_input(app, key),
    }
}

fn handle_browse_input(app: &mut App, key: KeyCode) -> bool {
    match key {
        KeyCode::Up | KeyCode::Char('k') => {
            app.select_previous_quiz();
            false
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.select_next_quiz();
            false
        }
        KeyCode::Enter => {
            app.start_quiz();
            false
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => true,
        _ => false,
    }
}

fn handle_quiz_input(app: &mut App, key: KeyCode) -> bool {
    match key {
        KeyCode::Up | KeyCode::Char('k') => app.select_previous_option(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_option(),
        KeyCode::Left | KeyCode::Char('h') => app.previous_question(),
        KeyCode::Right | KeyCode::Char('l') => app.next_question(),
        KeyCode::Enter | KeyCode::Char(' ') => app.choose_option(),
        KeyCode::Char('s') | KeyCode::Char('S') => app.submit(),
        KeyCode::Esc => app.abandon_quiz(),
        _ => {}
    }
    false
}

fn handle_result_input(app: &mut App, key: KeyCode) -> bool {
    match key {
        KeyCode::Down | KeyCode::Char('j') => {
            app.scroll_results_down();
            false
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.scroll_results_up();
            false
        }
        KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Esc => {
            app.back_to_browse();
            false
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => true,
        _ => false,
    }
}
