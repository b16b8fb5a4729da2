mod attempt;
mod question;
mod quiz;

pub use attempt::{AttemptRecord, FinishReason, Identity};
pub use question::{Question, NUM_OPTIONS};
pub use quiz::{Quiz, QuizFilter};

#[cfg(test)]
pub(crate) use quiz::fixtures;

/// Which screen the terminal is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Browse,
    Quiz,
    Result,
}
