//! Boundaries to the outside world: where quizzes come from, where attempts go,
//! and who the current user is.

mod local;
mod worker;

use std::sync::Mutex;

use async_trait::async_trait;

pub use local::{merge_attempts, merge_quizzes, LocalStore};
pub use worker::{PersistenceHandle, SaveOutcome};

use crate::error::StoreError;
use crate::models::{AttemptRecord, Identity, Quiz, QuizFilter};

/// Read access to quiz definitions.
#[async_trait]
pub trait QuizSource: Send + Sync {
    async fn fetch_quiz(&self, id: &str) -> Result<Quiz, StoreError>;

    async fn fetch_available_quizzes(&self, filter: &QuizFilter) -> Result<Vec<Quiz>, StoreError>;
}

/// Where finished attempts are written. Implementations own any retry policy.
#[async_trait]
pub trait AttemptSink: Send + Sync {
    async fn save_attempt(&self, record: &AttemptRecord) -> Result<(), StoreError>;

    /// Every attempt the sink knows about, oldest first.
    async fn fetch_attempts(&self) -> Result<Vec<AttemptRecord>, StoreError>;
}

/// Supplies the signed-in user.
pub trait IdentitySource {
    fn current_identity(&self) -> Identity;
}

impl IdentitySource for Identity {
    fn current_identity(&self) -> Identity {
        self.clone()
    }
}

/// Volatile store, mostly for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    quizzes: Mutex<Vec<Quiz>>,
    attempts: Mutex<Vec<AttemptRecord>>,
}

impl InMemoryStore {
    pub fn with_quizzes(quizzes: Vec<Quiz>) -> Self {
        Self {
            quizzes: Mutex::new(quizzes),
            attempts: Mutex::default(),
        }
    }

    pub fn attempts(&self) -> Vec<AttemptRecord> {
        self.attempts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".into())
}

#[async_trait]
impl QuizSource for InMemoryStore {
    async fn fetch_quiz(&self, id: &str) -> Result<Quiz, StoreError> {
        let quizzes = self.quizzes.lock().map_err(poisoned)?;
        quizzes
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or_else(|| StoreError::QuizNotFound(id.to_string()))
    }

    async fn fetch_available_quizzes(&self, filter: &QuizFilter) -> Result<Vec<Quiz>, StoreError> {
        let quizzes = self.quizzes.lock().map_err(poisoned)?;
        Ok(filter.apply(quizzes.iter()))
    }
}

#[async_trait]
impl AttemptSink for InMemoryStore {
    async fn save_attempt(&self, record: &AttemptRecord) -> Result<(), StoreError> {
        self.attempts.lock().map_err(poisoned)?.push(record.clone());
        Ok(())
    }

    async fn fetch_attempts(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        Ok(self.attempts.lock().map_err(poisoned)?.clone())
    }
}
