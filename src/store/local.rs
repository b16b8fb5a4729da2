//! JSON-file store in the user's data directory.
//!
//! Keeps `quizzes.json` and `attempts.json` side by side. Serves as the
//! offline cache and as the default backend when nothing remote is configured.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use super::{AttemptSink, QuizSource};
use crate::error::StoreError;
use crate::models::{AttemptRecord, Quiz, QuizFilter};

const QUIZZES_FILE: &str = "quizzes.json";
const ATTEMPTS_FILE: &str = "attempts.json";

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        read_list(&self.root.join(QUIZZES_FILE)).await
    }

    pub async fn attempts(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        read_list(&self.root.join(ATTEMPTS_FILE)).await
    }

    /// Merge `incoming` over the stored quizzes. Returns the new total.
    pub async fn import_quizzes(&self, incoming: Vec<Quiz>) -> Result<usize, StoreError> {
        let merged = merge_quizzes(incoming, self.quizzes().await?);
        write_list(&self.root.join(QUIZZES_FILE), &merged).await?;
        tracing::info!("quiz store now holds {} quizzes", merged.len());
        Ok(merged.len())
    }

    /// Merge `incoming` over the stored attempts. Returns the new total.
    pub async fn import_attempts(&self, incoming: Vec<AttemptRecord>) -> Result<usize, StoreError> {
        let merged = merge_attempts(incoming, self.attempts().await?);
        write_list(&self.root.join(ATTEMPTS_FILE), &merged).await?;
        tracing::info!("attempt store now holds {} attempts", merged.len());
        Ok(merged.len())
    }
}

/// Incoming quizzes win; existing ones survive only if their id is new.
pub fn merge_quizzes(incoming: Vec<Quiz>, existing: Vec<Quiz>) -> Vec<Quiz> {
    merge_by_key(incoming, existing, |q| q.id.clone())
}

/// Incoming attempts win; existing ones survive only if their id is new.
pub fn merge_attempts(
    incoming: Vec<AttemptRecord>,
    existing: Vec<AttemptRecord>,
) -> Vec<AttemptRecord> {
    merge_by_key(incoming, existing, |a| a.id.to_string())
}

fn merge_by_key<T, F>(incoming: Vec<T>, existing: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(incoming.len() + existing.len());
    for item in incoming.into_iter().chain(existing) {
        if seen.insert(key(&item)) {
            merged.push(item);
        }
    }
    merged
}

async fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    match fs::read_to_string(path).await {
        Ok(contents) if contents.trim().is_empty() => Ok(Vec::new()),
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

async fn write_list<T: Serialize>(path: &Path, items: &[T]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let contents = serde_json::to_string_pretty(items)?;
    // readers only ever see a complete file
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl QuizSource for LocalStore {
    async fn fetch_quiz(&self, id: &str) -> Result<Quiz, StoreError> {
        self.quizzes()
            .await?
            .into_iter()
            .find(|q| q.id == id)
            .ok_or_else(|| StoreError::QuizNotFound(id.to_string()))
    }

    async fn fetch_available_quizzes(&self, filter: &QuizFilter) -> Result<Vec<Quiz>, StoreError> {
        Ok(filter.apply(&self.quizzes().await?))
    }
}

#[async_trait]
impl AttemptSink for LocalStore {
    async fn save_attempt(&self, record: &AttemptRecord) -> Result<(), StoreError> {
        let path = self.root.join(ATTEMPTS_FILE);
        let mut attempts: Vec<AttemptRecord> = read_list(&path).await?;
        if let Some(existing) = attempts.iter_mut().find(|a| a.id == record.id) {
            *existing = record.clone();
        } else {
            attempts.push(record.clone());
        }
        write_list(&path, &attempts).await?;
        tracing::debug!("attempt {} written to {:?}", record.id, path);
        Ok(())
    }

    async fn fetch_attempts(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        self.attempts().await
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::*;
    use crate::models::fixtures::three_question_quiz;
    use crate::models::FinishReason;

    fn attempt(score: usize) -> AttemptRecord {
        AttemptRecord {
            id: Uuid::new_v4(),
            quiz_id: "math-1".into(),
            subject: "Math".into(),
            user_name: "Mei".into(),
            email: "mei@example.com".into(),
            uid: "u1".into(),
            answers: vec![Some(0), None, None],
            score,
            total: 3,
            percentage: crate::session::percentage(score, 3),
            time_taken_seconds: 30,
            started_at: DateTime::UNIX_EPOCH,
            submitted_at: DateTime::UNIX_EPOCH,
            reason: FinishReason::UserSubmitted,
        }
    }

    #[tokio::test]
    async fn missing_files_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.quizzes().await.unwrap().is_empty());
        assert!(store.fetch_attempts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_attempt_appends_and_upserts() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("nested"));
        let mut first = attempt(1);
        store.save_attempt(&first).await.unwrap();
        store.save_attempt(&attempt(2)).await.unwrap();

        first.user_name = "Mei L.".into();
        store.save_attempt(&first).await.unwrap();

        let stored = store.fetch_attempts().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].user_name, "Mei L.");
    }

    #[tokio::test]
    async fn import_then_fetch_quiz() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        assert_eq!(store.import_quizzes(vec![three_question_quiz()]).await.unwrap(), 1);

        let quiz = store.fetch_quiz("math-1").await.unwrap();
        assert_eq!(quiz, three_question_quiz());
        assert!(matches!(store.fetch_quiz("x").await, Err(StoreError::QuizNotFound(_))));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_json_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(QUIZZES_FILE), "{not json").unwrap();
        let store = LocalStore::new(dir.path());
        assert!(matches!(store.quizzes().await, Err(StoreError::Json(_))));
    }

    #[test]
    fn merge_quizzes_prefers_incoming() {
        let existing = three_question_quiz();
        let mut updated = three_question_quiz();
        updated.subject = "Arithmetic".into();
        let mut other = three_question_quiz();
        other.id = "math-0".into();

        let merged = merge_quizzes(vec![updated], vec![existing, other]);
        let summary: Vec<_> = merged.iter().map(|q| (q.id.as_str(), q.subject.as_str())).collect();
        assert_eq!(summary, vec![("math-1", "Arithmetic"), ("math-0", "Math")]);
    }

    #[test]
    fn merge_attempts_keeps_unknown_existing() {
        let shared = attempt(1);
        let mut server_copy = shared.clone();
        server_copy.score = 3;
        let local_only = attempt(0);

        let merged = merge_attempts(vec![server_copy], vec![shared, local_only.clone()]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].score, 3);
        assert_eq!(merged[1].id, local_only.id);
    }
}
