use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::portal::PortalAttempt;
use crate::error::SessionError;
use crate::models::{AttemptRecord, Quiz};

/// Errors while loading quiz definitions from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} must contain at least one quiz")]
    Empty { path: String },

    #[error("{path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: SessionError,
    },

    #[error("{path}: attempt {index}: {reason}")]
    BadAttempt {
        path: String,
        index: usize,
        reason: String,
    },
}

/// Either a record written by this crate or a row exported by the web portal.
#[derive(Deserialize)]
#[serde(untagged)]
enum AttemptEntry {
    Native(AttemptRecord),
    Portal(PortalAttempt),
}

/// Load and validate a JSON array of quizzes.
pub fn load_quizzes_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Quiz>, LoadError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let quizzes: Vec<Quiz> = read_json(path)?;
    if quizzes.is_empty() {
        return Err(LoadError::Empty { path: shown });
    }

    for quiz in &quizzes {
        quiz.validate()
            .map_err(|source| LoadError::Invalid {
                path: shown.clone(),
                source,
            })?;
    }

    tracing::info!("loaded {} quizzes from {}", quizzes.len(), path.display());
    Ok(quizzes)
}

/// Load a JSON array of attempt records, e.g. an export from another device.
///
/// Rows in the web portal's format are converted; their ids derive from the
/// portal's email/quiz/date key so importing the same export twice is a no-op.
pub fn load_attempts_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<AttemptRecord>, LoadError> {
    let path = path.as_ref();
    let entries: Vec<AttemptEntry> = read_json(path)?;
    let attempts = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            AttemptEntry::Native(record) => Ok(record),
            AttemptEntry::Portal(row) => {
                AttemptRecord::try_from(row).map_err(|reason| LoadError::BadAttempt {
                    path: path.display().to_string(),
                    index,
                    reason,
                })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!("loaded {} attempts from {}", attempts.len(), path.display());
    Ok(attempts)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let shown = path.display().to_string();
    let json_content = fs::read_to_string(path)
        .map_err(|source| LoadError::Read {
            path: shown.clone(),
            source,
        })?;
    serde_json::from_str(&json_content).map_err(|source| LoadError::Parse {
        path: shown,
        source,
    })
}
