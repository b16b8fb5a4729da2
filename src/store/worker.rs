//! Background attempt persistence.
//!
//! Finished attempts are queued on a channel and written by a spawned task,
//! so the UI loop never waits on storage. Results come back on a second
//! channel that the loop drains between frames.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::AttemptSink;
use crate::models::AttemptRecord;

/// Result of one save, reported back to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(Uuid),
    Failed { id: Uuid, reason: String },
}

pub struct PersistenceHandle {
    tx: mpsc::UnboundedSender<AttemptRecord>,
    outcomes: mpsc::UnboundedReceiver<SaveOutcome>,
    task: JoinHandle<()>,
}

impl PersistenceHandle {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(sink: Arc<dyn AttemptSink>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AttemptRecord>();
        let (outcome_tx, outcomes) = mpsc::unbounded_channel::<SaveOutcome>();

        let task = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let outcome = match sink.save_attempt(&record).await {
                    Ok(()) => {
                        tracing::info!("attempt {} saved", record.id);
                        SaveOutcome::Saved(record.id)
                    }
                    Err(e) => {
                        tracing::error!("failed to save attempt {}: {}", record.id, e);
                        SaveOutcome::Failed {
                            id: record.id,
                            reason: e.to_string(),
                        }
                    }
                };
                if outcome_tx.send(outcome).is_err() {
                    break;
                }
            }
        });

        Self { tx, outcomes, task }
    }

    /// Queue a record. Returns false if the worker is gone.
    pub fn submit(&self, record: AttemptRecord) -> bool {
        self.tx.send(record).is_ok()
    }

    /// Outcomes that arrived since the last call.
    pub fn drain_outcomes(&mut self) -> Vec<SaveOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.outcomes.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Wait for the next outcome.
    pub async fn next_outcome(&mut self) -> Option<SaveOutcome> {
        self.outcomes.recv().await
    }

    /// Stop accepting records and wait for queued ones to be written.
    pub async fn shutdown(self) {
        let Self { tx, outcomes, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            tracing::error!("persistence worker panicked: {}", e);
        }
        drop(outcomes);
    }
}
