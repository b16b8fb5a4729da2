//! Attempts exported by the web portal, which predate [`AttemptRecord`].

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{AttemptRecord, FinishReason};
use crate::session::percentage;

/// One attempt row as the web portal stores and syncs it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PortalAttempt {
    quiz_id: String,
    #[serde(default)]
    subject: String,
    #[serde(default, alias = "name")]
    user_name: String,
    #[serde(alias = "userEmail")]
    email: String,
    #[serde(default, alias = "userId")]
    uid: String,
    #[serde(default)]
    answers_json: Option<String>,
    score: usize,
    #[serde(default, alias = "totalQuestions")]
    total: Option<usize>,
    #[serde(default)]
    percentage: Option<u8>,
    #[serde(default)]
    time_taken: u32,
    #[serde(alias = "attemptDate", alias = "submittedAt")]
    date: String,
}

impl PortalAttempt {
    /// The portal's sync key: one attempt per email, quiz and date.
    fn sync_key(&self) -> String {
        format!("{}_{}_{}", self.email, self.quiz_id, self.date)
    }
}

impl TryFrom<PortalAttempt> for AttemptRecord {
    type Error = String;

    fn try_from(row: PortalAttempt) -> Result<Self, Self::Error> {
        let submitted_at = parse_portal_date(&row.date)
            .ok_or_else(|| format!("unrecognised date {:?}", row.date))?;
        let answers = row.answers_json.as_deref().map(parse_answers).unwrap_or_default();

        let total = row
            .total
            .or((!answers.is_empty()).then_some(answers.len()))
            .unwrap_or(row.score);
        if row.score > total {
            return Err(format!("score {} exceeds {} questions", row.score, total));
        }

        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, row.sync_key().as_bytes());
        let uid = if row.uid.is_empty() {
            row.email.clone()
        } else {
            row.uid
        };
        Ok(AttemptRecord {
            id,
            quiz_id: row.quiz_id,
            subject: row.subject,
            user_name: row.user_name,
            email: row.email,
            uid,
            answers,
            score: row.score,
            total,
            percentage: row.percentage.unwrap_or_else(|| percentage(row.score, total)),
            time_taken_seconds: row.time_taken,
            started_at: submitted_at - Duration::seconds(i64::from(row.time_taken)),
            submitted_at,
            reason: FinishReason::UserSubmitted,
        })
    }
}

/// RFC 3339 timestamps, or a bare `YYYY-MM-DD` read as UTC midnight.
fn parse_portal_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// `answersJson` is either an array or an object keyed by question index.
fn parse_answers(raw: &str) -> Vec<Option<usize>> {
    if let Ok(list) = serde_json::from_str::<Vec<Option<usize>>>(raw) {
        return list;
    }
    let Ok(by_index) = serde_json::from_str::<BTreeMap<String, usize>>(raw) else {
        tracing::warn!("ignoring unreadable answersJson");
        return Vec::new();
    };
    let indexed: Vec<(usize, usize)> = by_index
        .into_iter()
        .filter_map(|(k, v)| k.parse().ok().map(|i| (i, v)))
        .collect();
    let len = indexed.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
    let mut answers = vec![None; len];
    for (i, option) in indexed {
        answers[i] = Some(option);
    }
    answers
}
