//! Rankings and summaries computed over stored attempts.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::models::{AttemptRecord, Quiz};

/// Entry in the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_name: String,
    pub quiz_id: String,
    pub score: usize,
    pub total: usize,
    pub percentage: u8,
    pub time_taken_seconds: u32,
    pub is_you: bool,
}

/// Percentage descending, then faster first, then earlier submission, then id.
fn rank_order(a: &AttemptRecord, b: &AttemptRecord) -> Ordering {
    b.percentage
        .cmp(&a.percentage)
        .then_with(|| a.time_taken_seconds.cmp(&b.time_taken_seconds))
        .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Rank attempts, optionally for one quiz, keeping the top `limit`.
pub fn leaderboard(
    attempts: &[AttemptRecord],
    quiz_id: Option<&str>,
    limit: usize,
    your_email: Option<&str>,
) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&AttemptRecord> = attempts
        .iter()
        .filter(|a| quiz_id.is_none_or(|id| a.quiz_id == id))
        .collect();
    ranked.sort_by(|a, b| rank_order(a, b));

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, a)| LeaderboardEntry {
            rank: i + 1,
            user_name: a.user_name.clone(),
            quiz_id: a.quiz_id.clone(),
            score: a.score,
            total: a.total,
            percentage: a.percentage,
            time_taken_seconds: a.time_taken_seconds,
            is_you: your_email.is_some_and(|e| a.email == e),
        })
        .collect()
}

/// How one user has done on one quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSummary<'a> {
    pub attempts: usize,
    pub best: Option<&'a AttemptRecord>,
}

/// Best = highest score; equal scores go to the earliest submission.
pub fn best_attempt<'a, I>(attempts: I) -> Option<&'a AttemptRecord>
where
    I: IntoIterator<Item = &'a AttemptRecord>,
{
    attempts.into_iter().min_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.submitted_at.cmp(&b.submitted_at))
            .then_with(|| a.id.cmp(&b.id))
    })
}

pub fn summarize<'a>(
    attempts: &'a [AttemptRecord],
    email: &str,
    quiz_id: &str,
) -> AttemptSummary<'a> {
    let mine: Vec<&AttemptRecord> = attempts
        .iter()
        .filter(|a| a.belongs_to(email) && a.quiz_id == quiz_id)
        .collect();
    AttemptSummary {
        attempts: mine.len(),
        best: best_attempt(mine),
    }
}

/// Portal-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_quizzes: usize,
    pub total_questions: usize,
    pub total_attempts: usize,
    pub distinct_users: usize,
    pub attempts_on_day: usize,
}

/// Counters as of `now`. "Today" runs from midnight in `now`'s time zone.
pub fn dashboard_stats<Tz: TimeZone>(
    quizzes: &[Quiz],
    attempts: &[AttemptRecord],
    now: &DateTime<Tz>,
) -> DashboardStats {
    let zone = now.timezone();
    let today = now.date_naive();
    let users: HashSet<&str> = attempts.iter().map(|a| a.uid.as_str()).collect();
    DashboardStats {
        total_quizzes: quizzes.len(),
        total_questions: quizzes.iter().map(Quiz::total_questions).sum(),
        total_attempts: attempts.len(),
        distinct_users: users.len(),
        attempts_on_day: attempts
            .iter()
            .filter(|a| a.submitted_at.with_timezone(&zone).date_naive() == today)
            .count(),
    }
}
